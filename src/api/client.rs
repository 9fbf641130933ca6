// src/api/client.rs
//! HTTP transport for hypermedia APIs.
//!
//! A thin wrapper around reqwest: it sends the HAL `Accept` header, keeps
//! cookies across requests (session credentials), maps non-success statuses
//! to errors and parses the body as JSON. No normalization happens here.

use super::Transport;
use crate::config::TransportConfig;
use crate::constants::HAL_ACCEPT;
use crate::error::AppError;
use crate::error_recovery::retry_with_backoff;
use reqwest::{header, Client};
use serde_json::Value;

/// The default [`Transport`]: GET requests over reqwest with bounded retries.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Creates a new HTTP transport.
    pub fn new(config: TransportConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .cookie_store(config.with_credentials)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates the default headers for hypermedia requests.
    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(HAL_ACCEPT));
        headers
    }

    /// Makes one GET request and decodes the JSON body.
    async fn get_once(&self, uri: &str) -> Result<Value, AppError> {
        log::debug!("GET {}", uri);
        let response = self.client.get(uri).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("GET {} -> {}", uri, status);
            return Err(AppError::HttpStatus {
                uri: uri.to_string(),
                status,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            log::error!("Failed to parse response from {}: {}", uri, e);
            AppError::MalformedDocument(format!("{} is not valid JSON: {}", uri, e))
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, uri: &str) -> Result<Value, AppError> {
        retry_with_backoff(
            || self.get_once(uri),
            self.config.attempts,
            self.config.initial_delay,
            self.config.max_delay,
        )
        .await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

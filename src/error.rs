// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names a failure mode of the normalization cache and where it
//! happened. Errors that travel through a `loaded` handle are shared as
//! `Arc<AppError>`, since every holder of the handle observes the same failure.

use crate::types::CacheKey;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("API returned HTTP {status} for {uri}")]
    HttpStatus {
        uri: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed hypermedia document: {0}")]
    MalformedDocument(String),

    #[error("Cache misuse at '{key}': {reason}")]
    CacheMisuse { key: CacheKey, reason: String },

    #[error("Fetch for '{0}' ended without a result")]
    Cancelled(CacheKey),

    #[error("No Tokio runtime available to drive fetches")]
    MissingRuntime,

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether this error is transient and worth retrying at the transport.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkFailure(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::HttpStatus { status, .. } => {
                status.is_server_error()
                    || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || *status == reqwest::StatusCode::REQUEST_TIMEOUT
            }
            _ => false,
        }
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::HttpStatus { status, .. } if *status == reqwest::StatusCode::NOT_FOUND
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedDocument(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

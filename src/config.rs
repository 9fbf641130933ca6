use crate::api::FailurePolicy;
use crate::constants::{
    API_ROOT_ENV, DEFAULT_EVENT_CAPACITY, DEFAULT_EXPLORE_DEPTH, DEFAULT_FETCH_ATTEMPTS,
    DEFAULT_REQUEST_TIMEOUT_SECS, MAX_EXPLORE_DEPTH, MAX_FETCH_ATTEMPTS, RETRY_INITIAL_DELAY,
    RETRY_MAX_DELAY,
};
use crate::error::AppError;
use crate::types::{ApiRoot, ValidationError};
use clap::Parser;
use std::time::Duration;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Resource to resolve, absolute or relative to the API root (defaults to the root)
    #[arg(default_value = "")]
    pub uri: String,

    /// API root URL; falls back to the HALSTORE_API_ROOT environment variable
    #[arg(short = 'r', long)]
    pub api_root: Option<String>,

    /// How many link levels to follow when rendering the graph
    #[arg(short, long, default_value_t = DEFAULT_EXPLORE_DEPTH)]
    pub depth: u8,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Attempts per request, including the first one
    #[arg(long, default_value_t = DEFAULT_FETCH_ATTEMPTS)]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Keep failed placeholders in the cache instead of evicting them
    #[arg(long, default_value_t = false)]
    pub retain_failed: bool,

    /// Sort query parameters when computing cache keys
    #[arg(long, default_value_t = false)]
    pub sort_query: bool,

    /// Pipe mode - print compact JSON for piping
    #[arg(short = 'p', long, default_value_t = false)]
    pub pipe: bool,
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Attempts per request, including the first one.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
    /// Keep session cookies between requests.
    pub with_credentials: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_FETCH_ATTEMPTS,
            initial_delay: RETRY_INITIAL_DELAY,
            max_delay: RETRY_MAX_DELAY,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            with_credentials: true,
        }
    }
}

/// Everything needed to build a [`HalStore`](crate::HalStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_root: ApiRoot,
    pub sort_query: bool,
    pub failure_policy: FailurePolicy,
    pub event_capacity: usize,
    pub transport: TransportConfig,
}

impl StoreConfig {
    pub fn new(api_root: ApiRoot) -> Self {
        Self {
            api_root,
            sort_query: false,
            failure_policy: FailurePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            transport: TransportConfig::default(),
        }
    }
}

/// Resolved configuration for one run of the binary.
#[derive(Debug, Clone)]
pub struct ExploreConfig {
    pub store: StoreConfig,
    pub uri: String,
    pub depth: u8,
    pub pipe: bool,
    pub verbose: bool,
}

impl ExploreConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(mut cli: CommandLineInput) -> Result<Self, AppError> {
        let root = match cli.api_root.take() {
            Some(root) => root,
            None => std::env::var(API_ROOT_ENV).map_err(|_| {
                AppError::MissingConfiguration(format!(
                    "pass --api-root or set the {} environment variable",
                    API_ROOT_ENV
                ))
            })?,
        };
        Self::with_root(cli, root)
    }

    fn with_root(cli: CommandLineInput, root: String) -> Result<Self, AppError> {
        let api_root = ApiRoot::new(root)?;

        if cli.retries == 0 || cli.retries > MAX_FETCH_ATTEMPTS {
            return Err(ValidationError::OutOfBounds {
                value: cli.retries,
                min: 1,
                max: MAX_FETCH_ATTEMPTS,
            }
            .into());
        }

        let depth = cli.depth.min(MAX_EXPLORE_DEPTH);
        if cli.depth > depth {
            log::warn!(
                "Requested depth {} exceeds maximum {}. Clamping.",
                cli.depth,
                MAX_EXPLORE_DEPTH
            );
        }

        let store = StoreConfig {
            sort_query: cli.sort_query,
            failure_policy: if cli.retain_failed {
                FailurePolicy::Retain
            } else {
                FailurePolicy::Evict
            },
            transport: TransportConfig {
                attempts: cli.retries,
                timeout: Duration::from_secs(cli.timeout_secs),
                ..TransportConfig::default()
            },
            ..StoreConfig::new(api_root)
        };

        Ok(ExploreConfig {
            store,
            uri: cli.uri,
            depth,
            pipe: cli.pipe,
            verbose: cli.verbose,
        })
    }
}

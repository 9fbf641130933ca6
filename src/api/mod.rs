// src/api/mod.rs
//! Hypermedia API interaction — the ability to turn HAL resources into a cached graph.
//!
//! Transport, caching, normalization and orchestration are kept apart: the
//! cache only knows entries, the normalizer only knows documents, and the
//! orchestrator is the one place that ties a fetch to a cache key.

pub mod cache;
pub mod client;
pub mod normalizer;
pub mod orchestrator;
pub mod store;

use crate::error::AppError;
use serde_json::Value;

/// The ability to retrieve one hypermedia document.
///
/// This is the only I/O the engine performs. The cache and normalizer depend
/// on this trait, never on HTTP details; timeouts and retries belong to the
/// implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the JSON body at an absolute URI.
    async fn fetch(&self, uri: &str) -> Result<Value, AppError>;
}

// Re-export the public interface
pub use cache::{CacheEntry, CacheEvent, CacheMutator, EntryState, LoadResult, Loaded, NormalizedCache};
pub use client::HttpTransport;
pub use normalizer::GraphNormalizer;
pub use orchestrator::{FailurePolicy, FetchOrchestrator};
pub use store::{HalStore, HalStoreBuilder};

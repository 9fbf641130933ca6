// src/lib.rs
//! halstore library — a normalizing, lazily resolved cache for HAL APIs.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `ValidationError`
//! - **Configuration** — `StoreConfig`, `TransportConfig`, `ExploreConfig`
//! - **Keys and documents** — `CacheKey`, `ApiRoot`, `UriNormalizer`, `DocumentShape`
//! - **Object graph** — `Resolved`, `Resource`, `Collection`, `Node`, `Accessor`
//! - **Engine** — `HalStore`, `NormalizedCache`, `GraphNormalizer`, `FetchOrchestrator`
//! - **Exploration** — `render_graph`

pub mod api;
mod config;
pub mod constants;
mod error;
mod error_recovery;
mod explore;
pub mod model;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, Result};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ExploreConfig, StoreConfig, TransportConfig};

// --- Keys and Documents ---
pub use crate::types::{ApiRoot, CacheKey, DocumentShape, Link, LinkRelation, UriNormalizer};

// --- Object Graph ---
pub use crate::model::{
    Accessor, Collection, CollectionAccessor, Node, PageInfo, Resolved, Resource,
};

// --- Engine ---
pub use crate::api::{
    CacheEntry, CacheEvent, CacheMutator, EntryState, FailurePolicy, FetchOrchestrator,
    GraphNormalizer, HalStore, HalStoreBuilder, HttpTransport, LoadResult, Loaded,
    NormalizedCache, Transport,
};

// --- Exploration ---
pub use crate::explore::{render_graph, Exploration};

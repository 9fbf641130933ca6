// src/api/orchestrator.rs
//! Ties a cache key to at most one in-flight fetch.
//!
//! On a miss the placeholder goes into the cache under the same lock as the
//! miss check, before the fetch is spawned, so every later lookup for the key
//! shares the placeholder's `loaded` handle instead of fetching again.

use super::cache::{CacheEntry, LoadResult, Loaded, Lookup, NormalizedCache};
use super::normalizer::GraphNormalizer;
use super::Transport;
use crate::error::AppError;
use crate::model::Resolved;
use crate::types::{CacheKey, UriNormalizer};
use futures::FutureExt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// What happens to a placeholder whose fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Remove the placeholder so the next lookup fetches again.
    #[default]
    Evict,
    /// Keep the rejected placeholder until the key is invalidated.
    Retain,
}

/// Resolves cache keys, fetching and normalizing on a miss.
pub struct FetchOrchestrator {
    cache: Arc<NormalizedCache>,
    uris: Arc<UriNormalizer>,
    transport: Arc<dyn Transport>,
    policy: FailurePolicy,
    runtime: Handle,
}

impl FetchOrchestrator {
    pub fn new(
        cache: Arc<NormalizedCache>,
        uris: Arc<UriNormalizer>,
        transport: Arc<dyn Transport>,
        policy: FailurePolicy,
        runtime: Handle,
    ) -> Self {
        Self {
            cache,
            uris,
            transport,
            policy,
            runtime,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Returns whatever the cache holds for `key` right now.
    ///
    /// On a miss this installs and returns a placeholder; the payload may
    /// still be loading when this returns.
    pub fn resolve(&self, key: CacheKey) -> Arc<CacheEntry> {
        if let Some(entry) = self.cache.get(&key) {
            log::debug!("Cache hit: {}", key);
            return entry;
        }

        let (tx, rx) = oneshot::channel::<LoadResult>();
        let dropped_key = key.clone();
        let loaded: Loaded = rx
            .map(move |received| {
                received.unwrap_or_else(|_| Err(Arc::new(AppError::Cancelled(dropped_key))))
            })
            .boxed()
            .shared();

        match self.cache.lookup_or_install(&key, loaded) {
            Lookup::Hit(entry) => {
                log::debug!("Cache hit after race: {}", key);
                entry
            }
            Lookup::Installed(placeholder) => {
                log::debug!("Cache miss: {}", key);
                self.dispatch(key, Arc::clone(&placeholder), tx);
                placeholder
            }
        }
    }

    /// Spawns the fetch that fulfills `placeholder`.
    fn dispatch(
        &self,
        key: CacheKey,
        placeholder: Arc<CacheEntry>,
        tx: oneshot::Sender<LoadResult>,
    ) {
        let cache = Arc::clone(&self.cache);
        let uris = Arc::clone(&self.uris);
        let transport = Arc::clone(&self.transport);
        let policy = self.policy;
        let uri = uris.root().join(&key);

        self.runtime.spawn(async move {
            log::info!("Fetching {}", uri);
            let outcome = match transport.fetch(&uri).await {
                Ok(body) => load_document(&cache, &uris, body),
                Err(e) => Err(e),
            };

            let outcome = match outcome {
                Ok(resolved) => {
                    if resolved.self_key() != Some(&key) {
                        // Stored under its own self; the requested key must not stay loading.
                        log::debug!(
                            "{} answered with self '{}'",
                            key,
                            resolved.self_key().map(CacheKey::as_str).unwrap_or_default()
                        );
                        cache.evict_if_current(&key, &placeholder);
                    }
                    Ok(resolved)
                }
                Err(e) => {
                    log::warn!("Fetch for {} failed: {}", key, e);
                    if policy == FailurePolicy::Evict {
                        cache.evict_if_current(&key, &placeholder);
                    }
                    Err(Arc::new(e))
                }
            };

            // Nobody may be waiting on the handle anymore.
            let _ = tx.send(outcome);
        });
    }
}

/// Normalizes a fetched body and returns the root entity as stored.
fn load_document(
    cache: &NormalizedCache,
    uris: &UriNormalizer,
    body: serde_json::Value,
) -> Result<Arc<Resolved>, AppError> {
    let entry = GraphNormalizer::new(uris, cache).normalize_root(body)?;
    entry.resolved().cloned().ok_or_else(|| AppError::InternalError {
        message: format!("root '{}' was stored without a resolved value", entry.key()),
        source: None,
    })
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("cache", &self.cache)
            .field("uris", &self.uris)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

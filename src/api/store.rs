// src/api/store.rs
//! The accessor surface: the one entry point callers use to reach the graph.
//!
//! [`HalStore::api`] canonicalizes a URI and hands the key to the
//! orchestrator. Accessors produced by normalization come back through the
//! same method, so every resolution path sees the same cache.

use super::cache::{CacheEntry, CacheEvent, CacheMutator, LoadResult, NormalizedCache};
use super::client::HttpTransport;
use super::orchestrator::{FailurePolicy, FetchOrchestrator};
use super::Transport;
use crate::config::{StoreConfig, TransportConfig};
use crate::constants::DEFAULT_EVENT_CAPACITY;
use crate::error::AppError;
use crate::model::Node;
use crate::types::{ApiRoot, CacheKey, UriNormalizer};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// A normalized, lazily resolved view of a hypermedia API.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone, Debug)]
pub struct HalStore {
    uris: Arc<UriNormalizer>,
    cache: Arc<NormalizedCache>,
    orchestrator: Arc<FetchOrchestrator>,
}

impl HalStore {
    pub fn builder(api_root: ApiRoot) -> HalStoreBuilder {
        HalStoreBuilder::new(api_root)
    }

    /// Builds a store with the HTTP transport described by `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self, AppError> {
        Self::builder(config.api_root.clone())
            .sort_query(config.sort_query)
            .failure_policy(config.failure_policy)
            .event_capacity(config.event_capacity)
            .transport_config(config.transport.clone())
            .build()
    }

    /// Returns the cache entry for `uri`, starting a fetch if it is not cached.
    ///
    /// Never blocks: the entry may be a placeholder whose
    /// [`loaded`](CacheEntry::loaded) handle is still pending.
    pub fn api(&self, uri: &str) -> Arc<CacheEntry> {
        let key = self.uris.normalize(Some(uri));
        self.orchestrator.resolve(key)
    }

    /// The API root document.
    pub fn root(&self) -> Arc<CacheEntry> {
        self.orchestrator.resolve(CacheKey::root())
    }

    /// Resolves `uri` and waits for the entity.
    pub async fn load(&self, uri: &str) -> LoadResult {
        self.api(uri).loaded().await
    }

    /// The cached entry for `uri`, without fetching.
    pub fn peek(&self, uri: &str) -> Option<Arc<CacheEntry>> {
        self.cache.get(&self.uris.normalize(Some(uri)))
    }

    /// Drops the entry for `uri` so the next access fetches it again.
    pub fn invalidate(&self, uri: &str) -> Option<Arc<CacheEntry>> {
        let key = self.uris.normalize(Some(uri));
        log::debug!("Invalidating {}", key);
        self.cache.evict(&key)
    }

    /// Invalidates `uri` and starts a fresh fetch for it.
    pub fn refresh(&self, uri: &str) -> Arc<CacheEntry> {
        self.invalidate(uri);
        self.api(uri)
    }

    /// Appends an item to the cached page at `collection_uri`.
    pub fn append_item(
        &self,
        collection_uri: &str,
        item: Node,
    ) -> Result<Arc<CacheEntry>, AppError> {
        let key = self.uris.normalize(Some(collection_uri));
        self.cache.append_item(&key, item)
    }

    pub fn normalize(&self, uri: &str) -> CacheKey {
        self.uris.normalize(Some(uri))
    }

    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    pub fn api_root(&self) -> &ApiRoot {
        self.uris.root()
    }
}

/// Assembles a [`HalStore`] from its collaborators.
pub struct HalStoreBuilder {
    api_root: ApiRoot,
    sort_query: bool,
    failure_policy: FailurePolicy,
    event_capacity: usize,
    transport: Option<Arc<dyn Transport>>,
    transport_config: TransportConfig,
    runtime: Option<Handle>,
}

impl HalStoreBuilder {
    pub fn new(api_root: ApiRoot) -> Self {
        Self {
            api_root,
            sort_query: false,
            failure_policy: FailurePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            transport: None,
            transport_config: TransportConfig::default(),
            runtime: None,
        }
    }

    pub fn sort_query(mut self, enabled: bool) -> Self {
        self.sort_query = enabled;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Uses `transport` instead of the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Settings for the HTTP transport; ignored when a transport is supplied.
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    /// Runtime the fetches are spawned on. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<HalStore, AppError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| AppError::MissingRuntime)?,
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.transport_config)?),
        };

        let uris = Arc::new(UriNormalizer::new(self.api_root).sort_query(self.sort_query));
        let cache = Arc::new(NormalizedCache::new(self.event_capacity));
        let orchestrator = Arc::new(FetchOrchestrator::new(
            Arc::clone(&cache),
            Arc::clone(&uris),
            transport,
            self.failure_policy,
            runtime,
        ));

        log::debug!(
            "Store ready for {} (failure policy {:?})",
            uris.root(),
            self.failure_policy
        );

        Ok(HalStore {
            uris,
            cache,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_outside_a_runtime_fails() {
        let root = ApiRoot::new("http://api.test").unwrap();
        let result = HalStore::builder(root).build();
        assert!(matches!(result, Err(AppError::MissingRuntime)));
    }

    #[tokio::test]
    async fn keys_are_normalized_against_the_root() {
        let store = HalStore::builder(ApiRoot::new("http://api.test").unwrap())
            .build()
            .unwrap();
        assert_eq!(store.normalize("http://api.test/camps/1").as_str(), "/camps/1");
        assert!(store.peek("/camps/1").is_none());
        assert!(store.cache().is_empty());
    }
}

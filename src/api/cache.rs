// src/api/cache.rs
//! In-memory normalized cache of hypermedia resources.
//!
//! One entry per canonical key, written only through [`CacheMutator`].
//! Every write replaces a whole entry (or appends one item to a page) and is
//! announced on a broadcast channel so observers can react to it.

use crate::error::AppError;
use crate::model::{Node, Resolved};
use crate::types::CacheKey;
use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Outcome carried by a `loaded` handle.
pub type LoadResult = Result<Arc<Resolved>, Arc<AppError>>;

/// Cloneable handle to the eventual resolved entity of an entry.
pub type Loaded = Shared<BoxFuture<'static, LoadResult>>;

/// A handle that is already fulfilled with `resolved`.
pub fn ready_handle(resolved: Arc<Resolved>) -> Loaded {
    future::ready::<LoadResult>(Ok(resolved)).boxed().shared()
}

/// Synchronously readable state of an entry.
#[derive(Debug, Clone)]
pub enum EntryState {
    Loading,
    Resolved(Arc<Resolved>),
}

/// The value stored per key: a placeholder for an in-flight fetch, or a resolved entity.
///
/// Both shapes expose the same [`CacheEntry::loaded`] handle.
pub struct CacheEntry {
    key: CacheKey,
    state: EntryState,
    loaded: Loaded,
    updated_at: DateTime<Utc>,
}

impl CacheEntry {
    fn placeholder(key: CacheKey, loaded: Loaded) -> Self {
        Self {
            key,
            state: EntryState::Loading,
            loaded,
            updated_at: Utc::now(),
        }
    }

    fn new_resolved(key: CacheKey, resolved: Arc<Resolved>) -> Self {
        Self {
            key,
            loaded: ready_handle(Arc::clone(&resolved)),
            state: EntryState::Resolved(resolved),
            updated_at: Utc::now(),
        }
    }

    /// The canonical key this entry is stored under.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, EntryState::Loading)
    }

    pub fn resolved(&self) -> Option<&Arc<Resolved>> {
        match &self.state {
            EntryState::Resolved(r) => Some(r),
            EntryState::Loading => None,
        }
    }

    /// Handle to the resolved entity. Clones share one underlying future.
    pub fn loaded(&self) -> Loaded {
        self.loaded.clone()
    }

    /// When this entry was written.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// A change to the cache, announced after it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Placeholder(CacheKey),
    Resolved(CacheKey),
    Appended(CacheKey),
    Evicted(CacheKey),
}

impl CacheEvent {
    pub fn key(&self) -> &CacheKey {
        match self {
            CacheEvent::Placeholder(k)
            | CacheEvent::Resolved(k)
            | CacheEvent::Appended(k)
            | CacheEvent::Evicted(k) => k,
        }
    }
}

/// The write surface of the cache.
///
/// Each operation is one non-suspending step; no operation merges fields.
pub trait CacheMutator: Send + Sync {
    /// Installs a loading entry at `key`, replacing whatever was there.
    fn insert_placeholder(&self, key: CacheKey, loaded: Loaded) -> Arc<CacheEntry>;

    /// Stores `resolved` under its own `self` key with an already-fulfilled handle.
    fn insert_resolved(&self, resolved: Resolved) -> Result<Arc<CacheEntry>, AppError>;

    /// Appends `item` to the page stored at `collection_key`.
    fn append_item(&self, collection_key: &CacheKey, item: Node)
        -> Result<Arc<CacheEntry>, AppError>;

    /// Removes the entry at `key`, returning it.
    fn evict(&self, key: &CacheKey) -> Option<Arc<CacheEntry>>;
}

/// Result of the atomic miss-check-and-install used by the orchestrator.
#[derive(Debug)]
pub(crate) enum Lookup {
    Hit(Arc<CacheEntry>),
    Installed(Arc<CacheEntry>),
}

/// Mapping from canonical key to cache entry.
pub struct NormalizedCache {
    entries: RwLock<HashMap<CacheKey, Arc<CacheEntry>>>,
    events: broadcast::Sender<CacheEvent>,
}

impl NormalizedCache {
    /// Creates an empty cache; `event_capacity` bounds each subscriber's backlog.
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All keys currently cached, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Subscribes to every subsequent write.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Returns the entry at `key`, or installs a placeholder with `loaded` under the same lock.
    pub(crate) fn lookup_or_install(&self, key: &CacheKey, loaded: Loaded) -> Lookup {
        let installed = {
            let mut entries = self.entries.write();
            if let Some(existing) = entries.get(key) {
                return Lookup::Hit(Arc::clone(existing));
            }
            let entry = Arc::new(CacheEntry::placeholder(key.clone(), loaded));
            entries.insert(key.clone(), Arc::clone(&entry));
            entry
        };
        log::debug!("Placeholder installed: {}", key);
        self.notify(CacheEvent::Placeholder(key.clone()));
        Lookup::Installed(installed)
    }

    /// Evicts `key` only while it still holds `expected`.
    pub(crate) fn evict_if_current(&self, key: &CacheKey, expected: &Arc<CacheEntry>) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            let is_current = entries
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, expected));
            if is_current {
                entries.remove(key);
            }
            is_current
        };
        if removed {
            log::debug!("Evicted stale entry: {}", key);
            self.notify(CacheEvent::Evicted(key.clone()));
        }
        removed
    }

    fn notify(&self, event: CacheEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl Default for NormalizedCache {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CAPACITY)
    }
}

impl fmt::Debug for NormalizedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedCache")
            .field("entries", &self.len())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl CacheMutator for NormalizedCache {
    fn insert_placeholder(&self, key: CacheKey, loaded: Loaded) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::placeholder(key.clone(), loaded));
        self.entries.write().insert(key.clone(), Arc::clone(&entry));
        log::debug!("Placeholder installed: {}", key);
        self.notify(CacheEvent::Placeholder(key));
        entry
    }

    fn insert_resolved(&self, resolved: Resolved) -> Result<Arc<CacheEntry>, AppError> {
        let key = resolved
            .self_key()
            .cloned()
            .ok_or_else(|| AppError::CacheMisuse {
                key: CacheKey::from(""),
                reason: "resolved entity has no self key".to_string(),
            })?;
        let entry = Arc::new(CacheEntry::new_resolved(key.clone(), Arc::new(resolved)));
        self.entries.write().insert(key.clone(), Arc::clone(&entry));
        log::debug!("Resolved entry stored: {}", key);
        self.notify(CacheEvent::Resolved(key));
        Ok(entry)
    }

    fn append_item(
        &self,
        collection_key: &CacheKey,
        item: Node,
    ) -> Result<Arc<CacheEntry>, AppError> {
        let misuse = |reason: &str| AppError::CacheMisuse {
            key: collection_key.clone(),
            reason: reason.to_string(),
        };

        let entry = {
            let mut entries = self.entries.write();
            let current = entries
                .get(collection_key)
                .ok_or_else(|| misuse("no entry under this key"))?;
            let resolved = current
                .resolved()
                .ok_or_else(|| misuse("entry is still loading"))?;

            let mut updated = Resolved::clone(resolved);
            updated
                .as_page_mut()
                .ok_or_else(|| misuse("entry has no items sequence"))?
                .push(item);

            let entry = Arc::new(CacheEntry::new_resolved(
                collection_key.clone(),
                Arc::new(updated),
            ));
            entries.insert(collection_key.clone(), Arc::clone(&entry));
            entry
        };
        log::debug!("Item appended to {}", collection_key);
        self.notify(CacheEvent::Appended(collection_key.clone()));
        Ok(entry)
    }

    fn evict(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let removed = self.entries.write().remove(key);
        if removed.is_some() {
            log::debug!("Evicted: {}", key);
            self.notify(CacheEvent::Evicted(key.clone()));
        }
        removed
    }
}

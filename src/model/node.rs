//! Field values of a normalized entity and the lazy edges between entities.

use super::Collection;
use super::Resolved;
use crate::api::cache::CacheEntry;
use crate::api::store::HalStore;
use crate::error::AppError;
use crate::types::CacheKey;
use serde_json::{json, Value};
use std::sync::Arc;

/// One field of a resolved entity.
///
/// Nested resources are never materialized here: a link or an embedded
/// document is a [`Accessor`] on its key, an embedded array a
/// [`CollectionAccessor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Value(Value),
    Link(Accessor),
    Collection(CollectionAccessor),
}

impl Node {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Accessor> {
        match self {
            Node::Link(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionAccessor> {
        match self {
            Node::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// JSON rendering that does not follow edges: links become `{"href": key}`.
    pub fn to_shallow_json(&self) -> Value {
        match self {
            Node::Value(v) => v.clone(),
            Node::Link(a) => json!({ "href": a.key().as_str() }),
            Node::Collection(c) => Value::Array(
                c.get().items().iter().map(Node::to_shallow_json).collect(),
            ),
        }
    }
}

/// A lazy edge to another cached resource.
///
/// Captures only the target key. Every call to [`Accessor::get`] goes back
/// through the store's accessor surface, so holders always see the latest
/// cached state for the key, including a refetch that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accessor {
    key: CacheKey,
}

impl Accessor {
    pub fn new(key: CacheKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns whatever the cache holds for the key right now, starting a fetch on a miss.
    pub fn get(&self, store: &HalStore) -> Arc<CacheEntry> {
        store.api(self.key.as_str())
    }

    /// Waits for the target to be resolved.
    pub async fn load(&self, store: &HalStore) -> Result<Arc<Resolved>, Arc<AppError>> {
        self.get(store).loaded().await
    }
}

/// An embedded, fully enumerated collection.
///
/// The collection is built once during normalization and handed out as-is;
/// only the items inside it are lazy.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionAccessor(Arc<Collection>);

impl CollectionAccessor {
    pub fn new(collection: Collection) -> Self {
        Self(Arc::new(collection))
    }

    pub fn get(&self) -> Arc<Collection> {
        Arc::clone(&self.0)
    }
}

// src/api/normalizer.rs
//! Decomposition of fetched hypermedia documents into cached entities.
//!
//! The walk is synchronous once a body is in hand:
//!   1. Classify every node once into a [`DocumentShape`]
//!   2. Replace nested resources with accessors, arrays with collections
//!   3. Turn `_links` into a `self` key plus one accessor per relation
//!   4. Wrap documents with `_embedded.items` into collection pages
//!   5. Commit each resource through the [`CacheMutator`]

use super::cache::{CacheEntry, CacheMutator};
use crate::constants::{EMBEDDED_KEY, ITEMS_KEY, LINKS_KEY, SELF_REL};
use crate::error::AppError;
use crate::model::{Accessor, Collection, CollectionAccessor, Node, Resolved, Resource};
use crate::types::{CacheKey, DocumentShape, Link, LinkRelation, UriNormalizer};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A hypermedia document split into its parts, before wrapping.
struct Decomposed {
    self_key: CacheKey,
    fields: IndexMap<String, Node>,
    items: Option<Vec<Value>>,
}

/// Walks hypermedia documents and writes every resource found into the cache.
pub struct GraphNormalizer<'a> {
    uris: &'a UriNormalizer,
    mutator: &'a dyn CacheMutator,
}

impl<'a> GraphNormalizer<'a> {
    pub fn new(uris: &'a UriNormalizer, mutator: &'a dyn CacheMutator) -> Self {
        Self { uris, mutator }
    }

    /// Normalizes a document and returns an accessor on its key.
    ///
    /// The accessor never points at the in-memory value: holders resolve
    /// through the cache and see later refetches.
    pub fn normalize(&self, document: Value) -> Result<Accessor, AppError> {
        let entry = self.normalize_root(document)?;
        Ok(Accessor::new(entry.key().clone()))
    }

    /// Normalizes the root of a fetch and returns the entry stored for it.
    ///
    /// A root must be a resource or a page; anything else cannot be cached.
    pub(crate) fn normalize_root(&self, document: Value) -> Result<Arc<CacheEntry>, AppError> {
        match DocumentShape::classify(document) {
            DocumentShape::Linked(map) => self.normalize_resource(map),
            DocumentShape::Page(map) => self.normalize_page(map),
            DocumentShape::Sequence(_) => Err(AppError::MalformedDocument(
                "root document is an array, expected a resource".to_string(),
            )),
            DocumentShape::Plain(_) => Err(AppError::MalformedDocument(
                "root document carries no hypermedia metadata".to_string(),
            )),
        }
    }

    fn normalize_node(&self, value: Value) -> Result<Node, AppError> {
        match DocumentShape::classify(value) {
            DocumentShape::Plain(value) => Ok(Node::Value(value)),
            DocumentShape::Linked(map) => {
                let entry = self.normalize_resource(map)?;
                Ok(Node::Link(Accessor::new(entry.key().clone())))
            }
            DocumentShape::Page(map) => {
                let entry = self.normalize_page(map)?;
                Ok(Node::Link(Accessor::new(entry.key().clone())))
            }
            DocumentShape::Sequence(items) => {
                let nodes = self.normalize_sequence(items)?;
                Ok(Node::Collection(CollectionAccessor::new(
                    Collection::from_array(nodes),
                )))
            }
        }
    }

    fn normalize_sequence(&self, items: Vec<Value>) -> Result<Vec<Node>, AppError> {
        items
            .into_iter()
            .map(|item| self.normalize_node(item))
            .collect()
    }

    fn normalize_resource(&self, map: Map<String, Value>) -> Result<Arc<CacheEntry>, AppError> {
        let parts = self.decompose(map)?;
        let resource = Resource::new(parts.self_key, parts.fields);
        self.mutator.insert_resolved(Resolved::Resource(resource))
    }

    fn normalize_page(&self, map: Map<String, Value>) -> Result<Arc<CacheEntry>, AppError> {
        let parts = self.decompose(map)?;
        let raw_items = parts.items.ok_or_else(|| {
            AppError::MalformedDocument(format!(
                "page '{}' has no {}.{} array",
                parts.self_key, EMBEDDED_KEY, ITEMS_KEY
            ))
        })?;
        let items = self.normalize_sequence(raw_items)?;
        let page = Resource::new(parts.self_key, parts.fields);
        self.mutator
            .insert_resolved(Resolved::Page(Collection::from_page(page, items)))
    }

    /// Splits a hypermedia object into its key, normalized fields and raw page items.
    ///
    /// The `self` link is resolved before any field is walked, so a rejected
    /// document writes nothing. Plain fields come first, then lifted
    /// `_embedded` relations, then link relations; a later part replaces an
    /// earlier field of the same name.
    fn decompose(&self, mut map: Map<String, Value>) -> Result<Decomposed, AppError> {
        let links = map.remove(LINKS_KEY);
        let embedded = map.remove(EMBEDDED_KEY);

        let mut self_key = None;
        let mut link_fields = Vec::new();
        if let Some(links) = links {
            let relations: IndexMap<String, LinkRelation> = serde_json::from_value(links)
                .map_err(|e| AppError::MalformedDocument(format!("invalid {}: {}", LINKS_KEY, e)))?;

            for (rel, relation) in relations {
                if rel == SELF_REL {
                    self_key = Some(self.self_key(relation)?);
                } else {
                    link_fields.push((rel, self.link_node(relation)));
                }
            }
        }

        let self_key = self_key.ok_or_else(|| {
            AppError::MalformedDocument(format!("resource without a '{}' link", SELF_REL))
        })?;

        let mut fields = IndexMap::with_capacity(map.len() + link_fields.len());
        for (name, value) in map {
            let node = self.normalize_node(value)?;
            fields.insert(name, node);
        }

        let mut items = None;
        if let Some(Value::Object(embedded)) = embedded {
            for (rel, value) in embedded {
                match value {
                    Value::Array(list) if rel == ITEMS_KEY => items = Some(list),
                    other => {
                        let node = self.normalize_node(other)?;
                        fields.insert(rel, node);
                    }
                }
            }
        }

        fields.extend(link_fields);

        Ok(Decomposed {
            self_key,
            fields,
            items,
        })
    }

    fn self_key(&self, relation: LinkRelation) -> Result<CacheKey, AppError> {
        match relation {
            LinkRelation::Single(link) => Ok(self.uris.normalize(Some(&link.href))),
            LinkRelation::Many(_) => Err(AppError::MalformedDocument(format!(
                "'{}' must be a single link",
                SELF_REL
            ))),
        }
    }

    fn link_node(&self, relation: LinkRelation) -> Node {
        let accessor = |link: &Link| Accessor::new(self.uris.normalize(Some(&link.href)));
        match relation {
            LinkRelation::Single(link) => Node::Link(accessor(&link)),
            LinkRelation::Many(links) => Node::Collection(CollectionAccessor::new(
                Collection::from_array(links.iter().map(|l| Node::Link(accessor(l))).collect()),
            )),
        }
    }
}

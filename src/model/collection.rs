//! Collections of graph nodes: embedded arrays and pages of paginated lists.

use super::{Accessor, Node, Resource};
use crate::constants::{NEXT_REL, PREV_REL, TOTAL_ITEMS_KEY};
use crate::types::CacheKey;
use indexmap::IndexMap;

/// An ordered list of nodes, optionally carrying the page it was read from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    items: Vec<Node>,
    page: Option<PageInfo>,
}

/// Identity and pagination metadata of a collection page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    self_key: CacheKey,
    fields: IndexMap<String, Node>,
}

impl PageInfo {
    pub fn self_key(&self) -> &CacheKey {
        &self.self_key
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Collection {
    /// A fully enumerated collection with no pagination.
    pub fn from_array(items: Vec<Node>) -> Self {
        Self { items, page: None }
    }

    /// One page of a paginated collection.
    ///
    /// `page` holds the normalized page document without its items; every
    /// remaining field (counts, `next`/`prev` accessors) is kept as metadata.
    pub fn from_page(page: Resource, items: Vec<Node>) -> Self {
        let (self_key, fields) = page.into_parts();
        Self {
            items,
            page: Some(PageInfo { self_key, fields }),
        }
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    /// Accessors among the items, skipping plain values.
    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.items.iter().filter_map(Node::as_link)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> Option<&PageInfo> {
        self.page.as_ref()
    }

    pub fn is_page(&self) -> bool {
        self.page.is_some()
    }

    pub fn self_key(&self) -> Option<&CacheKey> {
        self.page.as_ref().map(|p| &p.self_key)
    }

    /// A pagination field of the page, if this is one.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.page.as_ref().and_then(|p| p.fields.get(name))
    }

    pub fn next(&self) -> Option<&Accessor> {
        self.field(NEXT_REL).and_then(Node::as_link)
    }

    pub fn prev(&self) -> Option<&Accessor> {
        self.field(PREV_REL).and_then(Node::as_link)
    }

    pub fn has_next(&self) -> bool {
        self.next().is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev().is_some()
    }

    /// Total item count across all pages, when the API reports it.
    pub fn total_items(&self) -> Option<u64> {
        self.field(TOTAL_ITEMS_KEY)
            .and_then(Node::as_value)
            .and_then(serde_json::Value::as_u64)
    }

    pub(crate) fn push(&mut self, item: Node) {
        self.items.push(item);
    }
}

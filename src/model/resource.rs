//! Resolved entities as stored in the cache.

use super::{Accessor, Collection, Node};
use crate::constants::ITEMS_KEY;
use crate::types::CacheKey;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A normalized single resource: its canonical key plus its decomposed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    self_key: CacheKey,
    fields: IndexMap<String, Node>,
}

impl Resource {
    pub fn new(self_key: CacheKey, fields: IndexMap<String, Node>) -> Self {
        Self { self_key, fields }
    }

    pub fn self_key(&self) -> &CacheKey {
        &self.self_key
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Node::as_value)
    }

    pub fn link(&self, name: &str) -> Option<&Accessor> {
        self.get(name).and_then(Node::as_link)
    }

    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.get(name)
            .and_then(Node::as_collection)
            .map(|c| c.get())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn into_parts(self) -> (CacheKey, IndexMap<String, Node>) {
        (self.self_key, self.fields)
    }
}

/// What a resolved cache entry holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Resource(Resource),
    /// A collection page; its items are the only growable sequence in the cache.
    Page(Collection),
}

impl Resolved {
    pub fn self_key(&self) -> Option<&CacheKey> {
        match self {
            Resolved::Resource(r) => Some(r.self_key()),
            Resolved::Page(c) => c.self_key(),
        }
    }

    /// A field by name. On pages, `items` is not a field; use [`Resolved::as_page`].
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self {
            Resolved::Resource(r) => r.get(name),
            Resolved::Page(c) => c.field(name),
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Node::as_value)
    }

    pub fn link(&self, name: &str) -> Option<&Accessor> {
        self.get(name).and_then(Node::as_link)
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Resolved::Resource(r) => Some(r),
            Resolved::Page(_) => None,
        }
    }

    pub fn as_page(&self) -> Option<&Collection> {
        match self {
            Resolved::Page(c) => Some(c),
            Resolved::Resource(_) => None,
        }
    }

    pub(crate) fn as_page_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Resolved::Page(c) => Some(c),
            Resolved::Resource(_) => None,
        }
    }

    /// JSON rendering without following edges, `self` first.
    pub fn to_shallow_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(key) = self.self_key() {
            out.insert("self".to_string(), Value::String(key.to_string()));
        }
        match self {
            Resolved::Resource(r) => {
                for (name, node) in r.fields() {
                    out.insert(name.to_string(), node.to_shallow_json());
                }
            }
            Resolved::Page(c) => {
                if let Some(page) = c.page() {
                    for (name, node) in page.fields() {
                        out.insert(name.to_string(), node.to_shallow_json());
                    }
                }
                out.insert(
                    ITEMS_KEY.to_string(),
                    Value::Array(c.items().iter().map(Node::to_shallow_json).collect()),
                );
            }
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn shallow_json_renders_links_as_hrefs() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Node::Value(json!("Summer camp")));
        fields.insert(
            "owner".to_string(),
            Node::Link(Accessor::new(CacheKey::from("/users/7"))),
        );
        let resolved = Resolved::Resource(Resource::new(CacheKey::from("/camps/1"), fields));

        assert_eq!(
            resolved.to_shallow_json(),
            json!({
                "self": "/camps/1",
                "name": "Summer camp",
                "owner": {"href": "/users/7"}
            })
        );
        assert_eq!(resolved.link("owner").map(|a| a.key().as_str()), Some("/users/7"));
        assert!(resolved.as_page().is_none());
    }
}

//! Structural view of a fetched hypermedia document.
//!
//! Every node of an incoming JSON body is classified exactly once, so the
//! normalizer matches over a closed set of shapes instead of probing properties.

use crate::constants::{EMBEDDED_KEY, ITEMS_KEY, LINKS_KEY};
use serde::Deserialize;
use serde_json::{Map, Value};

/// The shape of one node in a hypermedia document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// A leaf value or an object without hypermedia metadata.
    Plain(Value),
    /// A resource carrying `_links` (and possibly non-page `_embedded` relations).
    Linked(Map<String, Value>),
    /// An array of nodes, treated as a fully embedded collection.
    Sequence(Vec<Value>),
    /// One page of a paginated collection: `_links` plus an `_embedded.items` array.
    Page(Map<String, Value>),
}

impl DocumentShape {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => DocumentShape::Sequence(items),
            Value::Object(map) => {
                if !has_links(&map) {
                    DocumentShape::Plain(Value::Object(map))
                } else if is_page(&map) {
                    DocumentShape::Page(map)
                } else {
                    DocumentShape::Linked(map)
                }
            }
            other => DocumentShape::Plain(other),
        }
    }
}

fn is_page(map: &Map<String, Value>) -> bool {
    map.get(EMBEDDED_KEY)
        .and_then(|embedded| embedded.get(ITEMS_KEY))
        .is_some_and(Value::is_array)
}

/// Only link metadata makes an object a resource; `_embedded` alone does not.
fn has_links(map: &Map<String, Value>) -> bool {
    map.get(LINKS_KEY).is_some_and(Value::is_object)
}

/// A single HAL link object. Only `href` is interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub href: String,
}

/// The value of one relation under `_links`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LinkRelation {
    Single(Link),
    Many(Vec<Link>),
}

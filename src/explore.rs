// src/explore.rs
//! Depth-limited traversal of the cached graph, rendered back to JSON.
//!
//! Used by the binary to show what a URI resolves to. Links are followed
//! through the store up to the requested depth; deeper links, and links back
//! to a resource already on the current path, render as `{"href": key}`.

use crate::api::HalStore;
use crate::constants::ITEMS_KEY;
use crate::error::AppError;
use crate::model::{Node, Resolved};
use crate::types::CacheKey;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// A rendered graph and what it took to build it.
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    pub graph: Value,
    /// Resources rendered, the root included.
    pub resources: usize,
    /// Links that failed to resolve, with the reason.
    pub failures: Vec<(CacheKey, String)>,
}

#[derive(Default)]
struct Tally {
    resources: usize,
    failures: Vec<(CacheKey, String)>,
}

struct Walker<'a> {
    store: &'a HalStore,
    tally: Mutex<Tally>,
}

/// Resolves `uri` and renders it, following links `depth` levels deep.
///
/// Only a failure of the root itself is an error; failed links render inline
/// as `{"href": key, "error": reason}`.
pub async fn render_graph(
    store: &HalStore,
    uri: &str,
    depth: u8,
) -> Result<Exploration, Arc<AppError>> {
    let root = store.load(uri).await?;
    let walker = Walker {
        store,
        tally: Mutex::new(Tally::default()),
    };
    let graph = walker.render_resolved(&root, depth, im::HashSet::new()).await;
    let tally = walker.tally.into_inner();

    Ok(Exploration {
        graph,
        resources: tally.resources,
        failures: tally.failures,
    })
}

impl<'a> Walker<'a> {
    fn render_resolved<'b>(
        &'b self,
        resolved: &'b Resolved,
        depth: u8,
        path: im::HashSet<CacheKey>,
    ) -> BoxFuture<'b, Value> {
        async move {
            self.tally.lock().resources += 1;

            let mut path = path;
            let mut out = Map::new();
            if let Some(key) = resolved.self_key() {
                path.insert(key.clone());
                out.insert("self".to_string(), Value::String(key.to_string()));
            }

            match resolved {
                Resolved::Resource(resource) => {
                    for (name, node) in resource.fields() {
                        let value = self.render_node(node, depth, &path).await;
                        out.insert(name.to_string(), value);
                    }
                }
                Resolved::Page(collection) => {
                    if let Some(page) = collection.page() {
                        for (name, node) in page.fields() {
                            // Pagination links stay shallow; following them walks the whole list.
                            out.insert(name.to_string(), node.to_shallow_json());
                        }
                    }
                    let mut items = Vec::with_capacity(collection.len());
                    for node in collection.items() {
                        items.push(self.render_node(node, depth, &path).await);
                    }
                    out.insert(ITEMS_KEY.to_string(), Value::Array(items));
                }
            }

            Value::Object(out)
        }
        .boxed()
    }

    fn render_node<'b>(
        &'b self,
        node: &'b Node,
        depth: u8,
        path: &'b im::HashSet<CacheKey>,
    ) -> BoxFuture<'b, Value> {
        async move {
            match node {
                Node::Value(value) => value.clone(),
                Node::Link(accessor) => {
                    let key = accessor.key();
                    if depth == 0 || path.contains(key) {
                        return json!({ "href": key.as_str() });
                    }
                    match accessor.load(self.store).await {
                        Ok(target) => {
                            self.render_resolved(&target, depth - 1, path.clone())
                                .await
                        }
                        Err(e) => {
                            log::warn!("Could not resolve {}: {}", key, e);
                            self.tally
                                .lock()
                                .failures
                                .push((key.clone(), e.to_string()));
                            json!({ "href": key.as_str(), "error": e.to_string() })
                        }
                    }
                }
                Node::Collection(collection) => {
                    let collection = collection.get();
                    let mut items = Vec::with_capacity(collection.len());
                    for item in collection.items() {
                        items.push(self.render_node(item, depth, path).await);
                    }
                    Value::Array(items)
                }
            }
        }
        .boxed()
    }
}

// tests/common/mod.rs
//! Shared test helpers: fixtures and a scripted transport.

#![allow(dead_code)]

use halstore::{ApiRoot, AppError, FailurePolicy, HalStore, Transport};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const API_ROOT: &str = "http://api.test";

/// Loads `tests/fixtures/hal/<name>.json`.
pub fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/hal")
        .join(format!("{}.json", name));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("Fixture should be valid JSON")
}

enum Route {
    Body(Value),
    Status(StatusCode),
}

/// A [`Transport`] answering from a fixed route table and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    gated: AtomicBool,
    gate: Notify,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serves `body` for `path` under the API root.
    pub fn route(&self, path: &str, body: Value) {
        self.routes
            .lock()
            .insert(format!("{}{}", API_ROOT, path), Route::Body(body));
    }

    pub fn fail(&self, path: &str, status: u16) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.routes
            .lock()
            .insert(format!("{}{}", API_ROOT, path), Route::Status(status));
    }

    /// Holds every fetch until [`release`](Self::release) is called.
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Lets one held fetch proceed.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, uri: &str) -> Result<Value, AppError> {
        self.calls.lock().push(uri.to_string());
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        match self.routes.lock().get(uri) {
            Some(Route::Body(body)) => Ok(body.clone()),
            Some(Route::Status(status)) => Err(AppError::HttpStatus {
                uri: uri.to_string(),
                status: *status,
            }),
            None => Err(AppError::HttpStatus {
                uri: uri.to_string(),
                status: StatusCode::NOT_FOUND,
            }),
        }
    }
}

/// Routes every fixture under the path it describes.
pub fn camp_api() -> Arc<ScriptedTransport> {
    let transport = ScriptedTransport::new();
    transport.route("/", fixture("root"));
    transport.route("/camps", fixture("camps"));
    transport.route("/camps/1", fixture("camp_1"));
    transport.route("/users/1", fixture("user_1"));
    transport
}

pub fn store_with(transport: Arc<ScriptedTransport>, policy: FailurePolicy) -> HalStore {
    HalStore::builder(ApiRoot::new(API_ROOT).expect("valid root"))
        .failure_policy(policy)
        .transport(transport)
        .build()
        .expect("store should build inside a runtime")
}

// tests/store_resolution.rs
//! End-to-end resolution through the store with a scripted transport.

mod common;

use common::{camp_api, fixture, store_with, ScriptedTransport};
use halstore::{Accessor, AppError, CacheEvent, CacheKey, FailurePolicy, Node};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn concurrent_lookups_share_one_fetch() {
    let transport = camp_api();
    transport.hold();
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let first = store.api("/users/1");
    let second = store.api("http://api.test/users/1");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_loading());

    transport.release();
    let (a, b) = tokio::join!(first.loaded(), second.loaded());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(transport.calls(), vec!["http://api.test/users/1".to_string()]);

    let settled = store.api("/users/1");
    assert!(!settled.is_loading());
    assert_eq!(settled.resolved().and_then(|r| r.value("name")), Some(&json!("Ada")));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn resolved_entries_hand_out_what_the_cache_holds() {
    let store = store_with(camp_api(), FailurePolicy::Evict);

    let loaded = store.load("/users/1").await.unwrap();
    let entry = store.peek("/users/1").expect("cached after load");
    assert!(Arc::ptr_eq(entry.resolved().unwrap(), &loaded));
    assert_eq!(loaded.self_key(), Some(&CacheKey::from("/users/1")));

    let again = entry.loaded().await.unwrap();
    assert!(Arc::ptr_eq(&again, &loaded));
}

#[tokio::test]
async fn links_are_fetched_only_when_followed() {
    let transport = camp_api();
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let camp = store.load("/camps/1").await.unwrap();
    let leader = camp.link("leader").cloned().expect("leader link");
    assert_eq!(leader.key().as_str(), "/users/1");
    assert!(store.peek("/users/1").is_none());
    assert_eq!(transport.call_count(), 1);

    let user = leader.load(&store).await.unwrap();
    assert_eq!(user.value("name"), Some(&json!("Ada")));
    assert_eq!(
        transport.calls(),
        vec![
            "http://api.test/camps/1".to_string(),
            "http://api.test/users/1".to_string()
        ]
    );
}

#[tokio::test]
async fn embedded_resources_are_cached_without_a_fetch() {
    let transport = camp_api();
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let camp = store.load("/camps/1").await.unwrap();
    let location = camp.link("location").cloned().expect("embedded location");

    let entry = location.get(&store);
    assert!(!entry.is_loading());
    assert_eq!(entry.resolved().and_then(|r| r.value("city")), Some(&json!("Oslo")));
    assert_eq!(transport.call_count(), 1);

    let activities = camp
        .as_resource()
        .and_then(|r| r.collection("activities"))
        .expect("link array");
    assert_eq!(
        activities.accessors().map(|a| a.key().as_str()).collect::<Vec<_>>(),
        vec!["/activities/1", "/activities/2"]
    );
}

#[tokio::test]
async fn pages_resolve_to_collections_of_accessors() {
    let transport = camp_api();
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let resolved = store.load("/camps").await.unwrap();
    let page = resolved.as_page().expect("camps is a page");
    assert_eq!(
        page.accessors().map(|a| a.key().as_str()).collect::<Vec<_>>(),
        vec!["/camps/1", "/camps/2"]
    );
    assert_eq!(page.total_items(), Some(3));
    assert_eq!(page.next().map(|a| a.key().as_str()), Some("/camps?page=2"));
    assert!(!page.has_prev());

    let winter = store.api("/camps/2");
    assert_eq!(
        winter.resolved().and_then(|r| r.value("name")),
        Some(&json!("Winter Camp"))
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn the_root_document_is_keyed_as_slash() {
    let store = store_with(camp_api(), FailurePolicy::Evict);

    let root = store.root().loaded().await.unwrap();
    assert_eq!(root.self_key(), Some(&CacheKey::root()));
    assert_eq!(root.value("version"), Some(&json!("1.4.0")));
    assert_eq!(root.link("me").map(|a| a.key().as_str()), Some("/users/1"));
    assert!(Arc::ptr_eq(&store.api(""), &store.root()));
}

#[tokio::test]
async fn failed_fetches_are_evicted_by_default() {
    let transport = ScriptedTransport::new();
    transport.fail("/missing", 404);
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let err = store.load("/missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(store.peek("/missing").is_none());

    let err = store.load("/missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn retained_failures_stay_until_invalidated() {
    let transport = ScriptedTransport::new();
    transport.fail("/flaky", 503);
    let store = store_with(Arc::clone(&transport), FailurePolicy::Retain);

    assert!(store.load("/flaky").await.is_err());
    let stale = store.peek("/flaky").expect("failure retained");
    assert!(stale.is_loading());
    assert!(store.load("/flaky").await.is_err());
    assert_eq!(transport.call_count(), 1);

    transport.route("/flaky", json!({"_links": {"self": {"href": "/flaky"}}, "ok": true}));
    store.invalidate("/flaky");
    let recovered = store.load("/flaky").await.unwrap();
    assert_eq!(recovered.value("ok"), Some(&json!(true)));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn refresh_replaces_what_existing_accessors_see() {
    let transport = camp_api();
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let camp = store.load("/camps/1").await.unwrap();
    let leader = camp.link("leader").cloned().unwrap();
    leader.load(&store).await.unwrap();

    let mut renamed = fixture("user_1");
    renamed["name"] = json!("Ada Lovelace");
    transport.route("/users/1", renamed);

    let refreshed = store.refresh("/users/1").loaded().await.unwrap();
    assert_eq!(refreshed.value("name"), Some(&json!("Ada Lovelace")));

    let seen = leader.get(&store);
    assert_eq!(
        seen.resolved().and_then(|r| r.value("name")),
        Some(&json!("Ada Lovelace"))
    );
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn appending_requires_a_resolved_page() {
    let store = store_with(camp_api(), FailurePolicy::Evict);
    let item = Node::Link(Accessor::new(CacheKey::from("/camps/3")));

    let err = store.append_item("/camps", item.clone()).unwrap_err();
    assert!(matches!(err, AppError::CacheMisuse { .. }));

    store.load("/users/1").await.unwrap();
    let err = store.append_item("/users/1", item.clone()).unwrap_err();
    assert!(matches!(err, AppError::CacheMisuse { .. }));

    let before = store.load("/camps").await.unwrap();
    let mut events = store.subscribe();
    let entry = store.append_item("/camps", item).unwrap();

    let after = entry.resolved().and_then(|r| r.as_page()).unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(before.as_page().map(|p| p.len()), Some(2));
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::Appended(CacheKey::from("/camps"))
    );
    assert!(Arc::ptr_eq(&store.api("/camps"), &entry));
}

#[tokio::test]
async fn a_document_answering_with_another_self_is_cached_under_it() {
    let transport = camp_api();
    transport.route("/latest", fixture("camp_1"));
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let resolved = store.load("/latest").await.unwrap();
    assert_eq!(resolved.self_key(), Some(&CacheKey::from("/camps/1")));

    let canonical = store.peek("/camps/1").expect("stored under its self key");
    assert!(Arc::ptr_eq(canonical.resolved().unwrap(), &resolved));
    // Nothing under the requested key is left loading.
    assert!(store.peek("/latest").is_none());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn a_canonicalized_page_does_not_stay_loading() {
    let transport = camp_api();
    transport.route("/camps?page=1", fixture("camps"));
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let page = store.load("/camps?page=1").await.unwrap();
    assert_eq!(page.self_key(), Some(&CacheKey::from("/camps")));
    assert!(store.peek("/camps?page=1").is_none());

    let canonical = store.api("/camps");
    assert!(!canonical.is_loading());
    assert!(Arc::ptr_eq(canonical.resolved().unwrap(), &page));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn non_hypermedia_roots_are_rejected() {
    let transport = ScriptedTransport::new();
    transport.route("/plain", fixture("not_hal"));
    let store = store_with(Arc::clone(&transport), FailurePolicy::Evict);

    let err = store.load("/plain").await.unwrap_err();
    assert!(matches!(*err, AppError::MalformedDocument(_)));
    assert!(store.peek("/plain").is_none());
}

#[tokio::test]
async fn every_write_is_announced() {
    let store = store_with(camp_api(), FailurePolicy::Evict);
    let mut events = store.subscribe();

    store.load("/camps/1").await.unwrap();
    store.invalidate("/camps/1");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            CacheEvent::Placeholder(CacheKey::from("/camps/1")),
            CacheEvent::Resolved(CacheKey::from("/locations/9")),
            CacheEvent::Resolved(CacheKey::from("/camps/1")),
            CacheEvent::Evicted(CacheKey::from("/camps/1")),
        ]
    );
}

#![allow(clippy::unwrap_used)]
// Integration tests for `MacStore` against the in-memory CouchDB emulator.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::MockServer;

use macdb_api::mock::MockCouch;
use macdb_core::{CoreError, Lookup, MacRecord, MacStore, PutOutcome, Removal, RetryPolicy, StoreConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_retry(max_attempts: Option<u32>) -> RetryPolicy {
    RetryPolicy {
        delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_attempts,
        ..RetryPolicy::default()
    }
}

fn config_for(server: &MockServer, collection: &str) -> StoreConfig {
    let addr = server.address();
    StoreConfig::new(
        addr.ip().to_string(),
        addr.port(),
        "admin",
        SecretString::from("secret".to_string()),
    )
    .with_collection(collection)
    .with_retry(fast_retry(Some(5)))
    .with_timeout(Duration::from_secs(5))
}

async fn setup() -> (MockServer, MockCouch, MacStore) {
    let (server, couch) = MockCouch::start().await;
    let store = MacStore::connect(&config_for(&server, "test")).await.unwrap();
    (server, couch, store)
}

fn found(lookup: Lookup) -> MacRecord {
    match lookup {
        Lookup::Found(record) => record,
        other => panic!("expected a record, got {other:?}"),
    }
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_creates_missing_collection() {
    let (_server, couch, store) = setup().await;
    assert!(couch.has_database("test"));
    assert_eq!(store.collection(), "test");
    assert_eq!(store.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_connect_reuses_existing_collection() {
    let (server, couch) = MockCouch::start().await;
    couch.create_database("test");
    couch.insert("test", "AA", json!({ "MAC": "AA", "WE": "E", "code": "OTH", "info": "kept" }));

    let store = MacStore::connect(&config_for(&server, "test")).await.unwrap();
    assert_eq!(store.size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_connect_retries_until_server_answers() {
    let (server, couch) = MockCouch::start().await;
    couch.fail_probes(2);

    let store = MacStore::connect(&config_for(&server, "test")).await;
    assert!(store.is_ok());
    assert_eq!(couch.probe_count(), 3);
}

#[tokio::test]
async fn test_connect_gives_up_after_max_attempts() {
    let (server, couch) = MockCouch::start().await;
    couch.fail_probes(10);
    let config = config_for(&server, "test").with_retry(fast_retry(Some(3)));

    let err = MacStore::connect(&config).await.err().unwrap();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }), "got {err:?}");
    assert_eq!(couch.probe_count(), 3);
    assert!(!couch.has_database("test"));
}

#[tokio::test]
async fn test_connect_does_not_retry_rejected_credentials() {
    let (server, couch) = MockCouch::start().await;
    couch.reject_credentials();

    let err = MacStore::connect(&config_for(&server, "test")).await.err().unwrap();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "got {err:?}");
    assert_eq!(couch.probe_count(), 0);
}

#[tokio::test]
async fn test_connect_rejects_invalid_collection_name() {
    let (server, couch) = MockCouch::start().await;

    let err = MacStore::connect(&config_for(&server, "Bad Name")).await.err().unwrap();
    assert!(matches!(err, CoreError::InvalidCollectionName { .. }));
    assert_eq!(couch.probe_count(), 0);
}

// ── Single records ──────────────────────────────────────────────────

#[tokio::test]
async fn test_put_get_delete_lifecycle() {
    let (_server, _couch, store) = setup().await;
    let key = "00:00:00:00:00:00";

    let outcome = store.put(key, &MacRecord::new(key, "E", "OTH", "foo")).await.unwrap();
    assert_eq!(outcome, PutOutcome::Inserted);
    assert_eq!(store.size().await.unwrap(), 1);
    assert_eq!(found(store.get(key).await).info, "foo");

    let outcome = store.put(key, &MacRecord::new(key, "E", "OTH", "foo2")).await.unwrap();
    assert_eq!(outcome, PutOutcome::Updated);
    assert_eq!(store.size().await.unwrap(), 1);
    assert_eq!(found(store.get(key).await).info, "foo2");

    assert!(matches!(store.delete(key).await, Removal::Deleted));
    assert!(matches!(store.get(key).await, Lookup::NotFound));
    assert_eq!(store.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_keys_are_case_insensitive() {
    let (_server, couch, store) = setup().await;

    store
        .put("b8:27:eb:aa:bb:cc", &MacRecord::new("b8:27:eb:aa:bb:cc", "W", "RPi", "pi"))
        .await
        .unwrap();

    let stored = couch.document("test", "B8:27:EB:AA:BB:CC").unwrap();
    assert_eq!(stored["MAC"], "B8:27:EB:AA:BB:CC");
    assert!(store.get("B8:27:EB:AA:BB:CC").await.is_found());
    assert!(store.get("b8:27:eb:aa:bb:cc").await.is_found());
}

#[tokio::test]
async fn test_put_is_idempotent() {
    let (_server, _couch, store) = setup().await;
    let record = MacRecord::new("aa:bb", "W", "APL", "phone");

    store.put("aa:bb", &record).await.unwrap();
    let first = found(store.get("aa:bb").await);
    store.put("aa:bb", &record).await.unwrap();
    let second = found(store.get("aa:bb").await);

    assert!(first.same_fields(&second));
    assert_eq!(store.size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_keeps_revision_chain_and_extra_fields() {
    let (_server, couch, store) = setup().await;
    couch.insert(
        "test",
        "AA:BB",
        json!({ "MAC": "AA:BB", "WE": "E", "code": "OTH", "info": "old", "rack": 4 }),
    );

    store.put("aa:bb", &MacRecord::new("aa:bb", "W", "NVD", "new")).await.unwrap();

    let stored = couch.document("test", "AA:BB").unwrap();
    assert!(stored["_rev"].as_str().unwrap().starts_with("2-"));
    assert_eq!(stored["info"], "new");
    assert_eq!(stored["code"], "NVD");
    assert_eq!(stored["rack"], 4);
}

#[tokio::test]
async fn test_put_rejects_empty_key() {
    let (_server, _couch, store) = setup().await;
    let err = store.put("", &MacRecord::new("", "E", "OTH", "x")).await.unwrap_err();
    assert!(matches!(err, CoreError::EmptyKey));
}

#[tokio::test]
async fn test_missing_records() {
    let (_server, _couch, store) = setup().await;
    assert!(matches!(store.get("").await, Lookup::NotFound));
    assert!(matches!(store.get("FF:FF").await, Lookup::NotFound));
    assert!(matches!(store.delete("FF:FF").await, Removal::NotFound));
    assert!(!store.delete("FF:FF").await.into_result().unwrap());
}

#[tokio::test]
async fn test_lookup_after_collection_dropped_reads_as_absent() {
    let (server, couch, store) = setup().await;
    store.put("aa", &MacRecord::new("aa", "E", "OTH", "x")).await.unwrap();

    // Drop the collection behind the first store's back.
    let other = MacStore::connect(&config_for(&server, "test")).await.unwrap();
    other.terminate().await.unwrap();
    assert!(!couch.has_database("test"));

    assert!(store.get("aa").await.into_found().is_none());
}

#[tokio::test]
async fn test_dot_keys_are_ordinary_records() {
    let (_server, couch, store) = setup().await;

    for key in [".", ".."] {
        let outcome = store.put(key, &MacRecord::new(key, "E", "OTH", "dot")).await.unwrap();
        assert_eq!(outcome, PutOutcome::Inserted);
    }
    assert!(couch.document("test", ".").is_some());
    assert!(couch.document("test", "..").is_some());
    assert_eq!(found(store.get("..").await).info, "dot");

    let outcome = store.put(".", &MacRecord::new(".", "W", "RPi", "moved")).await.unwrap();
    assert_eq!(outcome, PutOutcome::Updated);
    let stored = couch.document("test", ".").unwrap();
    assert!(stored["_rev"].as_str().unwrap().starts_with("2-"));
    assert_eq!(stored["info"], "moved");

    let macs: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.mac).collect();
    assert_eq!(macs, vec![".", ".."]);

    assert!(matches!(store.delete(".").await, Removal::Deleted));
    assert!(matches!(store.get(".").await, Lookup::NotFound));
    assert_eq!(store.size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_reads_are_transient_and_put_still_writes() {
    let (_server, couch, store) = setup().await;
    couch.fail_document_reads();

    assert!(matches!(store.get("aa:01").await, Lookup::Transient(_)));

    let outcome = store.put("aa:01", &MacRecord::new("aa:01", "W", "RPi", "x")).await.unwrap();
    assert_eq!(outcome, PutOutcome::Inserted);
    assert_eq!(couch.document("test", "AA:01").unwrap()["info"], "x");

    assert!(matches!(store.delete("aa:01").await, Removal::Transient(_)));
    assert!(couch.document("test", "AA:01").is_some());
}

#[tokio::test]
async fn test_write_to_dropped_collection_names_the_collection() {
    let (server, _couch, store) = setup().await;
    let other = MacStore::connect(&config_for(&server, "test")).await.unwrap();
    other.terminate().await.unwrap();

    let err = store.put("aa", &MacRecord::new("aa", "E", "OTH", "x")).await.unwrap_err();
    assert!(matches!(err, CoreError::CollectionMissing { ref name } if name == "test"), "got {err:?}");
    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, CoreError::CollectionMissing { .. }), "got {err:?}");
}

// ── Whole collection ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_all_is_sorted_and_skips_foreign_documents() {
    let (_server, couch, store) = setup().await;
    for mac in ["cc:00", "aa:00", "bb:00"] {
        store.put(mac, &MacRecord::new(mac, "E", "OTH", mac)).await.unwrap();
    }
    couch.insert("test", "_design/views", json!({ "views": {} }));
    couch.insert("test", "note", json!({ "text": "not a record" }));

    let macs: Vec<String> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.mac)
        .collect();
    assert_eq!(macs, vec!["AA:00", "BB:00", "CC:00"]);
    assert_eq!(store.size().await.unwrap(), 3);
}

#[tokio::test]
async fn test_clean_empties_collection_but_keeps_design_documents() {
    let (_server, couch, store) = setup().await;
    for mac in ["aa", "bb", "cc"] {
        store.put(mac, &MacRecord::new(mac, "W", "RPi", "")).await.unwrap();
    }
    couch.insert("test", "_design/views", json!({ "views": {} }));

    assert_eq!(store.clean().await.unwrap(), 3);
    assert_eq!(store.size().await.unwrap(), 0);
    assert!(couch.document("test", "_design/views").is_some());
    assert!(couch.has_database("test"));

    assert_eq!(store.clean().await.unwrap(), 0);
}

#[tokio::test]
async fn test_terminate_drops_collection() {
    let (_server, couch, store) = setup().await;
    store.put("aa", &MacRecord::new("aa", "W", "RPi", "")).await.unwrap();

    store.terminate().await.unwrap();
    assert!(!couch.has_database("test"));
}

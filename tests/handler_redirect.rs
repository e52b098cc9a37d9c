mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::{CountingStore, Harness, InMemoryCache, record};
use redirect_cache::api::handlers::redirect_handler;
use redirect_cache::application::services::GuardSettings;
use redirect_cache::infrastructure::lock::LockService;
use std::sync::Arc;
use std::time::Duration;

fn server(h: &Harness) -> TestServer {
    let app = Router::new()
        .route("/{code}", get(redirect_handler))
        .with_state(h.state());

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_redirect_success() {
    let store = CountingStore::new();
    store.seed(record("abc123", "https://example.com/target"));
    let h = Harness::new(store, Arc::new(InMemoryCache::new()));
    let server = server(&h);

    let response = server.get("/abc123").await;

    assert_eq!(response.status_code(), 307);
    assert_eq!(response.header("location"), "https://example.com/target");

    let again = server.get("/abc123").await;
    assert_eq!(again.status_code(), 307);
    assert_eq!(h.store.queries(), 1);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let h = Harness::new(CountingStore::new(), Arc::new(InMemoryCache::new()));

    let response = server(&h).get("/notfound").await;

    response.assert_status_not_found();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_rejects_malformed_code() {
    let h = Harness::new(CountingStore::new(), Arc::new(InMemoryCache::new()));

    let response = server(&h).get("/ab-1").await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(h.store.queries(), 0);
}

#[tokio::test]
async fn test_store_failure_is_retryable() {
    let store = CountingStore::new();
    store.set_failing(true);
    let h = Harness::new(store, Arc::new(InMemoryCache::new()));

    let response = server(&h).get("/abc123").await;

    assert_eq!(response.status_code(), 503);
    assert_eq!(response.header("retry-after"), "1");
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "store_unavailable");
}

#[tokio::test]
async fn test_lock_timeout_is_retryable() {
    let settings = GuardSettings {
        wait: Duration::from_millis(50),
        lease: Duration::from_secs(10),
        poll_interval: Duration::from_millis(10),
        ..GuardSettings::default()
    };
    let h = Harness::with_settings(
        CountingStore::new(),
        Arc::new(InMemoryCache::new()),
        settings,
    );
    h.locks
        .try_lock(
            "busy1234",
            "other-instance",
            Duration::from_millis(10),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let response = server(&h).get("/busy1234").await;

    assert_eq!(response.status_code(), 503);
    assert_eq!(response.header("retry-after"), "1");
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "lock_timeout");
    assert_eq!(h.store.queries(), 0);
}

//! Integration tests for uploads and removals
//!
//! Verifies that the remote store reports success exactly for 2xx
//! responses and turns every other outcome into `false`.

use std::time::Duration;

use trackdav_core::ports::IRemoteStore;
use wiremock::{
    matchers::{body_bytes, header, method, path},
    Mock, ResponseTemplate,
};

use crate::common::{self, AUTH_HEADER, BASE_PATH};

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn test_upload_sends_body_and_returns_true() {
    let (server, store) = common::setup_store().await;
    let content = br#"{"latitude":48.85,"longitude":2.35}"#;

    Mock::given(method("PUT"))
        .and(path(format!("{BASE_PATH}/2026-03-01T10-00-00.000Z.json")))
        .and(header("authorization", AUTH_HEADER))
        .and(body_bytes(content.to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert!(store.upload("2026-03-01T10-00-00.000Z.json", content).await);
}

#[tokio::test]
async fn test_upload_overwrite_returns_true() {
    let (server, store) = common::setup_store().await;
    common::mount_put(&server, "same.json", 204).await;

    assert!(store.upload("same.json", b"{}").await);
    assert!(store.upload("same.json", b"{}").await);
}

#[tokio::test]
async fn test_upload_into_subfolder() {
    let (server, store) = common::setup_store().await;
    common::mount_put(&server, "2026/03/a.json", 201).await;

    assert!(store.upload("/2026/03/a.json", b"{}").await);
}

#[tokio::test]
async fn test_upload_failure_statuses_return_false() {
    for status in [401, 403, 404, 409, 500, 503] {
        let (server, store) = common::setup_store().await;
        common::mount_put(&server, "a.json", status).await;

        assert!(
            !store.upload("a.json", b"{}").await,
            "status {status} should fail"
        );
    }
}

#[tokio::test]
async fn test_upload_wrong_credentials_not_matched() {
    let (server, store) = common::setup_store().await;

    // Only accept a different user; the store's request falls through to 404
    Mock::given(method("PUT"))
        .and(header("authorization", "Basic b3RoZXI6b3RoZXI="))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    assert!(!store.upload("a.json", b"{}").await);
}

#[tokio::test]
async fn test_upload_times_out() {
    let (server, store) = common::setup_store_with_timeout(Duration::from_millis(200)).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    assert!(!store.upload("slow.json", b"{}").await);
}

#[tokio::test]
async fn test_upload_unreachable_server_returns_false() {
    let (server, store) = common::setup_store().await;
    drop(server);

    assert!(!store.upload("a.json", b"{}").await);
}

// ============================================================================
// Delete tests
// ============================================================================

#[tokio::test]
async fn test_delete_returns_true_on_204() {
    let (server, store) = common::setup_store().await;
    common::mount_delete(&server, "old.json", 204).await;

    assert!(store.delete("old.json").await);
}

#[tokio::test]
async fn test_delete_missing_returns_false() {
    let (server, store) = common::setup_store().await;
    common::mount_delete(&server, "gone.json", 404).await;

    assert!(!store.delete("gone.json").await);
}

//! Integration tests for folder listings
//!
//! Verifies the `PROPFIND` request shape and that listings are parsed,
//! stripped of the self-entry and sorted, with every failure collapsing to
//! an empty folder.

use trackdav_core::{
    domain::{RemoteElement, RemoteFolder},
    ports::IRemoteStore,
};
use trackdav_webdav::WebDavError;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common::{self, BASE_PATH};

#[tokio::test]
async fn test_load_folder_self_plus_three_children() {
    let (server, store) = common::setup_store().await;
    let body = common::multistatus(&[
        ("/dav/tracks/2026/", true),
        ("/dav/tracks/2026/zeta.json", false),
        ("/dav/tracks/2026/march/", true),
        ("/dav/tracks/2026/alpha.json", false),
    ]);
    common::mount_propfind(&server, &format!("{BASE_PATH}/2026/"), &body).await;

    let folder = store.load_folder("2026").await;

    assert_eq!(folder.path(), "2026/");
    assert_eq!(
        folder.elements(),
        &[
            RemoteElement::file("alpha.json"),
            RemoteElement::folder("march"),
            RemoteElement::file("zeta.json"),
        ]
    );
    assert_eq!(folder.files().count(), 2);
    assert_eq!(folder.folders().count(), 1);
}

#[tokio::test]
async fn test_load_root_folder_uses_trailing_separator() {
    let (server, store) = common::setup_store().await;
    let body = common::multistatus(&[("/dav/tracks/", true), ("/dav/tracks/a.json", false)]);
    common::mount_propfind(&server, &format!("{BASE_PATH}/"), &body).await;

    let folder = store.load_folder("/").await;

    assert_eq!(folder.path(), "/");
    assert_eq!(folder.elements(), &[RemoteElement::file("a.json")]);
}

#[tokio::test]
async fn test_load_folder_self_entry_listed_last() {
    let (server, store) = common::setup_store().await;
    let body = common::multistatus(&[
        ("/dav/tracks/2026/b.json", false),
        ("/dav/tracks/2026/a.json", false),
        ("/dav/tracks/2026/", true),
    ]);
    common::mount_propfind(&server, &format!("{BASE_PATH}/2026/"), &body).await;

    let folder = store.load_folder("2026").await;

    assert_eq!(
        folder.elements(),
        &[RemoteElement::file("a.json"), RemoteElement::file("b.json")]
    );
    assert_eq!(folder.folders().count(), 0);
}

#[tokio::test]
async fn test_load_empty_folder() {
    let (server, store) = common::setup_store().await;
    let body = common::multistatus(&[("/dav/tracks/empty/", true)]);
    common::mount_propfind(&server, &format!("{BASE_PATH}/empty/"), &body).await;

    let folder = store.load_folder("empty/").await;

    assert_eq!(folder.path(), "empty/");
    assert!(folder.is_empty());
}

#[tokio::test]
async fn test_load_folder_error_status_yields_empty() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("PROPFIND"))
        .and(path(format!("{BASE_PATH}/private/")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let folder = store.load_folder("private").await;

    assert_eq!(folder, RemoteFolder::empty());
    assert_eq!(folder.path(), "");
}

#[tokio::test]
async fn test_load_folder_malformed_body_yields_empty() {
    let (server, store) = common::setup_store().await;
    common::mount_propfind(&server, &format!("{BASE_PATH}/broken/"), "<html><body>login").await;

    let folder = store.load_folder("broken").await;

    assert_eq!(folder, RemoteFolder::empty());
}

#[tokio::test]
async fn test_client_propfind_error_is_typed() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = store.client().list_folder("x").await.unwrap_err();
    assert!(matches!(err, WebDavError::Unauthorized(_)));
}

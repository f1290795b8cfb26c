//! Shared test helpers for WebDAV integration tests
//!
//! Each helper mounts the necessary mock endpoints on a wiremock server.
//! All clients built here share the same base path and credentials.

use std::time::Duration;

use trackdav_core::domain::ServerConfig;
use trackdav_webdav::{client::WebDavClient, provider::WebDavRemoteStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base path every test store is rooted at
pub const BASE_PATH: &str = "/dav/tracks";

/// `Basic base64("walker:hunter2")`
pub const AUTH_HEADER: &str = "Basic d2Fsa2VyOmh1bnRlcjI=";

/// Server configuration pointing at the mock server
pub fn server_config(server: &MockServer) -> ServerConfig {
    ServerConfig::new(server.uri(), BASE_PATH, "walker", "hunter2")
        .expect("mock server config is complete")
}

/// Starts a mock server and returns it with a store pointing at it
pub async fn setup_store() -> (MockServer, WebDavRemoteStore) {
    setup_store_with_timeout(Duration::from_secs(5)).await
}

/// Same as [`setup_store`] with a custom request deadline
pub async fn setup_store_with_timeout(timeout: Duration) -> (MockServer, WebDavRemoteStore) {
    let server = MockServer::start().await;
    let client = WebDavClient::with_timeout(&server_config(&server), timeout)
        .expect("client for mock server");
    (server, WebDavRemoteStore::new(client))
}

/// Mounts a `PUT` on `file` answered with `status`
pub async fn mount_put(server: &MockServer, file: &str, status: u16) {
    Mock::given(method("PUT"))
        .and(path(format!("{BASE_PATH}/{file}")))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a `DELETE` on `file` answered with `status`
pub async fn mount_delete(server: &MockServer, file: &str, status: u16) {
    Mock::given(method("DELETE"))
        .and(path(format!("{BASE_PATH}/{file}")))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a depth-1 `PROPFIND` on `folder` (with trailing `/`) returning `body`
pub async fn mount_propfind(server: &MockServer, folder: &str, body: &str) {
    Mock::given(method("PROPFIND"))
        .and(path(folder.to_string()))
        .and(header("depth", "1"))
        .and(header("accept", "text/xml"))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(
            ResponseTemplate::new(207)
                .insert_header("content-type", "application/xml; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Builds a multistatus document from `(href, is_collection)` pairs
pub fn multistatus(entries: &[(&str, bool)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?><d:multistatus xmlns:d="DAV:">"#,
    );
    for (href, is_collection) in entries {
        body.push_str(&format!(
            "<d:response><d:href>{href}</d:href><d:propstat><d:prop>\
             <d:iscollection>{is_collection}</d:iscollection>\
             </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"
        ));
    }
    body.push_str("</d:multistatus>");
    body
}

//! Integration tests for trackdav-webdav
//!
//! Uses wiremock to simulate a WebDAV server and verifies end-to-end
//! behavior of the client and the remote store adapter: uploads, removals
//! and folder listings.

mod common;

mod test_propfind;
mod test_upload_delete;

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use vaurms_core::auth::{CredentialStore, MemoryStorage};
use vaurms_core::{ApiClient, ClientConfig};
use wiremock::{MockServer, Request};

/// A client pointed at `<server>/api` with an in-memory credential store and
/// downloads going to a fresh temporary directory.
pub fn client_for(server: &MockServer) -> (ApiClient, TempDir) {
    let downloads = tempfile::tempdir().expect("create download dir");
    let config = ClientConfig {
        base_url: format!("{}/api", server.uri()),
        download_dir: Some(downloads.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let credentials = Arc::new(CredentialStore::open(MemoryStorage::new()));
    let client = ApiClient::new(&config, credentials).expect("build client");
    (client, downloads)
}

/// A client whose API root nothing listens on.
pub fn unreachable_client() -> ApiClient {
    let config = ClientConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        ..ClientConfig::default()
    };
    let credentials = Arc::new(CredentialStore::open(MemoryStorage::new()));
    ApiClient::new(&config, credentials).expect("build client")
}

pub async fn only_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.expect("request recording enabled");
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

pub fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

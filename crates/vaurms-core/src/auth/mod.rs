//! Authentication state for the API client.
//!
//! This module provides:
//! - `CredentialStore`: the single live bearer token, shared by every request
//! - `DurableStorage` backends: OS keychain, JSON file, or memory
//!
//! The store is a pure state holder. Login, refresh and logout flows live in
//! `api::auth` and write to it through `CredentialStore::set`.

pub mod credentials;
pub mod storage;

pub use credentials::CredentialStore;
pub use storage::{DurableStorage, FileStorage, KeyringStorage, MemoryStorage, StorageError};

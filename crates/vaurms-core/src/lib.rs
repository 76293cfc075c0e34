//! Core library for vaurms - the authenticated client of the VAURMS
//! dashboard API.
//!
//! - `auth`: the shared `CredentialStore` and its durable backends
//! - `api`: the `ApiClient` request engine, upload/download, endpoint wrappers
//! - `models`: typed API responses
//! - `config`: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ClientConfig, FailureKind, Outcome, RequestOptions, SessionEvent};
pub use auth::{CredentialStore, DurableStorage};
pub use config::{Config, CredentialBackend};

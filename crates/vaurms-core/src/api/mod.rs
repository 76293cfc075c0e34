//! REST API client module for the VAURMS backend.
//!
//! This module provides the `ApiClient` request engine and the typed
//! endpoint wrappers built on it. All requests authenticate with the bearer
//! token held by the shared `CredentialStore`; a 401 clears it and raises a
//! `SessionEvent`.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod client;
pub mod datasets;
pub mod download;
pub mod error;
pub mod forecast;
pub mod rates;
pub mod reports;

pub use client::{
    append_query, ApiClient, ClientConfig, Outcome, RequestOptions, SessionEvent, NO_PARAMS,
};
pub use download::{DirectorySink, DownloadSink};
pub use error::{ApiError, FailureKind};

//! HTTP client adapter and action layer for the upstream commerce API.
//!
//! [`HttpClient`] sends exactly one request per call, attaches the session
//! token and enforces a per-request timeout; it never retries. [`Actions`]
//! validates inputs, issues the request and classifies the response into a
//! [`ReconciliationResult`](storefront_core::outcome::ReconciliationResult).

pub mod actions;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod validate;

pub use actions::Actions;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::HttpClient;

//! Error type for `storefront-client`.

use std::time::Duration;

use storefront_core::{intent::MutationKind, outcome::ReconciliationResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The upstream did not answer within the request's time budget.
  #[error("request timed out after {0:?}")]
  Timeout(Duration),

  /// The transport failed before a response arrived.
  #[error("network error: {0}")]
  Network(#[source] reqwest::Error),

  /// The request could not be built (bad base URL, bad header value...).
  #[error("invalid request: {0}")]
  Request(#[source] reqwest::Error),

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  /// A read endpoint answered with something other than success.
  #[error("upstream rejected the request: {0}")]
  Upstream(ReconciliationResult),

  #[error("no route for {kind} on {resource}")]
  Unroutable { resource: String, kind: MutationKind },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("core error: {0}")]
  Core(#[from] storefront_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Classification of an upstream call into a [`ReconciliationResult`].

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// A required input failed local validation; no request was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
  pub field:   String,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

/// What the upstream said about a mutation, reduced to the cases the
/// controller reconciles.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationResult {
  /// 2xx with a success marker. Carries the full response body.
  Success(Value),
  /// 409, or a message saying the resource already exists.
  AlreadyExists,
  /// 401 / 403.
  Unauthenticated,
  /// 5xx.
  ServerError,
  /// The transport failed before any response arrived.
  NetworkError,
  /// The request was aborted after exceeding its time budget.
  Timeout,
  /// Anything structurally unexpected; carries the upstream message if any.
  UnknownFailure(Option<String>),
  /// Rejected locally before reaching the network.
  Invalid(ValidationError),
}

impl ReconciliationResult {
  pub fn is_success(&self) -> bool { matches!(self, Self::Success(_)) }

  /// Whether a failed mutation is worth persisting for a later replay.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      Self::ServerError | Self::NetworkError | Self::Timeout | Self::UnknownFailure(_)
    )
  }

  /// Short machine-friendly name used in logs.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Success(_) => "success",
      Self::AlreadyExists => "already_exists",
      Self::Unauthenticated => "unauthenticated",
      Self::ServerError => "server_error",
      Self::NetworkError => "network_error",
      Self::Timeout => "timeout",
      Self::UnknownFailure(_) => "unknown_failure",
      Self::Invalid(_) => "invalid",
    }
  }
}

impl fmt::Display for ReconciliationResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnknownFailure(Some(msg)) => write!(f, "unknown_failure: {msg}"),
      Self::Invalid(e) => write!(f, "invalid: {e}"),
      other => f.write_str(other.label()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retryable_classes() {
    assert!(ReconciliationResult::ServerError.is_retryable());
    assert!(ReconciliationResult::NetworkError.is_retryable());
    assert!(ReconciliationResult::Timeout.is_retryable());
    assert!(ReconciliationResult::UnknownFailure(None).is_retryable());

    assert!(!ReconciliationResult::Unauthenticated.is_retryable());
    assert!(!ReconciliationResult::AlreadyExists.is_retryable());
    assert!(!ReconciliationResult::Success(Value::Null).is_retryable());
    assert!(
      !ReconciliationResult::Invalid(ValidationError::new("email", "required")).is_retryable()
    );
  }

  #[test]
  fn display_includes_detail() {
    let r = ReconciliationResult::UnknownFailure(Some("bad shape".into()));
    assert_eq!(r.to_string(), "unknown_failure: bad shape");
    let r = ReconciliationResult::Invalid(ValidationError::new("quantity", "must be at least 1"));
    assert_eq!(r.to_string(), "invalid: quantity: must be at least 1");
  }
}

//! Response classification.
//!
//! | Response | Result |
//! |----------|--------|
//! | 2xx with a success marker | `Success(body)` |
//! | 409, or a message saying "already" / "exist" | `AlreadyExists` |
//! | 401, 403 | `Unauthenticated` |
//! | 5xx | `ServerError` |
//! | transport timeout | `Timeout` |
//! | transport failure | `NetworkError` |
//! | anything else | `UnknownFailure(message)` |

use reqwest::StatusCode;
use serde_json::Value;
use storefront_core::outcome::ReconciliationResult;

use crate::{Error, Result, http::RawResponse};

/// Classify a response that did arrive.
pub fn classify(resp: &RawResponse) -> ReconciliationResult {
  let status = resp.status;
  let message = resp.body.as_ref().and_then(message_of);

  if status.is_success() {
    return match &resp.body {
      Some(body) if has_success_marker(body) => ReconciliationResult::Success(body.clone()),
      Some(_) if message.as_deref().is_some_and(mentions_existing) => {
        ReconciliationResult::AlreadyExists
      }
      Some(_) => ReconciliationResult::UnknownFailure(message),
      None => ReconciliationResult::UnknownFailure(Some(format!("{status} with no JSON body"))),
    };
  }

  if status == StatusCode::CONFLICT {
    return ReconciliationResult::AlreadyExists;
  }
  if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
    return ReconciliationResult::Unauthenticated;
  }
  if status.is_server_error() {
    return ReconciliationResult::ServerError;
  }
  if message.as_deref().is_some_and(mentions_existing) {
    return ReconciliationResult::AlreadyExists;
  }
  ReconciliationResult::UnknownFailure(message)
}

/// Classify the outcome of [`HttpClient::send`](crate::HttpClient::send).
///
/// Transport timeouts and failures become results; anything else (a request
/// that could not even be built) is returned as an error.
pub fn classify_sent(sent: Result<RawResponse>) -> Result<ReconciliationResult> {
  match sent {
    Ok(resp) => Ok(classify(&resp)),
    Err(Error::Timeout(_)) => Ok(ReconciliationResult::Timeout),
    Err(Error::Network(e)) => {
      tracing::debug!(error = %e, "transport failure");
      Ok(ReconciliationResult::NetworkError)
    }
    Err(other) => Err(other),
  }
}

fn has_success_marker(body: &Value) -> bool {
  if body.get("success").and_then(Value::as_bool) == Some(true) {
    return true;
  }
  if let Some(status) = body.get("status") {
    if status.as_bool() == Some(true) {
      return true;
    }
    if let Some(s) = status.as_str()
      && matches!(s.to_ascii_lowercase().as_str(), "success" | "ok")
    {
      return true;
    }
  }
  body
    .get("message")
    .and_then(Value::as_str)
    .is_some_and(|m| m.to_ascii_lowercase().contains("success"))
}

/// The human message of a body, from `message`, `error` or `errors.msg`.
fn message_of(body: &Value) -> Option<String> {
  body
    .get("message")
    .or_else(|| body.get("error"))
    .or_else(|| body.get("errors").and_then(|e| e.get("msg")))
    .and_then(Value::as_str)
    .map(str::to_owned)
}

/// "already in wishlist", "user already exists", "email exists", but not
/// "product does not exist".
fn mentions_existing(message: &str) -> bool {
  let m = message.to_ascii_lowercase();
  if m.contains("already") {
    return true;
  }
  m.contains("exist") && !m.contains("not exist") && !m.contains("n't exist")
}

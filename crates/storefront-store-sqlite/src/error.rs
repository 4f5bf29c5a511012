//! Error type for `storefront-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] storefront_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The stored record's key disagrees with the resource id of its intent.
  #[error("record key {key} does not match intent resource {intent}")]
  KeyMismatch { key: String, intent: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

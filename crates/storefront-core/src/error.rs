//! Error types for `storefront-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid resource id: {0:?}")]
  InvalidResourceId(String),

  #[error("unknown mutation kind: {0:?}")]
  UnknownMutationKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

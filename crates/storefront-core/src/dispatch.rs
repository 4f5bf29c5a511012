//! The seam between the optimistic controller and the action layer.

use std::future::Future;

use crate::{intent::MutationIntent, outcome::ReconciliationResult};

/// Performs the upstream call for a [`MutationIntent`] and classifies the
/// response.
///
/// Expected failures (auth, conflicts, 5xx, transport) come back as
/// [`ReconciliationResult`] values. `Err` is reserved for conditions the
/// dispatcher could not anticipate, such as an intent for a resource it does
/// not know how to route.
pub trait Dispatch: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn dispatch(
    &self,
    intent: MutationIntent,
  ) -> impl Future<Output = Result<ReconciliationResult, Self::Error>> + Send + '_;
}

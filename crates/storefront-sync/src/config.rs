//! Timing and expiry knobs for the protocol.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SyncConfig {
  /// How long a mutation may stay `Pending` before it is rolled back as a
  /// timeout.
  pub mutation_timeout: Duration,
  /// Retry records older than this are discarded instead of replayed.
  pub retry_ttl:        chrono::Duration,
  /// Automatic replays allowed per record before it is discarded.
  pub max_replays:      u32,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      mutation_timeout: Duration::from_secs(15),
      retry_ttl:        chrono::Duration::hours(24),
      max_replays:      5,
    }
  }
}

//! Connection settings for the upstream API.

use std::time::Duration;

/// Which time budget a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
  /// Reads and simple writes (cart, wishlist, profile, addresses, orders).
  Standard,
  /// Sign-in, sign-up and password changes.
  Auth,
  /// The forgot/verify/reset password steps.
  Reset,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Root of the API, e.g. `https://ecommerce.routemisr.com/api/v1`.
  pub base_url:      String,
  pub read_timeout:  Duration,
  pub auth_timeout:  Duration,
  pub reset_timeout: Duration,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url:      base_url.into(),
      read_timeout:  Duration::from_secs(10),
      auth_timeout:  Duration::from_secs(20),
      reset_timeout: Duration::from_secs(15),
    }
  }

  pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
    match class {
      TimeoutClass::Standard => self.read_timeout,
      TimeoutClass::Auth => self.auth_timeout,
      TimeoutClass::Reset => self.reset_timeout,
    }
  }
}

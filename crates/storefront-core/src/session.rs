//! The session/auth capability the protocol needs from its host.

use crate::intent::MutationIntent;

/// Supplies the bearer token and handles the hand-off to the login page.
pub trait SessionProvider: Send + Sync {
  /// The current session token, or `None` when signed out.
  fn token(&self) -> Option<String>;

  /// Send the user to the login entry point. `intent` is handed back to
  /// the controller after a successful sign-in so it can be resumed.
  fn redirect_to_login(&self, return_path: &str, intent: &MutationIntent);
}

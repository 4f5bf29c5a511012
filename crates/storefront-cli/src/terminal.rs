//! Terminal-side implementations of the notifier and session seams.

use storefront_core::{
  intent::MutationIntent,
  notify::{Notification, NotificationKind, Notifier},
  session::SessionProvider,
};

/// Prints notifications to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
  fn notify(&self, notification: Notification) {
    let mark = match notification.kind {
      NotificationKind::Success => "✓",
      NotificationKind::Error => "✗",
      NotificationKind::Info => "•",
    };
    tracing::debug!(kind = ?notification.kind, resource = ?notification.resource_id, "notification");
    if notification.retryable {
      eprintln!("{mark} {} (run `storefront retry` to try again)", notification.message);
    } else {
      eprintln!("{mark} {}", notification.message);
    }
  }
}

/// A session backed by a configured token. There is no login page to send
/// the user to, so a redirect prints how to sign in instead.
pub struct ConfiguredSession {
  token: Option<String>,
}

impl ConfiguredSession {
  pub fn new(token: Option<String>) -> Self { Self { token } }
}

impl SessionProvider for ConfiguredSession {
  fn token(&self) -> Option<String> { self.token.clone() }

  fn redirect_to_login(&self, return_path: &str, intent: &MutationIntent) {
    tracing::info!(%return_path, intent_id = %intent.intent_id(), "sign-in required");
    eprintln!(
      "  sign in with `storefront login`, set STOREFRONT_TOKEN, then repeat the {} {} change",
      intent.kind(),
      intent.resource_id()
    );
  }
}

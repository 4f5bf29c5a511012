//! User-facing notifications (toasts) and the [`Notifier`] sink.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::intent::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  Success,
  Error,
  Info,
}

/// One message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub kind:        NotificationKind,
  pub message:     String,
  /// The resource the message is about, if any. Connectivity changes have
  /// none.
  pub resource_id: Option<ResourceId>,
  /// Whether the surface should offer a manual retry.
  pub retryable:   bool,
}

impl Notification {
  fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into(), resource_id: None, retryable: false }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self::new(NotificationKind::Success, message)
  }

  pub fn error(message: impl Into<String>) -> Self { Self::new(NotificationKind::Error, message) }

  pub fn info(message: impl Into<String>) -> Self { Self::new(NotificationKind::Info, message) }

  pub fn about(mut self, resource_id: &ResourceId) -> Self {
    self.resource_id = Some(resource_id.clone());
    self
  }

  pub fn with_retry(mut self) -> Self {
    self.retryable = true;
    self
  }
}

/// A toast/alert mechanism.
pub trait Notifier: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// A [`Notifier`] that keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct NotificationLog {
  entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
  pub fn new() -> Self { Self::default() }

  /// A snapshot of everything notified so far.
  pub fn entries(&self) -> Vec<Notification> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Drain the log.
  pub fn take(&self) -> Vec<Notification> {
    std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
  }
}

impl Notifier for NotificationLog {
  fn notify(&self, notification: Notification) {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(notification);
  }
}

//! Notification texts.

use storefront_core::{
  intent::{MutationIntent, MutationKind},
  notify::Notification,
  outcome::ValidationError,
  state::ResourceState,
};

pub fn confirmed<S: ResourceState>(intent: &MutationIntent) -> Notification {
  Notification::success(match intent.kind() {
    MutationKind::Add => format!("Added to your {}", S::LABEL),
    MutationKind::Remove => format!("Removed from your {}", S::LABEL),
    MutationKind::Update => format!("Your {} was updated", S::LABEL),
  })
}

/// The duplicate guard fired: nothing to send.
pub fn unchanged<S: ResourceState>(intent: &MutationIntent) -> Notification {
  Notification::info(match intent.kind() {
    MutationKind::Add => format!("Already in your {}", S::LABEL),
    MutationKind::Remove => format!("Not in your {}", S::LABEL),
    MutationKind::Update => "No changes to save".to_owned(),
  })
}

pub fn already_exists<S: ResourceState>() -> Notification {
  Notification::info(format!("Already in your {}", S::LABEL))
}

pub fn sign_in_required() -> Notification { Notification::error("Please sign in to continue") }

pub fn server_error() -> Notification {
  Notification::error("Something went wrong on our side. Please try again.").with_retry()
}

pub fn network_error() -> Notification {
  Notification::error("Network error. Check your connection and try again.").with_retry()
}

pub fn timed_out() -> Notification {
  Notification::error("This is taking too long. Please try again.").with_retry()
}

pub fn unknown_failure(message: Option<&str>) -> Notification {
  let text = message
    .filter(|m| !m.trim().is_empty())
    .unwrap_or("Something went wrong. Please try again.");
  Notification::error(text).with_retry()
}

pub fn invalid(error: &ValidationError) -> Notification { Notification::error(error.to_string()) }

pub fn offline_blocked() -> Notification {
  Notification::error("You are offline. Reconnect to make changes.")
}

pub fn went_offline() -> Notification { Notification::info("You are offline") }

pub fn back_online() -> Notification { Notification::success("You are back online") }

//! The process-wide online/offline signal.
//!
//! Backed by a [`tokio::sync::watch`] channel: every synchronizer checks
//! [`Connectivity::is_online`] before leaving `Idle`, and reconnect listeners
//! subscribe to transitions. There is no polling; the host feeds platform
//! connectivity events in through [`Connectivity::set_online`]. Dropping the
//! monitor ends every listener.

use std::sync::Arc;

use storefront_core::notify::Notifier;
use tokio::sync::watch;

use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  BecameOnline,
  BecameOffline,
}

pub struct Connectivity {
  tx:       watch::Sender<bool>,
  notifier: Arc<dyn Notifier>,
}

impl Connectivity {
  /// A monitor that assumes the platform is online.
  pub fn new(notifier: Arc<dyn Notifier>) -> Self { Self::with_initial(true, notifier) }

  /// A monitor initialised from the platform's current state.
  pub fn with_initial(online: bool, notifier: Arc<dyn Notifier>) -> Self {
    let (tx, _rx) = watch::channel(online);
    Self { tx, notifier }
  }

  pub fn is_online(&self) -> bool { *self.tx.borrow() }

  pub fn subscribe(&self) -> watch::Receiver<bool> { self.tx.subscribe() }

  /// Record a platform connectivity event. Returns the transition it caused,
  /// or `None` when the state did not change.
  pub fn set_online(&self, online: bool) -> Option<Transition> {
    let changed = self.tx.send_if_modified(|current| {
      if *current == online {
        return false;
      }
      *current = online;
      true
    });
    if !changed {
      return None;
    }

    if online {
      tracing::info!("connectivity restored");
      self.notifier.notify(messages::back_online());
      Some(Transition::BecameOnline)
    } else {
      tracing::warn!("connectivity lost");
      self.notifier.notify(messages::went_offline());
      Some(Transition::BecameOffline)
    }
  }
}

//! The per-resource optimistic state machine.
//!
//! A [`Controller`] performs no IO. [`Controller::begin`] applies the
//! optimistic change and hands out a [`Ticket`]; [`Controller::settle`]
//! reconciles the upstream's answer for that ticket and returns the
//! [`Effect`]s the caller must carry out. State is always rolled back or
//! confirmed *before* the effects are returned, so the notification a user
//! sees never disagrees with what the control shows.

use storefront_core::{
  intent::{MutationIntent, ResourceId},
  notify::Notification,
  outcome::ReconciliationResult,
  state::ResourceState,
};

use crate::messages;

// ─── Phase ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Nothing in flight; the speculative state equals the last confirmed one.
  Idle,
  /// A mutation is in flight. The control must be disabled.
  Pending,
  /// The last mutation failed in a retryable way and was rolled back.
  AwaitingRetry,
}

/// Identifies one in-flight mutation. Settling with an old ticket is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Why [`Controller::begin`] declined an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
  /// A mutation for this resource is already in flight.
  InFlight,
  /// The resource is already in the state the intent asks for.
  AlreadyInState,
}

/// Something the caller must do after a settlement.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  Notify(Notification),
  /// Persist a pending-retry record for this intent.
  WriteRetry(MutationIntent),
  /// Delete any pending-retry record for the resource.
  ClearRetry,
  /// Send the user to the login page, carrying the intent for resumption.
  RedirectToLogin(MutationIntent),
  /// Tell dependent views to reload.
  Refresh,
}

struct InFlight {
  ticket: Ticket,
  intent: MutationIntent,
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct Controller<S> {
  resource_id: ResourceId,
  confirmed:   S,
  speculative: S,
  phase:       Phase,
  in_flight:   Option<InFlight>,
  /// The intent behind the last retryable failure, for manual retry.
  failed:      Option<MutationIntent>,
  issued:      u64,
}

impl<S: ResourceState> Controller<S> {
  pub fn new(resource_id: ResourceId, state: S) -> Self {
    Self {
      resource_id,
      confirmed: state.clone(),
      speculative: state,
      phase: Phase::Idle,
      in_flight: None,
      failed: None,
      issued: 0,
    }
  }

  pub fn resource_id(&self) -> &ResourceId { &self.resource_id }

  pub fn phase(&self) -> Phase { self.phase }

  /// What the UI should show right now.
  pub fn speculative(&self) -> &S { &self.speculative }

  /// The last state the upstream agreed with.
  pub fn confirmed(&self) -> &S { &self.confirmed }

  pub fn failed_intent(&self) -> Option<&MutationIntent> { self.failed.as_ref() }

  /// Replace the baseline with freshly-loaded server state. Ignored while a
  /// mutation is in flight.
  pub fn rebase(&mut self, state: S) -> bool {
    if self.phase == Phase::Pending {
      return false;
    }
    self.confirmed = state.clone();
    self.speculative = state;
    true
  }

  /// Apply `intent` optimistically and move to [`Phase::Pending`].
  pub fn begin(&mut self, intent: MutationIntent) -> Result<Ticket, Refusal> {
    if self.phase == Phase::Pending {
      return Err(Refusal::InFlight);
    }
    if self.speculative.target(&intent) == self.speculative {
      return Err(Refusal::AlreadyInState);
    }
    Ok(self.launch(intent))
  }

  /// Like [`begin`](Self::begin) but without the duplicate guard, for
  /// replaying a persisted intent whose baseline is unknown.
  pub fn begin_replay(&mut self, intent: MutationIntent) -> Result<Ticket, Refusal> {
    if self.phase == Phase::Pending {
      return Err(Refusal::InFlight);
    }
    Ok(self.launch(intent))
  }

  fn launch(&mut self, intent: MutationIntent) -> Ticket {
    self.issued += 1;
    let ticket = Ticket(self.issued);
    self.speculative = self.speculative.target(&intent);
    self.phase = Phase::Pending;
    self.in_flight = Some(InFlight { ticket, intent });
    ticket
  }

  /// Reconcile the upstream's answer to `ticket`.
  ///
  /// Returns no effects when `ticket` is not the mutation currently in
  /// flight (it was already settled, e.g. by a timeout).
  pub fn settle(&mut self, ticket: Ticket, result: &ReconciliationResult) -> Vec<Effect> {
    let Some(InFlight { intent, .. }) = self.in_flight.take_if(|f| f.ticket == ticket) else {
      return Vec::new();
    };
    let id = self.resource_id.clone();

    match result {
      ReconciliationResult::Success(payload) => {
        self.confirmed = self.speculative.confirm(payload);
        self.speculative = self.confirmed.clone();
        self.phase = Phase::Idle;
        self.failed = None;
        vec![
          Effect::ClearRetry,
          Effect::Notify(messages::confirmed::<S>(&intent).about(&id)),
          Effect::Refresh,
        ]
      }

      ReconciliationResult::AlreadyExists => {
        self.confirmed = self.confirmed.present();
        self.speculative = self.confirmed.clone();
        self.phase = Phase::Idle;
        self.failed = None;
        vec![
          Effect::ClearRetry,
          Effect::Notify(messages::already_exists::<S>().about(&id)),
        ]
      }

      ReconciliationResult::Unauthenticated => {
        self.roll_back(Phase::Idle);
        vec![
          Effect::ClearRetry,
          Effect::Notify(messages::sign_in_required().about(&id)),
          Effect::RedirectToLogin(intent),
        ]
      }

      ReconciliationResult::Invalid(e) => {
        self.roll_back(Phase::Idle);
        vec![Effect::ClearRetry, Effect::Notify(messages::invalid(e).about(&id))]
      }

      ReconciliationResult::ServerError
      | ReconciliationResult::NetworkError
      | ReconciliationResult::Timeout
      | ReconciliationResult::UnknownFailure(_) => {
        self.roll_back(Phase::AwaitingRetry);
        self.failed = Some(intent.clone());
        let notice = match result {
          ReconciliationResult::NetworkError => messages::network_error(),
          ReconciliationResult::Timeout => messages::timed_out(),
          ReconciliationResult::UnknownFailure(msg) => messages::unknown_failure(msg.as_deref()),
          _ => messages::server_error(),
        };
        vec![Effect::WriteRetry(intent), Effect::Notify(notice.about(&id))]
      }
    }
  }

  fn roll_back(&mut self, phase: Phase) {
    self.speculative = self.confirmed.clone();
    self.phase = phase;
    if phase == Phase::Idle {
      self.failed = None;
    }
  }
}

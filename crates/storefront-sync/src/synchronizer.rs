//! [`Synchronizer`] drives one [`Controller`] per resource.
//!
//! The synchronizer owns the `resource id → controller` table for one kind of
//! resource state (wishlist membership, cart quantity, profile). It guards
//! triggers against offline mode, runs the dispatcher under the mutation
//! timeout, and carries out the effects each settlement produces.
//!
//! Locks on the controller table are only ever held between await points,
//! so one resource's pending mutation never blocks another resource.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use storefront_core::{
  dispatch::Dispatch,
  intent::{MutationIntent, ResourceId},
  notify::Notifier,
  outcome::ReconciliationResult,
  retry::{PendingRetryRecord, RetryStore},
  session::SessionProvider,
  state::ResourceState,
};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
  SyncConfig,
  connectivity::Connectivity,
  controller::{Controller, Effect, Phase, Refusal, Ticket},
  messages,
};

const REFRESH_CAPACITY: usize = 64;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What happened to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
  /// Offline: nothing changed and nothing was recorded.
  Blocked,
  /// A mutation for this resource was already in flight.
  Ignored,
  /// The resource was already in the requested state; no request was made.
  NoOp,
  /// A manual retry was asked for but nothing is waiting to be retried.
  NothingToRetry,
  /// The request ran and was reconciled.
  Settled(ReconciliationResult),
}

/// Counts from one [`Synchronizer::replay_pending`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
  /// Records whose intent was sent again.
  pub replayed:  usize,
  /// Of those, how many were confirmed (success or already-exists).
  pub confirmed: usize,
  /// Expired records deleted without being sent.
  pub discarded: usize,
  /// Records left alone because their resource was busy or offline.
  pub skipped:   usize,
}

// ─── Services ────────────────────────────────────────────────────────────────

/// The collaborators a [`Synchronizer`] works through.
pub struct Services<D, R> {
  pub dispatcher:   Arc<D>,
  pub retries:      Arc<R>,
  pub notifier:     Arc<dyn Notifier>,
  pub session:      Arc<dyn SessionProvider>,
  pub connectivity: Arc<Connectivity>,
}

impl<D, R> Clone for Services<D, R> {
  fn clone(&self) -> Self {
    Self {
      dispatcher:   Arc::clone(&self.dispatcher),
      retries:      Arc::clone(&self.retries),
      notifier:     Arc::clone(&self.notifier),
      session:      Arc::clone(&self.session),
      connectivity: Arc::clone(&self.connectivity),
    }
  }
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

pub struct Synchronizer<S, D, R> {
  services:    Services<D, R>,
  config:      SyncConfig,
  controllers: Mutex<HashMap<ResourceId, Controller<S>>>,
  refresh:     broadcast::Sender<ResourceId>,
}

impl<S, D, R> Synchronizer<S, D, R>
where
  S: ResourceState + Default,
  D: Dispatch,
  R: RetryStore,
{
  pub fn new(services: Services<D, R>, config: SyncConfig) -> Self {
    let (refresh, _) = broadcast::channel(REFRESH_CAPACITY);
    Self {
      services,
      config,
      controllers: Mutex::new(HashMap::new()),
      refresh,
    }
  }

  fn table(&self) -> MutexGuard<'_, HashMap<ResourceId, Controller<S>>> {
    self.controllers.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Tracking ──────────────────────────────────────────────────────────────

  /// Start tracking `resource_id` with server-loaded `state`, or rebase an
  /// already-tracked resource onto it (ignored while a mutation is pending).
  pub fn track(&self, resource_id: ResourceId, state: S) {
    let mut table = self.table();
    match table.get_mut(&resource_id) {
      Some(controller) => {
        controller.rebase(state);
      }
      None => {
        table.insert(resource_id.clone(), Controller::new(resource_id, state));
      }
    }
  }

  /// Stop tracking `resource_id`, e.g. when its view is torn down.
  ///
  /// Refused while a mutation is pending: the controller has to stay until
  /// it settles so the outcome is still notified and recorded. Returns
  /// whether the resource was removed.
  pub fn untrack(&self, resource_id: &ResourceId) -> bool {
    let mut table = self.table();
    match table.get(resource_id).map(Controller::phase) {
      Some(Phase::Pending) => {
        tracing::debug!(resource = %resource_id, "not untracking while a mutation is pending");
        false
      }
      Some(_) => table.remove(resource_id).is_some(),
      None => false,
    }
  }

  pub fn phase(&self, resource_id: &ResourceId) -> Option<Phase> {
    self.table().get(resource_id).map(Controller::phase)
  }

  /// The state a view should render for `resource_id`.
  pub fn state(&self, resource_id: &ResourceId) -> Option<S> {
    self.table().get(resource_id).map(|c| c.speculative().clone())
  }

  /// Receives the id of every resource whose mutation was confirmed.
  pub fn subscribe_refresh(&self) -> broadcast::Receiver<ResourceId> { self.refresh.subscribe() }

  // ── Triggers ──────────────────────────────────────────────────────────────

  /// Run a user-triggered mutation through the protocol.
  pub async fn trigger(&self, intent: MutationIntent) -> TriggerOutcome {
    self.run(intent, None, true).await
  }

  /// Resume an intent handed back by the login flow after a redirect.
  pub async fn resume(&self, intent: MutationIntent) -> TriggerOutcome {
    tracing::info!(resource = %intent.resource_id(), "resuming intent after sign-in");
    self.run(intent, None, true).await
  }

  /// Manually retry the last failed mutation for `resource_id`, falling back
  /// to a persisted retry record (e.g. after a restart).
  pub async fn retry(&self, resource_id: &ResourceId) -> TriggerOutcome {
    let (tracked, failed) = {
      let table = self.table();
      let controller = table.get(resource_id);
      (
        controller.is_some(),
        controller.and_then(|c| c.failed_intent().cloned()),
      )
    };

    if let Some(intent) = failed {
      return self.run(intent, None, true).await;
    }

    let record = match self.services.retries.get(resource_id.clone()).await {
      Ok(Some(record)) => record,
      Ok(None) => return TriggerOutcome::NothingToRetry,
      Err(e) => {
        tracing::error!(resource = %resource_id, error = %e, "failed to read retry record");
        return TriggerOutcome::NothingToRetry;
      }
    };

    // Without a loaded baseline the duplicate guard would compare against
    // `Default` and could drop an intent that was never applied.
    let outcome = self.run(record.intent.clone(), Some(&record), tracked).await;
    if outcome == TriggerOutcome::NoOp {
      self.delete_record(resource_id).await;
    }
    outcome
  }

  /// Replay every non-expired retry record in this synchronizer's namespace,
  /// once each. Called on every offline → online transition.
  pub async fn replay_pending(&self) -> ReplayReport {
    let mut report = ReplayReport::default();

    let records = match self.services.retries.list().await {
      Ok(records) => records,
      Err(e) => {
        tracing::error!(error = %e, "failed to list retry records");
        return report;
      }
    };

    let now = Utc::now();
    for record in records
      .into_iter()
      .filter(|r| r.resource_id.namespace() == S::NAMESPACE)
    {
      if record.is_expired(now, self.config.retry_ttl, self.config.max_replays) {
        tracing::warn!(
          resource = %record.resource_id,
          replays = record.replays,
          recorded_at = %record.timestamp,
          "discarding stale retry record"
        );
        self.delete_record(&record.resource_id).await;
        report.discarded += 1;
        continue;
      }

      if !self.services.connectivity.is_online() {
        report.skipped += 1;
        continue;
      }

      let tracked = self.table().contains_key(&record.resource_id);
      let intent = record.intent.clone();
      match self.run(intent, Some(&record), tracked).await {
        TriggerOutcome::Settled(result) => {
          report.replayed += 1;
          if matches!(result, ReconciliationResult::Success(_) | ReconciliationResult::AlreadyExists)
          {
            report.confirmed += 1;
          }
        }
        TriggerOutcome::NoOp => {
          // The tracked state already matches: nothing left to send.
          self.delete_record(&record.resource_id).await;
          report.confirmed += 1;
        }
        TriggerOutcome::Blocked | TriggerOutcome::Ignored | TriggerOutcome::NothingToRetry => {
          report.skipped += 1;
        }
      }
    }

    tracing::info!(
      namespace = S::NAMESPACE,
      replayed = report.replayed,
      confirmed = report.confirmed,
      discarded = report.discarded,
      skipped = report.skipped,
      "replay pass finished"
    );
    report
  }

  /// Run one replay pass per offline → online transition until the
  /// connectivity monitor is dropped or the handle is aborted.
  pub fn spawn_reconnect_listener(self: &Arc<Self>) -> JoinHandle<()>
  where
    D: 'static,
    R: 'static,
  {
    let sync = Arc::clone(self);
    let mut rx = self.services.connectivity.subscribe();
    tokio::spawn(async move {
      let mut was_online = *rx.borrow_and_update();
      while rx.changed().await.is_ok() {
        let online = *rx.borrow_and_update();
        if online && !was_online {
          sync.replay_pending().await;
        }
        was_online = online;
      }
    })
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn run(
    &self,
    intent: MutationIntent,
    replaying: Option<&PendingRetryRecord>,
    guarded: bool,
  ) -> TriggerOutcome {
    let resource_id = intent.resource_id().clone();

    if resource_id.namespace() != S::NAMESPACE {
      tracing::warn!(resource = %resource_id, expected = S::NAMESPACE, "intent for foreign namespace");
      return TriggerOutcome::Ignored;
    }

    if !self.services.connectivity.is_online() {
      tracing::debug!(resource = %resource_id, "trigger blocked while offline");
      self
        .services
        .notifier
        .notify(messages::offline_blocked().about(&resource_id));
      return TriggerOutcome::Blocked;
    }

    let ticket = match self.begin(intent.clone(), guarded) {
      Ok(ticket) => ticket,
      Err(Refusal::InFlight) => {
        tracing::debug!(resource = %resource_id, "mutation already in flight");
        return TriggerOutcome::Ignored;
      }
      Err(Refusal::AlreadyInState) => {
        self
          .services
          .notifier
          .notify(messages::unchanged::<S>(&intent).about(&resource_id));
        return TriggerOutcome::NoOp;
      }
    };

    tracing::info!(
      resource = %resource_id,
      kind = %intent.kind(),
      intent_id = %intent.intent_id(),
      replay = replaying.is_some(),
      "mutation pending"
    );

    let result = self.call(intent).await;

    let effects = self
      .table()
      .get_mut(&resource_id)
      .map(|c| c.settle(ticket, &result))
      .unwrap_or_default();

    tracing::info!(resource = %resource_id, result = result.label(), "mutation settled");
    self.apply(&resource_id, effects, replaying).await;
    TriggerOutcome::Settled(result)
  }

  fn begin(&self, intent: MutationIntent, guarded: bool) -> Result<Ticket, Refusal> {
    let mut table = self.table();
    let resource_id = intent.resource_id().clone();
    let controller = table
      .entry(resource_id.clone())
      .or_insert_with(|| Controller::new(resource_id, S::default()));
    if guarded {
      controller.begin(intent)
    } else {
      controller.begin_replay(intent)
    }
  }

  /// Dispatch under the mutation timeout.
  async fn call(&self, intent: MutationIntent) -> ReconciliationResult {
    let resource_id = intent.resource_id().clone();
    match tokio::time::timeout(
      self.config.mutation_timeout,
      self.services.dispatcher.dispatch(intent),
    )
    .await
    {
      Ok(Ok(result)) => result,
      Ok(Err(e)) => {
        tracing::error!(resource = %resource_id, error = %e, "dispatch failed unexpectedly");
        ReconciliationResult::UnknownFailure(Some(e.to_string()))
      }
      Err(_) => {
        tracing::warn!(
          resource = %resource_id,
          timeout = ?self.config.mutation_timeout,
          "mutation timed out"
        );
        ReconciliationResult::Timeout
      }
    }
  }

  async fn apply(
    &self,
    resource_id: &ResourceId,
    effects: Vec<Effect>,
    replaying: Option<&PendingRetryRecord>,
  ) {
    for effect in effects {
      match effect {
        Effect::Notify(notification) => self.services.notifier.notify(notification),
        Effect::WriteRetry(intent) => {
          let record = match replaying {
            Some(prior) if prior.intent.intent_id() == intent.intent_id() => prior.replayed(),
            _ => PendingRetryRecord::new(intent),
          };
          tracing::warn!(resource = %resource_id, replays = record.replays, "retry record written");
          if let Err(e) = self.services.retries.put(record).await {
            tracing::error!(resource = %resource_id, error = %e, "failed to write retry record");
          }
        }
        Effect::ClearRetry => self.delete_record(resource_id).await,
        Effect::RedirectToLogin(intent) => {
          self
            .services
            .session
            .redirect_to_login(&resource_id.return_path(), &intent);
        }
        Effect::Refresh => {
          // No subscribers is fine.
          let _ = self.refresh.send(resource_id.clone());
        }
      }
    }
  }

  async fn delete_record(&self, resource_id: &ResourceId) {
    if let Err(e) = self.services.retries.delete(resource_id.clone()).await {
      tracing::error!(resource = %resource_id, error = %e, "failed to delete retry record");
    }
  }
}

//! Optimistic mutation protocol.
//!
//! - [`controller`]: the per-resource state machine
//!   (`Idle → Pending → {Confirmed, RolledBack, AwaitingRetry}`), free of IO.
//! - [`connectivity`]: the shared online/offline signal.
//! - [`synchronizer`]: owns the `resource id → controller` table, calls the
//!   dispatcher under a timeout and carries out the controller's effects
//!   (notifications, retry records, login redirects, refresh signals).

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod messages;
pub mod synchronizer;

pub use config::SyncConfig;
pub use connectivity::{Connectivity, Transition};
pub use controller::{Controller, Effect, Phase};
pub use synchronizer::{ReplayReport, Services, Synchronizer, TriggerOutcome};

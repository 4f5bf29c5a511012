//! Pending-retry records and the [`RetryStore`] trait.
//!
//! A record is written whenever an optimistic mutation fails in a retryable
//! way, and deleted once the mutation is confirmed (or found to already be
//! applied). The store holds at most one record per resource: a second write
//! for the same resource overwrites the first.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::{MutationIntent, ResourceId};

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRetryRecord {
  pub resource_id: ResourceId,
  pub intent:      MutationIntent,
  /// When the failure that produced this record happened.
  pub timestamp:   DateTime<Utc>,
  /// Automatic replays already attempted for this intent.
  pub replays:     u32,
}

impl PendingRetryRecord {
  pub fn new(intent: MutationIntent) -> Self {
    Self {
      resource_id: intent.resource_id().clone(),
      intent,
      timestamp: Utc::now(),
      replays: 0,
    }
  }

  /// The record written after an automatic replay failed again.
  pub fn replayed(&self) -> Self {
    Self {
      resource_id: self.resource_id.clone(),
      intent:      self.intent.clone(),
      timestamp:   Utc::now(),
      replays:     self.replays.saturating_add(1),
    }
  }

  /// A record is stale once it is older than `ttl` or has used up its
  /// automatic replays.
  pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration, max_replays: u32) -> bool {
    now - self.timestamp > ttl || self.replays >= max_replays
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable key/value persistence for [`PendingRetryRecord`]s, keyed by
/// resource id.
pub trait RetryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the record for `resource_id`, if one exists.
  fn get(
    &self,
    resource_id: ResourceId,
  ) -> impl Future<Output = Result<Option<PendingRetryRecord>, Self::Error>> + Send + '_;

  /// Insert or overwrite the record for its resource (last write wins).
  fn put(
    &self,
    record: PendingRetryRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete the record for `resource_id`. Returns whether one existed.
  fn delete(
    &self,
    resource_id: ResourceId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every stored record, oldest first.
  fn list(&self) -> impl Future<Output = Result<Vec<PendingRetryRecord>, Self::Error>> + Send + '_;
}

// ─── In-memory store ─────────────────────────────────────────────────────────

/// A [`RetryStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRetryStore {
  records: Mutex<HashMap<ResourceId, PendingRetryRecord>>,
}

impl MemoryRetryStore {
  pub fn new() -> Self { Self::default() }

  fn with<T>(&self, f: impl FnOnce(&mut HashMap<ResourceId, PendingRetryRecord>) -> T) -> T {
    let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
  }
}

impl RetryStore for MemoryRetryStore {
  type Error = Infallible;

  async fn get(&self, resource_id: ResourceId) -> Result<Option<PendingRetryRecord>, Infallible> {
    Ok(self.with(|m| m.get(&resource_id).cloned()))
  }

  async fn put(&self, record: PendingRetryRecord) -> Result<(), Infallible> {
    self.with(|m| m.insert(record.resource_id.clone(), record));
    Ok(())
  }

  async fn delete(&self, resource_id: ResourceId) -> Result<bool, Infallible> {
    Ok(self.with(|m| m.remove(&resource_id).is_some()))
  }

  async fn list(&self) -> Result<Vec<PendingRetryRecord>, Infallible> {
    let mut records: Vec<_> = self.with(|m| m.values().cloned().collect());
    records.sort_by_key(|r| r.timestamp);
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn intent(product: &str) -> MutationIntent {
    MutationIntent::add(ResourceId::wishlist(product).unwrap(), json!({ "productId": product }))
  }

  #[tokio::test]
  async fn put_get_delete() {
    let store = MemoryRetryStore::new();
    let record = PendingRetryRecord::new(intent("p1"));
    let id = record.resource_id.clone();

    store.put(record.clone()).await.unwrap();
    assert_eq!(store.get(id.clone()).await.unwrap(), Some(record));

    assert!(store.delete(id.clone()).await.unwrap());
    assert!(!store.delete(id.clone()).await.unwrap());
    assert!(store.get(id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn same_resource_is_last_write_wins() {
    let store = MemoryRetryStore::new();
    let first = PendingRetryRecord::new(intent("p1"));
    let second = PendingRetryRecord::new(MutationIntent::remove(ResourceId::wishlist("p1").unwrap()));

    store.put(first).await.unwrap();
    store.put(second.clone()).await.unwrap();

    let all = store.list().await.unwrap();
    assert_eq!(all, vec![second]);
  }

  #[test]
  fn expiry_by_age_and_replays() {
    let record = PendingRetryRecord::new(intent("p1"));
    let now = record.timestamp;
    assert!(!record.is_expired(now, Duration::hours(24), 5));
    assert!(record.is_expired(now + Duration::hours(25), Duration::hours(24), 5));

    let mut worn = record.clone();
    for _ in 0..5 {
      worn = worn.replayed();
    }
    assert_eq!(worn.replays, 5);
    assert!(worn.is_expired(worn.timestamp, Duration::hours(24), 5));
  }
}

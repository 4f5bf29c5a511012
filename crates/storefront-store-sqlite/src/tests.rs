//! Integration tests for `SqliteRetryStore` against an in-memory database.

use chrono::{Duration, Utc};
use serde_json::json;
use storefront_core::{
  intent::{MutationIntent, ResourceId},
  retry::{PendingRetryRecord, RetryStore},
};

use crate::{Error, SqliteRetryStore};

async fn store() -> SqliteRetryStore {
  SqliteRetryStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn wishlist_add(product: &str) -> PendingRetryRecord {
  PendingRetryRecord::new(MutationIntent::add(
    ResourceId::wishlist(product).unwrap(),
    json!({ "productId": product }),
  ))
}

// ─── Basic CRUD ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_record() {
  let s = store().await;
  let record = wishlist_add("6428ebc6dc1175abc65ca0b9");

  s.put(record.clone()).await.unwrap();

  let fetched = s.get(record.resource_id.clone()).await.unwrap();
  assert_eq!(fetched, Some(record));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  let result = s.get(ResourceId::cart("nope").unwrap()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_row_existed() {
  let s = store().await;
  let record = wishlist_add("p1");
  s.put(record.clone()).await.unwrap();

  assert!(s.delete(record.resource_id.clone()).await.unwrap());
  assert!(!s.delete(record.resource_id.clone()).await.unwrap());
  assert!(s.get(record.resource_id).await.unwrap().is_none());
}

// ─── Last write wins ─────────────────────────────────────────────────────────

#[tokio::test]
async fn second_put_for_same_resource_overwrites() {
  let s = store().await;
  let id = ResourceId::cart("p1").unwrap();

  let first = PendingRetryRecord::new(MutationIntent::add(id.clone(), json!({ "quantity": 1 })));
  let second = PendingRetryRecord::new(MutationIntent::update(id.clone(), json!({ "quantity": 4 })));

  s.put(first).await.unwrap();
  s.put(second.clone()).await.unwrap();

  let all = s.list().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0], second);
  assert_eq!(all[0].intent.payload_u64("quantity"), Some(4));
}

#[tokio::test]
async fn different_resources_do_not_conflict() {
  let s = store().await;
  s.put(wishlist_add("p1")).await.unwrap();
  s.put(wishlist_add("p2")).await.unwrap();
  s.put(PendingRetryRecord::new(MutationIntent::update(
    ResourceId::profile(),
    json!({ "name": "Ahmed" }),
  )))
  .await
  .unwrap();

  assert_eq!(s.list().await.unwrap().len(), 3);
}

// ─── Ordering and replays ────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_oldest_first() {
  let s = store().await;

  let mut older = wishlist_add("old");
  older.timestamp = Utc::now() - Duration::minutes(10);
  let newer = wishlist_add("new");

  s.put(newer.clone()).await.unwrap();
  s.put(older.clone()).await.unwrap();

  let all = s.list().await.unwrap();
  assert_eq!(all[0].resource_id, older.resource_id);
  assert_eq!(all[1].resource_id, newer.resource_id);
}

#[tokio::test]
async fn replay_counter_roundtrips() {
  let s = store().await;
  let record = wishlist_add("p1").replayed().replayed();

  s.put(record.clone()).await.unwrap();

  let fetched = s.get(record.resource_id.clone()).await.unwrap().unwrap();
  assert_eq!(fetched.replays, 2);
  assert_eq!(fetched.intent.intent_id(), record.intent.intent_id());
}

#[tokio::test]
async fn mismatched_key_is_rejected() {
  let s = store().await;
  let mut record = wishlist_add("p1");
  record.resource_id = ResourceId::wishlist("p2").unwrap();

  let err = s.put(record).await.unwrap_err();
  assert!(matches!(err, Error::KeyMismatch { .. }));
}

#[tokio::test]
async fn records_survive_reopen() {
  let dir = std::env::temp_dir().join(format!("storefront-retry-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("retries.db");

  let record = wishlist_add("p1");
  {
    let s = SqliteRetryStore::open(&path).await.unwrap();
    s.put(record.clone()).await.unwrap();
  }

  let reopened = SqliteRetryStore::open(&path).await.unwrap();
  assert_eq!(reopened.get(record.resource_id.clone()).await.unwrap(), Some(record));

  drop(reopened);
  std::fs::remove_dir_all(&dir).ok();
}

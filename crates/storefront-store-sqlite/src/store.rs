//! [`SqliteRetryStore`]: the SQLite implementation of [`RetryStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use storefront_core::{
  intent::ResourceId,
  retry::{PendingRetryRecord, RetryStore},
};

use crate::{
  Error, Result,
  encode::{RawRecord, encode_record},
  schema::SCHEMA,
};

const SELECT_COLUMNS: &str = "SELECT resource_id, intent_id, kind, payload_json,
        intent_created_at, recorded_at, replays
   FROM pending_retries";

// ─── Store ───────────────────────────────────────────────────────────────────

/// Pending-retry records backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteRetryStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteRetryStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RetryStore impl ─────────────────────────────────────────────────────────

impl RetryStore for SqliteRetryStore {
  type Error = Error;

  async fn get(&self, resource_id: ResourceId) -> Result<Option<PendingRetryRecord>> {
    let id_str = resource_id.to_string();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECT_COLUMNS} WHERE resource_id = ?1"),
              rusqlite::params![id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn put(&self, record: PendingRetryRecord) -> Result<()> {
    let row = encode_record(&record)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO pending_retries (
             resource_id, intent_id, kind, payload_json,
             intent_created_at, recorded_at, replays
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.resource_id,
            row.intent_id,
            row.kind,
            row.payload_json,
            row.intent_created_at,
            row.recorded_at,
            row.replays,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(resource = %record.resource_id, replays = record.replays, "retry record stored");
    Ok(())
  }

  async fn delete(&self, resource_id: ResourceId) -> Result<bool> {
    let id_str = resource_id.to_string();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM pending_retries WHERE resource_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list(&self) -> Result<Vec<PendingRetryRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY recorded_at ASC"))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

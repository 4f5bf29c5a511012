//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings (nanosecond precision, `Z`), payloads as compact JSON and
//! UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use storefront_core::{
  intent::{MutationIntent, MutationKind, ResourceId},
  retry::PendingRetryRecord,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Fixed-width encoding so `ORDER BY recorded_at` sorts chronologically.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row ──────────────────────────────────────────────────────────────────

/// One `pending_retries` row exactly as read from SQLite.
pub struct RawRecord {
  pub resource_id:       String,
  pub intent_id:         String,
  pub kind:              String,
  pub payload_json:      String,
  pub intent_created_at: String,
  pub recorded_at:       String,
  pub replays:           i64,
}

/// Column values for an insert, in schema order.
pub struct EncodedRecord {
  pub resource_id:       String,
  pub intent_id:         String,
  pub kind:              &'static str,
  pub payload_json:      String,
  pub intent_created_at: String,
  pub recorded_at:       String,
  pub replays:           i64,
}

pub fn encode_record(record: &PendingRetryRecord) -> Result<EncodedRecord> {
  let intent = &record.intent;
  if intent.resource_id() != &record.resource_id {
    return Err(Error::KeyMismatch {
      key:    record.resource_id.to_string(),
      intent: intent.resource_id().to_string(),
    });
  }
  Ok(EncodedRecord {
    resource_id:       record.resource_id.to_string(),
    intent_id:         encode_uuid(intent.intent_id()),
    kind:              intent.kind().as_str(),
    payload_json:      serde_json::to_string(intent.payload())?,
    intent_created_at: encode_dt(intent.created_at()),
    recorded_at:       encode_dt(record.timestamp),
    replays:           i64::from(record.replays),
  })
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      resource_id:       row.get(0)?,
      intent_id:         row.get(1)?,
      kind:              row.get(2)?,
      payload_json:      row.get(3)?,
      intent_created_at: row.get(4)?,
      recorded_at:       row.get(5)?,
      replays:           row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<PendingRetryRecord> {
    let resource_id: ResourceId = self.resource_id.parse()?;
    let kind: MutationKind = self.kind.parse()?;
    let intent = MutationIntent::restore(
      decode_uuid(&self.intent_id)?,
      resource_id.clone(),
      kind,
      serde_json::from_str(&self.payload_json)?,
      decode_dt(&self.intent_created_at)?,
    );
    Ok(PendingRetryRecord {
      resource_id,
      intent,
      timestamp: decode_dt(&self.recorded_at)?,
      replays: u32::try_from(self.replays.max(0)).unwrap_or(u32::MAX),
    })
  }
}

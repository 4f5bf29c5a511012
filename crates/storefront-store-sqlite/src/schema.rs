//! SQL schema for the pending-retry store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- At most one row per resource; writes use INSERT OR REPLACE so the last
-- writer wins.
CREATE TABLE IF NOT EXISTS pending_retries (
    resource_id       TEXT PRIMARY KEY,   -- 'namespace:key'
    intent_id         TEXT NOT NULL,
    kind              TEXT NOT NULL,      -- 'add' | 'remove' | 'update'
    payload_json      TEXT NOT NULL,
    intent_created_at TEXT NOT NULL,      -- RFC 3339 UTC
    recorded_at       TEXT NOT NULL,      -- RFC 3339 UTC
    replays           INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS pending_retries_recorded_idx ON pending_retries(recorded_at);

PRAGMA user_version = 1;
";

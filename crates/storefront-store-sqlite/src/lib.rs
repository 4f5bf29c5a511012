//! SQLite backend for pending-retry records.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The database file survives process
//! restarts, which is what lets a failed mutation be replayed after the
//! storefront is reopened.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteRetryStore;

#[cfg(test)]
mod tests;

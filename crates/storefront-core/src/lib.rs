//! Core types and trait definitions for the storefront mutation protocol.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! describes *what* a mutation is and how its outcome is classified; the
//! client, store and sync crates supply the *how*.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod dispatch;
pub mod error;
pub mod intent;
pub mod notify;
pub mod outcome;
pub mod retry;
pub mod session;
pub mod state;

pub use error::{Error, Result};

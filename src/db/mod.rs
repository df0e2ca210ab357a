//! Database module for walletwatch.
//!
//! Provides the append-only SQLite report history with idempotent migrations.

mod models;
mod store;

pub use models::*;
pub use store::*;

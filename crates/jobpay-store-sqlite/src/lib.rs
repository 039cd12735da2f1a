//! SQLite backend for the jobpay marketplace store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Payment and deposit transactions run
//! as SQLite transactions whose write statements carry their own guards.

mod encode;
mod ledger;
mod schema;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use seed::{DEMO_SEED, SeedData};
pub use store::SqliteStore;

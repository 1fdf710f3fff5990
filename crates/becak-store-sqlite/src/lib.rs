//! SQLite backend for the Becak ride store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call is serialised on that one
//! connection, and the conditional status update is a single guarded
//! `UPDATE`, which is what makes the accept race safe.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

//! SQLite backend for the kudos store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. This is the embedded backend used when
//! no PostgreSQL connection string is configured.

mod encode;
mod schema;
mod statements;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

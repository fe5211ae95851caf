//! PostgreSQL backend for the kudos store.
//!
//! Selected when a connection string is configured. Uses a [`sqlx`] pool and
//! speaks the same schema as the SQLite backend, with `$n` placeholders and
//! native booleans and timestamps.

mod schema;
mod statements;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::PostgresStore;

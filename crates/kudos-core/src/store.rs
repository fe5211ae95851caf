//! The `KudosStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`kudos-store-sqlite`,
//! `kudos-store-postgres`). Higher layers (`kudos-api`, `kudos-server`)
//! depend on this abstraction, never on a concrete backend; the backend is
//! chosen once at startup and handed down.

use std::future::Future;

use crate::kudos::{Kudos, LeaderboardEntry, NewKudos, Stats, Visibility};

// ─── Query type ──────────────────────────────────────────────────────────────

/// A filtered read over the `kudos` table. Every variant maps onto one
/// pre-defined parameterized statement per backend (see [`QueryShape`]).
///
/// Results are always ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KudosQuery {
  /// Kudos received by `user_id`. With `include_private == false` only
  /// public records are returned.
  Recipient { user_id: String, include_private: bool },
  /// Kudos sent by `user_id`; never filtered by visibility.
  Sender { user_id: String },
  /// Every record, optionally restricted to one visibility.
  All { visibility: Option<Visibility> },
}

/// The statement variant a [`KudosQuery`] selects. Backends key their SQL by
/// this value instead of assembling `WHERE` clauses at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryShape {
  Recipient,
  RecipientPublic,
  Sender,
  All,
  AllWithVisibility,
}

impl QueryShape {
  /// Every shape, for exhaustively testing backend statement tables.
  pub const ALL: [QueryShape; 5] = [
    QueryShape::Recipient,
    QueryShape::RecipientPublic,
    QueryShape::Sender,
    QueryShape::All,
    QueryShape::AllWithVisibility,
  ];
}

impl KudosQuery {
  pub fn shape(&self) -> QueryShape {
    match self {
      Self::Recipient { include_private: true, .. } => QueryShape::Recipient,
      Self::Recipient { include_private: false, .. } => QueryShape::RecipientPublic,
      Self::Sender { .. } => QueryShape::Sender,
      Self::All { visibility: None } => QueryShape::All,
      Self::All { visibility: Some(_) } => QueryShape::AllWithVisibility,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a kudos storage backend.
///
/// Kudos records are append-only: there is an insert and there are reads, but
/// no update or delete. Manager relationships are the only mutable rows, and
/// they are written through a single upsert.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait KudosStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Kudos ─────────────────────────────────────────────────────────────

  /// Persist a new record and return its storage-assigned id. `created_at`
  /// is stamped by the storage engine.
  fn insert(
    &self,
    input: NewKudos,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Run a filtered read, newest first, returning at most `limit` records.
  fn query(
    &self,
    query: KudosQuery,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Kudos>, Self::Error>> + Send + '_;

  /// Total, distinct recipients, distinct senders, and the last 7 days.
  fn stats(&self) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;

  /// Recipients ranked by kudos received. Order among equal counts is
  /// whatever the storage engine produces.
  fn leaderboard(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, Self::Error>> + Send + '_;

  // ── Convenience reads ─────────────────────────────────────────────────

  fn list_by_recipient(
    &self,
    user_id: &str,
    limit: u32,
    include_private: bool,
  ) -> impl Future<Output = Result<Vec<Kudos>, Self::Error>> + Send + '_ {
    self.query(
      KudosQuery::Recipient { user_id: user_id.to_owned(), include_private },
      limit,
    )
  }

  fn list_by_sender(
    &self,
    user_id: &str,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Kudos>, Self::Error>> + Send + '_ {
    self.query(KudosQuery::Sender { user_id: user_id.to_owned() }, limit)
  }

  fn list_all(
    &self,
    limit: u32,
    visibility: Option<Visibility>,
  ) -> impl Future<Output = Result<Vec<Kudos>, Self::Error>> + Send + '_ {
    self.query(KudosQuery::All { visibility }, limit)
  }

  fn list_public(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Kudos>, Self::Error>> + Send + '_ {
    self.list_all(limit, Some(Visibility::Public))
  }

  // ── Manager relationships ─────────────────────────────────────────────

  /// Insert or overwrite `user_id`'s manager, refreshing `updated_at`.
  fn set_manager<'a>(
    &'a self,
    user_id: &'a str,
    manager_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_manager<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Users whose manager is `manager_id`. Direct reports only.
  fn direct_reports<'a>(
    &'a self,
    manager_id: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Release the underlying handle or pool. Safe to call more than once.
  fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

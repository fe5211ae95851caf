//! [`SqliteStore`] — the SQLite implementation of [`KudosStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use kudos_core::{
  kudos::{Kudos, LeaderboardEntry, NewKudos, Stats},
  store::{KudosQuery, KudosStore},
};

use crate::{Result, encode::RawKudos, schema, statements};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A kudos store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and every
/// clone shares the same closed flag.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  closed:          Arc<AtomicBool>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self::from_connection(conn).await?;
    info!(path = %path.display(), "opened SQLite kudos store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  pub(crate) async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn, closed: Arc::new(AtomicBool::new(false)) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let migrated = self
      .conn
      .call(|conn| Ok(schema::apply(conn)?))
      .await?;
    if migrated {
      info!("added visibility column to kudos; existing rows are public");
    }
    Ok(())
  }
}

// ─── KudosStore impl ─────────────────────────────────────────────────────────

impl KudosStore for SqliteStore {
  type Error = crate::Error;

  // ── Kudos ─────────────────────────────────────────────────────────────────

  async fn insert(&self, input: NewKudos) -> Result<i64> {
    let visibility = input.visibility.as_ref().to_owned();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          statements::INSERT,
          rusqlite::params![
            input.from_user_id,
            input.from_user_name,
            input.to_user_id,
            input.to_user_name,
            input.message,
            input.channel_id,
            input.channel_name,
            input.sent_dm,
            input.sent_channel,
            visibility,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(id)
  }

  async fn query(&self, query: KudosQuery, limit: u32) -> Result<Vec<Kudos>> {
    let shape = query.shape();
    let sql   = statements::for_shape(shape);
    let limit = i64::from(limit);
    debug!(?shape, limit, "sqlite kudos query");

    let raws: Vec<RawKudos> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = match query {
          KudosQuery::Recipient { user_id, .. } | KudosQuery::Sender { user_id } => stmt
            .query_map(rusqlite::params![user_id, limit], RawKudos::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          KudosQuery::All { visibility: None } => stmt
            .query_map(rusqlite::params![limit], RawKudos::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          KudosQuery::All { visibility: Some(v) } => stmt
            .query_map(rusqlite::params![v.as_ref(), limit], RawKudos::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKudos::into_kudos).collect()
  }

  async fn stats(&self) -> Result<Stats> {
    let stats = self
      .conn
      .call(|conn| {
        let count = |sql: &str| conn.query_row(sql, [], |r| r.get::<_, i64>(0));
        Ok(Stats {
          total:             count(statements::COUNT_TOTAL)?,
          unique_recipients: count(statements::COUNT_RECIPIENTS)?,
          unique_senders:    count(statements::COUNT_SENDERS)?,
          last_7_days:       count(statements::COUNT_LAST_7_DAYS)?,
        })
      })
      .await?;
    Ok(stats)
  }

  async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>> {
    let limit = i64::from(limit);

    let entries = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(statements::LEADERBOARD)?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(LeaderboardEntry {
              to_user_id:   row.get(0)?,
              to_user_name: row.get(1)?,
              kudos_count:  row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(entries)
  }

  // ── Manager relationships ─────────────────────────────────────────────────

  async fn set_manager<'a>(&'a self, user_id: &'a str, manager_id: &'a str) -> Result<()> {
    let user_id    = user_id.to_owned();
    let manager_id = manager_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(statements::UPSERT_MANAGER, rusqlite::params![user_id, manager_id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_manager<'a>(&'a self, user_id: &'a str) -> Result<Option<String>> {
    let user_id = user_id.to_owned();

    let manager = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(statements::GET_MANAGER, rusqlite::params![user_id], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;
    Ok(manager)
  }

  async fn direct_reports<'a>(&'a self, manager_id: &'a str) -> Result<Vec<String>> {
    let manager_id = manager_id.to_owned();

    let reports = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(statements::DIRECT_REPORTS)?;
        let rows = stmt
          .query_map(rusqlite::params![manager_id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(reports)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn close(&self) -> Result<()> {
    if self.closed.swap(true, Ordering::SeqCst) {
      return Ok(());
    }
    self.conn.clone().close().await?;
    info!("closed SQLite kudos store");
    Ok(())
  }
}

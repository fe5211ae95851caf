//! [`PostgresStore`], the PostgreSQL implementation of [`KudosStore`].

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use sqlx::{
  FromRow, PgPool, Postgres,
  postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::{debug, info};

use kudos_core::{
  kudos::{Kudos, LeaderboardEntry, NewKudos, Stats, Visibility},
  store::{KudosQuery, KudosStore},
};

use crate::{Result, schema, statements};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Row ─────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct DbKudos {
  id:             i64,
  from_user_id:   String,
  from_user_name: String,
  to_user_id:     String,
  to_user_name:   String,
  message:        String,
  channel_id:     Option<String>,
  channel_name:   Option<String>,
  sent_dm:        Option<bool>,
  sent_channel:   Option<bool>,
  visibility:     String,
  created_at:     DateTime<Utc>,
}

impl DbKudos {
  fn into_kudos(self) -> Result<Kudos> {
    Ok(Kudos {
      id:             self.id,
      from_user_id:   self.from_user_id,
      from_user_name: self.from_user_name,
      to_user_id:     self.to_user_id,
      to_user_name:   self.to_user_name,
      message:        self.message,
      channel_id:     self.channel_id,
      channel_name:   self.channel_name,
      sent_dm:        self.sent_dm.unwrap_or(false),
      sent_channel:   self.sent_channel.unwrap_or(false),
      visibility:     Visibility::decode(&self.visibility)?,
      created_at:     self.created_at,
    })
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A kudos store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresStore {
  pool: PgPool,
}

impl PostgresStore {
  /// Connect using a `postgres://` connection string and bring the schema up
  /// to date. TLS follows the string's `sslmode`.
  ///
  /// The connection string may carry credentials and is never logged.
  pub async fn connect(url: &str) -> Result<Self> {
    Self::connect_with(PgConnectOptions::from_str(url)?).await
  }

  /// Like [`connect`](Self::connect), for options built in code.
  pub async fn connect_with(options: PgConnectOptions) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(MAX_CONNECTIONS)
      .acquire_timeout(ACQUIRE_TIMEOUT)
      .connect_with(options)
      .await?;

    if schema::apply(&pool).await? {
      info!("added visibility column to kudos; existing rows are public");
    }
    info!("connected to PostgreSQL kudos store");
    Ok(Self { pool })
  }
}

// ─── KudosStore impl ─────────────────────────────────────────────────────────

impl KudosStore for PostgresStore {
  type Error = crate::Error;

  // ── Kudos ─────────────────────────────────────────────────────────────────

  async fn insert(&self, input: NewKudos) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(statements::INSERT)
      .bind(&input.from_user_id)
      .bind(&input.from_user_name)
      .bind(&input.to_user_id)
      .bind(&input.to_user_name)
      .bind(&input.message)
      .bind(&input.channel_id)
      .bind(&input.channel_name)
      .bind(input.sent_dm)
      .bind(input.sent_channel)
      .bind(input.visibility.as_ref())
      .fetch_one(&self.pool)
      .await?;
    Ok(id)
  }

  async fn query(&self, query: KudosQuery, limit: u32) -> Result<Vec<Kudos>> {
    let shape = query.shape();
    let limit = i64::from(limit);
    debug!(?shape, limit, "postgres kudos query");

    let stmt = sqlx::query_as::<Postgres, DbKudos>(statements::for_shape(shape));
    let stmt = match &query {
      KudosQuery::Recipient { user_id, .. } | KudosQuery::Sender { user_id } => {
        stmt.bind(user_id.as_str())
      }
      KudosQuery::All { visibility: None } => stmt,
      KudosQuery::All { visibility: Some(v) } => stmt.bind(v.as_ref()),
    };
    let rows = stmt.bind(limit).fetch_all(&self.pool).await?;

    rows.into_iter().map(DbKudos::into_kudos).collect()
  }

  async fn stats(&self) -> Result<Stats> {
    let count = |sql: &'static str| sqlx::query_scalar::<Postgres, i64>(sql).fetch_one(&self.pool);
    Ok(Stats {
      total:             count(statements::COUNT_TOTAL).await?,
      unique_recipients: count(statements::COUNT_RECIPIENTS).await?,
      unique_senders:    count(statements::COUNT_SENDERS).await?,
      last_7_days:       count(statements::COUNT_LAST_7_DAYS).await?,
    })
  }

  async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(statements::LEADERBOARD)
      .bind(i64::from(limit))
      .fetch_all(&self.pool)
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(to_user_id, to_user_name, kudos_count)| LeaderboardEntry {
          to_user_id,
          to_user_name,
          kudos_count,
        })
        .collect(),
    )
  }

  // ── Manager relationships ─────────────────────────────────────────────────

  async fn set_manager<'a>(&'a self, user_id: &'a str, manager_id: &'a str) -> Result<()> {
    sqlx::query(statements::UPSERT_MANAGER)
      .bind(user_id)
      .bind(manager_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn get_manager<'a>(&'a self, user_id: &'a str) -> Result<Option<String>> {
    let manager = sqlx::query_scalar(statements::GET_MANAGER)
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(manager)
  }

  async fn direct_reports<'a>(&'a self, manager_id: &'a str) -> Result<Vec<String>> {
    let reports = sqlx::query_scalar(statements::DIRECT_REPORTS)
      .bind(manager_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(reports)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn close(&self) -> Result<()> {
    if self.pool.is_closed() {
      return Ok(());
    }
    self.pool.close().await;
    info!("closed PostgreSQL kudos store");
    Ok(())
  }
}

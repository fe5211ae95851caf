//! SQL schema for the kudos PostgreSQL store.
//!
//! Mirrors the SQLite schema. Databases created by older deployments use
//! `SERIAL` ids and zone-less `TIMESTAMP`s; the read statements cast both, so
//! those tables are served as-is and only gain the `visibility` column.
//!
//! The whole migration runs in one transaction under an advisory lock, so
//! several instances starting against the same database apply it one at a
//! time.

use sqlx::{Executor, PgPool};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kudos (
    id              BIGSERIAL PRIMARY KEY,
    from_user_id    TEXT NOT NULL,
    from_user_name  TEXT NOT NULL,
    to_user_id      TEXT NOT NULL,
    to_user_name    TEXT NOT NULL,
    message         TEXT NOT NULL,
    channel_id      TEXT,
    channel_name    TEXT,
    sent_dm         BOOLEAN DEFAULT FALSE,
    sent_channel    BOOLEAN DEFAULT FALSE,
    visibility      TEXT NOT NULL DEFAULT 'public',
    created_at      TIMESTAMPTZ DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS manager_relationships (
    user_id     TEXT PRIMARY KEY,
    manager_id  TEXT NOT NULL,
    created_at  TIMESTAMPTZ DEFAULT NOW(),
    updated_at  TIMESTAMPTZ DEFAULT NOW()
);
";

pub const HAS_VISIBILITY: &str = "
SELECT EXISTS (
  SELECT 1 FROM information_schema.columns
  WHERE table_schema = current_schema()
    AND table_name   = 'kudos'
    AND column_name  = 'visibility'
)";

pub const ADD_VISIBILITY: &str =
  "ALTER TABLE kudos ADD COLUMN IF NOT EXISTS visibility TEXT NOT NULL DEFAULT 'public'";

/// Key for `pg_advisory_xact_lock`, shared by every kudos instance.
pub const MIGRATION_LOCK: i64 = 0x6b75_646f_735f_6d67;

pub const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_to_user               ON kudos(to_user_id);
CREATE INDEX IF NOT EXISTS idx_from_user             ON kudos(from_user_id);
CREATE INDEX IF NOT EXISTS idx_created_at            ON kudos(created_at);
CREATE INDEX IF NOT EXISTS idx_visibility            ON kudos(visibility);
CREATE INDEX IF NOT EXISTS idx_visibility_created_at ON kudos(visibility, created_at);
CREATE INDEX IF NOT EXISTS idx_manager_user          ON manager_relationships(user_id);
CREATE INDEX IF NOT EXISTS idx_manager_manager       ON manager_relationships(manager_id);
";

/// Bring the schema up to date. Returns `true` if the visibility column had
/// to be added.
pub async fn apply(pool: &PgPool) -> sqlx::Result<bool> {
  let mut tx = pool.begin().await?;
  sqlx::query("SELECT pg_advisory_xact_lock($1)")
    .bind(MIGRATION_LOCK)
    .execute(&mut *tx)
    .await?;

  tx.execute(sqlx::raw_sql(SCHEMA)).await?;

  let has_visibility: bool = sqlx::query_scalar(HAS_VISIBILITY).fetch_one(&mut *tx).await?;
  if !has_visibility {
    sqlx::query(ADD_VISIBILITY).execute(&mut *tx).await?;
  }

  tx.execute(sqlx::raw_sql(INDEXES)).await?;
  tx.commit().await?;
  Ok(!has_visibility)
}

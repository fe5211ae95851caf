//! SQL schema for the kudos SQLite store.
//!
//! Executed on every open. Table creation is idempotent; the one additive
//! migration (the `visibility` column) is gated on a `PRAGMA table_info`
//! check, and indexes are created last because some of them cover that
//! column.

use rusqlite::Connection;

/// Table DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Kudos are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS kudos (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    from_user_id    TEXT NOT NULL,
    from_user_name  TEXT NOT NULL,
    to_user_id      TEXT NOT NULL,
    to_user_name    TEXT NOT NULL,
    message         TEXT NOT NULL,
    channel_id      TEXT,
    channel_name    TEXT,
    sent_dm         BOOLEAN DEFAULT 0,
    sent_channel    BOOLEAN DEFAULT 0,
    visibility      TEXT NOT NULL DEFAULT 'public',  -- 'public' | 'private'
    created_at      DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- One row per user; upserted, never appended.
CREATE TABLE IF NOT EXISTS manager_relationships (
    user_id     TEXT PRIMARY KEY,
    manager_id  TEXT NOT NULL,
    created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP
);
";

/// Added to databases created before visibility existed. Existing rows take
/// the default and become public.
pub const ADD_VISIBILITY: &str =
  "ALTER TABLE kudos ADD COLUMN visibility TEXT NOT NULL DEFAULT 'public'";

pub const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_to_user               ON kudos(to_user_id);
CREATE INDEX IF NOT EXISTS idx_from_user             ON kudos(from_user_id);
CREATE INDEX IF NOT EXISTS idx_created_at            ON kudos(created_at);
CREATE INDEX IF NOT EXISTS idx_visibility            ON kudos(visibility);
CREATE INDEX IF NOT EXISTS idx_visibility_created_at ON kudos(visibility, created_at);
CREATE INDEX IF NOT EXISTS idx_manager_user          ON manager_relationships(user_id);
CREATE INDEX IF NOT EXISTS idx_manager_manager       ON manager_relationships(manager_id);
";

/// Whether `table` currently has a column called `column`.
pub fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map([table], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names.iter().any(|n| n == column))
}

/// Bring the schema up to date. Returns `true` if the visibility column had
/// to be added.
pub fn apply(conn: &Connection) -> rusqlite::Result<bool> {
  conn.execute_batch(SCHEMA)?;
  let migrated = if has_column(conn, "kudos", "visibility")? {
    false
  } else {
    conn.execute(ADD_VISIBILITY, [])?;
    true
  };
  conn.execute_batch(INDEXES)?;
  Ok(migrated)
}

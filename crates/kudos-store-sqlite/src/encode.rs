//! Decoding helpers between SQLite rows and the domain types.
//!
//! `created_at` is filled by `CURRENT_TIMESTAMP`, which SQLite renders as
//! `YYYY-MM-DD HH:MM:SS` in UTC. Booleans are stored as 0/1 integers.

use chrono::{DateTime, NaiveDateTime, Utc};
use kudos_core::kudos::{Kudos, Visibility};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQLITE_DATETIME) {
    return Ok(naive.and_utc());
  }
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw row ─────────────────────────────────────────────────────────────────

/// A `kudos` row exactly as SQLite hands it back, before decoding.
pub struct RawKudos {
  pub id:             i64,
  pub from_user_id:   String,
  pub from_user_name: String,
  pub to_user_id:     String,
  pub to_user_name:   String,
  pub message:        String,
  pub channel_id:     Option<String>,
  pub channel_name:   Option<String>,
  pub sent_dm:        Option<bool>,
  pub sent_channel:   Option<bool>,
  pub visibility:     String,
  pub created_at:     String,
}

impl RawKudos {
  /// Read the columns selected by the statements in `statements.rs`, in order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      from_user_id:   row.get(1)?,
      from_user_name: row.get(2)?,
      to_user_id:     row.get(3)?,
      to_user_name:   row.get(4)?,
      message:        row.get(5)?,
      channel_id:     row.get(6)?,
      channel_name:   row.get(7)?,
      sent_dm:        row.get(8)?,
      sent_channel:   row.get(9)?,
      visibility:     row.get(10)?,
      created_at:     row.get(11)?,
    })
  }

  pub fn into_kudos(self) -> Result<Kudos> {
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
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

//! Kudos records — the fundamental unit of the store.
//!
//! A kudos record is an immutable fact once written: the store never updates
//! or deletes it. Sender and recipient names are snapshots taken at send time,
//! so a later rename on the chat platform does not rewrite history.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Visibility ──────────────────────────────────────────────────────────────

/// Access classification of a kudos record.
///
/// The lowercase string form (`"public"` / `"private"`) is what both storage
/// backends persist in the `visibility` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
  /// Visible to every caller.
  #[default]
  Public,
  /// Visible to the sender, the recipient, and the recipient's manager chain.
  Private,
}

impl Visibility {
  /// Decode the column representation, mapping failures onto [`Error`].
  pub fn decode(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownVisibility(s.to_owned()))
  }

  pub fn is_private(self) -> bool { matches!(self, Self::Private) }

  /// Human-readable label used in delivered messages.
  pub fn label(self) -> &'static str {
    match self {
      Self::Public => "🌐 Public",
      Self::Private => "🔒 Private",
    }
  }
}

// ─── Kudos ───────────────────────────────────────────────────────────────────

/// A persisted kudos record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kudos {
  pub id:             i64,
  pub from_user_id:   String,
  pub from_user_name: String,
  pub to_user_id:     String,
  pub to_user_name:   String,
  pub message:        String,
  /// Only set when the channel post actually went out.
  pub channel_id:     Option<String>,
  pub channel_name:   Option<String>,
  pub sent_dm:        bool,
  pub sent_channel:   bool,
  pub visibility:     Visibility,
  /// Storage-assigned; never supplied by callers.
  pub created_at:     DateTime<Utc>,
}

impl Kudos {
  /// Whether `user_id` is the sender or the recipient of this record.
  pub fn involves(&self, user_id: &str) -> bool {
    self.from_user_id == user_id || self.to_user_id == user_id
  }
}

// ─── NewKudos ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::KudosStore::insert`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKudos {
  pub from_user_id:   String,
  pub from_user_name: String,
  pub to_user_id:     String,
  pub to_user_name:   String,
  pub message:        String,
  pub channel_id:     Option<String>,
  pub channel_name:   Option<String>,
  pub sent_dm:        bool,
  pub sent_channel:   bool,
  pub visibility:     Visibility,
}

impl NewKudos {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(
    from_user_id: impl Into<String>,
    from_user_name: impl Into<String>,
    to_user_id: impl Into<String>,
    to_user_name: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    Self {
      from_user_id:   from_user_id.into(),
      from_user_name: from_user_name.into(),
      to_user_id:     to_user_id.into(),
      to_user_name:   to_user_name.into(),
      message:        message.into(),
      channel_id:     None,
      channel_name:   None,
      sent_dm:        false,
      sent_channel:   false,
      visibility:     Visibility::default(),
    }
  }

  pub fn with_visibility(mut self, visibility: Visibility) -> Self {
    self.visibility = visibility;
    self
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Four independent counts over the whole `kudos` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total:             i64,
  pub unique_recipients: i64,
  pub unique_senders:    i64,
  /// Records created within the last 7×24h, measured by the storage
  /// engine's clock.
  pub last_7_days:       i64,
}

/// One row of the leaderboard: a recipient identity pair and its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub to_user_id:   String,
  pub to_user_name: String,
  pub kudos_count:  i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn visibility_column_form() {
    assert_eq!(Visibility::Public.as_ref(), "public");
    assert_eq!(Visibility::Private.to_string(), "private");
    assert_eq!(Visibility::decode("private").unwrap(), Visibility::Private);
    assert!(matches!(
      Visibility::decode("secret"),
      Err(Error::UnknownVisibility(s)) if s == "secret"
    ));
  }

  #[test]
  fn stats_serialise_camel_case() {
    let stats = Stats { total: 4, unique_recipients: 2, unique_senders: 3, last_7_days: 1 };
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "total": 4, "uniqueRecipients": 2, "uniqueSenders": 3, "last7Days": 1
      })
    );
  }
}

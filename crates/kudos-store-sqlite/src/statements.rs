//! Pre-defined SQL statements, one per query shape.
//!
//! Nothing here is assembled at runtime: every filter combination the store
//! supports has its own fixed, parameterized statement.

use kudos_core::store::QueryShape;

macro_rules! select_kudos {
  ($tail:literal) => {
    concat!(
      "SELECT id, from_user_id, from_user_name, to_user_id, to_user_name,
              message, channel_id, channel_name, sent_dm, sent_channel,
              visibility, created_at
       FROM kudos ",
      $tail
    )
  };
}

/// `?1` = user id, `?2` = limit.
pub const BY_RECIPIENT: &str = select_kudos!(
  "WHERE to_user_id = ?1
   ORDER BY created_at DESC, id DESC
   LIMIT ?2"
);

/// `?1` = user id, `?2` = limit.
pub const BY_RECIPIENT_PUBLIC: &str = select_kudos!(
  "WHERE to_user_id = ?1 AND visibility = 'public'
   ORDER BY created_at DESC, id DESC
   LIMIT ?2"
);

/// `?1` = user id, `?2` = limit.
pub const BY_SENDER: &str = select_kudos!(
  "WHERE from_user_id = ?1
   ORDER BY created_at DESC, id DESC
   LIMIT ?2"
);

/// `?1` = limit.
pub const ALL: &str = select_kudos!(
  "ORDER BY created_at DESC, id DESC
   LIMIT ?1"
);

/// `?1` = visibility, `?2` = limit.
pub const ALL_WITH_VISIBILITY: &str = select_kudos!(
  "WHERE visibility = ?1
   ORDER BY created_at DESC, id DESC
   LIMIT ?2"
);

pub fn for_shape(shape: QueryShape) -> &'static str {
  match shape {
    QueryShape::Recipient => BY_RECIPIENT,
    QueryShape::RecipientPublic => BY_RECIPIENT_PUBLIC,
    QueryShape::Sender => BY_SENDER,
    QueryShape::All => ALL,
    QueryShape::AllWithVisibility => ALL_WITH_VISIBILITY,
  }
}

pub const INSERT: &str = "
INSERT INTO kudos (
  from_user_id, from_user_name, to_user_id, to_user_name,
  message, channel_id, channel_name, sent_dm, sent_channel, visibility
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

pub const COUNT_TOTAL: &str = "SELECT COUNT(*) FROM kudos";
pub const COUNT_RECIPIENTS: &str = "SELECT COUNT(DISTINCT to_user_id) FROM kudos";
pub const COUNT_SENDERS: &str = "SELECT COUNT(DISTINCT from_user_id) FROM kudos";
pub const COUNT_LAST_7_DAYS: &str =
  "SELECT COUNT(*) FROM kudos WHERE created_at >= datetime('now', '-7 days')";

/// `?1` = limit.
pub const LEADERBOARD: &str = "
SELECT to_user_id, to_user_name, COUNT(*) AS kudos_count
FROM kudos
GROUP BY to_user_id, to_user_name
ORDER BY kudos_count DESC
LIMIT ?1";

/// `?1` = user id, `?2` = manager id.
pub const UPSERT_MANAGER: &str = "
INSERT INTO manager_relationships (user_id, manager_id)
VALUES (?1, ?2)
ON CONFLICT(user_id) DO UPDATE SET
  manager_id = excluded.manager_id,
  updated_at = CURRENT_TIMESTAMP";

pub const GET_MANAGER: &str =
  "SELECT manager_id FROM manager_relationships WHERE user_id = ?1";

pub const DIRECT_REPORTS: &str =
  "SELECT user_id FROM manager_relationships WHERE manager_id = ?1 ORDER BY user_id";

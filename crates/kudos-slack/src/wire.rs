//! Response bodies as the Web API returns them. Only the fields we read are
//! modelled; everything else is ignored.

use serde::Deserialize;

use kudos_core::chat::{ChannelSummary, TeamMember};

/// Slack's sentinel user, which shows up in `users.list` like a person.
pub const SLACKBOT_ID: &str = "USLACKBOT";

fn non_empty(s: &Option<String>) -> Option<&str> { s.as_deref().filter(|s| !s.is_empty()) }

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SlackProfile {
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub image_72:     Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlackUser {
  pub id:        String,
  #[serde(default)]
  pub name:      String,
  pub real_name: Option<String>,
  #[serde(default)]
  pub deleted:   bool,
  #[serde(default)]
  pub is_bot:    bool,
  #[serde(default)]
  pub profile:   SlackProfile,
}

impl SlackUser {
  /// Real name, falling back to the handle.
  pub fn full_name(&self) -> &str { non_empty(&self.real_name).unwrap_or(&self.name) }

  pub fn display_name(&self) -> &str {
    non_empty(&self.profile.display_name).unwrap_or_else(|| self.full_name())
  }

  /// Whether the user belongs in the recipient picker.
  pub fn is_person(&self) -> bool { !self.deleted && !self.is_bot && self.id != SLACKBOT_ID }

  pub fn into_team_member(self) -> TeamMember {
    TeamMember {
      id:           self.id.clone(),
      name:         self.full_name().to_owned(),
      display_name: self.display_name().to_owned(),
      email:        non_empty(&self.profile.email).map(str::to_owned),
      image:        non_empty(&self.profile.image_72).map(str::to_owned),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
  pub user: SlackUser,
}

#[derive(Debug, Deserialize)]
pub struct UsersPage {
  #[serde(default)]
  pub members:           Vec<SlackUser>,
  #[serde(default)]
  pub response_metadata: ResponseMetadata,
}

// ─── Channels ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SlackChannel {
  pub id:         String,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub is_private: bool,
}

impl From<SlackChannel> for ChannelSummary {
  fn from(c: SlackChannel) -> Self { Self { id: c.id, name: c.name, is_private: c.is_private } }
}

#[derive(Debug, Deserialize)]
pub struct ChannelInfo {
  pub channel: SlackChannel,
}

#[derive(Debug, Deserialize)]
pub struct ChannelsPage {
  #[serde(default)]
  pub channels:          Vec<SlackChannel>,
  #[serde(default)]
  pub response_metadata: ResponseMetadata,
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMetadata {
  #[serde(default)]
  pub next_cursor: String,
}

impl ResponseMetadata {
  pub fn next(&self) -> Option<&str> {
    Some(self.next_cursor.as_str()).filter(|c| !c.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(json: serde_json::Value) -> SlackUser { serde_json::from_value(json).unwrap() }

  #[test]
  fn names_fall_back_when_blank() {
    let u = user(serde_json::json!({
      "id": "U1", "name": "ann", "real_name": "", "profile": { "display_name": "" }
    }));
    assert_eq!(u.full_name(), "ann");
    assert_eq!(u.display_name(), "ann");

    let u = user(serde_json::json!({
      "id": "U1", "name": "ann", "real_name": "Ann Lee", "profile": { "display_name": "annie" }
    }));
    assert_eq!(u.full_name(), "Ann Lee");
    assert_eq!(u.display_name(), "annie");
  }

  #[test]
  fn bots_and_slackbot_are_not_people() {
    assert!(!user(serde_json::json!({ "id": "B1", "is_bot": true })).is_person());
    assert!(!user(serde_json::json!({ "id": "U2", "deleted": true })).is_person());
    assert!(!user(serde_json::json!({ "id": SLACKBOT_ID })).is_person());
    assert!(user(serde_json::json!({ "id": "U3" })).is_person());
  }
}

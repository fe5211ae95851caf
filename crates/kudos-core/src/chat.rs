//! The `ChatPlatform` trait — the narrow contract the core needs from the
//! chat platform.
//!
//! Every call may fail independently. Callers catch and log failures; a
//! failed delivery never aborts recording a kudos.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Display data for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id:           String,
  pub display_name: String,
}

/// Display data for a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProfile {
  pub id:   String,
  pub name: String,
}

/// A selectable recipient in the web portal's form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
  pub id:           String,
  pub name:         String,
  pub display_name: String,
  pub email:        Option<String>,
  pub image:        Option<String>,
}

/// A selectable channel in the web portal's form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
  pub id:         String,
  pub name:       String,
  pub is_private: bool,
}

pub trait ChatPlatform: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Send `text` to `user_id` as a direct message.
  fn post_direct_message<'a>(
    &'a self,
    user_id: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Post `text` into `channel_id`.
  fn post_to_channel<'a>(
    &'a self,
    channel_id: &'a str,
    text: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn lookup_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + 'a;

  fn lookup_channel<'a>(
    &'a self,
    channel_id: &'a str,
  ) -> impl Future<Output = Result<ChannelProfile, Self::Error>> + Send + 'a;

  /// Active human members, sorted by name.
  fn team_members(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamMember>, Self::Error>> + Send + '_;

  /// Non-archived channels, sorted by name.
  fn channels(
    &self,
  ) -> impl Future<Output = Result<Vec<ChannelSummary>, Self::Error>> + Send + '_;
}

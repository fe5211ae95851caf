//! Async HTTP client for the Slack Web API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use kudos_core::chat::{ChannelProfile, ChannelSummary, ChatPlatform, TeamMember, UserProfile};

use crate::{
  Error, Result,
  wire::{ChannelInfo, ChannelsPage, ResponseMetadata, UserInfo, UsersPage},
};

/// Upper bound on pages fetched by a single directory listing.
const MAX_PAGES: usize = 50;

/// Connection settings for the Web API.
#[derive(Debug, Clone)]
pub struct SlackConfig {
  /// e.g. `https://slack.com/api`
  pub api_base:  String,
  pub bot_token: String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SlackClient {
  client: Client,
  config: SlackConfig,
}

impl SlackClient {
  pub fn new(config: SlackConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, method: &str) -> String {
    format!("{}/{}", self.config.api_base.trim_end_matches('/'), method)
  }

  // ── Transport ─────────────────────────────────────────────────────────────

  async fn send<T: DeserializeOwned>(&self, method: &'static str, req: RequestBuilder) -> Result<T> {
    let resp = req.bearer_auth(&self.config.bot_token).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { method, status });
    }

    let body: Value = resp.json().await?;
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
      let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_owned();
      return Err(Error::Api { method, error });
    }
    Ok(serde_json::from_value(body)?)
  }

  async fn get<T: DeserializeOwned>(&self, method: &'static str, query: &[(&str, &str)]) -> Result<T> {
    self.send(method, self.client.get(self.url(method)).query(query)).await
  }

  async fn post<T: DeserializeOwned>(&self, method: &'static str, body: &Value) -> Result<T> {
    self.send(method, self.client.post(self.url(method)).json(body)).await
  }

  /// Post `text` as a single markdown section, with `text` repeated as the
  /// notification fallback.
  async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
    let body = json!({
      "channel": channel,
      "text": text,
      "blocks": [
        { "type": "section", "text": { "type": "mrkdwn", "text": text } }
      ],
    });
    let _: Value = self.post("chat.postMessage", &body).await?;
    Ok(())
  }

  // ── Interactive ───────────────────────────────────────────────────────────

  /// Open a modal in response to a slash command. `trigger_id` expires
  /// three seconds after Slack sent it.
  pub async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<()> {
    let body = json!({ "trigger_id": trigger_id, "view": view });
    let _: Value = self.post("views.open", &body).await?;
    Ok(())
  }

  /// A message in `channel` that only `user_id` can see.
  pub async fn post_ephemeral(&self, channel: &str, user_id: &str, text: &str) -> Result<()> {
    let body = json!({ "channel": channel, "user": user_id, "text": text });
    let _: Value = self.post("chat.postEphemeral", &body).await?;
    Ok(())
  }

  // ── Pagination ────────────────────────────────────────────────────────────

  /// Follow `next_cursor` until it comes back empty.
  async fn paginate<P, T>(
    &self,
    method: &'static str,
    query: &[(&str, &str)],
    split: impl Fn(P) -> (Vec<T>, ResponseMetadata),
  ) -> Result<Vec<T>>
  where
    P: DeserializeOwned,
  {
    let mut items = Vec::new();
    let mut cursor = String::new();

    for _ in 0..MAX_PAGES {
      let mut params = query.to_vec();
      if !cursor.is_empty() {
        params.push(("cursor", cursor.as_str()));
      }
      let page: P = self.get(method, &params).await?;
      let (mut batch, meta) = split(page);
      items.append(&mut batch);

      match meta.next() {
        Some(next) => cursor = next.to_owned(),
        None => return Ok(items),
      }
    }

    debug!(method, pages = MAX_PAGES, "stopped paginating at page limit");
    Ok(items)
  }
}

// ─── ChatPlatform impl ───────────────────────────────────────────────────────

impl ChatPlatform for SlackClient {
  type Error = Error;

  async fn post_direct_message<'a>(&'a self, user_id: &'a str, text: &'a str) -> Result<()> {
    self.post_message(user_id, text).await
  }

  async fn post_to_channel<'a>(&'a self, channel_id: &'a str, text: &'a str) -> Result<()> {
    // Joining fails for private channels and when already a member; the
    // post below is what decides success.
    if let Err(e) = self.post::<Value>("conversations.join", &json!({ "channel": channel_id })).await {
      debug!(%channel_id, error = %e, "could not join channel before posting");
    }
    self.post_message(channel_id, text).await
  }

  async fn lookup_user<'a>(&'a self, user_id: &'a str) -> Result<UserProfile> {
    let info: UserInfo = self.get("users.info", &[("user", user_id)]).await?;
    Ok(UserProfile {
      display_name: info.user.full_name().to_owned(),
      id:           info.user.id,
    })
  }

  async fn lookup_channel<'a>(&'a self, channel_id: &'a str) -> Result<ChannelProfile> {
    let info: ChannelInfo = self.get("conversations.info", &[("channel", channel_id)]).await?;
    Ok(ChannelProfile { id: info.channel.id, name: info.channel.name })
  }

  async fn team_members(&self) -> Result<Vec<TeamMember>> {
    let users = self
      .paginate("users.list", &[("limit", "200")], |page: UsersPage| {
        (page.members, page.response_metadata)
      })
      .await?;

    let mut members: Vec<TeamMember> = users
      .into_iter()
      .filter(|u| u.is_person())
      .map(|u| u.into_team_member())
      .collect();
    members.sort_by_cached_key(|m| m.name.to_lowercase());
    Ok(members)
  }

  async fn channels(&self) -> Result<Vec<ChannelSummary>> {
    let query = [
      ("types", "public_channel,private_channel"),
      ("exclude_archived", "true"),
      ("limit", "1000"),
    ];
    let channels = self
      .paginate("conversations.list", &query, |page: ChannelsPage| {
        (page.channels, page.response_metadata)
      })
      .await?;

    let mut channels: Vec<ChannelSummary> = channels.into_iter().map(Into::into).collect();
    channels.sort_by_cached_key(|c| c.name.to_lowercase());
    Ok(channels)
  }
}

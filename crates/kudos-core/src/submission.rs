//! The kudos submission orchestrator.
//!
//! A submission is validated first, with no side effects. Delivery then goes
//! out through the chat platform (DM first, channel second), each attempt
//! independent of the other. The record is persisted last, carrying what
//! actually happened rather than what was asked for. Delivery failures are
//! logged and reported back, never propagated.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  chat::ChatPlatform,
  kudos::{NewKudos, Visibility},
  store::KudosStore,
};

/// Shortest accepted message, counted in characters.
pub const MIN_MESSAGE_CHARS: usize = 10;

/// Emoji used when the submitter did not pick one.
pub const DEFAULT_EMOJI: &str = "🎉";

// ─── Request ─────────────────────────────────────────────────────────────────

/// A kudos submission as received from the slash-command modal or the web
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  pub from_user_id:   String,
  pub from_user_name: String,
  pub to_user_id:     String,
  pub message:        String,
  pub emoji:          Option<String>,
  pub visibility:     Visibility,
  pub wants_dm:       bool,
  pub wants_channel:  bool,
  pub channel_id:     Option<String>,
}

/// Why a submission was refused before anything was sent or stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("message must be at least {MIN_MESSAGE_CHARS} characters long")]
  MessageTooShort,

  #[error("private kudos can only be sent via direct message, not to channels")]
  PrivateToChannel,

  #[error("a channel must be selected when posting to a channel")]
  MissingChannel,

  #[error("invalid recipient user id: {0}")]
  UnknownRecipient(String),
}

#[derive(Debug, Error)]
pub enum SubmitError<E> {
  #[error(transparent)]
  Invalid(#[from] ValidationError),

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl Submission {
  /// Check every rule that can be decided without talking to anyone.
  pub fn validate(&self) -> Result<(), ValidationError> {
    let required = [
      ("fromUserId", &self.from_user_id),
      ("fromUserName", &self.from_user_name),
      ("toUserId", &self.to_user_id),
      ("message", &self.message),
    ];
    if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
      return Err(ValidationError::MissingField(*name));
    }
    if self.message.chars().count() < MIN_MESSAGE_CHARS {
      return Err(ValidationError::MessageTooShort);
    }
    if self.visibility.is_private() && self.wants_channel {
      return Err(ValidationError::PrivateToChannel);
    }
    if self.wants_channel && self.channel().is_none() {
      return Err(ValidationError::MissingChannel);
    }
    Ok(())
  }

  fn channel(&self) -> Option<&str> {
    self.channel_id.as_deref().filter(|c| !c.trim().is_empty())
  }

  pub fn emoji(&self) -> &str {
    self.emoji.as_deref().filter(|e| !e.is_empty()).unwrap_or(DEFAULT_EMOJI)
  }

  /// The text delivered to the recipient and/or channel.
  pub fn render(&self) -> String {
    format!(
      "{} *Kudos to <@{}>!* {}\n\n*From:* <@{}>\n*Message:* {}",
      self.emoji(),
      self.to_user_id,
      self.visibility.label(),
      self.from_user_id,
      self.message,
    )
  }
}

// ─── Receipt ─────────────────────────────────────────────────────────────────

/// What the caller is told after a submission was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
  pub id:           i64,
  pub sent_dm:      bool,
  pub sent_channel: bool,
  pub channel_name: Option<String>,
  pub visibility:   Visibility,
  /// Set when nothing was delivered; the kudos is recorded regardless.
  pub warning:      Option<String>,
}

// ─── Orchestration ───────────────────────────────────────────────────────────

/// Validate, deliver, then persist `submission`.
pub async fn submit<S, C>(
  store: &S,
  chat: &C,
  submission: Submission,
) -> Result<Receipt, SubmitError<S::Error>>
where
  S: KudosStore + ?Sized,
  C: ChatPlatform + ?Sized,
{
  submission.validate()?;

  let recipient = chat.lookup_user(&submission.to_user_id).await.map_err(|e| {
    warn!(to_user_id = %submission.to_user_id, error = %e, "recipient lookup failed");
    ValidationError::UnknownRecipient(submission.to_user_id.clone())
  })?;

  let text = submission.render();

  let mut sent_dm = false;
  if submission.wants_dm {
    match chat.post_direct_message(&submission.to_user_id, &text).await {
      Ok(()) => sent_dm = true,
      Err(e) => warn!(to_user_id = %submission.to_user_id, error = %e, "direct message failed"),
    }
  }

  let mut channel: Option<(String, String)> = None;
  if let (true, Some(channel_id)) = (submission.wants_channel, submission.channel()) {
    match deliver_to_channel(chat, channel_id, &text).await {
      Ok(name) => channel = Some((channel_id.to_owned(), name)),
      Err(e) => warn!(%channel_id, error = %e, "channel post failed"),
    }
  }

  let sent_channel = channel.is_some();
  let (channel_id, channel_name) = channel.unzip();

  let record = NewKudos {
    from_user_id: submission.from_user_id,
    from_user_name: submission.from_user_name,
    to_user_id: submission.to_user_id,
    to_user_name: recipient.display_name,
    message: submission.message,
    channel_id,
    channel_name: channel_name.clone(),
    sent_dm,
    sent_channel,
    visibility: submission.visibility,
  };

  let id = store.insert(record).await.map_err(SubmitError::Store)?;

  let warning = (!sent_dm && !sent_channel).then(|| {
    warn!(id, "kudos recorded but not delivered");
    "The kudos was recorded, but it could not be delivered.".to_owned()
  });

  info!(id, sent_dm, sent_channel, visibility = %submission.visibility, "kudos recorded");

  Ok(Receipt {
    id,
    sent_dm,
    sent_channel,
    channel_name,
    visibility: submission.visibility,
    warning,
  })
}

/// Resolve the channel's name, then post. A failed lookup counts as a failed
/// delivery.
async fn deliver_to_channel<C>(chat: &C, channel_id: &str, text: &str) -> Result<String, C::Error>
where
  C: ChatPlatform + ?Sized,
{
  let profile = chat.lookup_channel(channel_id).await?;
  chat.post_to_channel(channel_id, text).await?;
  Ok(profile.name)
}

//! The Slack-side entry point: the `/kudos` slash command and the submission
//! of the modal it opens.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/commands` | Slash command; opens the kudos modal |
//! | `POST` | `/interactions` | `view_submission` of the kudos modal |
//!
//! Both routes require a valid Slack request signature. A submission is
//! checked while Slack waits, so problems show up under the offending field.
//! Delivery and recording happen after the modal has closed, and the sender
//! gets an ephemeral confirmation when they are done.

use std::sync::Arc;

use axum::{
  Form, Json, Router,
  extract::{State, rejection::FormRejection},
  http::StatusCode,
  middleware,
  response::{IntoResponse, Response},
  routing::post,
};
use serde::Deserialize;
use tracing::{info, warn};

use kudos_core::{
  chat::ChatPlatform,
  store::KudosStore,
  submission::{self, Receipt, Submission},
};

use crate::{
  SlackClient,
  modal::{self, CHANNEL_BLOCK, KudosForm, POSTING_BLOCK, RECIPIENT_BLOCK, ViewState},
  signature::require_signature,
};

/// Shared state for the Slack routes.
pub struct SlackState<S> {
  pub store:          Arc<S>,
  pub client:         Arc<SlackClient>,
  pub signing_secret: Arc<str>,
}

impl<S> Clone for SlackState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      client:         Arc::clone(&self.client),
      signing_secret: Arc::clone(&self.signing_secret),
    }
  }
}

/// Router for Slack's request URLs, typically nested under `/slack`.
pub fn router<S>(state: SlackState<S>) -> Router<()>
where
  S: KudosStore + 'static,
{
  let secret = Arc::clone(&state.signing_secret);
  Router::new()
    .route("/commands", post(command::<S>))
    .route("/interactions", post(interaction::<S>))
    .layer(middleware::from_fn_with_state(secret, require_signature))
    .with_state(state)
}

// ─── Slash command ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SlashCommand {
  pub user_id:    String,
  #[serde(default)]
  pub user_name:  String,
  #[serde(default)]
  pub channel_id: String,
  #[serde(default)]
  pub trigger_id: String,
}

/// `POST /commands`
///
/// Slack only needs an empty 200 here; failures are reported to the user
/// through a message instead.
pub async fn command<S>(
  State(state): State<SlackState<S>>,
  form: Result<Form<SlashCommand>, FormRejection>,
) -> Response
where
  S: KudosStore,
{
  let Form(cmd) = match form {
    Ok(form) => form,
    Err(rejection) => return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
  };

  let opened = if cmd.trigger_id.is_empty() {
    Err("missing trigger_id".to_owned())
  } else {
    let view = modal::kudos_form(&cmd.user_name, &cmd.channel_id);
    state.client.open_view(&cmd.trigger_id, &view).await.map_err(|e| e.to_string())
  };

  if let Err(error) = opened {
    warn!(user_id = %cmd.user_id, %error, "could not open the kudos modal");
    let text = format!("Sorry, there was an error opening the kudos form: {error}. Please try again.");
    // Ephemeral messages need a channel; anywhere else the user gets a DM.
    let notified = if cmd.channel_id.starts_with('C') {
      state.client.post_ephemeral(&cmd.channel_id, &cmd.user_id, &text).await
    } else {
      state.client.post_direct_message(&cmd.user_id, &text).await
    };
    if let Err(e) = notified {
      warn!(user_id = %cmd.user_id, error = %e, "could not tell the user the modal failed");
    }
  }

  StatusCode::OK.into_response()
}

// ─── View submission ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InteractionForm {
  pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionUser {
  pub id:   String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedView {
  #[serde(default)]
  pub callback_id:      String,
  #[serde(default)]
  pub private_metadata: String,
  #[serde(default)]
  pub state:            ViewState,
}

#[derive(Debug, Deserialize)]
pub struct Interaction {
  #[serde(rename = "type")]
  pub kind: String,
  pub user: InteractionUser,
  pub view: Option<SubmittedView>,
}

/// `POST /interactions`
///
/// An empty 200 closes the modal; a `response_action: errors` body keeps it
/// open with the problem shown under the field it concerns.
pub async fn interaction<S>(
  State(state): State<SlackState<S>>,
  form: Result<Form<InteractionForm>, FormRejection>,
) -> Response
where
  S: KudosStore + 'static,
{
  let payload = match form {
    Ok(Form(form)) => form.payload,
    Err(rejection) => return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
  };
  let interaction: Interaction = match serde_json::from_str(&payload) {
    Ok(interaction) => interaction,
    Err(e) => return (StatusCode::BAD_REQUEST, format!("malformed interaction payload: {e}")).into_response(),
  };

  let Some(view) = interaction.view.filter(|v| v.callback_id == modal::CALLBACK_ID) else {
    return StatusCode::OK.into_response();
  };
  if interaction.kind != "view_submission" {
    return StatusCode::OK.into_response();
  }

  let form = KudosForm::from_state(&view.state);
  if !form.dm && !form.channel {
    return errors(POSTING_BLOCK, "Please select at least one posting option (DM or Channel).");
  }

  let user = interaction.user;
  let provisional_name = if user.name.is_empty() { user.id.clone() } else { user.name.clone() };
  let submission = form.into_submission(&user.id, &provisional_name);

  if let Err(e) = submission.validate() {
    return errors(modal::block_for(&e), &e.to_string());
  }
  if let Err(response) = check_reachable(&state.client, &submission).await {
    return response;
  }

  let return_channel = if view.private_metadata.is_empty() { user.id.clone() } else { view.private_metadata };
  tokio::spawn(deliver(state, submission, return_channel));

  StatusCode::OK.into_response()
}

fn errors(block: &str, message: &str) -> Response { Json(modal::field_error(block, message)).into_response() }

/// Checks that need the Web API: the recipient exists and, when a channel
/// was picked, the bot can see it. Other lookup failures are left for
/// delivery to report.
async fn check_reachable(client: &SlackClient, submission: &Submission) -> Result<(), Response> {
  if let Err(e) = client.lookup_user(&submission.to_user_id).await {
    warn!(to_user_id = %submission.to_user_id, error = %e, "recipient lookup failed");
    return Err(errors(RECIPIENT_BLOCK, "Could not find this team member."));
  }

  if let Some(channel_id) = submission.channel_id.as_deref()
    && let Err(e) = client.lookup_channel(channel_id).await
  {
    if e.api_code() == Some("channel_not_found") {
      return Err(errors(
        CHANNEL_BLOCK,
        "Bot cannot access this channel. If it is private, please invite the bot to the channel first.",
      ));
    }
    warn!(%channel_id, error = %e, "channel lookup failed; trying delivery anyway");
  }

  Ok(())
}

// ─── Delivery ────────────────────────────────────────────────────────────────

/// Runs after the modal has closed.
async fn deliver<S>(state: SlackState<S>, mut submission: Submission, return_channel: String)
where
  S: KudosStore,
{
  let client = state.client.as_ref();
  let sender = submission.from_user_id.clone();

  match client.lookup_user(&sender).await {
    Ok(profile) => submission.from_user_name = profile.display_name,
    Err(e) => warn!(user_id = %sender, error = %e, "sender lookup failed; using their handle"),
  }

  let emoji = submission.emoji().to_owned();
  let text = match submission::submit(state.store.as_ref(), client, submission).await {
    Ok(receipt) => {
      info!(id = receipt.id, "kudos submitted from Slack");
      confirmation(&emoji, &receipt)
    }
    Err(e) => {
      warn!(user_id = %sender, error = %e, "kudos submission failed");
      "Sorry, there was an error sending the kudos. Please try again.".to_owned()
    }
  };

  if let Err(e) = client.post_ephemeral(&return_channel, &sender, &text).await {
    warn!(user_id = %sender, error = %e, "could not confirm kudos to the sender");
  }
}

/// The ephemeral summary shown to the sender.
pub fn confirmation(emoji: &str, receipt: &Receipt) -> String {
  let mut lines = vec![
    format!("✅ Kudos sent successfully! {emoji}"),
    String::new(),
    format!("Visibility: {}", receipt.visibility.label()),
  ];
  if receipt.sent_dm {
    lines.push("✓ Direct message sent".to_owned());
  }
  if receipt.sent_channel {
    lines.push(format!("✓ Posted in {}", receipt.channel_name.as_deref().unwrap_or("channel")));
  }
  if !receipt.sent_dm && !receipt.sent_channel {
    lines.push("⚠️ Note: There was an issue sending the kudos. Please try again.".to_owned());
  }
  lines.join("\n")
}

//! The "Send Kudos" modal: the view opened by `/kudos`, and the parsing of
//! what comes back when it is submitted.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Value, json};

use kudos_core::{
  kudos::Visibility,
  submission::{DEFAULT_EMOJI, MIN_MESSAGE_CHARS, Submission, ValidationError},
};

/// `callback_id` of the kudos modal; other views are ignored.
pub const CALLBACK_ID: &str = "kudos_modal";

pub const EMOJIS: [&str; 10] = ["🎉", "👏", "🌟", "💯", "🔥", "✨", "🙌", "💪", "🚀", "⭐"];

// Block and action ids. Field errors are reported against the block id.
pub const RECIPIENT_BLOCK: &str = "recipient_block";
pub const MESSAGE_BLOCK: &str = "message_block";
pub const EMOJI_BLOCK: &str = "emoji_block";
pub const VISIBILITY_BLOCK: &str = "visibility_block";
pub const POSTING_BLOCK: &str = "posting_options_block";
pub const CHANNEL_BLOCK: &str = "channel_block";

const RECIPIENT: &str = "recipient";
const MESSAGE: &str = "message";
const EMOJI: &str = "emoji";
const VISIBILITY: &str = "visibility";
const POSTING: &str = "posting_options";
const CHANNEL: &str = "channel";

// ─── View ────────────────────────────────────────────────────────────────────

fn plain(text: &str) -> Value { json!({ "type": "plain_text", "text": text, "emoji": true }) }

fn option(text: &str, value: &str) -> Value { json!({ "text": plain(text), "value": value }) }

fn visibility_option(visibility: Visibility, description: &str) -> Value {
  json!({
    "text": plain(visibility.label()),
    "value": visibility.as_ref(),
    "description": plain(description),
  })
}

/// The modal opened for `requester`. `return_channel` travels in
/// `private_metadata` so the confirmation lands where `/kudos` was typed.
pub fn kudos_form(requester: &str, return_channel: &str) -> Value {
  let public = visibility_option(Visibility::Public, "Visible to everyone");
  let private = visibility_option(Visibility::Private, "Only visible to you, recipient, and managers");
  let dm = option("Send Direct Message to recipient", "dm");

  json!({
    "type": "modal",
    "callback_id": CALLBACK_ID,
    "private_metadata": return_channel,
    "title": plain("Send Kudos"),
    "submit": plain("Send Kudos"),
    "close": plain("Cancel"),
    "blocks": [
      {
        "type": "section",
        "text": {
          "type": "mrkdwn",
          "text": format!(
            "*Hey {requester}!* 👋\n\nSend kudos to recognize your team member's great work!"
          ),
        },
      },
      { "type": "divider" },
      {
        "type": "input",
        "block_id": RECIPIENT_BLOCK,
        "label": plain("Team Member"),
        "element": {
          "type": "users_select",
          "action_id": RECIPIENT,
          "placeholder": plain("Select a team member"),
        },
      },
      {
        "type": "input",
        "block_id": MESSAGE_BLOCK,
        "label": plain("Kudos Message"),
        "element": {
          "type": "plain_text_input",
          "action_id": MESSAGE,
          "multiline": true,
          "min_length": MIN_MESSAGE_CHARS,
          "placeholder": plain("What did they do that deserves kudos?"),
        },
      },
      {
        "type": "input",
        "block_id": EMOJI_BLOCK,
        "optional": true,
        "label": plain("Emoji"),
        "element": {
          "type": "static_select",
          "action_id": EMOJI,
          "initial_option": option(DEFAULT_EMOJI, DEFAULT_EMOJI),
          "options": EMOJIS.iter().map(|e| option(e, e)).collect::<Vec<_>>(),
        },
      },
      { "type": "divider" },
      {
        "type": "input",
        "block_id": VISIBILITY_BLOCK,
        "optional": true,
        "label": plain("Visibility"),
        "element": {
          "type": "radio_buttons",
          "action_id": VISIBILITY,
          "initial_option": public.clone(),
          "options": [public, private],
        },
      },
      { "type": "divider" },
      {
        "type": "input",
        "block_id": POSTING_BLOCK,
        "label": plain("Where should this kudos be sent?"),
        "element": {
          "type": "checkboxes",
          "action_id": POSTING,
          "initial_options": [dm.clone()],
          "options": [dm, option("Post in a channel", "channel")],
        },
      },
      {
        "type": "input",
        "block_id": CHANNEL_BLOCK,
        "optional": true,
        "label": plain("Channel (if posting to channel)"),
        "element": {
          "type": "conversations_select",
          "action_id": CHANNEL,
          "placeholder": plain("Select a channel"),
          "filter": { "include": ["public", "private"], "exclude_bot_users": true },
        },
      },
    ],
  })
}

// ─── Submission payload ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectedOption {
  pub value: String,
}

/// One input's state. Which field is set depends on the element type.
#[derive(Debug, Default, Deserialize)]
pub struct ElementState {
  pub value:                 Option<String>,
  pub selected_user:         Option<String>,
  pub selected_conversation: Option<String>,
  pub selected_option:       Option<SelectedOption>,
  #[serde(default)]
  pub selected_options:      Vec<SelectedOption>,
}

/// `view.state`: block id → action id → element state.
#[derive(Debug, Default, Deserialize)]
pub struct ViewState {
  #[serde(default)]
  pub values: HashMap<String, HashMap<String, ElementState>>,
}

impl ViewState {
  fn element(&self, block: &str, action: &str) -> Option<&ElementState> {
    self.values.get(block)?.get(action)
  }
}

/// The modal's fields, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KudosForm {
  pub recipient:  Option<String>,
  pub message:    String,
  pub emoji:      Option<String>,
  pub visibility: Visibility,
  pub dm:         bool,
  pub channel:    bool,
  pub channel_id: Option<String>,
}

impl KudosForm {
  pub fn from_state(state: &ViewState) -> Self {
    let posting: Vec<&str> = state
      .element(POSTING_BLOCK, POSTING)
      .map(|e| e.selected_options.iter().map(|o| o.value.as_str()).collect())
      .unwrap_or_default();
    let selected = |block, action| {
      state
        .element(block, action)
        .and_then(|e| e.selected_option.as_ref())
        .map(|o| o.value.clone())
    };

    Self {
      recipient:  state.element(RECIPIENT_BLOCK, RECIPIENT).and_then(|e| e.selected_user.clone()),
      message:    state
        .element(MESSAGE_BLOCK, MESSAGE)
        .and_then(|e| e.value.clone())
        .unwrap_or_default(),
      emoji:      selected(EMOJI_BLOCK, EMOJI),
      visibility: selected(VISIBILITY_BLOCK, VISIBILITY)
        .and_then(|v| Visibility::decode(&v).ok())
        .unwrap_or_default(),
      dm:         posting.contains(&"dm"),
      channel:    posting.contains(&"channel"),
      channel_id: state
        .element(CHANNEL_BLOCK, CHANNEL)
        .and_then(|e| e.selected_conversation.clone()),
    }
  }

  /// The orchestrator's view of this form, sent by `from_user_id`.
  pub fn into_submission(self, from_user_id: &str, from_user_name: &str) -> Submission {
    Submission {
      from_user_id:   from_user_id.to_owned(),
      from_user_name: from_user_name.to_owned(),
      to_user_id:     self.recipient.unwrap_or_default(),
      message:        self.message,
      emoji:          self.emoji,
      visibility:     self.visibility,
      wants_dm:       self.dm,
      wants_channel:  self.channel,
      channel_id:     self.channel_id.filter(|_| self.channel),
    }
  }
}

// ─── Field errors ────────────────────────────────────────────────────────────

/// A `response_action: errors` body, which keeps the modal open and shows
/// `message` under `block`.
pub fn field_error(block: &str, message: &str) -> Value {
  json!({ "response_action": "errors", "errors": { block: message } })
}

/// The block a validation failure belongs to.
pub fn block_for(error: &ValidationError) -> &'static str {
  match error {
    ValidationError::MissingField("toUserId") | ValidationError::UnknownRecipient(_) => RECIPIENT_BLOCK,
    ValidationError::PrivateToChannel => POSTING_BLOCK,
    ValidationError::MissingChannel => CHANNEL_BLOCK,
    ValidationError::MissingField(_) | ValidationError::MessageTooShort => MESSAGE_BLOCK,
  }
}

//! Slack integration: a Web API client implementing
//! [`kudos_core::chat::ChatPlatform`], and the `/kudos` slash command with
//! the modal it opens.
//!
//! Only the handful of Web API methods the kudos flows need are wrapped.
//! Every call goes through the `{ "ok": bool, "error": "..." }` envelope, and
//! `ok: false` surfaces as [`Error::Api`].

mod client;
mod wire;

pub mod error;
pub mod interactions;
pub mod modal;
pub mod signature;

pub use client::{SlackClient, SlackConfig};
pub use error::{Error, Result};
pub use interactions::SlackState;

//! JSON REST API for the kudos service.
//!
//! Exposes an axum [`Router`] backed by any [`KudosStore`] and
//! [`ChatPlatform`]. TLS, static assets and process lifecycle are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kudos_api::api_router(state))
//! ```

pub mod auth;
pub mod directory;
pub mod error;
pub mod kudos;
pub mod managers;
pub mod params;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kudos_core::{chat::ChatPlatform, store::KudosStore};
use serde::{Deserialize, Serialize};

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Default and maximum row counts for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// `/kudos` and `/kudos/public`.
  pub default_feed:        u32,
  /// `/kudos/user/*` and `/kudos/sent/*`.
  pub default_user:        u32,
  pub default_leaderboard: u32,
  /// Requests above this are clamped to it.
  pub max:                 u32,
}

impl Default for Limits {
  fn default() -> Self {
    Self { default_feed: 50, default_user: 10, default_leaderboard: 10, max: 500 }
  }
}

/// Settings the handlers consult per request.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
  /// HMAC key for viewer tokens. `None` serves every caller as anonymous.
  pub session_secret: Option<String>,
  /// Users allowed to edit manager relationships.
  pub admin_user_ids: Vec<String>,
  pub limits:         Limits,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, C> {
  pub store:  Arc<S>,
  pub chat:   Arc<C>,
  pub config: Arc<ApiConfig>,
}

impl<S, C> Clone for ApiState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      chat:   Arc::clone(&self.chat),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The `{ "success": true, "data": ..., "count": n }` body every successful
/// response is wrapped in.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    T,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub count:   Option<usize>,
}

impl<T> Envelope<T> {
  pub fn data(data: T) -> Self { Self { success: true, data, count: None } }
}

impl<T> Envelope<Vec<T>> {
  pub fn list(data: Vec<T>) -> Self {
    let count = Some(data.len());
    Self { success: true, data, count }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: ApiState<S, C>) -> Router<()>
where
  S: KudosStore + 'static,
  C: ChatPlatform + 'static,
{
  Router::new()
    // Kudos
    .route("/kudos", get(kudos::list_all::<S, C>))
    .route("/kudos/public", get(kudos::list_public::<S, C>))
    .route("/kudos/user/{user_id}", get(kudos::received::<S, C>))
    .route("/kudos/sent/{user_id}", get(kudos::sent::<S, C>))
    .route("/kudos/send", post(kudos::send::<S, C>))
    // Aggregates
    .route("/stats", get(stats::stats::<S, C>))
    .route("/leaderboard", get(stats::leaderboard::<S, C>))
    // Directory
    .route("/team-members", get(directory::team_members::<S, C>))
    .route("/channels", get(directory::channels::<S, C>))
    // Manager relationships
    .route("/managers/{user_id}", get(managers::get_one::<S, C>).put(managers::set::<S, C>))
    .route("/managers/{user_id}/reports", get(managers::reports::<S, C>))
    .with_state(state)
}

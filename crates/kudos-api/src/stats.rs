//! Handlers for `/stats` and `/leaderboard`.
//!
//! Both aggregate over every record regardless of visibility; they expose
//! counts and names, never message text.

use axum::{
  Json,
  extract::{Query, State},
};

use kudos_core::{
  chat::ChatPlatform,
  kudos::{LeaderboardEntry, Stats},
  store::KudosStore,
};

use crate::{ApiState, Envelope, error::ApiError, params::ListParams};

/// `GET /stats`
pub async fn stats<S, C>(
  State(state): State<ApiState<S, C>>,
) -> Result<Json<Envelope<Stats>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let stats = state.store.stats().await.map_err(ApiError::store)?;
  Ok(Json(Envelope::data(stats)))
}

/// `GET /leaderboard[?limit=n]`
pub async fn leaderboard<S, C>(
  State(state): State<ApiState<S, C>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<LeaderboardEntry>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let limits = state.config.limits;
  let limit = params.limit(limits.default_leaderboard, limits.max)?;
  let entries = state.store.leaderboard(limit).await.map_err(ApiError::store)?;
  Ok(Json(Envelope::list(entries)))
}

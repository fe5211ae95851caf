//! Pass-through listings from the chat platform, used to fill the web form's
//! recipient and channel pickers.

use axum::{Json, extract::State};

use kudos_core::{
  chat::{ChannelSummary, ChatPlatform, TeamMember},
  store::KudosStore,
};

use crate::{ApiState, Envelope, error::ApiError};

/// `GET /team-members`
pub async fn team_members<S, C>(
  State(state): State<ApiState<S, C>>,
) -> Result<Json<Envelope<Vec<TeamMember>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let members = state.chat.team_members().await.map_err(ApiError::chat)?;
  Ok(Json(Envelope::list(members)))
}

/// `GET /channels`
pub async fn channels<S, C>(
  State(state): State<ApiState<S, C>>,
) -> Result<Json<Envelope<Vec<ChannelSummary>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let channels = state.chat.channels().await.map_err(ApiError::chat)?;
  Ok(Json(Envelope::list(channels)))
}

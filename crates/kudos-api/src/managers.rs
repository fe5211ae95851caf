//! Handlers for `/managers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/managers/{user_id}` | `{ userId, managerId }`; 404 when none is set |
//! | `PUT`  | `/managers/{user_id}` | Body: `{ "managerId": "..." }`; administrators only |
//! | `GET`  | `/managers/{user_id}/reports` | Direct reports only, not the whole subtree |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use kudos_core::{chat::ChatPlatform, store::KudosStore};

use crate::{ApiState, Envelope, auth::Caller, error::ApiError, params::JsonBody};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
  pub user_id:    String,
  pub manager_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetManagerBody {
  pub manager_id: String,
}

/// `GET /managers/{user_id}`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(user_id): Path<String>,
) -> Result<Json<Envelope<Relationship>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let manager_id = state
    .store
    .get_manager(&user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no manager recorded for {user_id}")))?;
  Ok(Json(Envelope::data(Relationship { user_id, manager_id })))
}

/// `PUT /managers/{user_id}`
pub async fn set<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  Path(user_id): Path<String>,
  JsonBody(body): JsonBody<SetManagerBody>,
) -> Result<Json<Envelope<Relationship>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let admin = caller.require_admin(&state.config.admin_user_ids)?;

  let manager_id = body.manager_id.trim().to_owned();
  if manager_id.is_empty() {
    return Err(ApiError::BadRequest("managerId is required".into()));
  }
  if manager_id == user_id {
    return Err(ApiError::BadRequest("a user cannot manage themselves".into()));
  }

  state.store.set_manager(&user_id, &manager_id).await.map_err(ApiError::store)?;
  info!(%admin, %user_id, %manager_id, "manager relationship set");

  Ok(Json(Envelope::data(Relationship { user_id, manager_id })))
}

/// `GET /managers/{user_id}/reports`
pub async fn reports<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(manager_id): Path<String>,
) -> Result<Json<Envelope<Vec<String>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let reports = state.store.direct_reports(&manager_id).await.map_err(ApiError::store)?;
  Ok(Json(Envelope::list(reports)))
}

//! Handlers for `/kudos` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/kudos` | `?limit`, `?visibility=public\|private` |
//! | `GET`  | `/kudos/public` | `?limit` |
//! | `GET`  | `/kudos/user/{user_id}` | Received; `?limit`, `?includePrivate` (default `true`) |
//! | `GET`  | `/kudos/sent/{user_id}` | `?limit` |
//! | `POST` | `/kudos/send` | Body: [`SendBody`]; returns the delivery [`Receipt`] |
//!
//! Every read is filtered through the visibility policy for the [`Caller`]
//! after the store query, so a page may hold fewer than `limit` records.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use kudos_core::{
  chat::ChatPlatform,
  kudos::{Kudos, Visibility},
  store::KudosStore,
  submission::{self, Receipt, Submission},
  visibility::retain_visible,
};

use crate::{
  ApiState, Envelope,
  auth::Caller,
  error::ApiError,
  params::{JsonBody, ListParams},
};

async fn visible<S, C>(
  state: &ApiState<S, C>,
  caller: &Caller,
  records: Vec<Kudos>,
) -> Result<Json<Envelope<Vec<Kudos>>>, ApiError>
where
  S: KudosStore,
{
  let records = retain_visible(state.store.as_ref(), &caller.0, records)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Envelope::list(records)))
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// `GET /kudos[?limit=n][&visibility=public|private]`
pub async fn list_all<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<Kudos>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let limits = state.config.limits;
  let limit = params.limit(limits.default_feed, limits.max)?;
  let records = state
    .store
    .list_all(limit, params.visibility()?)
    .await
    .map_err(ApiError::store)?;
  visible(&state, &caller, records).await
}

/// `GET /kudos/public[?limit=n]`
pub async fn list_public<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<Kudos>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let limits = state.config.limits;
  let limit = params.limit(limits.default_feed, limits.max)?;
  let records = state.store.list_public(limit).await.map_err(ApiError::store)?;
  visible(&state, &caller, records).await
}

// ─── Per user ────────────────────────────────────────────────────────────────

/// `GET /kudos/user/{user_id}[?limit=n][&includePrivate=false]`
pub async fn received<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  Path(user_id): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<Kudos>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let limits = state.config.limits;
  let limit = params.limit(limits.default_user, limits.max)?;
  let records = state
    .store
    .list_by_recipient(&user_id, limit, params.include_private())
    .await
    .map_err(ApiError::store)?;
  visible(&state, &caller, records).await
}

/// `GET /kudos/sent/{user_id}[?limit=n]`
pub async fn sent<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  Path(user_id): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Envelope<Vec<Kudos>>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let limits = state.config.limits;
  let limit = params.limit(limits.default_user, limits.max)?;
  let records = state.store.list_by_sender(&user_id, limit).await.map_err(ApiError::store)?;
  visible(&state, &caller, records).await
}

// ─── Send ────────────────────────────────────────────────────────────────────

fn yes() -> bool { true }

/// JSON body accepted by `POST /kudos/send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
  #[serde(default)]
  pub from_user_id:   String,
  #[serde(default)]
  pub from_user_name: String,
  #[serde(default)]
  pub to_user_id:     String,
  #[serde(default)]
  pub message:        String,
  pub emoji:          Option<String>,
  pub visibility:     Option<String>,
  #[serde(default = "yes")]
  pub send_dm:        bool,
  /// Posting to a channel is requested by naming one.
  pub channel_id:     Option<String>,
}

impl SendBody {
  fn into_submission(self) -> Result<Submission, ApiError> {
    let visibility = match self.visibility.as_deref() {
      None | Some("") => Visibility::default(),
      Some(v) => Visibility::decode(v).map_err(|_| {
        ApiError::BadRequest(format!("visibility must be \"public\" or \"private\", got {v:?}"))
      })?,
    };
    let channel_id = self.channel_id.filter(|c| !c.trim().is_empty());

    Ok(Submission {
      from_user_id: self.from_user_id,
      from_user_name: self.from_user_name,
      to_user_id: self.to_user_id,
      message: self.message,
      emoji: self.emoji,
      visibility,
      wants_dm: self.send_dm,
      wants_channel: channel_id.is_some(),
      channel_id,
    })
  }
}

/// `POST /kudos/send`
///
/// A verified caller may only send as themselves; anonymous submissions are
/// accepted as-is.
pub async fn send<S, C>(
  State(state): State<ApiState<S, C>>,
  caller: Caller,
  JsonBody(body): JsonBody<SendBody>,
) -> Result<Json<Envelope<Receipt>>, ApiError>
where
  S: KudosStore,
  C: ChatPlatform,
{
  let submission = body.into_submission()?;

  if let Some(id) = caller.user_id() {
    if id != submission.from_user_id {
      return Err(ApiError::Forbidden("kudos can only be sent as yourself".into()));
    }
  }

  let receipt = submission::submit(state.store.as_ref(), state.chat.as_ref(), submission).await?;
  Ok(Json(Envelope::data(receipt)))
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use kudos_core::submission::{SubmitError, ValidationError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("invalid or forged viewer token")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("chat platform error: {0}")]
  Chat(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self { Self::Store(Box::new(e)) }

  pub fn chat(e: impl std::error::Error + Send + Sync + 'static) -> Self { Self::Chat(Box::new(e)) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<ValidationError> for ApiError {
  fn from(e: ValidationError) -> Self { Self::BadRequest(e.to_string()) }
}

impl<E> From<SubmitError<E>> for ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(e: SubmitError<E>) -> Self {
    match e {
      SubmitError::Invalid(v) => v.into(),
      SubmitError::Store(e) => Self::store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Store(_) | ApiError::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
  }
}

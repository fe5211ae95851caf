//! Error type for `kudos-slack`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} returned HTTP {status}")]
  Status { method: &'static str, status: reqwest::StatusCode },

  #[error("{method} failed: {error}")]
  Api { method: &'static str, error: String },

  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),
}

impl Error {
  /// The Web API's `error` code, when the call came back `ok: false`.
  pub fn api_code(&self) -> Option<&str> {
    match self {
      Self::Api { error, .. } => Some(error.as_str()),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

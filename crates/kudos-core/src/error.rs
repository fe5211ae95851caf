//! Error types for `kudos-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown visibility: {0:?}")]
  UnknownVisibility(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

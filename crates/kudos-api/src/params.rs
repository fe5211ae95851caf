//! Request parsing shared by the handlers.
//!
//! Query parameters arrive as raw strings and JSON bodies go through
//! [`JsonBody`], so a malformed request becomes a uniform 400 envelope
//! instead of axum's plain-text rejection.

use axum::extract::FromRequest;
use serde::Deserialize;

use kudos_core::kudos::Visibility;

use crate::error::ApiError;

/// [`axum::Json`] whose rejections render as [`ApiError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub limit:           Option<String>,
  pub visibility:      Option<String>,
  pub include_private: Option<String>,
}

impl ListParams {
  /// The requested row count: `default` when absent, clamped to `max`.
  /// Zero and non-numeric values are rejected.
  pub fn limit(&self, default: u32, max: u32) -> Result<u32, ApiError> {
    let Some(raw) = self.limit.as_deref() else {
      return Ok(default.min(max));
    };
    match raw.trim().parse::<u64>() {
      Ok(0) | Err(_) => Err(ApiError::BadRequest(format!(
        "limit must be a positive integer, got {raw:?}"
      ))),
      Ok(n) => Ok(n.min(u64::from(max)) as u32),
    }
  }

  pub fn visibility(&self) -> Result<Option<Visibility>, ApiError> {
    self
      .visibility
      .as_deref()
      .map(|v| {
        Visibility::decode(v).map_err(|_| {
          ApiError::BadRequest(format!("visibility must be \"public\" or \"private\", got {v:?}"))
        })
      })
      .transpose()
  }

  /// Defaults to `true`; only the literal `false` turns it off.
  pub fn include_private(&self) -> bool { self.include_private.as_deref() != Some("false") }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn with_limit(limit: &str) -> ListParams {
    ListParams { limit: Some(limit.to_owned()), ..Default::default() }
  }

  #[test]
  fn limit_defaults_and_clamps() {
    assert_eq!(ListParams::default().limit(50, 500).unwrap(), 50);
    assert_eq!(with_limit("7").limit(50, 500).unwrap(), 7);
    assert_eq!(with_limit("100000").limit(50, 500).unwrap(), 500);
  }

  #[test]
  fn bad_limits_are_rejected() {
    for raw in ["0", "-3", "ten", ""] {
      assert!(matches!(with_limit(raw).limit(50, 500), Err(ApiError::BadRequest(_))), "{raw:?}");
    }
  }

  #[test]
  fn visibility_filter() {
    let p = ListParams { visibility: Some("private".into()), ..Default::default() };
    assert_eq!(p.visibility().unwrap(), Some(Visibility::Private));
    assert_eq!(ListParams::default().visibility().unwrap(), None);

    let p = ListParams { visibility: Some("secret".into()), ..Default::default() };
    assert!(p.visibility().is_err());
  }

  #[test]
  fn include_private_is_opt_out() {
    assert!(ListParams::default().include_private());
    let p = ListParams { include_private: Some("false".into()), ..Default::default() };
    assert!(!p.include_private());
    let p = ListParams { include_private: Some("0".into()), ..Default::default() };
    assert!(p.include_private());
  }
}

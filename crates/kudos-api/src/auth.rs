//! Viewer tokens and the [`Caller`] extractor.
//!
//! A token is `<user_id>.<hex HMAC-SHA256(session_secret, user_id)>`, sent as
//! `Authorization: Bearer <token>`. Tokens are minted by whatever signs users
//! in; this crate only verifies them. A request without a token is served as
//! anonymous, and a request carrying a bad token is rejected outright.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use kudos_core::visibility::Viewer;

use crate::{ApiState, error::ApiError};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, user_id: &str) -> Option<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
  mac.update(user_id.as_bytes());
  Some(mac)
}

/// Mint a viewer token for `user_id`.
pub fn issue_token(secret: &str, user_id: &str) -> Option<String> {
  if user_id.is_empty() || user_id.contains('.') {
    return None;
  }
  let signature = mac(secret, user_id)?.finalize().into_bytes();
  Some(format!("{user_id}.{}", hex::encode(signature)))
}

/// Return the user id a token was issued for, if its signature checks out.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
  let (user_id, signature) = token.rsplit_once('.')?;
  if user_id.is_empty() {
    return None;
  }
  let signature = hex::decode(signature).ok()?;
  mac(secret, user_id)?.verify_slice(&signature).ok()?;
  Some(user_id.to_owned())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The identity a request is served for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Viewer);

impl Caller {
  pub fn user_id(&self) -> Option<&str> { self.0.user_id() }

  /// The caller's id, provided it is listed as an administrator.
  pub fn require_admin(&self, admins: &[String]) -> Result<&str, ApiError> {
    match self.user_id() {
      Some(id) if admins.iter().any(|a| a == id) => Ok(id),
      Some(_) => Err(ApiError::Forbidden("administrator access required".into())),
      None => Err(ApiError::Unauthorized),
    }
  }
}

impl<S, C> FromRequestParts<ApiState<S, C>> for Caller
where
  S: Send + Sync,
  C: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
      return Ok(Caller(Viewer::Anonymous));
    };
    // Without a secret nobody can be verified, so everyone is anonymous.
    let Some(secret) = state.config.session_secret.as_deref() else {
      return Ok(Caller(Viewer::Anonymous));
    };

    let token = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Bearer "))
      .ok_or(ApiError::Unauthorized)?;
    let user_id = verify_token(secret, token.trim()).ok_or(ApiError::Unauthorized)?;

    Ok(Caller(Viewer::User(user_id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "correct horse battery staple";

  #[test]
  fn issued_tokens_verify() {
    let token = issue_token(SECRET, "U123").unwrap();
    assert!(token.starts_with("U123."));
    assert_eq!(verify_token(SECRET, &token).as_deref(), Some("U123"));
  }

  #[test]
  fn wrong_secret_fails() {
    let token = issue_token(SECRET, "U123").unwrap();
    assert_eq!(verify_token("another secret", &token), None);
  }

  #[test]
  fn tampered_user_fails() {
    let token = issue_token(SECRET, "U123").unwrap();
    let forged = token.replacen("U123", "U999", 1);
    assert_eq!(verify_token(SECRET, &forged), None);
  }

  #[test]
  fn malformed_tokens_fail() {
    for token in ["", "U123", "U123.", ".abcd", "U123.not-hex", "U123.abcd"] {
      assert_eq!(verify_token(SECRET, token), None, "{token:?}");
    }
  }

  #[test]
  fn ids_with_separator_are_not_issued() {
    assert_eq!(issue_token(SECRET, ""), None);
    assert_eq!(issue_token(SECRET, "a.b"), None);
  }

  #[test]
  fn admin_check() {
    let admins = vec!["UADMIN".to_owned()];
    assert_eq!(Caller(Viewer::user("UADMIN")).require_admin(&admins).unwrap(), "UADMIN");
    assert!(matches!(
      Caller(Viewer::user("U1")).require_admin(&admins),
      Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
      Caller(Viewer::Anonymous).require_admin(&admins),
      Err(ApiError::Unauthorized)
    ));
  }
}

//! Verification of Slack's signed requests.
//!
//! Slack signs every slash command and interaction with
//! `v0=<hex HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}")>` in
//! `X-Slack-Signature`, and sends the timestamp in
//! `X-Slack-Request-Timestamp`. Requests older than five minutes are refused
//! so a captured request cannot be replayed.

use std::sync::Arc;

use axum::{
  body::Body,
  extract::{Request, State},
  http::{HeaderMap, StatusCode},
  middleware::Next,
  response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Largest clock difference accepted between Slack and us.
pub const MAX_SKEW_SECS: i64 = 5 * 60;

/// Slash-command and interaction payloads are small form posts.
const MAX_BODY_BYTES: usize = 1024 * 1024;

fn mac(secret: &str, timestamp: &str, body: &[u8]) -> Option<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
  mac.update(b"v0:");
  mac.update(timestamp.as_bytes());
  mac.update(b":");
  mac.update(body);
  Some(mac)
}

/// The `X-Slack-Signature` value Slack would send for `body`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Option<String> {
  let digest = mac(secret, timestamp, body)?.finalize().into_bytes();
  Some(format!("v0={}", hex::encode(digest)))
}

/// Check `signature` over `body`, and that `timestamp` is within
/// [`MAX_SKEW_SECS`] of `now` (Unix seconds).
pub fn verify(secret: &str, timestamp: &str, body: &[u8], signature: &str, now: i64) -> bool {
  let Ok(sent_at) = timestamp.parse::<i64>() else {
    return false;
  };
  if (now - sent_at).abs() > MAX_SKEW_SECS {
    return false;
  }
  let Some(digest) = signature.strip_prefix("v0=").and_then(|h| hex::decode(h).ok()) else {
    return false;
  };
  mac(secret, timestamp, body).is_some_and(|m| m.verify_slice(&digest).is_ok())
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
  headers.get(name).and_then(|v| v.to_str().ok())
}

/// Middleware rejecting any request without a valid Slack signature. The
/// body is buffered for the check and handed on unchanged.
pub async fn require_signature(
  State(secret): State<Arc<str>>,
  req: Request,
  next: Next,
) -> Result<Response, StatusCode> {
  let (parts, body) = req.into_parts();
  let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
    .await
    .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

  let valid = match (header(&parts.headers, TIMESTAMP_HEADER), header(&parts.headers, SIGNATURE_HEADER)) {
    (Some(timestamp), Some(signature)) => {
      verify(&secret, timestamp, &body, signature, chrono::Utc::now().timestamp())
    }
    _ => false,
  };
  if !valid {
    warn!(path = %parts.uri.path(), "rejected request with a missing or invalid Slack signature");
    return Err(StatusCode::UNAUTHORIZED);
  }

  Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
  const BODY: &[u8] = b"token=x&user_id=U1&command=%2Fkudos&trigger_id=1.2.3";

  #[test]
  fn signed_bodies_verify() {
    let signature = sign(SECRET, "1531420618", BODY).unwrap();
    assert!(signature.starts_with("v0="));
    assert!(verify(SECRET, "1531420618", BODY, &signature, 1531420618));
    assert!(verify(SECRET, "1531420618", BODY, &signature, 1531420618 + MAX_SKEW_SECS));
  }

  #[test]
  fn tampering_is_detected() {
    let signature = sign(SECRET, "1531420618", BODY).unwrap();
    assert!(!verify("another-secret", "1531420618", BODY, &signature, 1531420618));
    assert!(!verify(SECRET, "1531420619", BODY, &signature, 1531420618));
    assert!(!verify(SECRET, "1531420618", b"token=x&user_id=U2", &signature, 1531420618));
    assert!(!verify(SECRET, "1531420618", BODY, signature.trim_start_matches("v0="), 1531420618));
    assert!(!verify(SECRET, "1531420618", BODY, "v0=zz", 1531420618));
  }

  #[test]
  fn stale_requests_are_refused() {
    let signature = sign(SECRET, "1531420618", BODY).unwrap();
    assert!(!verify(SECRET, "1531420618", BODY, &signature, 1531420618 + MAX_SKEW_SECS + 1));
    assert!(!verify(SECRET, "not-a-time", BODY, &signature, 1531420618));
  }
}

//! The top-level router and the serve loop.
//!
//! The API is nested under `/api`, the Slack entry points under `/slack`
//! when a signing secret is configured, and the web portal takes every other
//! path.

use std::{path::Path, sync::Arc};

use anyhow::Context as _;
use axum::{Json, Router, routing::get};
use kudos_api::ApiState;
use kudos_core::{chat::ChatPlatform, store::KudosStore};
use kudos_slack::{SlackClient, SlackState};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::{
  services::{ServeDir, ServeFile},
  trace::TraceLayer,
};

use crate::config::ServerConfig;

/// `/health`, the API under `/api`, the Slack entry points under `/slack`
/// when given, and, when `static_dir` is set, the web portal for everything
/// else. Unknown paths fall back to `index.html` so client-side routes
/// resolve.
pub fn router<S, C>(state: ApiState<S, C>, slack: Option<Router>, static_dir: Option<&Path>) -> Router
where
  S: KudosStore + 'static,
  C: ChatPlatform + 'static,
{
  let mut app = Router::new()
    .route("/health", get(health))
    .nest("/api", kudos_api::api_router(state));

  if let Some(slack) = slack {
    app = app.nest("/slack", slack);
  }

  if let Some(dir) = static_dir {
    let index = ServeFile::new(dir.join("index.html"));
    app = app.fallback_service(ServeDir::new(dir).fallback(index));
  }

  app.layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "timestamp": chrono::Utc::now() }))
}

/// Serve until SIGINT or SIGTERM, then close `store`.
pub async fn run<S>(store: S, slack: SlackClient, config: &ServerConfig) -> anyhow::Result<()>
where
  S: KudosStore + 'static,
{
  let store = Arc::new(store);
  let slack = Arc::new(slack);
  let state = ApiState {
    store:  Arc::clone(&store),
    chat:   Arc::clone(&slack),
    config: Arc::new(config.api_config()),
  };

  let interactions = match config.signing_secret() {
    Some(secret) => Some(kudos_slack::interactions::router(SlackState {
      store:          Arc::clone(&store),
      client:         slack,
      signing_secret: secret.into(),
    })),
    None => {
      tracing::info!("slack_signing_secret is not set; the /kudos slash command is disabled");
      None
    }
  };

  let app = router(state, interactions, config.static_dir.as_deref());
  let address = format!("{}:{}", config.host, config.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shutting down");
  store.close().await.context("failed to close store")?;
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::warn!("failed to listen for ctrl-c: {e}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::warn!("failed to install SIGTERM handler: {e}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use kudos_slack::SlackConfig;
  use kudos_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn state() -> ApiState<SqliteStore, SlackClient> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let chat = SlackClient::new(SlackConfig {
      api_base:  "http://127.0.0.1:9".into(),
      bot_token: String::new(),
    })
    .unwrap();
    ApiState {
      store:  Arc::new(store),
      chat:   Arc::new(chat),
      config: Arc::new(ServerConfig::default().api_config()),
    }
  }

  async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let resp = app
      .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
  }

  #[tokio::test]
  async fn health_reports_ok() {
    let (status, body) = get(router(state().await, None, None), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, body) = get(router(state().await, None, None), "/api/kudos").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 0);
  }

  #[tokio::test]
  async fn unknown_paths_serve_the_portal() {
    let dir = std::env::temp_dir().join(format!("kudos-portal-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>kudos</h1>").unwrap();

    let (status, body) = get(router(state().await, None, Some(&dir)), "/leaderboard/week").await;
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>kudos</h1>");
  }

  #[tokio::test]
  async fn slack_routes_are_nested_and_signed() {
    let state = state().await;
    let slack = kudos_slack::interactions::router(SlackState {
      store:          Arc::clone(&state.store),
      client:         Arc::clone(&state.chat),
      signing_secret: "secret".into(),
    });
    let app = router(state, Some(slack), None);

    let req = Request::post("/slack/commands")
      .header("content-type", "application/x-www-form-urlencoded")
      .body(Body::from("user_id=U1&trigger_id=1.2.3"))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn no_portal_means_404() {
    let (status, _) = get(router(state().await, None, None), "/leaderboard/week").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}

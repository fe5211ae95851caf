//! kudos-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens PostgreSQL
//! when `database_url` is set and SQLite otherwise, and serves the JSON API
//! plus the optional web portal over HTTP.
//!
//! # Viewer tokens
//!
//! To mint a bearer token that identifies a user to the API:
//!
//! ```
//! cargo run -p kudos-server -- --issue-token U012ABCDEF
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use kudos_server::{ServerConfig, StoreLocator};
use kudos_slack::SlackClient;
use kudos_store_postgres::PostgresStore;
use kudos_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kudos web API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a viewer token for USER_ID signed with `session_secret` and exit.
  #[arg(long, value_name = "USER_ID")]
  issue_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Helper mode: mint a token and exit.
  if let Some(user_id) = cli.issue_token {
    let secret = cfg
      .api_config()
      .session_secret
      .context("session_secret must be set to issue tokens")?;
    let token = kudos_api::auth::issue_token(&secret, &user_id)
      .context("user id must be non-empty and must not contain '.'")?;
    println!("{token}");
    return Ok(());
  }

  if cfg.slack_bot_token.is_empty() {
    tracing::warn!("slack_bot_token is not set; message delivery and directory lookups will fail");
  }
  let chat = SlackClient::new(cfg.slack_config()).context("failed to build Slack client")?;

  let locator = cfg.store_locator();
  tracing::info!("using {locator}");

  match locator {
    StoreLocator::Postgres(url) => {
      let store = PostgresStore::connect(&url)
        .await
        .context("failed to connect to PostgreSQL")?;
      kudos_server::run(store, chat, &cfg).await
    }
    StoreLocator::Sqlite(path) => {
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      kudos_server::run(store, chat, &cfg).await
    }
  }
}

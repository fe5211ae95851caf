//! Server configuration, read from an optional TOML file overlaid with
//! `KUDOS_*` environment variables.

use std::{
  fmt,
  path::{Path, PathBuf},
};

use kudos_api::{ApiConfig, Limits};
use kudos_slack::SlackConfig;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// PostgreSQL connection string. When set and non-blank, PostgreSQL is
  /// used instead of SQLite.
  pub database_url:         Option<String>,
  pub sqlite_path:          PathBuf,
  pub slack_bot_token:      String,
  pub slack_api_base:       String,
  /// Enables the `/kudos` slash command and its modal under `/slack`.
  pub slack_signing_secret: Option<String>,
  pub session_secret:       Option<String>,
  pub admin_user_ids:       Vec<String>,
  /// Built web portal, served for every path the API does not claim.
  pub static_dir:           Option<PathBuf>,
  pub limits:               Limits,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "0.0.0.0".into(),
      port:                 3001,
      database_url:         None,
      sqlite_path:          PathBuf::from("kudos.db"),
      slack_bot_token:      String::new(),
      slack_api_base:       "https://slack.com/api".into(),
      slack_signing_secret: None,
      session_secret:       None,
      admin_user_ids:       Vec::new(),
      static_dir:           None,
      limits:               Limits::default(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists), then apply `KUDOS_*` overrides. Nested keys
  /// use a double underscore, e.g. `KUDOS_LIMITS__MAX=100`.
  ///
  /// A bare `DATABASE_URL` is honoured when nothing else sets one, since
  /// that is what most PostgreSQL hosts export.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    let mut cfg: Self = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("KUDOS")
          .prefix_separator("_")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("admin_user_ids")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;

    if cfg.database_url.is_none() {
      cfg.database_url = std::env::var("DATABASE_URL").ok();
    }
    Ok(cfg)
  }

  /// Which backend to open. Decided once, at startup.
  pub fn store_locator(&self) -> StoreLocator {
    match self.database_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
      Some(url) => StoreLocator::Postgres(url.to_owned()),
      None => StoreLocator::Sqlite(expand_tilde(&self.sqlite_path)),
    }
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      session_secret: self.session_secret.clone().filter(|s| !s.is_empty()),
      admin_user_ids: self.admin_user_ids.clone(),
      limits:         self.limits,
    }
  }

  /// The Slack signing secret, unless unset or blank.
  pub fn signing_secret(&self) -> Option<&str> {
    self.slack_signing_secret.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  pub fn slack_config(&self) -> SlackConfig {
    SlackConfig {
      api_base:  self.slack_api_base.clone(),
      bot_token: self.slack_bot_token.clone(),
    }
  }
}

// ─── Backend selection ───────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub enum StoreLocator {
  Postgres(String),
  Sqlite(PathBuf),
}

/// Never prints the connection string; it may carry credentials.
impl fmt::Display for StoreLocator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Postgres(_) => f.write_str("PostgreSQL"),
      Self::Sqlite(path) => write!(f, "SQLite at {}", path.display()),
    }
  }
}

impl fmt::Debug for StoreLocator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

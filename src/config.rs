//! Loading application configuration (server + client sections) from TOML.
//!
//! Every field has a default, so an absent file or an absent section is fine.
//! Example:
//!
//! ```toml
//! [server]
//! port = 8000
//! test_length = 5
//! enable_dev_reset = true
//!
//! [client]
//! base_url = "http://127.0.0.1:8000"
//! inter_question_delay_ms = 1600
//! ```

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{error, info};

pub const CONFIG_PATH_ENV: &str = "EDUSMART_CONFIG_PATH";
pub const BASE_URL_ENV: &str = "EDUSMART_BASE_URL";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub client: ClientConfig,
}

/// Progress Engine settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub port: u16,
  /// Number of questions in one adaptive test run when the client does not ask for another length.
  pub test_length: usize,
  /// Exposes `POST /api/dev/reset`. Off unless explicitly enabled.
  pub enable_dev_reset: bool,
  pub static_dir: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      port: 8000,
      test_length: 5,
      enable_dev_reset: false,
      static_dir: PathBuf::from("./static"),
    }
  }
}

/// Student client settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  pub base_url: String,
  /// File holding the cached student (the session).
  pub session_path: PathBuf,
  pub test_length: usize,
  /// Pause between automated adaptive-test submissions; matches the UI animation.
  pub inter_question_delay_ms: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8000".into(),
      session_path: PathBuf::from(".edusmart/session.json"),
      test_length: 5,
      inter_question_delay_ms: 1600,
    }
  }
}

impl ClientConfig {
  pub fn inter_question_delay(&self) -> Duration {
    Duration::from_millis(self.inter_question_delay_ms)
  }
}

impl AppConfig {
  /// Load from `EDUSMART_CONFIG_PATH` (if set), then apply `PORT` / `EDUSMART_BASE_URL`.
  /// Read or parse failures are logged and fall back to defaults.
  pub fn from_env() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.server.port = port;
    }
    if let Ok(url) = std::env::var(BASE_URL_ENV) {
      if !url.trim().is_empty() {
        cfg.client.base_url = url;
      }
    }
    cfg
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var(CONFIG_PATH_ENV).ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "edusmart", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "edusmart", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "edusmart", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

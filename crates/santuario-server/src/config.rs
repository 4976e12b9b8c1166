//! Runtime server configuration.
//!
//! Read from a TOML file and overridden by `SANTUARIO_*` environment
//! variables (nested keys use `__`, e.g. `SANTUARIO_MENTOR__API_KEY`).

use std::path::{Path, PathBuf};

use santuario_api::UserCredentials;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/santuario/santuario.db") }

fn default_timeout_secs() -> u64 { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub users:      Vec<UserCredentials>,
  /// Absent means every mentor consultation uses the fixed fallback.
  #[serde(default)]
  pub mentor:     Option<MentorConfig>,
}

/// An OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MentorConfig {
  /// Base URL, e.g. `https://api.openai.com/v1`.
  pub endpoint:     String,
  #[serde(default)]
  pub api_key:      Option<String>,
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl ServerConfig {
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("SANTUARIO").separator("__"))
      .build()?
      .try_deserialize()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

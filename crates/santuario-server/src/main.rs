//! santuario server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API under `/api`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[users]]` entry in config.toml:
//!
//! ```
//! cargo run -p santuario-server -- --hash-password
//! ```
//!
//! # Loading content
//!
//! ```
//! cargo run -p santuario-server -- --import content.json
//! ```

mod config;
mod mentor;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::Router;
use clap::Parser;
use rand_core::OsRng;
use santuario_api::{AppState, AuthConfig};
use santuario_core::{content::ContentBundle, store::SantuarioStore};
use santuario_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  config::{ServerConfig, expand_tilde},
  mentor::HttpMentor,
};

#[derive(Parser)]
#[command(author, version, about = "Santuario journal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Replace the daily content with the collections in this JSON file and
  /// exit.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = cli.import {
    return import_content(&store, &path).await;
  }

  if server_cfg.users.is_empty() {
    tracing::warn!("no [[users]] configured; every request will be rejected");
  }

  let mut state = AppState::new(Arc::new(store), AuthConfig {
    users: server_cfg.users.clone(),
  });

  if let Some(mentor_cfg) = &server_cfg.mentor {
    let mentor = HttpMentor::new(mentor_cfg).context("failed to build mentor client")?;
    tracing::info!(endpoint = %mentor_cfg.endpoint, model = %mentor_cfg.model, "mentor enabled");
    state = state.with_mentor(Arc::new(mentor), Duration::from_secs(mentor_cfg.timeout_secs));
  } else {
    tracing::info!("no mentor configured; consultations use the fallback reflection");
  }

  let app = Router::new()
    .nest("/api", santuario_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Validate a content bundle, log every dropped record, and store the rest.
async fn import_content(store: &SqliteStore, path: &std::path::Path) -> anyhow::Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading content file {}", path.display()))?;
  let bundle = ContentBundle::from_json(&raw).context("parsing content bundle")?;

  let (snapshot, rejections) = bundle.validate();
  for r in &rejections {
    tracing::warn!(collection = %r.collection, index = r.index, reason = %r.reason, "record skipped");
  }

  let summary = store
    .import_content(snapshot)
    .await
    .context("storing content")?;

  tracing::info!(
    readings = summary.readings,
    philosophers = summary.philosophers,
    meditations = summary.meditations,
    tasks = summary.tasks,
    questions = summary.questions,
    skipped = rejections.len(),
    "content imported"
  );
  Ok(())
}

/// Read a password as one line of stdin. Input is echoed, so pipe it in
/// when the terminal is shared.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  read_password_line(io::stdin().lock())
}

fn read_password_line(mut input: impl std::io::BufRead) -> anyhow::Result<String> {
  let mut line = String::new();
  input.read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

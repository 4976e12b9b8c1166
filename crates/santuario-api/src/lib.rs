//! JSON REST API for Santuario.
//!
//! Exposes an axum [`Router`] backed by any
//! [`santuario_core::store::SantuarioStore`]. Every route requires HTTP Basic
//! auth; the authenticated username scopes all reads and writes. TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", santuario_api::api_router(state))
//! ```

pub mod auth;
pub mod daily;
pub mod error;
pub mod etag;
pub mod journal;
pub mod xp;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post, put},
};
use santuario_core::{
  mentor::{Mentor, Unavailable},
  store::SantuarioStore,
};

pub use auth::{AuthConfig, UserCredentials};
pub use error::ApiError;

/// How long a mentor call may take before the fallback is used.
pub const DEFAULT_MENTOR_TIMEOUT: Duration = Duration::from_secs(20);

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SantuarioStore> {
  pub store:          Arc<S>,
  pub auth:           Arc<AuthConfig>,
  pub mentor:         Arc<dyn Mentor>,
  pub mentor_timeout: Duration,
}

impl<S: SantuarioStore> AppState<S> {
  /// State with no mentor configured; every consultation falls back.
  pub fn new(store: Arc<S>, auth: AuthConfig) -> Self {
    Self {
      store,
      auth: Arc::new(auth),
      mentor: Arc::new(Unavailable),
      mentor_timeout: DEFAULT_MENTOR_TIMEOUT,
    }
  }

  pub fn with_mentor(mut self, mentor: Arc<dyn Mentor>, timeout: Duration) -> Self {
    self.mentor = mentor;
    self.mentor_timeout = timeout;
    self
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SantuarioStore + Clone + 'static,
{
  Router::new()
    // Daily content
    .route("/daily", get(daily::today::<S>))
    .route("/daily/reset", post(daily::reset::<S>))
    // Journal
    .route("/journal", get(journal::list::<S>).delete(journal::clear::<S>))
    .route("/journal/{date}", get(journal::get_one::<S>))
    .route("/journal/{date}/sections", post(journal::save_section::<S>))
    .route("/journal/{date}/mood", put(journal::set_mood::<S>))
    .route("/journal/{date}/challenge", put(journal::set_challenge::<S>))
    .route("/journal/{date}/responses", put(journal::set_responses::<S>))
    .route("/journal/{date}/mentor", post(journal::consult_mentor::<S>))
    // Progress
    .route("/xp", get(xp::status::<S>))
    .route("/export", get(xp::export::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

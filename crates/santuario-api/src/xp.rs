//! Handlers for progress and data export.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/xp` | Current total and level |
//! | `GET`  | `/export` | Every entry plus XP status |

use axum::{Json, extract::State};
use santuario_core::{
  journal::JournalEntry,
  store::{EntryQuery, SantuarioStore},
  xp::XpStatus,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::AuthUser, error::ApiError};

/// `GET /xp`
pub async fn status<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
) -> Result<Json<XpStatus>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let total = state.store.xp_total(&user).await.map_err(ApiError::store)?;
  Ok(Json(XpStatus::from_total(total)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
  pub user_id: String,
  pub entries: Vec<JournalEntry>,
  pub xp:      XpStatus,
}

/// `GET /export`
pub async fn export<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
) -> Result<Json<ExportResponse>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let entries = state
    .store
    .list_entries(&user, &EntryQuery::default())
    .await
    .map_err(ApiError::store)?;
  let total = state.store.xp_total(&user).await.map_err(ApiError::store)?;

  Ok(Json(ExportResponse {
    user_id: user,
    entries,
    xp: XpStatus::from_total(total),
  }))
}

//! Handlers for `/daily` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/daily` | Optional `?date=YYYY-MM-DD`; defaults to the server's local date |
//! | `POST` | `/daily/reset` | Stores a fresh salt, reshuffling every slot |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use santuario_core::{
  daily::{DailySelection, select_daily},
  store::SantuarioStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

// ─── Today ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DailyParams {
  pub date: Option<NaiveDate>,
}

/// `GET /daily[?date=<date>]`
pub async fn today<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Query(params): Query<DailyParams>,
) -> Result<Json<DailySelection>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let date = params.date.unwrap_or_else(|| Local::now().date_naive());
  let snapshot = state
    .store
    .content_snapshot()
    .await
    .map_err(ApiError::store)?;
  let salt = state
    .store
    .user_salt(&user)
    .await
    .map_err(ApiError::store)?
    .unwrap_or_default();

  Ok(Json(select_daily(date, &snapshot, &salt)))
}

// ─── Reset ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
  pub salt: String,
}

/// `POST /daily/reset`
pub async fn reset<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
) -> Result<Json<ResetResponse>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let salt = Uuid::new_v4().to_string();
  state
    .store
    .set_user_salt(&user, salt.clone())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user = %user, "daily selection reset");
  Ok(Json(ResetResponse { salt }))
}

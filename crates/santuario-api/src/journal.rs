//! Handlers for `/journal` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/journal` | Optional `?from=&to=&limit=&offset=`; newest first |
//! | `DELETE` | `/journal` | Clears every entry for the user |
//! | `GET`    | `/journal/:date` | 404 if never saved; carries an `ETag` |
//! | `POST`   | `/journal/:date/sections` | Body: `{"kind":"morning","fragment":"…"}` |
//! | `PUT`    | `/journal/:date/mood` | Body: `{"mood":4}` |
//! | `PUT`    | `/journal/:date/challenge` | Body: `{"title":"…","status":"success"}` |
//! | `PUT`    | `/journal/:date/responses` | Body: `{"question_response":"…"}` |
//! | `POST`   | `/journal/:date/mentor` | Asks the mentor; falls back on failure |
//!
//! Every write accepts an optional `If-Match` header and answers with the new
//! `ETag`. A conditional write is compared against the stored version in the
//! same store call that performs it, so concurrent writers cannot both pass.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use santuario_core::{
  daily::select_daily,
  document::{DisplaySections, SectionKind},
  journal::{ChallengeStatus, JournalEntry, Mood},
  mentor::{MentorError, MentorNote, MentorRequest},
  store::{EntryQuery, SantuarioStore},
  xp::{Interaction, XpAward},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, ApiJson},
  etag::{check_if_match, entry_etag},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The stored entry for `date` (if any) and a working copy to mutate.
async fn load<S>(
  state: &AppState<S>,
  user: &str,
  date: NaiveDate,
) -> Result<(Option<JournalEntry>, JournalEntry), ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let current = state
    .store
    .get_entry(user, date)
    .await
    .map_err(ApiError::store)?;
  let working = current
    .clone()
    .unwrap_or_else(|| JournalEntry::new(user, date));
  Ok((current, working))
}

/// Persist `entry`. With a version taken from `If-Match`, the write only
/// lands if the stored entry is still that version.
async fn save<S>(
  state: &AppState<S>,
  entry: JournalEntry,
  expected: Option<DateTime<Utc>>,
) -> Result<JournalEntry, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  match expected {
    None => state.store.upsert_entry(entry).await.map_err(ApiError::store),
    Some(version) => state
      .store
      .replace_entry_if(entry, version)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::PreconditionFailed),
  }
}

async fn award<S>(
  state: &AppState<S>,
  user: &str,
  date: NaiveDate,
  interaction: Interaction,
) -> Result<Option<XpAward>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let award = state
    .store
    .award_xp(user, date, interaction)
    .await
    .map_err(ApiError::store)?;
  if let Some(a) = &award {
    tracing::debug!(user = %user, %date, interaction = %a.interaction, xp = a.xp, "xp awarded");
  }
  Ok(award)
}

/// Attach the entry's `ETag` to a JSON body.
fn with_etag<T: Serialize>(entry: &JournalEntry, body: T) -> Result<Response, ApiError> {
  let tag = entry_etag(entry).map_err(ApiError::store)?;
  let mut res = Json(body).into_response();
  if let Ok(v) = HeaderValue::from_str(&tag) {
    res.headers_mut().insert(header::ETAG, v);
  }
  Ok(res)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
  pub entry:      JournalEntry,
  pub xp_awarded: Option<XpAward>,
}

// ─── List / clear ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub from:   Option<NaiveDate>,
  pub to:     Option<NaiveDate>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /journal[?from=&to=&limit=&offset=]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<JournalEntry>>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let query = EntryQuery {
    from:   params.from,
    to:     params.to,
    limit:  params.limit,
    offset: params.offset,
  };
  let entries = state
    .store
    .list_entries(&user, &query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
  pub deleted: u64,
}

/// `DELETE /journal`
pub async fn clear<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
) -> Result<Json<ClearResponse>, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let deleted = state
    .store
    .clear_entries(&user)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user = %user, deleted, "journal cleared");
  Ok(Json(ClearResponse { deleted }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryView {
  pub entry:    JournalEntry,
  pub sections: DisplaySections,
}

/// `GET /journal/:date`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let entry = state
    .store
    .get_entry(&user, date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no entry for {date}")))?;

  let sections = entry.sections();
  with_etag(&entry, EntryView { entry: entry.clone(), sections })
}

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SectionBody {
  /// What the client believes it is saving. The fragment's markup decides.
  pub kind:     SectionKind,
  pub fragment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SectionResponse {
  pub entry:         JournalEntry,
  pub sections:      DisplaySections,
  pub classified_as: SectionKind,
  pub xp_awarded:    Option<XpAward>,
}

/// `POST /journal/:date/sections`
pub async fn save_section<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<SectionBody>,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let (current, mut entry) = load(&state, &user, date).await?;
  let expected = check_if_match(&headers, current.as_ref())?;

  let (classified_as, hint_honoured) = entry.apply_fragment(&body.fragment, body.kind);
  if !hint_honoured {
    tracing::debug!(
      user = %user,
      %date,
      hint = %body.kind,
      classified = %classified_as,
      "section hint disagreed with fragment markup"
    );
  }

  let entry = save(&state, entry, expected).await?;

  let xp_awarded = if body.fragment.trim().is_empty() {
    None
  } else {
    award(&state, &user, date, Interaction::for_section(classified_as)).await?
  };

  let sections = entry.sections();
  with_etag(&entry, SectionResponse {
    entry: entry.clone(),
    sections,
    classified_as,
    xp_awarded,
  })
}

// ─── Mood ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoodBody {
  pub mood: u8,
}

/// `PUT /journal/:date/mood`
pub async fn set_mood<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<MoodBody>,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let mood = Mood::new(body.mood)?;

  let (current, mut entry) = load(&state, &user, date).await?;
  let expected = check_if_match(&headers, current.as_ref())?;

  entry.mood = mood;
  let entry = save(&state, entry, expected).await?;

  let xp_awarded = if mood.is_set() {
    award(&state, &user, date, Interaction::MoodLogged).await?
  } else {
    None
  };

  with_etag(&entry, EntryResponse { entry: entry.clone(), xp_awarded })
}

// ─── Challenge ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChallengeBody {
  pub title:  Option<String>,
  pub status: Option<ChallengeStatus>,
}

/// `PUT /journal/:date/challenge`
pub async fn set_challenge<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<ChallengeBody>,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let (current, mut entry) = load(&state, &user, date).await?;
  let expected = check_if_match(&headers, current.as_ref())?;

  entry.set_challenge(body.title, body.status);
  let entry = save(&state, entry, expected).await?;

  let xp_awarded = if body.status == Some(ChallengeStatus::Success) {
    award(&state, &user, date, Interaction::ChallengeCompleted).await?
  } else {
    None
  };

  with_etag(&entry, EntryResponse { entry: entry.clone(), xp_awarded })
}

// ─── Legacy responses ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResponsesBody {
  pub question_response:  Option<String>,
  pub challenge_response: Option<String>,
}

/// `PUT /journal/:date/responses`. Absent fields are left untouched.
pub async fn set_responses<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<ResponsesBody>,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let (current, mut entry) = load(&state, &user, date).await?;
  let expected = check_if_match(&headers, current.as_ref())?;

  if body.question_response.is_some() {
    entry.question_response = body.question_response;
  }
  if body.challenge_response.is_some() {
    entry.challenge_response = body.challenge_response;
  }
  let entry = save(&state, entry, expected).await?;

  with_etag(&entry, EntryResponse { entry: entry.clone(), xp_awarded: None })
}

// ─── Mentor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MentorResponse {
  pub note:       MentorNote,
  /// `true` when the mentor failed and the fixed reflection was used.
  pub fell_back:  bool,
  pub entry:      JournalEntry,
  pub xp_awarded: Option<XpAward>,
}

/// `POST /journal/:date/mentor`
pub async fn consult_mentor<S>(
  State(state): State<AppState<S>>,
  AuthUser(user): AuthUser,
  Path(date): Path<NaiveDate>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: SantuarioStore + Clone + 'static,
{
  let (current, mut entry) = load(&state, &user, date).await?;
  let expected = check_if_match(&headers, current.as_ref())?;

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
  let reading_quote = select_daily(date, &snapshot, &salt)
    .reading
    .map(|r| r.quote);

  let request = MentorRequest {
    date,
    mood: entry.mood,
    entry_text: entry.text.clone(),
    reading_quote,
  };

  let answer = tokio::time::timeout(state.mentor_timeout, state.mentor.reflect(&request))
    .await
    .unwrap_or(Err(MentorError::Timeout));

  let (note, fell_back) = match answer {
    Ok(note) if !note.feedback.trim().is_empty() => (note, false),
    Ok(_) => {
      tracing::warn!(user = %user, %date, "mentor returned empty feedback; using fallback");
      (MentorNote::fallback(), true)
    }
    Err(e) => {
      tracing::warn!(user = %user, %date, error = %e, "mentor unavailable; using fallback");
      (MentorNote::fallback(), true)
    }
  };

  entry.apply_fragment(&note.to_fragment(), SectionKind::Free);
  let entry = save(&state, entry, expected).await?;
  let xp_awarded = award(&state, &user, date, Interaction::MentorConsulted).await?;

  with_etag(&entry, MentorResponse {
    note,
    fell_back,
    entry: entry.clone(),
    xp_awarded,
  })
}

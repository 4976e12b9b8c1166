//! ETag computation and `If-Match` checks for journal entries.
//!
//! An ETag is the quoted SHA-256 of the entry's JSON form. Because the store
//! stamps `updated_at` on every write, any save changes the tag.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use santuario_core::journal::JournalEntry;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Compute the ETag for `entry`.
pub fn entry_etag(entry: &JournalEntry) -> Result<String, serde_json::Error> {
  let json = serde_json::to_vec(entry)?;
  let hash = Sha256::digest(&json);
  Ok(format!("\"{}\"", hex::encode(hash)))
}

fn strip_etag_quotes(s: &str) -> &str { s.trim().trim_matches('"') }

/// Enforce an optional `If-Match` header against the entry currently stored.
///
/// Without the header every write proceeds and `None` is returned. With it,
/// the write proceeds only if an entry exists and its tag matches (or the
/// header is `*`); the returned `updated_at` is the version the write must
/// still find when it lands.
pub fn check_if_match(
  headers: &HeaderMap,
  current: Option<&JournalEntry>,
) -> Result<Option<DateTime<Utc>>, ApiError> {
  let Some(if_match) = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok())
  else {
    return Ok(None);
  };

  let Some(entry) = current else {
    return Err(ApiError::PreconditionFailed);
  };

  if if_match.trim() == "*" {
    return Ok(Some(entry.updated_at));
  }

  let current_tag = entry_etag(entry).map_err(ApiError::store)?;
  let matches = if_match
    .split(',')
    .any(|tag| strip_etag_quotes(tag) == strip_etag_quotes(&current_tag));

  if matches {
    Ok(Some(entry.updated_at))
  } else {
    Err(ApiError::PreconditionFailed)
  }
}

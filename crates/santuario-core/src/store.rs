//! The `SantuarioStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `santuario-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  content::{ContentSnapshot, ImportSummary},
  journal::JournalEntry,
  xp::{Interaction, XpAward},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`SantuarioStore::list_entries`]. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub from:   Option<NaiveDate>,
  pub to:     Option<NaiveDate>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Santuario storage backend.
///
/// Journal writes are upserts keyed by `(user_id, date)`; the last writer
/// wins unless the caller asks for a conditional replace. XP awards are append-only and unique per
/// `(user_id, date, interaction)`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SantuarioStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Content ───────────────────────────────────────────────────────────

  /// Replace every content collection with `snapshot`.
  fn import_content(
    &self,
    snapshot: ContentSnapshot,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + '_;

  /// The current content collections, in stored order.
  fn content_snapshot(
    &self,
  ) -> impl Future<Output = Result<ContentSnapshot, Self::Error>> + Send + '_;

  // ── User settings ─────────────────────────────────────────────────────

  /// The user's daily reset salt, if they ever reset.
  fn user_salt<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  fn set_user_salt<'a>(
    &'a self,
    user_id: &'a str,
    salt: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Journal ───────────────────────────────────────────────────────────

  /// The entry for `date`, or `None` if nothing was saved that day.
  fn get_entry<'a>(
    &'a self,
    user_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<JournalEntry>, Self::Error>> + Send + 'a;

  /// Insert or overwrite the entry for `(entry.user_id, entry.date)`.
  /// `updated_at` is always set by the store.
  fn upsert_entry(
    &self,
    entry: JournalEntry,
  ) -> impl Future<Output = Result<JournalEntry, Self::Error>> + Send + '_;

  /// Overwrite the stored entry only while its `updated_at` still equals
  /// `expected`. The comparison and the write happen atomically; `None`
  /// means the entry changed or vanished since it was read.
  fn replace_entry_if(
    &self,
    entry: JournalEntry,
    expected: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<JournalEntry>, Self::Error>> + Send + '_;

  /// Entries matching `query`, newest date first.
  fn list_entries<'a>(
    &'a self,
    user_id: &'a str,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<JournalEntry>, Self::Error>> + Send + 'a;

  /// Delete every entry belonging to `user_id`; returns how many went.
  fn clear_entries<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── XP ledger ─────────────────────────────────────────────────────────

  /// Award `interaction` for `date`. Returns `None` if it was already
  /// awarded for that date.
  fn award_xp<'a>(
    &'a self,
    user_id: &'a str,
    date: NaiveDate,
    interaction: Interaction,
  ) -> impl Future<Output = Result<Option<XpAward>, Self::Error>> + Send + 'a;

  fn xp_total<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

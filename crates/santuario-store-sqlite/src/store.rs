//! [`SqliteStore`], the SQLite implementation of [`SantuarioStore`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use santuario_core::{
  content::{ContentSnapshot, ImportSummary},
  journal::JournalEntry,
  store::{EntryQuery, SantuarioStore},
  xp::{Interaction, XpAward},
};

use crate::{
  Result,
  encode::{
    ENTRY_COLUMNS, RawEntry, decode_snapshot, encode_challenge_status,
    encode_date, encode_dt, encode_interaction, encode_snapshot,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Santuario store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SantuarioStore impl ─────────────────────────────────────────────────────

impl SantuarioStore for SqliteStore {
  type Error = crate::Error;

  // ── Content ───────────────────────────────────────────────────────────────

  async fn import_content(&self, snapshot: ContentSnapshot) -> Result<ImportSummary> {
    let summary = ImportSummary::from(&snapshot);
    let rows = encode_snapshot(&snapshot)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM content_items", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO content_items (collection, position, value_json)
             VALUES (?1, ?2, ?3)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.collection,
              row.position,
              row.value_json
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(summary)
  }

  async fn content_snapshot(&self) -> Result<ContentSnapshot> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT collection, value_json FROM content_items
           ORDER BY collection, position",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_snapshot(rows)
  }

  // ── User settings ─────────────────────────────────────────────────────────

  async fn user_salt(&self, user_id: &str) -> Result<Option<String>> {
    let user_id = user_id.to_owned();

    let salt: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT daily_salt FROM user_settings WHERE user_id = ?1",
            rusqlite::params![user_id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(salt.flatten())
  }

  async fn set_user_salt(&self, user_id: &str, salt: String) -> Result<()> {
    let user_id = user_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_settings (user_id, daily_salt) VALUES (?1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET daily_salt = excluded.daily_salt",
          rusqlite::params![user_id, salt],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Journal ───────────────────────────────────────────────────────────────

  async fn get_entry(
    &self,
    user_id: &str,
    date: NaiveDate,
  ) -> Result<Option<JournalEntry>> {
    let user_id = user_id.to_owned();
    let date_str = encode_date(date);

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ENTRY_COLUMNS} FROM journal_entries
               WHERE user_id = ?1 AND date = ?2"
            ),
            rusqlite::params![user_id, date_str],
            RawEntry::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn upsert_entry(&self, mut entry: JournalEntry) -> Result<JournalEntry> {
    entry.updated_at = Utc::now();

    let user_id     = entry.user_id.clone();
    let date_str    = encode_date(entry.date);
    let text        = entry.text.clone();
    let mood        = entry.mood.value();
    let question    = entry.question_response.clone();
    let challenge   = entry.challenge_response.clone();
    let title       = entry.challenge_title.clone();
    let status      = entry.challenge_status.map(encode_challenge_status);
    let completed   = entry.challenge_completed;
    let updated_str = encode_dt(entry.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO journal_entries (
             user_id, date, text, mood, question_response,
             challenge_response, challenge_title, challenge_status,
             challenge_completed, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(user_id, date) DO UPDATE SET
             text                = excluded.text,
             mood                = excluded.mood,
             question_response   = excluded.question_response,
             challenge_response  = excluded.challenge_response,
             challenge_title     = excluded.challenge_title,
             challenge_status    = excluded.challenge_status,
             challenge_completed = excluded.challenge_completed,
             updated_at          = excluded.updated_at",
          rusqlite::params![
            user_id,
            date_str,
            text,
            mood,
            question,
            challenge,
            title,
            status,
            completed,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn replace_entry_if(
    &self,
    mut entry: JournalEntry,
    expected: DateTime<Utc>,
  ) -> Result<Option<JournalEntry>> {
    // The new stamp must differ from `expected` or a second writer holding
    // the same version could still match.
    entry.updated_at = Utc::now().max(expected + Duration::microseconds(1));

    let user_id      = entry.user_id.clone();
    let date_str     = encode_date(entry.date);
    let text         = entry.text.clone();
    let mood         = entry.mood.value();
    let question     = entry.question_response.clone();
    let challenge    = entry.challenge_response.clone();
    let title        = entry.challenge_title.clone();
    let status       = entry.challenge_status.map(encode_challenge_status);
    let completed    = entry.challenge_completed;
    let updated_str  = encode_dt(entry.updated_at);
    let expected_str = encode_dt(expected);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE journal_entries SET
             text                = ?3,
             mood                = ?4,
             question_response   = ?5,
             challenge_response  = ?6,
             challenge_title     = ?7,
             challenge_status    = ?8,
             challenge_completed = ?9,
             updated_at          = ?10
           WHERE user_id = ?1 AND date = ?2 AND updated_at = ?11",
          rusqlite::params![
            user_id,
            date_str,
            text,
            mood,
            question,
            challenge,
            title,
            status,
            completed,
            updated_str,
            expected_str,
          ],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(entry))
  }

  async fn list_entries(
    &self,
    user_id: &str,
    query: &EntryQuery,
  ) -> Result<Vec<JournalEntry>> {
    let user_id    = user_id.to_owned();
    let from_str   = query.from.map(encode_date);
    let to_str     = query.to.map(encode_date);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val  = query.limit.map_or(-1, |l| l as i64);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTRY_COLUMNS} FROM journal_entries
           WHERE user_id = ?1
             AND (?2 IS NULL OR date >= ?2)
             AND (?3 IS NULL OR date <= ?3)
           ORDER BY date DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, from_str, to_str, limit_val, offset_val],
            RawEntry::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn clear_entries(&self, user_id: &str) -> Result<u64> {
    let user_id = user_id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM journal_entries WHERE user_id = ?1",
          rusqlite::params![user_id],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  // ── XP ledger ─────────────────────────────────────────────────────────────

  async fn award_xp(
    &self,
    user_id: &str,
    date: NaiveDate,
    interaction: Interaction,
  ) -> Result<Option<XpAward>> {
    let award = XpAward {
      user_id: user_id.to_owned(),
      date,
      interaction,
      xp: interaction.xp(),
      recorded_at: Utc::now(),
    };

    let award_id     = Uuid::new_v4().to_string();
    let user_id      = award.user_id.clone();
    let date_str     = encode_date(date);
    let interaction_ = encode_interaction(interaction);
    let xp           = award.xp as i64;
    let at_str       = encode_dt(award.recorded_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO xp_awards
             (award_id, user_id, date, interaction, xp, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![award_id, user_id, date_str, interaction_, xp, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(award))
  }

  async fn xp_total(&self, user_id: &str) -> Result<u64> {
    let user_id = user_id.to_owned();

    let total: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(xp), 0) FROM xp_awards WHERE user_id = ?1",
          rusqlite::params![user_id],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(total.max(0) as u64)
  }
}

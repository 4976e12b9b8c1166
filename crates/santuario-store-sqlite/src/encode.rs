//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Enums are stored as their lowercase / snake_case names.
//! Content records are stored as compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use santuario_core::{
  content::{Collection, ContentSnapshot},
  journal::{ChallengeStatus, JournalEntry, Mood},
  xp::Interaction,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_challenge_status(s: ChallengeStatus) -> &'static str { s.into() }

pub fn decode_challenge_status(s: &str) -> Result<ChallengeStatus> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "challenge_status",
    value:  s.to_owned(),
  })
}

pub fn encode_interaction(i: Interaction) -> &'static str { i.into() }

pub fn decode_interaction(s: &str) -> Result<Interaction> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "interaction",
    value:  s.to_owned(),
  })
}

pub fn decode_collection(s: &str) -> Result<Collection> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "collection",
    value:  s.to_owned(),
  })
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// One `content_items` row ready for insertion.
pub struct ContentRow {
  pub collection: &'static str,
  pub position:   i64,
  pub value_json: String,
}

fn rows_for<T: Serialize>(
  collection: Collection,
  items: &[T],
  out: &mut Vec<ContentRow>,
) -> Result<()> {
  for (position, item) in items.iter().enumerate() {
    out.push(ContentRow {
      collection: collection.into(),
      position:   position as i64,
      value_json: serde_json::to_string(item)?,
    });
  }
  Ok(())
}

pub fn encode_snapshot(snapshot: &ContentSnapshot) -> Result<Vec<ContentRow>> {
  let mut rows = Vec::new();
  rows_for(Collection::Readings, &snapshot.readings, &mut rows)?;
  rows_for(Collection::Philosophers, &snapshot.philosophers, &mut rows)?;
  rows_for(Collection::Meditations, &snapshot.meditations, &mut rows)?;
  rows_for(Collection::Tasks, &snapshot.tasks, &mut rows)?;
  rows_for(Collection::Questions, &snapshot.questions, &mut rows)?;
  Ok(rows)
}

fn push_decoded<T: DeserializeOwned>(json: &str, into: &mut Vec<T>) -> Result<()> {
  into.push(serde_json::from_str(json)?);
  Ok(())
}

/// Rebuild a snapshot from `(collection, value_json)` pairs already sorted
/// by position.
pub fn decode_snapshot(rows: Vec<(String, String)>) -> Result<ContentSnapshot> {
  let mut snapshot = ContentSnapshot::default();
  for (collection, json) in rows {
    match decode_collection(&collection)? {
      Collection::Readings => push_decoded(&json, &mut snapshot.readings)?,
      Collection::Philosophers => push_decoded(&json, &mut snapshot.philosophers)?,
      Collection::Meditations => push_decoded(&json, &mut snapshot.meditations)?,
      Collection::Tasks => push_decoded(&json, &mut snapshot.tasks)?,
      Collection::Questions => push_decoded(&json, &mut snapshot.questions)?,
    }
  }
  Ok(snapshot)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `journal_entries` row.
pub struct RawEntry {
  pub user_id:             String,
  pub date:                String,
  pub text:                String,
  pub mood:                u8,
  pub question_response:   Option<String>,
  pub challenge_response:  Option<String>,
  pub challenge_title:     Option<String>,
  pub challenge_status:    Option<String>,
  pub challenge_completed: bool,
  pub updated_at:          String,
}

/// Column list matching [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str = "user_id, date, text, mood, question_response,
  challenge_response, challenge_title, challenge_status, challenge_completed,
  updated_at";

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:             row.get(0)?,
      date:                row.get(1)?,
      text:                row.get(2)?,
      mood:                row.get(3)?,
      question_response:   row.get(4)?,
      challenge_response:  row.get(5)?,
      challenge_title:     row.get(6)?,
      challenge_status:    row.get(7)?,
      challenge_completed: row.get(8)?,
      updated_at:          row.get(9)?,
    })
  }

  pub fn into_entry(self) -> Result<JournalEntry> {
    Ok(JournalEntry {
      user_id:             self.user_id,
      date:                decode_date(&self.date)?,
      text:                self.text,
      mood:                Mood::new(self.mood)?,
      question_response:   self.question_response,
      challenge_response:  self.challenge_response,
      challenge_title:     self.challenge_title,
      challenge_status:    self
        .challenge_status
        .as_deref()
        .map(decode_challenge_status)
        .transpose()?,
      challenge_completed: self.challenge_completed,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

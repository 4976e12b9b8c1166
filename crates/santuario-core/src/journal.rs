//! Journal entries, one per user per calendar date.
//!
//! An entry is created by the first save for its date and mutated by every
//! later one (mood tap, ritual, free writing, mentor note). Entries are never
//! deleted individually.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  document::{DisplaySections, SectionKind, merge_fragment, split_for_display},
};

// ─── Mood ────────────────────────────────────────────────────────────────────

/// Daily mood on a 1–5 scale; 0 means "not logged".
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
  pub const MAX: u8 = 5;
  pub const UNSET: Mood = Mood(0);

  pub fn new(value: u8) -> Result<Self> {
    if value > Self::MAX {
      return Err(Error::InvalidMood(value));
    }
    Ok(Self(value))
  }

  pub fn value(self) -> u8 { self.0 }

  pub fn is_set(self) -> bool { self.0 != 0 }
}

impl TryFrom<u8> for Mood {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<Mood> for u8 {
  fn from(m: Mood) -> u8 { m.0 }
}

// ─── Challenge ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChallengeStatus {
  Success,
  Failed,
}

// ─── Entry ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
  pub user_id:             String,
  pub date:                NaiveDate,
  /// Rich-text document; see [`crate::document`] for its structure.
  pub text:                String,
  pub mood:                Mood,
  /// Legacy free-text answer to the daily question.
  pub question_response:   Option<String>,
  /// Legacy free-text reflection on the daily challenge.
  pub challenge_response:  Option<String>,
  pub challenge_title:     Option<String>,
  pub challenge_status:    Option<ChallengeStatus>,
  /// Mirrors `challenge_status == Some(Success)` for older readers.
  pub challenge_completed: bool,
  /// Set by the store on every write.
  pub updated_at:          DateTime<Utc>,
}

impl JournalEntry {
  /// An empty, not-yet-persisted entry for `date`.
  pub fn new(user_id: impl Into<String>, date: NaiveDate) -> Self {
    Self {
      user_id: user_id.into(),
      date,
      text: String::new(),
      mood: Mood::UNSET,
      question_response: None,
      challenge_response: None,
      challenge_title: None,
      challenge_status: None,
      challenge_completed: false,
      updated_at: DateTime::<Utc>::UNIX_EPOCH,
    }
  }

  /// Merge a newly authored fragment into the document. Returns the section
  /// the fragment was classified as, and whether that agreed with `hint`.
  pub fn apply_fragment(
    &mut self,
    fragment: &str,
    hint: SectionKind,
  ) -> (SectionKind, bool) {
    let outcome = merge_fragment(&self.text, fragment, hint);
    self.text = outcome.document;
    (outcome.section, outcome.hint_honoured)
  }

  /// Set the day's challenge, keeping the legacy completion flag in sync.
  pub fn set_challenge(
    &mut self,
    title: Option<String>,
    status: Option<ChallengeStatus>,
  ) {
    self.challenge_title = title;
    self.challenge_status = status;
    self.challenge_completed = status == Some(ChallengeStatus::Success);
  }

  /// The challenge outcome, reading the legacy flag when no status was
  /// recorded.
  pub fn effective_challenge_status(&self) -> Option<ChallengeStatus> {
    match self.challenge_status {
      Some(s) => Some(s),
      None if self.challenge_completed => Some(ChallengeStatus::Success),
      None => None,
    }
  }

  pub fn sections(&self) -> DisplaySections { split_for_display(&self.text) }
}

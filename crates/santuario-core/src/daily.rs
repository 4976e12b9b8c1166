//! Seeded daily selector.
//!
//! Every user sees the same reading, meditation, task and question on a given
//! calendar date without any server coordination: the pick is a pure function
//! of the date, a per-slot salt and a user-controlled reset salt.
//!
//! The hash is DJB2 over UTF-16 code units with wrapping 32-bit signed
//! arithmetic, so indices agree with the browser client that persisted
//! selections were first computed by.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::content::{
  ContentSnapshot, DailyQuestion, Meditation, Philosopher, Reading, Task,
};

// ─── Seed ────────────────────────────────────────────────────────────────────

const DJB2_INIT: i32 = 5381;

/// The named categories of daily content. Each has its own salt so that slots
/// are decorrelated for the same date and user salt.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Slot {
  Reading,
  /// Philosopher bio; only consulted when the reading's author has no match.
  Bio,
  Meditation,
  Task,
  Question,
}

impl Slot {
  pub fn salt(self) -> &'static str { self.into() }
}

/// `date_iso + slot_salt + user_salt`, the string a daily index is derived
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed(String);

impl Seed {
  pub fn new(date_iso: &str, slot_salt: &str, user_salt: &str) -> Self {
    let mut s =
      String::with_capacity(date_iso.len() + slot_salt.len() + user_salt.len());
    s.push_str(date_iso);
    s.push_str(slot_salt);
    s.push_str(user_salt);
    Self(s)
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn hash(&self) -> u32 { seed_hash(&self.0) }

  /// Reduce the hash onto `0..len`. `len` must be non-zero.
  pub fn index(&self, len: usize) -> usize { self.hash() as usize % len }
}

/// DJB2 (`hash * 33 + unit`) over the UTF-16 code units of `seed`, wrapped to
/// 32 signed bits, then made non-negative.
///
/// `unsigned_abs` keeps `i32::MIN` representable (2^31) instead of
/// overflowing.
pub fn seed_hash(seed: &str) -> u32 {
  seed
    .encode_utf16()
    .fold(DJB2_INIT, |hash, unit| {
      hash.wrapping_mul(33).wrapping_add(i32::from(unit))
    })
    .unsigned_abs()
}

/// Deterministically pick one element of `items` for `date_iso`.
///
/// Returns `None` for an empty slice. Same inputs always yield the same
/// element, across processes and machines.
pub fn select_seeded<'a, T>(
  date_iso: &str,
  items: &'a [T],
  slot_salt: &str,
  user_salt: &str,
) -> Option<&'a T> {
  if items.is_empty() {
    return None;
  }
  let seed = Seed::new(date_iso, slot_salt, user_salt);
  items.get(seed.index(items.len()))
}

/// Canonical `YYYY-MM-DD` form used in seeds. Time zones never enter the
/// seed; callers decide which calendar day it is.
pub fn date_iso(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

// ─── Philosopher matching ────────────────────────────────────────────────────

/// Find the first philosopher whose name and `author` contain one another,
/// ignoring case.
///
/// Ambiguous authors resolve to the earliest philosopher in collection
/// order. Blank authors never match.
pub fn match_philosopher<'a>(
  author: &str,
  philosophers: &'a [Philosopher],
) -> Option<&'a Philosopher> {
  let author = author.trim().to_lowercase();
  if author.is_empty() {
    return None;
  }
  philosophers.iter().find(|p| {
    let name = p.name.trim().to_lowercase();
    !name.is_empty() && (author.contains(&name) || name.contains(&author))
  })
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Today's content for one user. Derived, never persisted; recomputing with
/// the same inputs yields an identical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySelection {
  pub date:        NaiveDate,
  pub reading:     Option<Reading>,
  pub philosopher: Option<Philosopher>,
  /// `true` when `philosopher` was found through the reading's author rather
  /// than picked independently.
  pub is_match:    bool,
  pub meditation:  Option<Meditation>,
  pub task:        Option<Task>,
  pub question:    Option<DailyQuestion>,
}

/// Select every slot for `date`. `user_salt` is the user's reset value, empty
/// if they never reset.
pub fn select_daily(
  date: NaiveDate,
  snapshot: &ContentSnapshot,
  user_salt: &str,
) -> DailySelection {
  let iso = date_iso(date);

  let reading =
    select_seeded(&iso, &snapshot.readings, Slot::Reading.salt(), user_salt);

  let matched = reading
    .and_then(|r| r.author.as_deref())
    .and_then(|author| match_philosopher(author, &snapshot.philosophers));

  let (philosopher, is_match) = match matched {
    Some(p) => (Some(p), true),
    None => (
      select_seeded(&iso, &snapshot.philosophers, Slot::Bio.salt(), user_salt),
      false,
    ),
  };

  DailySelection {
    date,
    reading: reading.cloned(),
    philosopher: philosopher.cloned(),
    is_match,
    meditation: select_seeded(
      &iso,
      &snapshot.meditations,
      Slot::Meditation.salt(),
      user_salt,
    )
    .cloned(),
    task: select_seeded(&iso, &snapshot.tasks, Slot::Task.salt(), user_salt)
      .cloned(),
    question: select_seeded(
      &iso,
      &snapshot.questions,
      Slot::Question.salt(),
      user_salt,
    )
    .cloned(),
  }
}

//! Content records: the daily material every user draws from.
//!
//! Records arrive from an external source as loosely-shaped JSON. They are
//! modelled here as explicit structs with named optional fields; a
//! [`ContentBundle`] is validated into a [`ContentSnapshot`] before any
//! selection runs, so blank or malformed records never reach the selector.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use strum::{Display, EnumString, IntoStaticStr};

use crate::Result;

// ─── Records ─────────────────────────────────────────────────────────────────

/// A daily reading: a quote plus commentary, attributed to an author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
  pub title:      String,
  pub quote:      String,
  pub body:       Option<String>,
  /// Free-text attribution, e.g. "Marco Aurelio, Meditaciones II.1".
  pub author:     Option<String>,
  pub tags:       Vec<String>,
  /// Reading format (e.g. "quote", "letter"); `type` on the wire.
  #[serde(rename = "type")]
  pub kind:       Option<String>,
  pub philosophy: Option<String>,
}

/// A philosopher bio card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Philosopher {
  pub id:          Option<String>,
  pub name:        String,
  /// Human-readable life span, e.g. "4 a.C. – 65 d.C.".
  pub dates:       Option<String>,
  pub role:        Option<String>,
  pub school:      Option<String>,
  pub description: Option<String>,
  pub key_ideas:   Vec<String>,
  pub icon:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meditation {
  pub title:            String,
  pub category:         Option<String>,
  pub duration_minutes: Option<u32>,
  pub difficulty:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
  pub title:       String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyQuestion {
  pub question: String,
}

// ─── Collections ─────────────────────────────────────────────────────────────

/// Names the five content collections; used in storage keys and rejections.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  Readings,
  Philosophers,
  Meditations,
  Tasks,
  Questions,
}

/// A record dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
  pub collection: Collection,
  /// Position of the record in the incoming collection.
  pub index:      usize,
  pub reason:     String,
}

/// One incoming record. A record whose fields have the wrong JSON types is
/// kept as `Malformed` so that it is rejected alone instead of failing the
/// whole bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming<T> {
  Record(T),
  Malformed(String),
}

impl<T> From<T> for Incoming<T> {
  fn from(record: T) -> Self { Self::Record(record) }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Incoming<T> {
  fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match serde_json::from_value(value) {
      Ok(record) => Self::Record(record),
      Err(e) => Self::Malformed(e.to_string()),
    })
  }
}

/// Content as received from the outside world. Every collection may be
/// missing; every record may be incomplete or malformed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentBundle {
  pub readings:     Vec<Incoming<Reading>>,
  pub philosophers: Vec<Incoming<Philosopher>>,
  pub meditations:  Vec<Incoming<Meditation>>,
  pub tasks:        Vec<Incoming<Task>>,
  pub questions:    Vec<Incoming<DailyQuestion>>,
}

/// Validated, ordered content. Treated as immutable for the duration of a
/// single daily selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
  pub readings:     Vec<Reading>,
  pub philosophers: Vec<Philosopher>,
  pub meditations:  Vec<Meditation>,
  pub tasks:        Vec<Task>,
  pub questions:    Vec<DailyQuestion>,
}

impl ContentSnapshot {
  pub fn is_empty(&self) -> bool {
    self.readings.is_empty()
      && self.philosophers.is_empty()
      && self.meditations.is_empty()
      && self.tasks.is_empty()
      && self.questions.is_empty()
  }
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub readings:     usize,
  pub philosophers: usize,
  pub meditations:  usize,
  pub tasks:        usize,
  pub questions:    usize,
}

impl From<&ContentSnapshot> for ImportSummary {
  fn from(s: &ContentSnapshot) -> Self {
    Self {
      readings:     s.readings.len(),
      philosophers: s.philosophers.len(),
      meditations:  s.meditations.len(),
      tasks:        s.tasks.len(),
      questions:    s.questions.len(),
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn is_blank(s: &str) -> bool { s.trim().is_empty() }

/// Keep the well-formed records whose required field is present, recording
/// a [`Rejection`] for every other one. Survivors keep their relative order.
fn retain_valid<T>(
  collection: Collection,
  items: Vec<Incoming<T>>,
  missing: impl Fn(&T) -> Option<&'static str>,
  rejections: &mut Vec<Rejection>,
) -> Vec<T> {
  items
    .into_iter()
    .enumerate()
    .filter_map(|(index, item)| {
      let reason = match item {
        Incoming::Record(record) => match missing(&record) {
          None => return Some(record),
          Some(field) => format!("missing required field `{field}`"),
        },
        Incoming::Malformed(error) => format!("malformed record: {error}"),
      };
      rejections.push(Rejection { collection, index, reason });
      None
    })
    .collect()
}

impl ContentBundle {
  /// Decode a bundle. Only a document that is not an object of arrays fails;
  /// individual bad records surface later as rejections.
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }

  /// Drop malformed records and records with a blank required field, and
  /// return the survivors as a snapshot, along with one [`Rejection`] per
  /// dropped record.
  pub fn validate(self) -> (ContentSnapshot, Vec<Rejection>) {
    let mut rejections = Vec::new();

    let readings = retain_valid(
      Collection::Readings,
      self.readings,
      |r| {
        if is_blank(&r.title) {
          Some("title")
        } else if is_blank(&r.quote) {
          Some("quote")
        } else {
          None
        }
      },
      &mut rejections,
    );
    let philosophers = retain_valid(
      Collection::Philosophers,
      self.philosophers,
      |p| is_blank(&p.name).then_some("name"),
      &mut rejections,
    );
    let meditations = retain_valid(
      Collection::Meditations,
      self.meditations,
      |m| is_blank(&m.title).then_some("title"),
      &mut rejections,
    );
    let tasks = retain_valid(
      Collection::Tasks,
      self.tasks,
      |t| is_blank(&t.title).then_some("title"),
      &mut rejections,
    );
    let questions = retain_valid(
      Collection::Questions,
      self.questions,
      |q| is_blank(&q.question).then_some("question"),
      &mut rejections,
    );

    let snapshot = ContentSnapshot {
      readings,
      philosophers,
      meditations,
      tasks,
      questions,
    };
    (snapshot, rejections)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_collections_default_to_empty() {
    let bundle = ContentBundle::from_json(r#"{"tasks":[{"title":"Caminar"}]}"#).unwrap();
    let (snapshot, rejections) = bundle.validate();
    assert!(rejections.is_empty());
    assert!(snapshot.readings.is_empty());
    assert_eq!(snapshot.tasks.len(), 1);
  }

  #[test]
  fn reading_type_field_maps_to_kind() {
    let reading: Reading = serde_json::from_str(
      r#"{"title":"T","quote":"Q","type":"letter","tags":["virtud"]}"#,
    )
    .unwrap();
    assert_eq!(reading.kind.as_deref(), Some("letter"));
    assert_eq!(reading.tags, vec!["virtud".to_string()]);
    assert!(reading.author.is_none());
  }

  #[test]
  fn blank_required_fields_are_rejected_in_order() {
    let bundle: ContentBundle = serde_json::from_str(
      r#"{
        "readings": [
          {"title": "Uno", "quote": "q1"},
          {"title": "  ", "quote": "q2"},
          {"title": "Tres"},
          {"title": "Cuatro", "quote": "q4"}
        ],
        "philosophers": [{"name": ""}, {"name": "Séneca"}]
      }"#,
    )
    .unwrap();

    let (snapshot, rejections) = bundle.validate();

    let titles: Vec<_> =
      snapshot.readings.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Uno", "Cuatro"]);
    assert_eq!(snapshot.philosophers.len(), 1);

    assert_eq!(rejections.len(), 3);
    assert_eq!(rejections[0].collection, Collection::Readings);
    assert_eq!(rejections[0].index, 1);
    assert!(rejections[0].reason.contains("title"));
    assert_eq!(rejections[1].index, 2);
    assert!(rejections[1].reason.contains("quote"));
    assert_eq!(rejections[2].collection, Collection::Philosophers);
    assert_eq!(rejections[2].index, 0);
  }

  #[test]
  fn mistyped_record_is_rejected_alone() {
    let bundle = ContentBundle::from_json(
      r#"{
        "meditations": [
          {"title": "Vista desde arriba", "duration_minutes": 10},
          {"title": "x", "duration_minutes": "10"},
          {"title": "Premeditatio malorum"}
        ],
        "questions": [42, {"question": "¿Qué depende de mí?"}]
      }"#,
    )
    .unwrap();

    let (snapshot, rejections) = bundle.validate();

    let titles: Vec<_> =
      snapshot.meditations.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Vista desde arriba", "Premeditatio malorum"]);
    assert_eq!(snapshot.meditations[0].duration_minutes, Some(10));
    assert_eq!(snapshot.questions.len(), 1);

    assert_eq!(rejections.len(), 2);
    assert_eq!(rejections[0].collection, Collection::Meditations);
    assert_eq!(rejections[0].index, 1);
    assert!(rejections[0].reason.starts_with("malformed record"));
    assert_eq!(rejections[1].collection, Collection::Questions);
    assert_eq!(rejections[1].index, 0);
  }

  #[test]
  fn malformed_json_is_a_serialization_error() {
    assert!(matches!(
      ContentBundle::from_json(r#"{"readings": 3}"#),
      Err(crate::Error::Serialization(_))
    ));
  }

  #[test]
  fn collection_names_are_snake_case() {
    assert_eq!(Collection::Readings.to_string(), "readings");
    assert_eq!("questions".parse::<Collection>().unwrap(), Collection::Questions);
  }
}

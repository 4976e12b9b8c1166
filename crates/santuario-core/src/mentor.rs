//! The AI mentor collaborator.
//!
//! The mentor reads the day's entry and answers with a short reflection. It is
//! an external, possibly failing service: callers substitute
//! [`MentorNote::fallback`] on any error so the evening ritual is never
//! interrupted.

use std::{future::Future, pin::Pin};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{document::escape_html, journal::Mood};

const FALLBACK_FEEDBACK: &str = "Hoy has dedicado un momento a examinar tu \
                                 día; eso ya es práctica. Recuerda: no nos \
                                 perturban las cosas, sino nuestras opiniones \
                                 sobre ellas.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorRequest {
  pub date:          NaiveDate,
  pub mood:          Mood,
  /// The journal document as stored.
  pub entry_text:    String,
  /// The day's reading, when there is one.
  pub reading_quote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorNote {
  pub feedback: String,
}

impl MentorNote {
  /// The fixed reflection used whenever the mentor cannot answer.
  pub fn fallback() -> Self { Self { feedback: FALLBACK_FEEDBACK.to_string() } }

  /// Render as a free-content fragment for the journal document.
  pub fn to_fragment(&self) -> String {
    format!(
      r#"<p class="mentor-note">{}</p>"#,
      escape_html(self.feedback.trim())
    )
  }
}

#[derive(Debug, Error)]
pub enum MentorError {
  #[error("no mentor is configured")]
  Unavailable,

  #[error("mentor transport error: {0}")]
  Transport(String),

  #[error("mentor returned an invalid response: {0}")]
  InvalidResponse(String),

  #[error("mentor timed out")]
  Timeout,
}

pub type MentorFuture<'a> =
  Pin<Box<dyn Future<Output = Result<MentorNote, MentorError>> + Send + 'a>>;

/// Anything that can reflect on a journal entry.
///
/// Object-safe so the server can choose an implementation from config.
pub trait Mentor: Send + Sync {
  fn reflect<'a>(&'a self, request: &'a MentorRequest) -> MentorFuture<'a>;
}

/// A mentor that always fails; used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Mentor for Unavailable {
  fn reflect<'a>(&'a self, _request: &'a MentorRequest) -> MentorFuture<'a> {
    Box::pin(async { Err::<MentorNote, _>(MentorError::Unavailable) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fallback_is_deterministic() {
    assert_eq!(MentorNote::fallback(), MentorNote::fallback());
    assert!(!MentorNote::fallback().feedback.is_empty());
  }

  #[test]
  fn fragment_escapes_feedback() {
    let note = MentorNote { feedback: " <script>x</script> & más ".into() };
    assert_eq!(
      note.to_fragment(),
      r#"<p class="mentor-note">&lt;script&gt;x&lt;/script&gt; &amp; más</p>"#
    );
  }

  #[test]
  fn fragment_is_free_content() {
    let fragment = MentorNote::fallback().to_fragment();
    assert_eq!(
      crate::document::classify_fragment(&fragment),
      crate::document::SectionKind::Free
    );
  }
}

//! Journal document model: parse, merge and display-split.
//!
//! A day's journal is a single rich-text string. Inside it, the morning and
//! evening rituals each live in a `<div>` carrying a marker class
//! ([`MORNING_MARKER`], [`EVENING_MARKER`]); everything else is free content.
//! The markers are a persisted format and must not change.
//!
//! Saving a ritual replaces its block wholesale. Saving free text appends to
//! the free content. The document is always reassembled as morning, free,
//! evening, regardless of the order the saves arrived in.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub use crate::html::escape_html;
use crate::html::{Tag, find_tag, sanitize_for_display, tag_end};

pub const MORNING_MARKER: &str = "ritual-block-morning";
pub const EVENING_MARKER: &str = "ritual-block-evening";

/// Inserted between successive free-content saves.
pub const FREE_SEPARATOR: &str = "<br><br>";
/// Inserted between non-empty sections on reassembly.
pub const SECTION_SEPARATOR: &str = "\n";

// ─── Section kinds ───────────────────────────────────────────────────────────

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
pub enum SectionKind {
  Morning,
  Free,
  Evening,
}

impl SectionKind {
  /// The marker class for ritual sections; `None` for free content.
  pub fn marker(self) -> Option<&'static str> {
    match self {
      Self::Morning => Some(MORNING_MARKER),
      Self::Evening => Some(EVENING_MARKER),
      Self::Free => None,
    }
  }
}

/// Wrap `inner_html` in the block markup for `kind`. Free content is
/// returned unchanged.
pub fn ritual_block(kind: SectionKind, inner_html: &str) -> String {
  match kind.marker() {
    Some(marker) => {
      format!(r#"<div class="ritual-block {marker}">{inner_html}</div>"#)
    }
    None => inner_html.to_string(),
  }
}

// ─── Block scanning ──────────────────────────────────────────────────────────

/// A marked block located in a document, as byte ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
  /// From `<div` through the balancing `</div>`.
  outer: Range<usize>,
  /// Between the opening tag and the balancing close tag.
  inner: Range<usize>,
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
  a.start < b.end && b.start < a.end
}

/// Locate the `</div>` balancing a `<div>` whose opening tag ends just before
/// `from`. Returns `(close_start, close_end)`, or `None` if the document runs
/// out first.
fn balancing_close(lower: &str, from: usize) -> Option<(usize, usize)> {
  let mut depth = 1usize;
  let mut pos = from;
  loop {
    let close = find_tag(lower, "</div", pos)?;
    match find_tag(lower, "<div", pos) {
      Some(open) if open < close => {
        depth += 1;
        pos = open + "<div".len();
      }
      _ => {
        let end = close + tag_end(&lower[close..])? + 1;
        depth -= 1;
        if depth == 0 {
          return Some((close, end));
        }
        pos = end;
      }
    }
  }
}

/// Find the first `<div>` whose class list contains `marker`.
///
/// Openings inside `exclude` are skipped, as are candidates that would
/// overlap it. A malformed candidate is skipped on its own: an opening tag
/// that never ends (or whose quoting runs into the next `<div`), or a block
/// without a balancing close. Scanning resumes right after it.
fn find_block(
  doc: &str,
  lower: &str,
  marker: &str,
  exclude: Option<&Range<usize>>,
) -> Option<Block> {
  let mut from = 0;
  while let Some(open) = find_tag(lower, "<div", from) {
    from = open + "<div".len();
    let Some(len) = tag_end(&doc[open..]) else {
      continue;
    };
    let open_end = open + len;
    if find_tag(lower, "<div", from).is_some_and(|next| next < open_end) {
      continue;
    }
    from = open_end + 1;

    if exclude.is_some_and(|r| r.contains(&open)) {
      continue;
    }
    let is_marked = Tag::parse(&doc[open..=open_end])
      .is_some_and(|tag| tag.has_class(marker));
    if !is_marked {
      continue;
    }

    let Some((close_start, close_end)) = balancing_close(lower, open_end + 1)
    else {
      continue;
    };
    let block = Block {
      outer: open..close_end,
      inner: open_end + 1..close_start,
    };
    if exclude.is_some_and(|r| overlaps(r, &block.outer)) {
      continue;
    }
    return Some(block);
  }
  None
}

/// Inner HTML of a block string produced by [`find_block`].
fn block_inner(block: &str) -> &str {
  let lower = block.to_ascii_lowercase();
  let start = tag_end(block).map_or(0, |i| i + 1);
  let end = lower.rfind("</div").filter(|&e| e >= start).unwrap_or(block.len());
  block[start..end].trim()
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A journal document split into its three logical sections.
///
/// `morning` and `evening` hold the complete block markup, including the
/// marker `<div>`, so that [`JournalDocument::render`] reproduces them
/// byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalDocument {
  pub morning: Option<String>,
  pub free:    String,
  pub evening: Option<String>,
}

impl JournalDocument {
  /// Split `doc` into its sections. Never fails: missing or unterminated
  /// blocks simply leave their text in the free content.
  pub fn parse(doc: &str) -> Self {
    let lower = doc.to_ascii_lowercase();

    let morning = find_block(doc, &lower, MORNING_MARKER, None);
    let evening = find_block(
      doc,
      &lower,
      EVENING_MARKER,
      morning.as_ref().map(|b| &b.outer),
    );

    let mut taken: Vec<&Range<usize>> =
      [&morning, &evening].into_iter().flatten().map(|b| &b.outer).collect();
    taken.sort_by_key(|r| r.start);

    let mut pieces = Vec::new();
    let mut cursor = 0;
    for r in taken {
      pieces.push(&doc[cursor..r.start]);
      cursor = r.end;
    }
    pieces.push(&doc[cursor..]);

    let free = pieces
      .into_iter()
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .collect::<Vec<_>>()
      .join(SECTION_SEPARATOR);

    Self {
      morning: morning.map(|b| doc[b.outer].to_string()),
      free,
      evening: evening.map(|b| doc[b.outer].to_string()),
    }
  }

  /// Append `text` to the free content, separated by a paragraph break.
  pub fn append_free(&mut self, text: &str) {
    let text = text.trim();
    if text.is_empty() {
      return;
    }
    if !self.free.is_empty() {
      self.free.push_str(FREE_SEPARATOR);
    }
    self.free.push_str(text);
  }

  /// Apply a newly authored fragment and report which section it landed in.
  ///
  /// Every ritual block the fragment carries replaces the matching section;
  /// whatever the fragment holds outside its blocks is appended to the free
  /// content. A fragment without a complete marked block is free content.
  pub fn apply(&mut self, fragment: &str) -> SectionKind {
    let incoming = Self::parse(fragment);
    let mut landed = SectionKind::Free;

    if let Some(evening) = incoming.evening {
      self.evening = Some(evening);
      landed = SectionKind::Evening;
    }
    if let Some(morning) = incoming.morning {
      self.morning = Some(morning);
      landed = SectionKind::Morning;
    }
    self.append_free(&incoming.free);
    landed
  }

  /// Reassemble as morning, free, evening, with separators only between
  /// non-empty sections.
  pub fn render(&self) -> String {
    [
      self.morning.as_deref(),
      Some(self.free.as_str()),
      self.evening.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(SECTION_SEPARATOR)
  }

  /// Display form of each section: ritual blocks reduced to their inner
  /// HTML, all sections cleaned of inline styling.
  pub fn display(&self) -> DisplaySections {
    DisplaySections {
      morning: self
        .morning
        .as_deref()
        .map(|b| sanitize_for_display(block_inner(b))),
      evening: self
        .evening
        .as_deref()
        .map(|b| sanitize_for_display(block_inner(b))),
      free:    sanitize_for_display(&self.free),
    }
  }
}

/// What a fragment's markup says it is, using the same block scan as
/// [`JournalDocument::parse`]. A morning block wins over an evening block.
pub fn classify_fragment(fragment: &str) -> SectionKind {
  let parsed = JournalDocument::parse(fragment);
  if parsed.morning.is_some() {
    SectionKind::Morning
  } else if parsed.evening.is_some() {
    SectionKind::Evening
  } else {
    SectionKind::Free
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Result of merging a fragment into an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
  pub document:      String,
  /// The section the fragment was classified as.
  pub section:       SectionKind,
  /// `false` when the caller's hint disagreed with the fragment's markup.
  pub hint_honoured: bool,
}

/// Merge `fragment` into `existing`. Classification comes from the
/// fragment's markup; `hint` is only compared against it.
pub fn merge_fragment(
  existing: &str,
  fragment: &str,
  hint: SectionKind,
) -> MergeOutcome {
  let mut doc = JournalDocument::parse(existing);
  let section = doc.apply(fragment);
  MergeOutcome {
    document: doc.render(),
    section,
    hint_honoured: section == hint,
  }
}

/// Merge `fragment` into `existing`, returning the reassembled document.
pub fn merge_journal_content(
  existing: &str,
  fragment: &str,
  hint: SectionKind,
) -> String {
  merge_fragment(existing, fragment, hint).document
}

// ─── Display ─────────────────────────────────────────────────────────────────

/// A document split for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySections {
  pub morning: Option<String>,
  pub evening: Option<String>,
  pub free:    String,
}

/// Split `document` for rendering. Extraction agrees with the merge, so
/// anything displayed here is part of what a later save edits.
pub fn split_for_display(document: &str) -> DisplaySections {
  JournalDocument::parse(document).display()
}

#[cfg(test)]
mod tests {
  use super::*;

  const MORNING_COFFEE: &str =
    r#"<div class="ritual-block ritual-block-morning">Gratitude: coffee</div>"#;
  const MORNING_SUNSHINE: &str =
    r#"<div class="ritual-block ritual-block-morning">Gratitude: sunshine</div>"#;
  const EVENING_REVIEW: &str =
    r#"<div class="ritual-block ritual-block-evening">Review: good day</div>"#;

  fn save(doc: &str, fragment: &str, kind: SectionKind) -> String {
    merge_journal_content(doc, fragment, kind)
  }

  // ── Worked example ───────────────────────────────────────────────────────

  #[test]
  fn morning_evening_free_then_new_morning() {
    let doc = save("", MORNING_COFFEE, SectionKind::Morning);
    let doc = save(&doc, EVENING_REVIEW, SectionKind::Evening);
    let doc = save(&doc, "Random thought.", SectionKind::Free);

    assert_eq!(
      doc,
      format!("{MORNING_COFFEE}\nRandom thought.\n{EVENING_REVIEW}")
    );

    let doc = save(&doc, MORNING_SUNSHINE, SectionKind::Morning);
    assert_eq!(
      doc,
      format!("{MORNING_SUNSHINE}\nRandom thought.\n{EVENING_REVIEW}")
    );
    assert!(!doc.contains("coffee"));
  }

  // ── Ordering ─────────────────────────────────────────────────────────────

  #[test]
  fn sections_are_ordered_regardless_of_save_order() {
    let orders: [[(&str, SectionKind); 3]; 3] = [
      [
        (EVENING_REVIEW, SectionKind::Evening),
        ("nota", SectionKind::Free),
        (MORNING_COFFEE, SectionKind::Morning),
      ],
      [
        ("nota", SectionKind::Free),
        (EVENING_REVIEW, SectionKind::Evening),
        (MORNING_COFFEE, SectionKind::Morning),
      ],
      [
        (EVENING_REVIEW, SectionKind::Evening),
        (MORNING_COFFEE, SectionKind::Morning),
        ("nota", SectionKind::Free),
      ],
    ];

    for order in orders {
      let doc = order
        .iter()
        .fold(String::new(), |doc, (frag, kind)| save(&doc, frag, *kind));
      let m = doc.find(MORNING_MARKER).unwrap();
      let f = doc.find("nota").unwrap();
      let e = doc.find(EVENING_MARKER).unwrap();
      assert!(m < f && f < e, "out of order: {doc}");
    }
  }

  #[test]
  fn no_leading_or_trailing_separator() {
    assert_eq!(save("", EVENING_REVIEW, SectionKind::Evening), EVENING_REVIEW);
    assert_eq!(save("", "solo", SectionKind::Free), "solo");
    let doc = save(EVENING_REVIEW, MORNING_COFFEE, SectionKind::Morning);
    assert_eq!(doc, format!("{MORNING_COFFEE}\n{EVENING_REVIEW}"));
  }

  // ── Replacement ──────────────────────────────────────────────────────────

  #[test]
  fn saving_the_same_morning_twice_keeps_one_block() {
    let doc = save("", MORNING_COFFEE, SectionKind::Morning);
    let doc = save(&doc, MORNING_COFFEE, SectionKind::Morning);
    assert_eq!(doc.matches(MORNING_MARKER).count(), 1);
    assert_eq!(
      JournalDocument::parse(&doc).morning.as_deref(),
      Some(MORNING_COFFEE)
    );
  }

  #[test]
  fn evening_replacement_leaves_other_sections() {
    let doc = format!("{MORNING_COFFEE}\nlibre\n{EVENING_REVIEW}");
    let new_evening = ritual_block(SectionKind::Evening, "Review: hard day");
    let doc = save(&doc, &new_evening, SectionKind::Evening);
    assert_eq!(doc, format!("{MORNING_COFFEE}\nlibre\n{new_evening}"));
  }

  // ── Free content ─────────────────────────────────────────────────────────

  #[test]
  fn free_content_accumulates_in_order() {
    let doc = save("", "A", SectionKind::Free);
    let doc = save(&doc, "B", SectionKind::Free);
    let free = split_for_display(&doc).free;
    assert_eq!(free, "A<br><br>B");
    assert!(free.find('A') < free.find('B'));
  }

  #[test]
  fn unmarked_fragment_is_free_whatever_the_hint() {
    let outcome = merge_fragment(MORNING_COFFEE, "just text", SectionKind::Morning);
    assert_eq!(outcome.section, SectionKind::Free);
    assert!(!outcome.hint_honoured);
    assert_eq!(outcome.document, format!("{MORNING_COFFEE}\njust text"));
  }

  #[test]
  fn blank_fragment_changes_nothing() {
    let doc = format!("{MORNING_COFFEE}\nlibre");
    assert_eq!(save(&doc, "   ", SectionKind::Free), doc);
  }

  #[test]
  fn text_around_a_ritual_block_goes_to_free() {
    let fragment = format!("antes {MORNING_COFFEE} después");
    let outcome = merge_fragment("", &fragment, SectionKind::Morning);
    assert_eq!(outcome.section, SectionKind::Morning);
    assert!(outcome.hint_honoured);
    let parsed = JournalDocument::parse(&outcome.document);
    assert_eq!(parsed.morning.as_deref(), Some(MORNING_COFFEE));
    assert_eq!(parsed.free, "antes\ndespués");
  }

  // ── Parsing ──────────────────────────────────────────────────────────────

  #[test]
  fn nested_divs_stay_inside_their_block() {
    let morning = r#"<div class="ritual-block ritual-block-morning"><div>1</div><div>2</div></div>"#;
    let doc = format!("{morning}\nfree\n{EVENING_REVIEW}");
    let parsed = JournalDocument::parse(&doc);
    assert_eq!(parsed.morning.as_deref(), Some(morning));
    assert_eq!(parsed.free, "free");
    assert_eq!(parsed.evening.as_deref(), Some(EVENING_REVIEW));
  }

  #[test]
  fn unterminated_block_is_treated_as_absent() {
    let doc = r#"<div class="ritual-block ritual-block-morning">never closed"#;
    let parsed = JournalDocument::parse(doc);
    assert!(parsed.morning.is_none());
    assert_eq!(parsed.free, doc);
  }

  #[test]
  fn unterminated_fragment_lands_in_free() {
    let broken = r#"<div class="ritual-block ritual-block-evening">oops"#;
    let outcome = merge_fragment(MORNING_COFFEE, broken, SectionKind::Evening);
    assert_eq!(outcome.section, SectionKind::Free);
    let parsed = JournalDocument::parse(&outcome.document);
    assert_eq!(parsed.morning.as_deref(), Some(MORNING_COFFEE));
    assert!(parsed.evening.is_none());
    assert_eq!(parsed.free, broken);
  }

  #[test]
  fn unterminated_opener_does_not_hide_a_later_block() {
    let broken = r#"<div class="ritual-block ritual-block-evening">oops"#;
    let doc = save("", EVENING_REVIEW, SectionKind::Evening);
    let doc = save(&doc, broken, SectionKind::Free);

    let parsed = JournalDocument::parse(&doc);
    assert_eq!(parsed.evening.as_deref(), Some(EVENING_REVIEW));
    assert_eq!(parsed.free, broken);

    let later = ritual_block(SectionKind::Evening, "Review: calmer");
    let doc = save(&doc, &later, SectionKind::Evening);
    assert_eq!(doc, format!("{broken}\n{later}"));
    assert_eq!(doc.matches(EVENING_MARKER).count(), 2);
    assert_eq!(JournalDocument::parse(&doc).evening, Some(later));
  }

  #[test]
  fn unclosed_attribute_quote_does_not_hide_a_later_block() {
    let broken = r#"<div data-x="oops>texto"#;
    let doc = save("", EVENING_REVIEW, SectionKind::Evening);
    let doc = save(&doc, broken, SectionKind::Free);
    assert_eq!(doc, format!("{broken}\n{EVENING_REVIEW}"));

    let parsed = JournalDocument::parse(&doc);
    assert_eq!(parsed.evening.as_deref(), Some(EVENING_REVIEW));
    assert_eq!(parsed.free, broken);

    // The stray quote pairs up with one inside the next block.
    let quoted = r#"<div class="ritual-block ritual-block-morning">"cita</div>"#;
    let doc = format!(r#"<div title="a>b{quoted}"#);
    assert_eq!(JournalDocument::parse(&doc).morning.as_deref(), Some(quoted));
  }

  #[test]
  fn markers_are_class_tokens_not_substrings() {
    let doc = r#"<div class="ritual-block-morning-draft">x</div>"#;
    assert!(JournalDocument::parse(doc).morning.is_none());
    assert_eq!(classify_fragment(doc), SectionKind::Free);
  }

  #[test]
  fn only_the_first_block_of_a_kind_is_extracted() {
    let second = ritual_block(SectionKind::Morning, "second");
    let doc = format!("{MORNING_COFFEE}{second}");
    let parsed = JournalDocument::parse(&doc);
    assert_eq!(parsed.morning.as_deref(), Some(MORNING_COFFEE));
    assert_eq!(parsed.free, second);
  }

  #[test]
  fn uppercase_tags_are_recognised() {
    let doc = r#"<DIV class="ritual-block ritual-block-evening">noche</DIV>"#;
    let parsed = JournalDocument::parse(doc);
    assert_eq!(parsed.evening.as_deref(), Some(doc));
    assert_eq!(parsed.display().evening.as_deref(), Some("noche"));
  }

  #[test]
  fn parse_render_is_stable() {
    let doc = format!("  {EVENING_REVIEW} middle {MORNING_COFFEE}  ");
    let once = JournalDocument::parse(&doc).render();
    let twice = JournalDocument::parse(&once).render();
    assert_eq!(once, twice);
    assert_eq!(once, format!("{MORNING_COFFEE}\nmiddle\n{EVENING_REVIEW}"));
  }

  // ── Classification ───────────────────────────────────────────────────────

  #[test]
  fn classification_follows_markup() {
    assert_eq!(classify_fragment(MORNING_COFFEE), SectionKind::Morning);
    assert_eq!(classify_fragment(EVENING_REVIEW), SectionKind::Evening);
    assert_eq!(classify_fragment("<p>hola</p>"), SectionKind::Free);
    let both = format!("{EVENING_REVIEW}{MORNING_COFFEE}");
    assert_eq!(classify_fragment(&both), SectionKind::Morning);
  }

  #[test]
  fn fragment_with_both_blocks_replaces_both() {
    let both = format!(
      "{}{}",
      ritual_block(SectionKind::Morning, "m2"),
      ritual_block(SectionKind::Evening, "e2")
    );
    let doc = format!("{MORNING_COFFEE}\nlibre\n{EVENING_REVIEW}");
    let sections = split_for_display(&save(&doc, &both, SectionKind::Morning));
    assert_eq!(sections.morning.as_deref(), Some("m2"));
    assert_eq!(sections.evening.as_deref(), Some("e2"));
    assert_eq!(sections.free, "libre");
  }

  // ── Display split ────────────────────────────────────────────────────────

  #[test]
  fn round_trip_isolates_each_kind() {
    let base = format!("{MORNING_COFFEE}\nbase\n{EVENING_REVIEW}");

    let m = ritual_block(SectionKind::Morning, "<p>nuevo día</p>");
    let s = split_for_display(&save(&base, &m, SectionKind::Morning));
    assert_eq!(s.morning.as_deref(), Some("<p>nuevo día</p>"));

    let e = ritual_block(SectionKind::Evening, "<p>balance</p>");
    let s = split_for_display(&save(&base, &e, SectionKind::Evening));
    assert_eq!(s.evening.as_deref(), Some("<p>balance</p>"));

    let s = split_for_display(&save(&base, "<p>extra</p>", SectionKind::Free));
    assert_eq!(s.free, "base<br><br><p>extra</p>");
    assert_eq!(s.morning.as_deref(), Some("Gratitude: coffee"));
    assert_eq!(s.evening.as_deref(), Some("Review: good day"));
  }

  #[test]
  fn display_strips_styles_and_collapses_headings() {
    let doc = format!(
      "{}\n<h1 style=\"font-size:40px\">Título</h1>",
      ritual_block(SectionKind::Morning, r#"<p style="color:red">sol</p>"#)
    );
    let s = split_for_display(&doc);
    assert_eq!(s.morning.as_deref(), Some("<p>sol</p>"));
    assert_eq!(s.free, "<h3>Título</h3>");
    assert!(s.evening.is_none());
  }

  #[test]
  fn empty_document_displays_nothing() {
    assert_eq!(split_for_display(""), DisplaySections::default());
  }

  #[test]
  fn ritual_block_markup() {
    assert_eq!(
      ritual_block(SectionKind::Morning, "x"),
      r#"<div class="ritual-block ritual-block-morning">x</div>"#
    );
    assert_eq!(ritual_block(SectionKind::Free, "x"), "x");
    assert_eq!(SectionKind::Evening.to_string(), "evening");
    assert_eq!("morning".parse::<SectionKind>().unwrap(), SectionKind::Morning);
  }
}

//! Minimal tag scanner for journal rich text.
//!
//! Journal documents are whatever the browser editor produced, so nothing here
//! validates HTML. The scanner only needs to recognise tag boundaries, read
//! attributes, and rewrite tags for display.

// ─── Tag boundaries ──────────────────────────────────────────────────────────

/// Byte index of the `>` closing the tag that starts at `s[0] == '<'`,
/// ignoring any `>` inside quoted attribute values.
pub(crate) fn tag_end(s: &str) -> Option<usize> {
  let mut quote: Option<u8> = None;
  for (i, b) in s.bytes().enumerate().skip(1) {
    match (quote, b) {
      (Some(q), _) if b == q => quote = None,
      (Some(_), _) => {}
      (None, b'"' | b'\'') => quote = Some(b),
      (None, b'>') => return Some(i),
      (None, _) => {}
    }
  }
  None
}

/// Find `pattern` (an already-lowercased tag opener such as `"<div"` or
/// `"</div"`) in `lower` at or after `from`, requiring a tag boundary after
/// it so that `<divider>` is not mistaken for `<div>`.
pub(crate) fn find_tag(lower: &str, pattern: &str, from: usize) -> Option<usize> {
  let mut pos = from;
  while pos <= lower.len() {
    let found = pos + lower.get(pos..)?.find(pattern)?;
    let after = found + pattern.len();
    match lower.as_bytes().get(after) {
      Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
        return Some(found);
      }
      _ => pos = after,
    }
  }
  None
}

// ─── Tag parsing ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attr<'a> {
  pub name:  &'a str,
  pub value: Option<&'a str>,
  /// The attribute exactly as written, e.g. `class="a b"`.
  pub raw:   &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag<'a> {
  pub name:         &'a str,
  pub closing:      bool,
  pub self_closing: bool,
  pub attrs:        Vec<Attr<'a>>,
}

impl<'a> Tag<'a> {
  /// Parse a complete tag including its angle brackets. Comments, doctypes
  /// and anything without a tag name yield `None`.
  pub fn parse(tag: &'a str) -> Option<Self> {
    let body = tag.strip_prefix('<')?.strip_suffix('>')?;
    let (closing, body) = match body.strip_prefix('/') {
      Some(b) => (true, b),
      None => (false, body),
    };
    let name_len = body
      .find(|c: char| !c.is_ascii_alphanumeric())
      .unwrap_or(body.len());
    if name_len == 0 {
      return None;
    }
    let (name, mut rest) = body.split_at(name_len);

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
      rest = rest.trim_start();
      if rest.is_empty() {
        break;
      }
      if rest == "/" {
        self_closing = true;
        break;
      }
      let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
        .unwrap_or(rest.len());
      if name_end == 0 {
        // Stray `=` or `/`; both are single-byte.
        rest = &rest[1..];
        continue;
      }
      let attr_name = &rest[..name_end];
      let after_name = rest[name_end..].trim_start();

      let (value, remaining) = match after_name.strip_prefix('=') {
        Some(v) => {
          let v = v.trim_start();
          match v.as_bytes().first() {
            Some(&q) if q == b'"' || q == b'\'' => {
              let inner = &v[1..];
              match inner.find(char::from(q)) {
                Some(end) => (Some(&inner[..end]), &inner[end + 1..]),
                None => (Some(inner), ""),
              }
            }
            _ => {
              let end = v.find(char::is_whitespace).unwrap_or(v.len());
              (Some(&v[..end]), &v[end..])
            }
          }
        }
        None => (None, after_name),
      };

      let raw = rest[..rest.len() - remaining.len()].trim_end();
      attrs.push(Attr { name: attr_name, value, raw });
      rest = remaining;
    }

    Some(Self { name, closing, self_closing, attrs })
  }

  pub fn attr(&self, name: &str) -> Option<&Attr<'a>> {
    self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
  }

  /// Whether the `class` attribute lists `token` as one of its classes.
  pub fn has_class(&self, token: &str) -> bool {
    self
      .attr("class")
      .and_then(|a| a.value)
      .is_some_and(|v| v.split_whitespace().any(|c| c == token))
  }
}

// ─── Display cleaning ────────────────────────────────────────────────────────

/// Headings that are collapsed to `<h3>` for display.
const COLLAPSED_HEADINGS: [&str; 2] = ["h1", "h2"];
const DISPLAY_HEADING: &str = "h3";

/// Rewrite a single tag for display: inline `style` attributes are dropped
/// and top-level headings collapse to [`DISPLAY_HEADING`]. Unparseable tags
/// pass through untouched.
fn clean_tag(tag: &str) -> String {
  let Some(parsed) = Tag::parse(tag) else {
    return tag.to_string();
  };
  let collapse = COLLAPSED_HEADINGS
    .iter()
    .any(|h| parsed.name.eq_ignore_ascii_case(h));
  let has_style = parsed.attr("style").is_some();
  if !collapse && !has_style {
    return tag.to_string();
  }

  let mut out = String::with_capacity(tag.len());
  out.push('<');
  if parsed.closing {
    out.push('/');
  }
  out.push_str(if collapse { DISPLAY_HEADING } else { parsed.name });
  for attr in parsed.attrs.iter().filter(|a| !a.name.eq_ignore_ascii_case("style")) {
    out.push(' ');
    out.push_str(attr.raw);
  }
  if parsed.self_closing {
    out.push_str(" /");
  }
  out.push('>');
  out
}

/// Strip inline styling from `html` for safe display.
pub fn sanitize_for_display(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut rest = html;
  while let Some(lt) = rest.find('<') {
    out.push_str(&rest[..lt]);
    let tail = &rest[lt..];
    match tag_end(tail) {
      Some(end) => {
        out.push_str(&clean_tag(&tail[..=end]));
        rest = &tail[end + 1..];
      }
      None => {
        out.push_str(tail);
        rest = "";
      }
    }
  }
  out.push_str(rest);
  out
}

/// Escape plain text for insertion into a journal document.
pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

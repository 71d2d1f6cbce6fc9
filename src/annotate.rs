//! Emphasis markers around character spans of a snippet.
//!
//! Used to show why a publication sentence matched: the subject and object
//! mentions are wrapped in markers. Offsets count characters (Unicode scalar
//! values), `end` is exclusive. Invalid spans are skipped with a warning and
//! the rest of the text is still annotated.
//!
//! The output is meant for literal injection into markup. Input text is not
//! escaped.

use crate::error::SpanError;

/// Opening and closing markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emphasis {
    pub open: String,
    pub close: String,
}

impl Default for Emphasis {
    fn default() -> Self {
        Self {
            open: "<b>".into(),
            close: "</b>".into(),
        }
    }
}

/// A validated half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Validate a raw `[start, end]` pair against a text of `len` characters.
    pub fn from_raw(raw: Option<&[i64]>, len: usize) -> Result<Self, SpanError> {
        let raw = raw.ok_or(SpanError::Missing)?;
        let &[start, end] = raw else {
            return Err(SpanError::Arity { arity: raw.len() });
        };
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        let in_bounds = usize::try_from(start).ok().zip(usize::try_from(end).ok());
        match in_bounds {
            Some((s, e)) if e <= len => Ok(Self { start: s, end: e }),
            _ => Err(SpanError::OutOfBounds { start, end, len }),
        }
    }

    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Wrap every valid span of `text` in `emphasis` markers.
pub fn annotate(text: &str, ranges: &[Option<&[i64]>], emphasis: &Emphasis) -> String {
    let mut chars: Vec<&str> = split_chars(text);
    let spans = valid_spans(ranges, chars.len());
    if spans.is_empty() {
        return text.to_string();
    }

    // Back to front: each insertion only shifts positions after it.
    for span in spans.iter().rev() {
        chars.insert(span.end, &emphasis.close);
        chars.insert(span.start, &emphasis.open);
    }
    chars.concat()
}

/// Annotate the subject and object spans of a publication snippet.
pub fn annotate_snippet(snippet: &crate::graph::PublicationSnippet, emphasis: &Emphasis) -> String {
    let ranges: Vec<Option<&[i64]>> = [&snippet.subject, &snippet.object]
        .into_iter()
        .filter(|r| r.is_some())
        .map(|r| r.as_deref())
        .collect();
    annotate(&snippet.text, &ranges, emphasis)
}

fn split_chars(text: &str) -> Vec<&str> {
    text.char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect()
}

/// Valid spans sorted by start, with overlapping spans merged.
fn valid_spans(ranges: &[Option<&[i64]>], len: usize) -> Vec<Span> {
    let mut spans: Vec<Span> = ranges
        .iter()
        .filter_map(|raw| match Span::from_raw(*raw, len) {
            Ok(span) => Some(span),
            Err(e) => {
                tracing::warn!(error = %e, "skipping emphasis span");
                None
            }
        })
        .collect();
    spans.sort();

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if last.overlaps(&span) || *last == span => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

//! The span scanner.

use std::fmt;

use crate::{DelimiterKind, Delimiters, ScanError};

/// Line/column location inside a source string. Both are 1-based and the
/// column counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Computes the position of the byte `offset` in `source`.
    pub fn locate(source: &str, offset: usize) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What a [`Span`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Literal text, emitted as-is.
    Text,
    /// A delimiter-bounded construct.
    Construct(DelimiterKind),
}

/// A slice of template source tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub kind: SpanKind,
    /// For text, the text itself. For constructs, the body between the
    /// markers with surrounding whitespace trimmed.
    pub content: &'a str,
    /// The full source slice this span was cut from, markers included.
    pub raw: &'a str,
    /// Byte offset of `raw` in the scanned source.
    pub offset: usize,
}

impl<'a> Span<'a> {
    fn text(content: &'a str, raw: &'a str, offset: usize) -> Self {
        Self {
            kind: SpanKind::Text,
            content,
            raw,
            offset,
        }
    }

    /// Returns the construct kind, or `None` for text.
    pub fn construct_kind(&self) -> Option<DelimiterKind> {
        match self.kind {
            SpanKind::Construct(kind) => Some(kind),
            SpanKind::Text => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == SpanKind::Text
    }
}

/// Lazy scanner over template source.
///
/// Yields text and construct spans in source order. The sequence is finite:
/// after the input is exhausted, or after the first error, it yields `None`.
/// Call [`reset`](Self::reset) (or clone a fresh scanner) to scan again.
///
/// Inside a construct body, quoted strings are opaque: a close marker inside
/// `'...'` or `"..."` does not end the construct, and a backslash escapes the
/// next character within a string.
///
/// An open marker directly preceded by the escape marker is literal text. The
/// escape marker itself is dropped from the output.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    delimiters: &'a Delimiters,
    pos: usize,
    pending: Option<Span<'a>>,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, delimiters: &'a Delimiters) -> Self {
        Self {
            source,
            delimiters,
            pos: 0,
            pending: None,
            done: false,
        }
    }

    /// Rewinds to the start of the source.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.pending = None;
        self.done = false;
    }

    /// Returns the source being scanned.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Finds the next open marker at or after `self.pos`.
    ///
    /// Returns the absolute byte offset and the kind.
    fn find_open(&self) -> Option<(usize, DelimiterKind)> {
        let rest = &self.source[self.pos..];
        rest.char_indices().find_map(|(i, _)| {
            self.delimiters
                .match_open(&rest[i..])
                .map(|kind| (self.pos + i, kind))
        })
    }

    /// Whether the open marker at `start` is preceded by the escape marker
    /// that has not already been consumed.
    fn is_escaped(&self, start: usize) -> bool {
        let marker_len = self.delimiters.escape_marker.len_utf8();
        start >= self.pos + marker_len
            && self.source[..start].ends_with(self.delimiters.escape_marker)
    }

    fn scan_construct(&mut self, start: usize, kind: DelimiterKind) -> Result<Span<'a>, ScanError> {
        let pair = self.delimiters.get(kind);
        let body_start = start + pair.open.len();

        match find_close(&self.source[body_start..], &pair.close) {
            Some(len) => {
                let end = body_start + len + pair.close.len();
                self.pos = end;
                Ok(Span {
                    kind: SpanKind::Construct(kind),
                    content: self.source[body_start..body_start + len].trim(),
                    raw: &self.source[start..end],
                    offset: start,
                })
            }
            None => {
                self.done = true;
                Err(ScanError::UnterminatedConstruct {
                    kind,
                    offset: start,
                    position: Position::locate(self.source, start),
                })
            }
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Span<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(span) = self.pending.take() {
            return Some(Ok(span));
        }
        if self.done || self.pos >= self.source.len() {
            return None;
        }

        let Some((start, kind)) = self.find_open() else {
            // No more constructs - rest is text
            let rest = &self.source[self.pos..];
            let span = Span::text(rest, rest, self.pos);
            self.pos = self.source.len();
            return Some(Ok(span));
        };

        if self.is_escaped(start) {
            let marker_start = start - self.delimiters.escape_marker.len_utf8();
            let open_end = start + self.delimiters.get(kind).open.len();
            let literal = Span::text(
                &self.source[start..open_end],
                &self.source[marker_start..open_end],
                marker_start,
            );
            let text_start = self.pos;
            self.pos = open_end;

            if marker_start > text_start {
                self.pending = Some(literal);
                let text = &self.source[text_start..marker_start];
                return Some(Ok(Span::text(text, text, text_start)));
            }
            return Some(Ok(literal));
        }

        if start > self.pos {
            let text = &self.source[self.pos..start];
            let span = Span::text(text, text, self.pos);
            self.pos = start;
            return Some(Ok(span));
        }

        Some(self.scan_construct(start, kind))
    }
}

impl std::iter::FusedIterator for Scanner<'_> {}

/// Returns the byte length of `body` up to the first `close` marker that is
/// not inside a quoted string.
fn find_close(body: &str, close: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if body[i..].starts_with(close) {
                    return Some(i);
                }
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
            }
        }
    }

    None
}

//! Delimiter registry.
//!
//! A template recognizes three construct kinds, each bounded by an open and a
//! close marker. The markers are configurable per template, but every marker
//! must be non-empty and no two kinds may share an open or a close marker,
//! otherwise the scanner could not tell constructs apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DelimiterError;

/// Default open marker for escaped output.
pub const DEFAULT_OPEN_ESCAPED: &str = "{{";
/// Default close marker for escaped output.
pub const DEFAULT_CLOSE_ESCAPED: &str = "}}";
/// Default open marker for unescaped output.
pub const DEFAULT_OPEN_UNESCAPED: &str = "{{!";
/// Default close marker for unescaped output.
pub const DEFAULT_CLOSE_UNESCAPED: &str = "!}}";
/// Default open marker for statements.
pub const DEFAULT_OPEN_STATEMENT: &str = "{%";
/// Default close marker for statements.
pub const DEFAULT_CLOSE_STATEMENT: &str = "%}";
/// Default escape marker. Placed right before an open marker, it makes the
/// marker literal text.
pub const DEFAULT_ESCAPE_MARKER: char = '\\';

/// The kind of a delimiter-bounded construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterKind {
    /// `{{ expr }}` - output is HTML-escaped.
    EscapedTag,
    /// `{{! expr !}}` - output is emitted raw.
    UnescapedTag,
    /// `{% directive %}` - block directives such as `part` and `show`.
    Statement,
}

impl DelimiterKind {
    /// All kinds, in registry order.
    pub const ALL: [DelimiterKind; 3] = [
        DelimiterKind::EscapedTag,
        DelimiterKind::UnescapedTag,
        DelimiterKind::Statement,
    ];
}

impl fmt::Display for DelimiterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DelimiterKind::EscapedTag => "escaped tag",
            DelimiterKind::UnescapedTag => "unescaped tag",
            DelimiterKind::Statement => "statement",
        };
        f.write_str(name)
    }
}

/// An open/close marker pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterPair {
    pub open: String,
    pub close: String,
}

impl DelimiterPair {
    /// Creates a new pair. Validation happens when the pair is installed in
    /// a [`Delimiters`] registry.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// The delimiter registry: one [`DelimiterPair`] per [`DelimiterKind`], plus
/// the escape marker.
///
/// # Example
///
/// ```rust
/// use vellum_scanner::{DelimiterKind, Delimiters};
///
/// let mut delimiters = Delimiters::default();
/// delimiters.set(DelimiterKind::EscapedTag, "++", "--").unwrap();
///
/// assert_eq!(delimiters.get(DelimiterKind::EscapedTag).open, "++");
/// assert!(delimiters.set(DelimiterKind::Statement, "++", "%}").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub escaped: DelimiterPair,
    pub unescaped: DelimiterPair,
    pub statement: DelimiterPair,
    pub escape_marker: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            escaped: DelimiterPair::new(DEFAULT_OPEN_ESCAPED, DEFAULT_CLOSE_ESCAPED),
            unescaped: DelimiterPair::new(DEFAULT_OPEN_UNESCAPED, DEFAULT_CLOSE_UNESCAPED),
            statement: DelimiterPair::new(DEFAULT_OPEN_STATEMENT, DEFAULT_CLOSE_STATEMENT),
            escape_marker: DEFAULT_ESCAPE_MARKER,
        }
    }
}

impl Delimiters {
    /// Builds a registry from three pairs, validating them together.
    pub fn new(
        escaped: DelimiterPair,
        unescaped: DelimiterPair,
        statement: DelimiterPair,
    ) -> Result<Self, DelimiterError> {
        let delimiters = Self {
            escaped,
            unescaped,
            statement,
            escape_marker: DEFAULT_ESCAPE_MARKER,
        };
        delimiters.validate()?;
        Ok(delimiters)
    }

    /// Returns the pair registered for `kind`.
    pub fn get(&self, kind: DelimiterKind) -> &DelimiterPair {
        match kind {
            DelimiterKind::EscapedTag => &self.escaped,
            DelimiterKind::UnescapedTag => &self.unescaped,
            DelimiterKind::Statement => &self.statement,
        }
    }

    /// Replaces the pair for `kind`.
    ///
    /// The registry is left untouched if the new pair is empty or collides
    /// with another kind's markers.
    pub fn set(
        &mut self,
        kind: DelimiterKind,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Result<(), DelimiterError> {
        let mut candidate = self.clone();
        *candidate.slot_mut(kind) = DelimiterPair::new(open, close);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(
        mut self,
        kind: DelimiterKind,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Result<Self, DelimiterError> {
        self.set(kind, open, close)?;
        Ok(self)
    }

    /// Sets the escape marker.
    pub fn with_escape_marker(mut self, marker: char) -> Self {
        self.escape_marker = marker;
        self
    }

    /// Checks that all markers are non-empty and that no marker of one kind
    /// equals either marker of another kind.
    pub fn validate(&self) -> Result<(), DelimiterError> {
        for kind in DelimiterKind::ALL {
            let pair = self.get(kind);
            if pair.open.is_empty() || pair.close.is_empty() {
                return Err(DelimiterError::Empty { kind });
            }
        }

        for (i, first) in DelimiterKind::ALL.iter().enumerate() {
            for second in &DelimiterKind::ALL[i + 1..] {
                let (a, b) = (self.get(*first), self.get(*second));
                for marker in [&a.open, &a.close] {
                    if *marker == b.open || *marker == b.close {
                        return Err(DelimiterError::Conflict {
                            first: *first,
                            second: *second,
                            marker: marker.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns the kind whose open marker matches at the start of `input`.
    ///
    /// When several open markers match (`{{` and `{{!` both match `{{!x!}}`)
    /// the longest one wins.
    pub fn match_open(&self, input: &str) -> Option<DelimiterKind> {
        DelimiterKind::ALL
            .iter()
            .copied()
            .filter(|kind| input.starts_with(self.get(*kind).open.as_str()))
            .max_by_key(|kind| self.get(*kind).open.len())
    }

    fn slot_mut(&mut self, kind: DelimiterKind) -> &mut DelimiterPair {
        match kind {
            DelimiterKind::EscapedTag => &mut self.escaped,
            DelimiterKind::UnescapedTag => &mut self.unescaped,
            DelimiterKind::Statement => &mut self.statement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Delimiters::default().validate().is_ok());
    }

    #[test]
    fn longest_open_marker_wins() {
        let delimiters = Delimiters::default();
        assert_eq!(
            delimiters.match_open("{{!x!}}"),
            Some(DelimiterKind::UnescapedTag)
        );
        assert_eq!(delimiters.match_open("{{ x }}"), Some(DelimiterKind::EscapedTag));
        assert_eq!(delimiters.match_open("{% x %}"), Some(DelimiterKind::Statement));
        assert_eq!(delimiters.match_open("x {{"), None);
    }

    #[test]
    fn empty_marker_rejected() {
        let mut delimiters = Delimiters::default();
        let err = delimiters
            .set(DelimiterKind::Statement, "", "%}")
            .unwrap_err();
        assert_eq!(
            err,
            DelimiterError::Empty {
                kind: DelimiterKind::Statement
            }
        );
        // Failed set leaves the registry as it was
        assert_eq!(delimiters, Delimiters::default());
    }

    #[test]
    fn conflicting_markers_rejected() {
        let mut delimiters = Delimiters::default();
        let err = delimiters
            .set(DelimiterKind::Statement, "{{", "%}")
            .unwrap_err();
        assert!(matches!(err, DelimiterError::Conflict { .. }));
    }

    #[test]
    fn open_marker_matching_other_close_rejected() {
        let mut delimiters = Delimiters::default();
        let err = delimiters
            .set(DelimiterKind::Statement, "}}", "%}")
            .unwrap_err();
        assert_eq!(
            err,
            DelimiterError::Conflict {
                first: DelimiterKind::EscapedTag,
                second: DelimiterKind::Statement,
                marker: "}}".to_string(),
            }
        );
        assert_eq!(delimiters, Delimiters::default());

        assert!(delimiters
            .set(DelimiterKind::EscapedTag, "[[", "{%")
            .is_err());
    }

    #[test]
    fn custom_markers_accepted() {
        let delimiters = Delimiters::default()
            .with(DelimiterKind::UnescapedTag, "^^", "$$")
            .and_then(|d| d.with(DelimiterKind::EscapedTag, "++", "--"))
            .and_then(|d| d.with(DelimiterKind::Statement, "(*", "*)"))
            .unwrap();
        assert_eq!(delimiters.match_open("^^x$$"), Some(DelimiterKind::UnescapedTag));
        assert_eq!(delimiters.match_open("{{x}}"), None);
    }
}

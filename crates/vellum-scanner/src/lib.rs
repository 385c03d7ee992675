//! Delimiter-aware scanner for vellum view templates.
//!
//! This crate splits template source into literal text and
//! delimiter-bounded constructs. It knows nothing about what a construct
//! means; evaluating them is the job of the `vellum` compiler.
//!
//! # Example
//!
//! ```rust
//! use vellum_scanner::{scan, DelimiterKind, Delimiters, SpanKind};
//!
//! let delimiters = Delimiters::default();
//! let spans = scan("Hello, {{ name }}!", &delimiters).unwrap();
//!
//! assert_eq!(spans.len(), 3);
//! assert_eq!(spans[1].kind, SpanKind::Construct(DelimiterKind::EscapedTag));
//! assert_eq!(spans[1].content, "name");
//! ```
//!
//! # Construct Kinds
//!
//! | Kind | Default markers |
//! |------|-----------------|
//! | Escaped output | `{{ expr }}` |
//! | Unescaped output | `{{! expr !}}` |
//! | Statement | `{% directive %}` |
//!
//! When two open markers match at the same position, the longer one wins, so
//! `{{!` opens an unescaped construct rather than an escaped one.
//!
//! # Escaping Markers
//!
//! A backslash right before an open marker turns the marker into literal
//! text: `\{{ name }}` renders as `{{ name }}`.

mod delimiters;
mod error;
mod scanner;

pub use delimiters::{
    DelimiterKind, DelimiterPair, Delimiters, DEFAULT_CLOSE_ESCAPED, DEFAULT_CLOSE_STATEMENT,
    DEFAULT_CLOSE_UNESCAPED, DEFAULT_ESCAPE_MARKER, DEFAULT_OPEN_ESCAPED, DEFAULT_OPEN_STATEMENT,
    DEFAULT_OPEN_UNESCAPED,
};
pub use error::{DelimiterError, ScanError};
pub use scanner::{Position, Scanner, Span, SpanKind};

/// Scans `source` to completion.
///
/// Equivalent to collecting a [`Scanner`], stopping at the first error.
pub fn scan<'a>(source: &'a str, delimiters: &'a Delimiters) -> Result<Vec<Span<'a>>, ScanError> {
    Scanner::new(source, delimiters).collect()
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    // Text that cannot contain any default marker or the escape marker
    fn plain_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,!?:;'\"\n]{0,60}"
    }

    fn rejoin(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.raw).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn plain_text_is_single_text_span(text in plain_text()) {
            let delimiters = Delimiters::default();
            let spans = scan(&text, &delimiters).unwrap();
            prop_assert!(spans.iter().all(|s| s.is_text()));
            prop_assert_eq!(rejoin(&spans), text.as_str());
        }

        #[test]
        fn raw_slices_cover_source(
            before in plain_text(),
            body in "[a-z_ ]{0,20}",
            after in plain_text(),
        ) {
            let delimiters = Delimiters::default();
            let source = format!("{before}{{{{{body}}}}}{after}");
            let spans = scan(&source, &delimiters).unwrap();
            prop_assert_eq!(rejoin(&spans), source.as_str());
            let constructs: Vec<_> = spans.iter().filter(|s| !s.is_text()).collect();
            prop_assert_eq!(constructs.len(), 1);
            prop_assert_eq!(constructs[0].content, body.trim());
        }

        #[test]
        fn quoted_close_marker_never_ends_construct(inner in "[a-z ]{0,10}") {
            let delimiters = Delimiters::default();
            let source = format!("{{{{! \"{inner}!}}}}\" !}}}}");
            let spans = scan(&source, &delimiters).unwrap();
            prop_assert_eq!(spans.len(), 1);
            prop_assert_eq!(spans[0].kind, SpanKind::Construct(DelimiterKind::UnescapedTag));
        }
    }
}

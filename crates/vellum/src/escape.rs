//! Output escaping for escaped constructs.
//!
//! Escaped output (`{{ expr }}`) passes its final string through an
//! [`Escaper`] after the expression is fully evaluated; unescaped output
//! (`{{! expr !}}`) is emitted unchanged.

use std::borrow::Cow;

/// Encodes text for safe inclusion in the output document.
pub trait Escaper: Send + Sync {
    fn escape<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

/// HTML entity escaping.
///
/// Encodes `&`, `<`, `>`, `"` and `'`. An `&` that already starts a
/// well-formed entity reference (`&amp;`, `&#039;`, `&#x27;`) is left alone,
/// so escaping already-escaped text changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape<'a>(&self, input: &'a str) -> Cow<'a, str> {
        escape_html(input)
    }
}

/// Escapes nothing. Useful for plain-text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEscaper;

impl Escaper for NoEscaper {
    fn escape<'a>(&self, input: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(input)
    }
}

/// HTML-escapes `input`, borrowing when nothing needs encoding.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    let needs_escape = input.char_indices().any(|(i, c)| match c {
        '<' | '>' | '"' | '\'' => true,
        '&' => entity_len(&input[i..]).is_none(),
        _ => false,
    });
    if !needs_escape {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + input.len() / 4);
    for (i, c) in input.char_indices() {
        match c {
            '&' if entity_len(&input[i..]).is_some() => output.push('&'),
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#039;"),
            _ => output.push(c),
        }
    }
    Cow::Owned(output)
}

/// Longest entity name accepted between `&` and `;`.
const MAX_ENTITY_NAME: usize = 32;

/// Length of the entity reference at the start of `input` (which begins with
/// `&`), or `None` if it is not one.
///
/// Accepts `&name;`, `&#digits;` and `&#xhex;`.
fn entity_len(input: &str) -> Option<usize> {
    let body = input.strip_prefix('&')?;
    let end = body
        .bytes()
        .take(MAX_ENTITY_NAME + 1)
        .position(|b| b == b';')?;
    let name = &body[..end];

    let valid = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        !hex.is_empty() && hex.len() <= 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
    } else if let Some(digits) = name.strip_prefix('#') {
        !digits.is_empty() && digits.len() <= 7 && digits.chars().all(|c| c.is_ascii_digit())
    } else {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && name.len() <= MAX_ENTITY_NAME
            && chars.all(|c| c.is_ascii_alphanumeric())
    };

    valid.then_some(end + 2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn escaping_is_idempotent(s in "[a-z&<>\"'#;0-9 ]{0,40}") {
            let once = escape_html(&s).into_owned();
            let twice = escape_html(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn escaped_output_has_no_raw_specials(s in "[a-z&<>\"' ]{0,40}") {
            let escaped = escape_html(&s);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
        }

        #[test]
        fn safe_text_unchanged(s in "[a-zA-Z0-9 .,!?]{0,40}") {
            prop_assert_eq!(escape_html(&s), s.as_str());
        }
    }
}

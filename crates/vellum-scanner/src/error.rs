//! Error types for the scanner crate.

use thiserror::Error;

use crate::{DelimiterKind, Position};

/// Errors raised while scanning template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// An open marker with no matching close marker.
    #[error("unterminated {kind} at line {}, column {}", position.line, position.column)]
    UnterminatedConstruct {
        kind: DelimiterKind,
        /// Byte offset of the open marker.
        offset: usize,
        position: Position,
    },
}

/// Errors raised when configuring delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelimiterError {
    /// An open or close marker is the empty string.
    #[error("{kind} delimiters must not be empty")]
    Empty { kind: DelimiterKind },

    /// Two kinds share the same marker.
    #[error("{first} and {second} delimiters both use '{marker}'")]
    Conflict {
        first: DelimiterKind,
        second: DelimiterKind,
        marker: String,
    },
}

//! Error types for template compilation.
//!
//! This module provides [`CompileError`], the single failure type returned by
//! every compile entry point. A compile call either returns the full output
//! or one of these errors; partial output is never returned.

use thiserror::Error;
use vellum_scanner::{DelimiterError, ScanError};

/// Error raised by a template function.
///
/// Registered functions return this to abort compilation; the compiler wraps
/// it in [`CompileError::FunctionFailed`] together with the function name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error type for template compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An open delimiter without a matching close delimiter.
    #[error(transparent)]
    UnterminatedConstruct(#[from] ScanError),

    /// A call to a function that is neither registered nor built in.
    #[error("unknown template function '{name}'")]
    UnknownFunction { name: String },

    /// `show` referenced a part that was never declared.
    #[error("part '{name}' is not declared")]
    UndeclaredPart { name: String },

    /// Nested tag, part or include resolution went deeper than allowed.
    #[error("recursion limit of {limit} exceeded while resolving '{name}'")]
    RecursionLimitExceeded { name: String, limit: usize },

    /// The body of an output construct could not be parsed.
    #[error("malformed expression '{expression}' at offset {offset}: {message}")]
    MalformedExpression {
        expression: String,
        offset: usize,
        message: String,
    },

    /// A statement directive is used in the wrong place or with wrong
    /// arguments.
    #[error("malformed directive '{directive}': {message}")]
    MalformedDirective { directive: String, message: String },

    /// A statement directive that the compiler does not know.
    #[error("unknown directive '{name}'")]
    UnknownDirective { name: String },

    /// A `part` without a matching `endpart`.
    #[error("part '{name}' is never closed with endpart")]
    UnterminatedPart { name: String },

    /// The same part name declared twice.
    #[error("part '{name}' is declared more than once")]
    DuplicatePart { name: String },

    /// `include` referenced a template that is not registered.
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    /// A name that is neither a tag nor a variable, in strict mode.
    #[error("'{name}' is neither a tag nor a variable")]
    UndefinedName { name: String },

    /// A static call or access on a class that is not registered.
    #[error("unknown class '{name}'")]
    UnknownClass { name: String },

    /// A method the receiver does not provide.
    #[error("unknown method '{method}' on {receiver}")]
    UnknownMethod { receiver: String, method: String },

    /// An operator applied to values it cannot handle.
    #[error("type error: {0}")]
    TypeError(String),

    /// A template function reported a failure.
    #[error("function '{name}' failed: {source}")]
    FunctionFailed {
        name: String,
        #[source]
        source: FunctionError,
    },

    /// Invalid delimiter configuration.
    #[error(transparent)]
    InvalidDelimiters(#[from] DelimiterError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CompileError {
    pub(crate) fn directive(directive: &str, message: impl Into<String>) -> Self {
        Self::MalformedDirective {
            directive: directive.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for CompileError {
    fn from(err: serde_yaml::Error) -> Self {
        CompileError::Config(err.to_string())
    }
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

//! The expression language used inside constructs.
//!
//! A construct body such as `$user->name ?? default_name()` is tokenized by
//! [`lexer`] and parsed into an [`Expr`] tree by [`parser`]. Trees are
//! evaluated by the compiler; this module only deals with syntax.

mod ast;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use lexer::SyntaxError;
pub use parser::MAX_NESTING;

use crate::error::{CompileError, Result};

/// Parses a construct body, reporting failures as
/// [`CompileError::MalformedExpression`].
///
/// Bare identifiers accepted by `is_tag` become tag references; all other
/// bare identifiers become variable references.
pub fn parse(source: &str, is_tag: &dyn Fn(&str) -> bool) -> Result<Expr> {
    parser::parse_expression(source, is_tag).map_err(|err| CompileError::MalformedExpression {
        expression: source.to_string(),
        offset: err.offset,
        message: err.message,
    })
}

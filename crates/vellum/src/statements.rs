//! Statement directives and part collection.
//!
//! Statement constructs (`{% ... %}` by default) hold directives rather than
//! output expressions:
//!
//! - `part("name")` ... `endpart` captures the text in between
//! - `show(expr)` outputs a captured part
//! - `include(expr)` outputs a template registered on the compiler
//!
//! Parts are collected from the top-level source before anything is
//! rendered, so `show` may appear before the part it refers to.

use std::collections::HashMap;

use log::debug;
use vellum_scanner::{DelimiterKind, Span};

use crate::error::{CompileError, Result};
use crate::expr::{self, Expr};

/// Captured part bodies by name.
pub(crate) type Parts<'a> = HashMap<String, Vec<Span<'a>>>;

/// A parsed statement directive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Directive {
    Part(String),
    EndPart,
    Show(Expr),
    Include(Expr),
}

/// Parses the body of a statement construct.
pub(crate) fn parse_directive(body: &str, is_tag: &dyn Fn(&str) -> bool) -> Result<Directive> {
    match expr::parse(body, is_tag)? {
        Expr::Var(name) | Expr::Tag(name) if name == "endpart" => Ok(Directive::EndPart),
        Expr::Var(name) | Expr::Tag(name) => Err(CompileError::UnknownDirective { name }),
        Expr::Call { name, mut args } => match name.as_str() {
            "part" => match args.as_slice() {
                [arg] => arg
                    .as_str_literal()
                    .map(|name| Directive::Part(name.to_string()))
                    .ok_or_else(|| {
                        CompileError::directive(body, "part name must be a string literal")
                    }),
                _ => Err(CompileError::directive(body, "part takes exactly one name")),
            },
            "endpart" if args.is_empty() => Ok(Directive::EndPart),
            "show" | "include" if args.len() == 1 => {
                let argument = args.remove(0);
                Ok(if name == "show" {
                    Directive::Show(argument)
                } else {
                    Directive::Include(argument)
                })
            }
            "endpart" | "show" | "include" => Err(CompileError::directive(
                body,
                format!("wrong number of arguments for {}", name),
            )),
            _ => Err(CompileError::UnknownDirective { name }),
        },
        _ => Err(CompileError::directive(body, "expected a directive")),
    }
}

fn is_statement(span: &Span<'_>) -> bool {
    span.construct_kind() == Some(DelimiterKind::Statement)
}

/// Splits the top-level spans into the body to render and the declared
/// parts.
///
/// Part declarations are removed from the body. Nested parts, stray
/// `endpart`s, unterminated and duplicate parts are errors.
pub(crate) fn extract_parts<'a>(
    spans: Vec<Span<'a>>,
    is_tag: &dyn Fn(&str) -> bool,
) -> Result<(Vec<Span<'a>>, Parts<'a>)> {
    let mut body = Vec::with_capacity(spans.len());
    let mut parts = Parts::new();
    let mut open: Option<(String, Vec<Span<'a>>)> = None;

    for span in spans {
        if is_statement(&span) {
            match parse_directive(span.content, is_tag)? {
                Directive::Part(name) => {
                    if let Some((outer, _)) = &open {
                        return Err(CompileError::directive(
                            span.content,
                            format!("part '{}' cannot be declared inside part '{}'", name, outer),
                        ));
                    }
                    if parts.contains_key(&name) {
                        return Err(CompileError::DuplicatePart { name });
                    }
                    open = Some((name, Vec::new()));
                    continue;
                }
                Directive::EndPart => match open.take() {
                    Some((name, captured)) => {
                        debug!("collected part '{}' ({} spans)", name, captured.len());
                        parts.insert(name, captured);
                        continue;
                    }
                    None => {
                        return Err(CompileError::directive(
                            span.content,
                            "endpart without a matching part",
                        ))
                    }
                },
                Directive::Show(_) | Directive::Include(_) => {}
            }
        }

        match &mut open {
            Some((_, captured)) => captured.push(span),
            None => body.push(span),
        }
    }

    if let Some((name, _)) = open {
        return Err(CompileError::UnterminatedPart { name });
    }
    Ok((body, parts))
}

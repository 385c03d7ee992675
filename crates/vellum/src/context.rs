//! Per-compile resolution state.
//!
//! A [`Context`] combines one template's tags and variables with the
//! compiler's functions, classes and named templates for the duration of a
//! single compile call. It owns the part table collected from the top-level
//! source and renders span sequences, recursing into tag values, parts and
//! included templates with an explicit depth counter.

use log::{trace, warn};
use vellum_scanner::{scan, DelimiterKind, Span, SpanKind};

use crate::compiler::Compiler;
use crate::config::UndefinedBehavior;
use crate::error::{CompileError, Result};
use crate::eval::Evaluator;
use crate::expr::{self, Expr};
use crate::functions::{builtins, Output};
use crate::statements::{parse_directive, Directive, Parts};
use crate::template::Template;
use crate::value::Value;

pub(crate) struct Context<'a> {
    compiler: &'a Compiler,
    template: &'a Template,
    parts: Parts<'a>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(compiler: &'a Compiler, template: &'a Template, parts: Parts<'a>) -> Self {
        Self {
            compiler,
            template,
            parts,
        }
    }

    pub(crate) fn is_tag(&self, name: &str) -> bool {
        self.template.has_tag(name)
    }

    /// Renders `spans` at nesting level `depth`, appending to `out`.
    pub(crate) fn render(&self, spans: &[Span<'_>], depth: usize, out: &mut String) -> Result<()> {
        for span in spans {
            match span.kind {
                SpanKind::Text => out.push_str(span.content),
                SpanKind::Construct(DelimiterKind::Statement) => {
                    self.render_statement(span.content, depth, out)?
                }
                SpanKind::Construct(kind) => self.render_output(kind, span.content, depth, out)?,
            }
        }
        Ok(())
    }

    fn render_output(
        &self,
        kind: DelimiterKind,
        body: &str,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        trace!("evaluating {} '{}' at depth {}", kind, body, depth);
        let expr = expr::parse(body, &|name| self.is_tag(name))?;

        let mut evaluator = Evaluator::new(self, depth);
        let value = evaluator.eval(&expr)?;

        out.push_str(&evaluator.into_output().into_string());
        let text = value.to_string();
        match kind {
            DelimiterKind::EscapedTag => out.push_str(&self.compiler.escaper().escape(&text)),
            _ => out.push_str(&text),
        }
        Ok(())
    }

    fn render_statement(&self, body: &str, depth: usize, out: &mut String) -> Result<()> {
        match parse_directive(body, &|name| self.is_tag(name))? {
            Directive::Show(expr) => {
                let name = self.directive_argument(&expr, depth)?;
                let spans = self
                    .parts
                    .get(&name)
                    .ok_or_else(|| CompileError::UndeclaredPart { name: name.clone() })?;
                let depth = self.descend(&name, depth)?;
                trace!("showing part '{}'", name);
                self.render(spans, depth, out)
            }
            Directive::Include(expr) => {
                let name = self.directive_argument(&expr, depth)?;
                let source = self
                    .compiler
                    .named_template(&name)
                    .ok_or_else(|| CompileError::TemplateNotFound { name: name.clone() })?;
                let depth = self.descend(&name, depth)?;
                trace!("including template '{}'", name);
                let spans = scan(source, self.template.delimiters())?;
                self.render(&spans, depth, out)
            }
            Directive::Part(_) | Directive::EndPart => Err(CompileError::directive(
                body,
                "parts can only be declared in the top-level template",
            )),
        }
    }

    fn directive_argument(&self, expr: &Expr, depth: usize) -> Result<String> {
        Evaluator::new(self, depth).eval(expr).map(|v| v.to_string())
    }

    /// Returns the next nesting level, or fails once the configured limit
    /// is reached.
    fn descend(&self, name: &str, depth: usize) -> Result<usize> {
        let limit = self.compiler.config().max_depth;
        if depth + 1 > limit {
            return Err(CompileError::RecursionLimitExceeded {
                name: name.to_string(),
                limit,
            });
        }
        Ok(depth + 1)
    }

    /// Compiles the value of tag `name`.
    ///
    /// Tag values are scanned with the template's delimiters and rendered
    /// one level deeper, so tags may reference other tags.
    pub(crate) fn resolve_tag(&self, name: &str, depth: usize) -> Result<Value> {
        let Some(source) = self.template.tag(name) else {
            return self.undefined(name);
        };
        let depth = self.descend(name, depth)?;
        trace!("compiling tag '{}' at depth {}", name, depth);

        let spans = scan(source, self.template.delimiters())?;
        let mut out = String::with_capacity(source.len());
        self.render(&spans, depth, &mut out)?;
        Ok(Value::String(out))
    }

    /// Looks up variable `name`. Variables are never compiled.
    pub(crate) fn resolve_var(&self, name: &str) -> Result<Value> {
        match self.template.var(name) {
            Some(value) => Ok(value.clone()),
            None => self.undefined(name),
        }
    }

    fn undefined(&self, name: &str) -> Result<Value> {
        match self.compiler.config().undefined {
            UndefinedBehavior::Lenient => {
                warn!("'{}' is neither a tag nor a variable; output is empty", name);
                Ok(Value::Null)
            }
            UndefinedBehavior::Strict => Err(CompileError::UndefinedName {
                name: name.to_string(),
            }),
        }
    }

    /// Calls a registered function, falling back to the built-ins.
    pub(crate) fn call_function(
        &self,
        name: &str,
        args: &[Value],
        output: &mut Output,
    ) -> Result<Value> {
        let result = if let Some(function) = self.compiler.functions().get(name) {
            function.call(args, output)
        } else if let Some(builtin) = builtins::lookup(name) {
            builtin(args)
        } else {
            return Err(CompileError::UnknownFunction {
                name: name.to_string(),
            });
        };
        result.map_err(|source| CompileError::FunctionFailed {
            name: name.to_string(),
            source,
        })
    }

    pub(crate) fn call_method(&self, receiver: &Value, method: &str, args: &[Value]) -> Result<Value> {
        let unknown = || CompileError::UnknownMethod {
            receiver: receiver.type_name().to_string(),
            method: method.to_string(),
        };
        let Value::Object(object) = receiver else {
            return Err(unknown());
        };
        match object.call_method(method, args) {
            Some(result) => result.map_err(|source| CompileError::FunctionFailed {
                name: format!("{}.{}", object.type_name(), method),
                source,
            }),
            None => Err(unknown()),
        }
    }

    pub(crate) fn call_static(&self, class: &str, method: &str, args: &[Value]) -> Result<Value> {
        let object = self.compiler.class(class).ok_or_else(|| CompileError::UnknownClass {
            name: class.to_string(),
        })?;
        match object.call_method(method, args) {
            Some(result) => result.map_err(|source| CompileError::FunctionFailed {
                name: format!("{}::{}", class, method),
                source,
            }),
            None => Err(CompileError::UnknownMethod {
                receiver: class.to_string(),
                method: method.to_string(),
            }),
        }
    }

    pub(crate) fn static_member(&self, class: &str, name: &str) -> Result<Value> {
        let object = self.compiler.class(class).ok_or_else(|| CompileError::UnknownClass {
            name: class.to_string(),
        })?;
        Ok(object.get_attr(name).unwrap_or_default())
    }
}

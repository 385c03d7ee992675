//! The compiler entry point.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use vellum_scanner::{scan, DelimiterKind, Span};

use crate::config::CompilerConfig;
use crate::context::Context;
use crate::error::{CompileError, Result};
use crate::escape::{Escaper, HtmlEscaper};
use crate::expr::{self, Expr};
use crate::functions::{builtins, FunctionRegistry, FunctionResult, Output};
use crate::statements::{extract_parts, parse_directive, Directive, Parts};
use crate::template::Template;
use crate::value::{TemplateObject, Value};

/// Compiles templates into their final output.
///
/// A compiler owns everything shared between compile calls: registered
/// functions, classes for static access, named templates for `include`, the
/// output escaper and the configuration. It holds no other state, so one
/// instance can compile many templates, from several threads at once.
///
/// # Example
///
/// ```rust
/// use vellum::{Compiler, Template, Value};
///
/// let mut compiler = Compiler::new();
/// compiler.register_function("foo", |_: &[Value]| "bar");
/// compiler.register_function("baz", |args: &[Value]| {
///     args.first().map(|v| v.to_string()).unwrap_or_default().chars().rev().collect::<String>()
/// });
///
/// let template = Template::new("{{! baz(foo()) !}}");
/// assert_eq!(compiler.render(&template).unwrap(), "rab");
/// ```
pub struct Compiler {
    functions: FunctionRegistry,
    classes: HashMap<String, Arc<dyn TemplateObject>>,
    templates: HashMap<String, String>,
    escaper: Arc<dyn Escaper>,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            functions: FunctionRegistry::new(),
            classes: HashMap::new(),
            templates: HashMap::new(),
            escaper: Arc::new(HtmlEscaper),
            config: CompilerConfig::default(),
        }
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.classes.keys().collect();
        classes.sort();
        let mut templates: Vec<_> = self.templates.keys().collect();
        templates.sort();
        f.debug_struct("Compiler")
            .field("functions", &self.functions.len())
            .field("classes", &classes)
            .field("templates", &templates)
            .field("config", &self.config)
            .finish()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    ///
    /// Fails if the configuration does not pass
    /// [`CompilerConfig::validate`].
    pub fn with_config(mut self, config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Replaces the escaper used for escaped constructs.
    pub fn with_escaper<E: Escaper + 'static>(mut self, escaper: E) -> Self {
        self.escaper = Arc::new(escaper);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn escaper(&self) -> &dyn Escaper {
        self.escaper.as_ref()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Creates a template that uses the configured delimiters.
    pub fn template(&self, contents: impl Into<String>) -> Template {
        // The configuration was validated by `with_config`.
        Template::with_delimiters(contents, self.config.delimiters.clone())
    }

    /// Registers a template function.
    ///
    /// The function receives the evaluated arguments in call order and may
    /// return anything convertible to [`Value`], or a
    /// `Result<_, FunctionError>`.
    pub fn register_function<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: FunctionResult,
    {
        self.functions.register(name, f);
    }

    /// Registers a template function that can write directly to the output.
    ///
    /// Text written to the [`Output`] is emitted unescaped, before the value
    /// the construct itself produces.
    pub fn register_emitting_function<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &mut Output) -> R + Send + Sync + 'static,
        R: FunctionResult,
    {
        self.functions.register_emitting(name, f);
    }

    /// Registers an object reachable through static access, `Name::method()`
    /// and `Name::attr`.
    ///
    /// The name may be a `::`-separated path such as `app::Routes`, used in
    /// templates as `app::Routes::url("home")`. The last segment of a static
    /// access is always the method or attribute.
    pub fn register_class<T: TemplateObject + 'static>(&mut self, name: impl Into<String>, class: T) {
        self.classes.insert(name.into(), Arc::new(class));
    }

    pub(crate) fn class(&self, name: &str) -> Option<&dyn TemplateObject> {
        self.classes.get(name).map(|c| c.as_ref())
    }

    /// Registers a named template for `include`.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub(crate) fn named_template(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Compiles the template's own contents.
    pub fn render(&self, template: &Template) -> Result<String> {
        self.compile(template, template.contents())
    }

    /// Compiles `source` against the tags, variables and delimiters of
    /// `template`.
    ///
    /// Either the whole output is returned or the first error; partial
    /// output is never returned.
    pub fn compile(&self, template: &Template, source: &str) -> Result<String> {
        debug!("compiling template ({} bytes)", source.len());

        let is_tag = |name: &str| template.has_tag(name);
        let spans = scan(source, template.delimiters())?;
        let (body, parts) = extract_parts(spans, &is_tag)?;

        let context = Context::new(self, template, parts);
        let mut output = String::with_capacity(source.len());
        context.render(&body, 0, &mut output)?;

        debug!("compiled template ({} bytes of output)", output.len());
        Ok(output)
    }

    /// Checks `source` without evaluating anything.
    ///
    /// Scans the source, collects parts, parses every construct and
    /// directive, and verifies that every called function exists, every
    /// class is registered, and every literal `show` or `include` target is
    /// declared. Tag values are not checked.
    pub fn validate(&self, template: &Template, source: &str) -> Result<()> {
        let is_tag = |name: &str| template.has_tag(name);
        let spans = scan(source, template.delimiters())?;
        let (body, parts) = extract_parts(spans, &is_tag)?;

        self.validate_spans(&body, &parts, &is_tag)?;
        for spans in parts.values() {
            self.validate_spans(spans, &parts, &is_tag)?;
        }
        Ok(())
    }

    fn validate_spans(
        &self,
        spans: &[Span<'_>],
        parts: &Parts<'_>,
        is_tag: &dyn Fn(&str) -> bool,
    ) -> Result<()> {
        for span in spans {
            match span.construct_kind() {
                None => {}
                Some(DelimiterKind::Statement) => match parse_directive(span.content, is_tag)? {
                    Directive::Show(expr) => {
                        self.validate_expr(&expr)?;
                        if let Some(name) = expr.as_str_literal() {
                            if !parts.contains_key(name) {
                                return Err(CompileError::UndeclaredPart {
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                    Directive::Include(expr) => {
                        self.validate_expr(&expr)?;
                        if let Some(name) = expr.as_str_literal() {
                            if !self.has_template(name) {
                                return Err(CompileError::TemplateNotFound {
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                    Directive::Part(_) | Directive::EndPart => {
                        return Err(CompileError::directive(
                            span.content,
                            "parts can only be declared in the top-level template",
                        ))
                    }
                },
                Some(_) => self.validate_expr(&expr::parse(span.content, is_tag)?)?,
            }
        }
        Ok(())
    }

    fn validate_expr(&self, expr: &Expr) -> Result<()> {
        let mut result = Ok(());
        expr.walk(&mut |node| {
            if result.is_err() {
                return;
            }
            match node {
                Expr::Call { name, .. }
                    if !self.functions.contains(name) && !builtins::is_builtin(name) =>
                {
                    result = Err(CompileError::UnknownFunction { name: name.clone() });
                }
                Expr::StaticCall { class, .. } | Expr::StaticMember { class, .. }
                    if !self.classes.contains_key(class) =>
                {
                    result = Err(CompileError::UnknownClass {
                        name: class.clone(),
                    });
                }
                _ => {}
            }
        });
        result
    }
}

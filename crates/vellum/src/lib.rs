//! # Vellum - View Template Compiler
//!
//! `vellum` compiles view templates: literal text with delimiter-bounded
//! constructs that output escaped or raw values, call template functions,
//! reference tags and variables, and declare reusable parts.
//!
//! Scanning is done by the [`vellum_scanner`] crate; this crate parses and
//! evaluates what the scanner finds.
//!
//! ## Core Concepts
//!
//! - [`Template`]: Source text plus tags (strings that may contain further
//!   constructs) and variables (arbitrary [`Value`]s, output as-is)
//! - [`Compiler`]: Owns registered functions, classes and named templates,
//!   and compiles templates into their output
//! - [`CompilerConfig`]: Delimiters, recursion limit and undefined-name
//!   behavior, loadable from YAML
//! - [`TemplateObject`]: Capability interface for host objects used in
//!   member, method and static access
//!
//! ## Quick Start
//!
//! ```rust
//! use vellum::{Compiler, Template, Value};
//!
//! let mut compiler = Compiler::new();
//! compiler.register_function("greet", |args: &[Value]| {
//!     format!("Hello, {}!", args.first().cloned().unwrap_or_default())
//! });
//!
//! let mut template = Template::new("<p>{{ greet($name) }}</p>{{! footer !}}");
//! template.set_var("name", "Tom & Jerry");
//! template.set_tag("footer", "<hr>");
//!
//! let output = compiler.render(&template).unwrap();
//! assert_eq!(output, "<p>Hello, Tom &amp; Jerry!</p><hr>");
//! ```
//!
//! ## Constructs
//!
//! | Construct | Default syntax | Output |
//! |-----------|----------------|--------|
//! | Escaped | `{{ expr }}` | HTML-escaped value |
//! | Unescaped | `{{! expr !}}` | Raw value |
//! | Statement | `{% directive %}` | Depends on the directive |
//!
//! A backslash before an open delimiter outputs the delimiter literally:
//! `\{{ name }}` renders as `{{ name }}`.
//!
//! ## Names
//!
//! - `name(args)` always calls a function: registered functions first, then
//!   the [built-ins](functions::builtins)
//! - a bare `name` is a tag if the template has one by that name, otherwise
//!   a variable
//! - `$name` is always a variable
//!
//! Tags are compiled when output, so a tag can reference other tags:
//!
//! ```rust
//! use vellum::{Compiler, Template};
//!
//! let mut template = Template::new("{{! content !}}");
//! template.set_tag("message", "world");
//! template.set_tag("content", "Hello, {{! message !}}!");
//!
//! assert_eq!(Compiler::new().render(&template).unwrap(), "Hello, world!");
//! ```
//!
//! Tag compilation is bounded by [`CompilerConfig::max_depth`]; a tag that
//! references itself fails with [`CompileError::RecursionLimitExceeded`].
//!
//! ## Parts
//!
//! ```rust
//! use vellum::{Compiler, Template};
//!
//! let template = Template::new(
//!     r#"<main>{% show("body") %}</main>{% part("body") %}Hi{% endpart %}"#,
//! );
//! assert_eq!(Compiler::new().render(&template).unwrap(), "<main>Hi</main>");
//! ```
//!
//! ## Custom Delimiters
//!
//! ```rust
//! use vellum::{Compiler, DelimiterKind, Template};
//!
//! let mut template = Template::new("^^ $x $$ and {{ $x }}");
//! template.set_delimiters(DelimiterKind::EscapedTag, "^^", "$$").unwrap();
//! template.set_var("x", "<y>");
//!
//! assert_eq!(
//!     Compiler::new().render(&template).unwrap(),
//!     "&lt;y&gt; and {{ $x }}"
//! );
//! ```

pub mod compiler;
pub mod config;
mod context;
mod error;
pub mod escape;
mod eval;
pub mod expr;
pub mod functions;
pub mod prelude;
mod statements;
pub mod template;
pub mod value;

pub use compiler::Compiler;
pub use config::{CompilerConfig, UndefinedBehavior, DEFAULT_MAX_DEPTH};
pub use error::{CompileError, FunctionError, Result};
pub use escape::{escape_html, Escaper, HtmlEscaper, NoEscaper};
pub use functions::{FunctionRegistry, FunctionResult, Output};
pub use template::Template;
pub use value::{Number, TemplateObject, Value};

// Scanner types needed to configure delimiters
pub use vellum_scanner::{DelimiterKind, DelimiterPair, Delimiters};

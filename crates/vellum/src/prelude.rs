//! Convenient imports.
//!
//! ```rust
//! use vellum::prelude::*;
//!
//! let mut template = Template::new("{{ upper($name) }}");
//! template.set_var("name", "dave");
//! assert_eq!(Compiler::new().render(&template).unwrap(), "DAVE");
//! ```

pub use crate::{
    CompileError, Compiler, CompilerConfig, DelimiterKind, FunctionError, Output, Template,
    TemplateObject, Value,
};

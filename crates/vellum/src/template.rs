//! The per-render template state.

use std::collections::HashMap;

use vellum_scanner::{DelimiterKind, Delimiters};

use crate::error::Result;
use crate::value::Value;

/// Source text plus the tags, variables and delimiters it is compiled with.
///
/// A template is mutated by the caller before compilation and only read
/// during a compile pass.
///
/// # Example
///
/// ```rust
/// use vellum::{Compiler, Template};
///
/// let mut template = Template::new("<h1>{{ title }}</h1>{{ $count }}");
/// template.set_tag("title", "Tom & Jerry");
/// template.set_var("count", 3);
///
/// let output = Compiler::new().render(&template).unwrap();
/// assert_eq!(output, "<h1>Tom &amp; Jerry</h1>3");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Template {
    contents: String,
    tags: HashMap<String, String>,
    vars: HashMap<String, Value>,
    delimiters: Delimiters,
}

impl Template {
    /// Creates a template with the default delimiters.
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            ..Self::default()
        }
    }

    /// Creates a template with already validated delimiters.
    pub(crate) fn with_delimiters(contents: impl Into<String>, delimiters: Delimiters) -> Self {
        Self {
            contents: contents.into(),
            delimiters,
            ..Self::default()
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: impl Into<String>) {
        self.contents = contents.into();
    }

    /// Sets a tag. Tag values may contain further constructs, which are
    /// compiled when the tag is output.
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    /// Sets several tags at once.
    pub fn set_tags<I, K, V>(&mut self, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in tags {
            self.set_tag(name, value);
        }
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Binds a variable. Variables are output as-is, never compiled.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Replaces the markers for one construct kind.
    ///
    /// Fails without changing anything if a marker is empty or collides with
    /// the markers of another kind.
    pub fn set_delimiters(
        &mut self,
        kind: DelimiterKind,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Result<()> {
        self.delimiters.set(kind, open, close)?;
        Ok(())
    }

    /// Replaces all delimiters.
    pub fn set_all_delimiters(&mut self, delimiters: Delimiters) -> Result<()> {
        delimiters.validate()?;
        self.delimiters = delimiters;
        Ok(())
    }
}

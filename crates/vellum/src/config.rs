//! Compiler configuration.
//!
//! Configuration can be built in code or loaded from YAML:
//!
//! ```yaml
//! max_depth: 16
//! undefined: strict
//! delimiters:
//!   escaped: { open: "[[", close: "]]" }
//!   unescaped: { open: "[[!", close: "!]]" }
//!   statement: { open: "[%", close: "%]" }
//!   escape_marker: "\\"
//! ```
//!
//! Every field is optional; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vellum_scanner::Delimiters;

use crate::error::{CompileError, Result};

/// Default limit for nested tag, part and include resolution.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What happens when a name is neither a tag nor a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedBehavior {
    /// The name outputs nothing.
    #[default]
    Lenient,
    /// Compilation fails with [`CompileError::UndefinedName`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Delimiters given to templates created with
    /// [`Compiler::template`](crate::Compiler::template).
    pub delimiters: Delimiters,
    /// Maximum nesting of tag, part and include resolution.
    pub max_depth: usize,
    pub undefined: UndefinedBehavior,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            undefined: UndefinedBehavior::default(),
        }
    }
}

impl CompilerConfig {
    /// Parses configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CompilerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiters.validate()?;
        if self.max_depth == 0 {
            return Err(CompileError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn strict(mut self) -> Self {
        self.undefined = UndefinedBehavior::Strict;
        self
    }
}

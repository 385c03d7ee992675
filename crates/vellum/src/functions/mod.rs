//! Template functions.
//!
//! Templates call functions with `name(args...)`. A call resolves, in order,
//! against:
//!
//! 1. functions registered on the [`Compiler`](crate::Compiler) through
//!    [`FunctionRegistry`]
//! 2. the built-in functions in [`builtins`]
//!
//! and fails with [`CompileError::UnknownFunction`](crate::CompileError::UnknownFunction)
//! otherwise.
//!
//! Functions take a variadic argument list, so the same function can be
//! called with zero, one or many arguments; missing arguments are simply
//! absent from the slice.
//!
//! ## Emitting Functions
//!
//! Some functions write output directly instead of (or in addition to)
//! returning a value. Register those with
//! [`FunctionRegistry::register_emitting`]; whatever they write to the
//! [`Output`] sink lands in the document unescaped, before the construct's
//! own value.

pub mod builtins;
mod html;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::FunctionError;
use crate::value::Value;

/// Sink for text written directly by emitting functions.
#[derive(Debug, Default)]
pub struct Output {
    buffer: String,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw text.
    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Conversion of a function's return value into its final result.
///
/// Implemented for anything convertible to [`Value`] and for
/// `Result<T, FunctionError>` where `T` converts to [`Value`], so functions
/// can return either plain values or fallible results.
pub trait FunctionResult {
    fn into_result(self) -> Result<Value, FunctionError>;
}

impl<T: Into<Value>> FunctionResult for Result<T, FunctionError> {
    fn into_result(self) -> Result<Value, FunctionError> {
        self.map(Into::into)
    }
}

impl<T: Into<Value>> FunctionResult for T {
    fn into_result(self) -> Result<Value, FunctionError> {
        Ok(self.into())
    }
}

type BoxedFunction = Arc<dyn Fn(&[Value], &mut Output) -> Result<Value, FunctionError> + Send + Sync>;

/// A callable stored in a [`FunctionRegistry`].
#[derive(Clone)]
pub struct Function {
    inner: BoxedFunction,
}

impl Function {
    /// Invokes the function.
    pub fn call(&self, args: &[Value], output: &mut Output) -> Result<Value, FunctionError> {
        (self.inner)(args, output)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}

/// Name → callable table owned by a compiler instance.
///
/// # Example
///
/// ```rust
/// use vellum::{FunctionRegistry, Output, Value};
///
/// let mut functions = FunctionRegistry::new();
/// functions.register("shout", |args: &[Value]| {
///     args.first().map(|v| v.to_string().to_uppercase()).unwrap_or_default()
/// });
///
/// let shout = functions.get("shout").unwrap();
/// let mut output = Output::new();
/// let result = shout.call(&[Value::from("hey")], &mut output).unwrap();
/// assert_eq!(result, Value::from("HEY"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `name`, replacing any previous function with that
    /// name.
    pub fn register<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: FunctionResult,
    {
        let inner: BoxedFunction = Arc::new(move |args, _output| f(args).into_result());
        self.functions.insert(name.into(), Function { inner });
    }

    /// Registers a function that may write directly to the output.
    pub fn register_emitting<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &mut Output) -> R + Send + Sync + 'static,
        R: FunctionResult,
    {
        let inner: BoxedFunction = Arc::new(move |args, output| f(args, output).into_result());
        self.functions.insert(name.into(), Function { inner });
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Returns the `index`-th argument, or `Null` when it was not passed.
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    args.get(index).unwrap_or(NULL)
}

//! Built-in template functions.
//!
//! These are available in every template without registration. A function
//! registered on the compiler under the same name takes precedence.
//!
//! ## Text
//!
//! - `upper(s)`, `lower(s)`, `capitalize(s)`, `trim(s)`
//! - `reverse(s)` - reverses a string or a list
//! - `length(v)` - characters of a string, items of a list or map
//! - `join(list, sep="")`
//! - `replace(s, from, to)`
//! - `default(v, fallback)` - `fallback` when `v` is null or empty
//! - `json(v)` - compact JSON
//! - `escape(s)` - HTML escaping, for use in unescaped constructs
//! - `nl2br(s)` - inserts `<br />` before every line break
//! - `round(n, precision=0)`
//!
//! ## HTML Helpers
//!
//! `charset`, `css`, `favicon`, `http_equiv`, `meta_description`,
//! `meta_keywords`, `page_title` and `script` produce markup for a page
//! head. Their attribute values are escaped, so use them in unescaped
//! constructs: `{{! css(["/a.css", "/b.css"]) !}}`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::arg;
use super::html;
use crate::error::FunctionError;
use crate::escape::escape_html;
use crate::value::{Number, Value};

/// Signature shared by all built-in functions.
pub type Builtin = fn(&[Value]) -> Result<Value, FunctionError>;

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Builtin> = HashMap::new();
    table.insert("upper", upper);
    table.insert("lower", lower);
    table.insert("capitalize", capitalize);
    table.insert("reverse", reverse);
    table.insert("trim", trim);
    table.insert("length", length);
    table.insert("join", join);
    table.insert("replace", replace);
    table.insert("default", default);
    table.insert("json", json);
    table.insert("escape", escape);
    table.insert("nl2br", nl2br);
    table.insert("round", round);

    table.insert("charset", html::charset);
    table.insert("css", html::css);
    table.insert("favicon", html::favicon);
    table.insert("http_equiv", html::http_equiv);
    table.insert("meta_description", html::meta_description);
    table.insert("meta_keywords", html::meta_keywords);
    table.insert("page_title", html::page_title);
    table.insert("script", html::script);
    table
});

/// Looks up a built-in function by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

/// Returns true if `name` is a built-in function.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name)
}

/// Names of all built-in functions, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn text(args: &[Value], index: usize) -> String {
    arg(args, index).to_string()
}

fn upper(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(text(args, 0).to_uppercase().into())
}

fn lower(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(text(args, 0).to_lowercase().into())
}

fn capitalize(args: &[Value]) -> Result<Value, FunctionError> {
    let s = text(args, 0);
    let mut chars = s.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(capitalized.into())
}

fn reverse(args: &[Value]) -> Result<Value, FunctionError> {
    match arg(args, 0) {
        Value::List(items) => Ok(Value::List(items.iter().rev().cloned().collect())),
        other => Ok(other.to_string().chars().rev().collect::<String>().into()),
    }
}

fn trim(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(text(args, 0).trim().into())
}

fn length(args: &[Value]) -> Result<Value, FunctionError> {
    let len = match arg(args, 0) {
        Value::Null => 0,
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => other.to_string().chars().count(),
    };
    Ok(len.into())
}

fn join(args: &[Value]) -> Result<Value, FunctionError> {
    let separator = text(args, 1);
    match arg(args, 0) {
        Value::List(items) => Ok(items
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(&separator)
            .into()),
        Value::Null => Ok(Value::from("")),
        other => Err(FunctionError::new(format!(
            "join expects a list, got {}",
            other.type_name()
        ))),
    }
}

fn replace(args: &[Value]) -> Result<Value, FunctionError> {
    let from = text(args, 1);
    if from.is_empty() {
        return Ok(text(args, 0).into());
    }
    Ok(text(args, 0).replace(&from, &text(args, 2)).into())
}

fn default(args: &[Value]) -> Result<Value, FunctionError> {
    let value = arg(args, 0);
    let missing = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    Ok(if missing { arg(args, 1).clone() } else { value.clone() })
}

fn json(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(arg(args, 0).to_json().to_string().into())
}

fn escape(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(escape_html(&text(args, 0)).into_owned().into())
}

fn nl2br(args: &[Value]) -> Result<Value, FunctionError> {
    let s = text(args, 0);
    let mut output = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                output.push_str("<br />\r\n");
            }
            '\r' | '\n' => {
                output.push_str("<br />");
                output.push(c);
            }
            _ => output.push(c),
        }
    }
    Ok(output.into())
}

fn round(args: &[Value]) -> Result<Value, FunctionError> {
    let value = arg(args, 0);
    let number = value
        .as_number()
        .ok_or_else(|| FunctionError::new(format!("round expects a number, got {}", value.type_name())))?;
    let precision = match arg(args, 1).as_number() {
        Some(Number::Int(p)) => i32::try_from(p.clamp(0, 15)).unwrap_or(0),
        _ => 0,
    };

    match number {
        Number::Int(n) => Ok(Value::from(n)),
        Number::Float(n) if precision == 0 => Ok(Value::from(n.round() as i64)),
        Number::Float(n) => {
            let factor = 10f64.powi(precision);
            Ok(Value::from((n * factor).round() / factor))
        }
    }
}

//! Runtime values.
//!
//! Variables bound on a [`Template`](crate::Template), function arguments and
//! function results are all [`Value`]s. Plain data converts in from Rust
//! primitives or from anything `Serialize`; host objects with behavior plug in
//! through the [`TemplateObject`] capability trait.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::FunctionError;

/// Capability interface for host objects exposed to templates.
///
/// Templates never reach into Rust objects directly. Member access
/// (`$user->name`), method calls (`$request->is_path("/foo")`) and static
/// calls (`Routes::url("home")`) are routed through this trait, and the object
/// decides what it exposes.
///
/// # Example
///
/// ```rust
/// use vellum::{FunctionError, TemplateObject, Value};
///
/// struct Request {
///     path: String,
/// }
///
/// impl TemplateObject for Request {
///     fn get_attr(&self, name: &str) -> Option<Value> {
///         match name {
///             "path" => Some(Value::from(self.path.as_str())),
///             _ => None,
///         }
///     }
///
///     fn call_method(&self, name: &str, args: &[Value]) -> Option<Result<Value, FunctionError>> {
///         match name {
///             "is_path" => {
///                 let wanted = args.first().map(|v| v.to_string()).unwrap_or_default();
///                 Some(Ok(Value::from(self.path == wanted)))
///             }
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait TemplateObject: Send + Sync {
    /// Name used in error messages.
    fn type_name(&self) -> &str {
        "object"
    }

    /// Returns the attribute `name`, or `None` if the object has no such
    /// attribute.
    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Invokes the method `name`. Returns `None` if the object has no such
    /// method.
    fn call_method(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, FunctionError>> {
        None
    }

    /// Text emitted when the object itself is output.
    fn render(&self) -> String {
        String::new()
    }
}

/// A number, kept as an integer when it is one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }

    fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::Int(n));
        }
        s.parse::<f64>().ok().filter(|n| n.is_finite()).map(Number::Float)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

/// A runtime template value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn TemplateObject>),
}

impl Value {
    /// Converts any serializable value.
    ///
    /// Structs become maps, sequences become lists.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Wraps a host object.
    pub fn from_object<T: TemplateObject + 'static>(object: T) -> Value {
        Value::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Truthiness used by the ternary and logical operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Numeric view of the value, used by arithmetic. Numeric strings count
    /// as numbers, `null` as zero.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Null => Some(Number::Int(0)),
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::String(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Member access: map keys, list indices given as digits, or object
    /// attributes. Missing members are `None`.
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::List(items) => name.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            Value::Object(obj) => obj.get_attr(name),
            _ => None,
        }
    }

    /// Subscript access: `list[int]`, `map[string]`, or an object attribute.
    pub fn get_item(&self, key: &Value) -> Option<Value> {
        match (self, key) {
            (Value::List(items), key) => {
                let index = match key.as_number()? {
                    Number::Int(n) => usize::try_from(n).ok()?,
                    Number::Float(_) => return None,
                };
                items.get(index).cloned()
            }
            (Value::Map(map), key) => map.get(&key.to_string()).cloned(),
            (Value::Object(obj), key) => obj.get_attr(&key.to_string()),
            _ => None,
        }
    }

    /// Equality used by `==` and `!=`.
    ///
    /// Numbers compare numerically, strings compare by formatted text against
    /// any scalar, everything else compares structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_f64() == b.to_f64(),
            (Value::String(a), b) if b.is_scalar() => *a == b.to_string(),
            (a, Value::String(b)) if a.is_scalar() => a.to_string() == *b,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`. `None` when the values are
    /// not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => a.to_f64().partial_cmp(&b.to_f64()),
            (a, b) if a.is_scalar() && b.is_scalar() => {
                let (a, b) = (a.as_number()?, b.as_number()?);
                a.to_f64().partial_cmp(&b.to_f64())
            }
            _ => None,
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// Converts to JSON. Objects become their rendered text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(Number::Int(n)) => serde_json::Value::from(*n),
            Value::Number(Number::Float(n)) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(obj) => serde_json::Value::String(obj.render()),
        }
    }
}

/// Formats the value the way it appears in template output.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            // For lists and maps, use JSON representation
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
            Value::Object(obj) => f.write_str(&obj.render()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(obj) => write!(f, "Object(<{}>)", obj.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::Int(i64::from(n)))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Number(Number::Int(n)),
            Err(_) => Value::Number(Number::Float(n as f64)),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

//! Runtime value type passed between verbs.
//!
//! Script values are dynamically typed.  `Undefined` is the miss sentinel
//! returned by lookups that find nothing; it is distinct from `Null`, which
//! is a real value a script may assign.

use std::collections::BTreeMap;
use std::fmt;

use super::callable::Callable;

/// A script runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Callable(Callable),
    /// Marks an argument slot to be bound by a later application.
    Placeholder,
}

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INT: f64 = 9_007_199_254_740_991.0;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            other => other.fmt_nested(f),
        }
    }
}

impl Value {
    /// Build a numeric value, normalising integral results to `Int`.
    pub fn number(x: f64) -> Value {
        if x.is_finite() && x.fract() == 0.0 && x.abs() <= MAX_SAFE_INT {
            Value::Int(x as i64)
        } else {
            Value::Float(x)
        }
    }

    /// Name of the type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Callable(_) => "function",
            Value::Placeholder => "placeholder",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `Undefined` or `Null`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Truthiness: nil, `false`, zero, NaN and `""` are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Undefined | Value::Null | Value::Placeholder => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0 && !x.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) | Value::Callable(_) => true,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null => Some(0.0),
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    Some(0.0)
                } else {
                    t.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// Numeric coercion; values without a numeric view become NaN.
    pub fn as_float(&self) -> f64 {
        self.as_number().unwrap_or(f64::NAN)
    }

    /// Integer coercion used for indices and counts (truncates).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            other => other
                .as_number()
                .filter(|x| x.is_finite())
                .map(|x| x.trunc() as i64),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose equality: numbers compare by value across `Int`/`Float`,
    /// everything else structurally.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            _ => self == rhs,
        }
    }

    /// Parse one bare word of script text into a value.
    ///
    /// Numbers, `true`/`false`/`null`/`undefined`, `__` and JSON list/map
    /// literals are recognised; anything else stays a string.
    pub fn parse_literal(s: &str) -> Value {
        let t = s.trim();
        match t {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            "null" => return Value::Null,
            "undefined" => return Value::Undefined,
            "__" => return Value::Placeholder,
            _ => {}
        }
        if let Ok(n) = t.parse::<i64>() {
            return Value::Int(n);
        }
        if looks_numeric(t) {
            if let Ok(x) = t.parse::<f64>() {
                return Value::Float(x);
            }
        }
        if t.starts_with('[') || t.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(t) {
                return Value::from(json);
            }
        }
        Value::Str(s.to_owned())
    }

    // ── Formatting ────────────────────────────────────────────────────────────

    /// Display form used inside lists and maps: strings are quoted.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.is_nan() {
                    write!(f, "NaN")
                } else if x.is_infinite() {
                    write!(f, "{}Infinity", if *x < 0.0 { "-" } else { "" })
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: ")?;
                    v.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
            Value::Callable(c) => write!(f, "{c}"),
            Value::Placeholder => write!(f, "__"),
        }
    }
}

/// Guard against `f64::from_str` accepting words like `inf` or `NaN`.
fn looks_numeric(t: &str) -> bool {
    let body = t.strip_prefix(['-', '+']).unwrap_or(t);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

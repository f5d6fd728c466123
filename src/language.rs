use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use im::{OrdMap as ImOrdMap, Vector as ImVector};
use serde_json::Value as JsonValue;

use crate::ast::Lambda;
use crate::environment::Environment;
use crate::interner::Symbol;
use crate::numeric::{Number, format_float};
use crate::parser::escape_string;
use crate::stack;
use crate::stdlib::Builtin;

// ============================================================================
// Core Type System
// ============================================================================

/// Persistent vector with structural sharing
pub type VectorValue = ImVector<Value>;

/// Persistent map with structural sharing; iteration follows [`Value`]'s
/// total order so printing and `keys` are deterministic.
pub type MapValue = ImOrdMap<Value, Value>;

/// An interned `:keyword` constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keyword(Symbol);

impl Keyword {
    pub fn new(name: &str) -> Self {
        Keyword(Symbol::new(name))
    }

    /// The keyword spelled `name`, if any keyword with that name exists
    pub fn get(name: &str) -> Option<Self> {
        Symbol::get(name).map(Keyword)
    }

    pub fn name(&self) -> String {
        self.0.resolve()
    }

    pub fn symbol(&self) -> Symbol {
        self.0
    }

    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        self.0.with_str(f)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// A function value: parameter patterns and body from a `fn` form plus the
/// environment captured when the form was evaluated.
#[derive(Clone)]
pub struct Closure {
    pub lambda: Arc<Lambda>,
    pub env: Environment,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.lambda.params.len()
    }
}

// Manual implementation since the captured environment is opaque
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.lambda.params)
            .field("body", &self.lambda.body)
            .field("env", &self.env)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Keyword(Keyword),
    Vector(VectorValue),
    Map(MapValue),
    Closure(Arc<Closure>),
    Builtin(Arc<Builtin>),
    /// Handle to a host tool, resolved by name
    Tool(Arc<str>),
}

// ============================================================================
// Constructors and Accessors
// ============================================================================

impl Value {
    pub fn int(n: i64) -> Value {
        Value::Number(Number::Int(n))
    }

    pub fn float(x: f64) -> Value {
        Value::Number(Number::Float(x))
    }

    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn keyword(name: &str) -> Value {
        Value::Keyword(Keyword::new(name))
    }

    pub fn vector(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Vector(items.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(entries.into_iter().collect())
    }

    /// `nil` and `false` are falsy; everything else is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Closure(_) | Value::Builtin(_) | Value::Tool(_) | Value::Keyword(_)
        )
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(Number::Int(_)) => "integer",
            Value::Number(Number::Float(_)) => "float",
            Value::String(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Tool(_) => "tool",
        }
    }

    /// Rendering used by `str` and `join`: strings unquoted, nil empty
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Keyword(_) => 3,
            Value::String(_) => 4,
            Value::Vector(_) => 5,
            Value::Map(_) => 6,
            Value::Closure(_) => 7,
            Value::Builtin(_) => 8,
            Value::Tool(_) => 9,
        }
    }
}

// ============================================================================
// Equality and Ordering
// ============================================================================

/// Total structural order: by type, then by value. This is the order of map
/// keys and of `sort` without a comparator. `1` and `1.0` are distinct here;
/// the DSL's `=` uses [`values_equal`] instead.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(*b),
            (Value::Keyword(a), Value::Keyword(b)) => a.symbol().cmp_name(&b.symbol()),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Vector(a), Value::Vector(b)) => stack::guarded(|| a.iter().cmp(b.iter())),
            (Value::Map(a), Value::Map(b)) => stack::guarded(|| a.iter().cmp(b.iter())),
            (Value::Closure(a), Value::Closure(b)) => Arc::as_ptr(a).cmp(&Arc::as_ptr(b)),
            (Value::Builtin(a), Value::Builtin(b)) => a.name().cmp(b.name()),
            (Value::Tool(a), Value::Tool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

/// Equality as seen by DSL code: numbers compare numerically (`1 = 1.0`,
/// `NaN` never equal), collections element-wise, `nil = nil`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.num_eq(*y),
        (Value::Vector(x), Value::Vector(y)) => {
            x.len() == y.len()
                && stack::guarded(|| x.iter().zip(y.iter()).all(|(p, q)| values_equal(p, q)))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && stack::guarded(|| {
                    x.iter()
                        .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
                })
        }
        _ => a == b,
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Keyword(k) => write!(f, "{k}"),
            Value::Vector(items) => stack::guarded(|| {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }),
            Value::Map(map) => stack::guarded(|| {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }),
            Value::Closure(c) => write!(f, "#<fn/{}>", c.arity()),
            Value::Builtin(b) => write!(f, "#<builtin {}>", b.name()),
            Value::Tool(name) => write!(f, "#<tool {name}>"),
        }
    }
}

// ============================================================================
// JSON Interop
// ============================================================================

impl Value {
    /// Convert host JSON data. Object keys become keywords.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::int(i),
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::string(s),
            JsonValue::Array(items) => {
                stack::guarded(|| Value::vector(items.iter().map(Value::from_json)))
            }
            JsonValue::Object(entries) => stack::guarded(|| {
                Value::map(
                    entries
                        .iter()
                        .map(|(k, v)| (Value::keyword(k), Value::from_json(v))),
                )
            }),
        }
    }

    /// Convert to JSON for the host. Non-finite floats become the strings
    /// `"Infinity"`, `"-Infinity"` and `"NaN"`; keywords lose their colon.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Nil => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(Number::Int(n)) => JsonValue::from(*n),
            Value::Number(Number::Float(x)) => serde_json::Number::from_f64(*x)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(format_float(*x))),
            Value::String(s) => JsonValue::String(s.to_string()),
            Value::Keyword(k) => JsonValue::String(k.name()),
            Value::Vector(items) => {
                stack::guarded(|| JsonValue::Array(items.iter().map(Value::to_json).collect()))
            }
            Value::Map(map) => stack::guarded(|| {
                JsonValue::Object(
                    map.iter()
                        .map(|(k, v)| (json_key(k), v.to_json()))
                        .collect(),
                )
            }),
            other => JsonValue::String(other.to_string()),
        }
    }
}

fn json_key(key: &Value) -> String {
    match key {
        Value::Keyword(k) => k.name(),
        Value::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Convert a JSON object into a context or memory map
pub fn map_from_json(json: &JsonValue) -> MapValue {
    match Value::from_json(json) {
        Value::Map(m) => m,
        _ => MapValue::new(),
    }
}

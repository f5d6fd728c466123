//! Argument helpers for native builtins
//!
//! Every helper takes the builtin's name so the resulting `TypeError`
//! tells the caller which call went wrong.

use crate::error::EvalError;
use crate::language::{MapValue, Value, VectorValue};
use crate::numeric::Number;

// ============================================================================
// Value Extraction Helpers
// ============================================================================

pub fn expected(name: &str, what: &str, got: &Value) -> EvalError {
    EvalError::type_error(format!("{name}: expected {what}, got {} {got}", got.type_name()))
}

/// Extract a number. `nil` is a type error, never a silent zero.
pub fn extract_number(name: &str, value: &Value) -> Result<Number, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(expected(name, "a number", other)),
    }
}

/// Extract an integer; floats with no fractional part are accepted
pub fn extract_int(name: &str, value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Number(Number::Int(n)) => Ok(*n),
        Value::Number(Number::Float(x)) if x.fract() == 0.0 && x.is_finite() => Ok(*x as i64),
        other => Err(expected(name, "an integer", other)),
    }
}

/// Extract a non-negative integer used as a count or index
pub fn extract_index(name: &str, value: &Value) -> Result<usize, EvalError> {
    let n = extract_int(name, value)?;
    Ok(n.max(0) as usize)
}

pub fn extract_string<'v>(name: &str, value: &'v Value) -> Result<&'v str, EvalError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(expected(name, "a string", other)),
    }
}

/// Extract a map; `nil` reads as the empty map
pub fn extract_map(name: &str, value: &Value) -> Result<MapValue, EvalError> {
    match value {
        Value::Map(m) => Ok(m.clone()),
        Value::Nil => Ok(MapValue::new()),
        other => Err(expected(name, "a map", other)),
    }
}

pub fn extract_vector(name: &str, value: &Value) -> Result<VectorValue, EvalError> {
    match value {
        Value::Vector(v) => Ok(v.clone()),
        Value::Nil => Ok(VectorValue::new()),
        other => Err(expected(name, "a vector", other)),
    }
}

/// Extract a callable value (fn, builtin, keyword or tool)
pub fn extract_callable<'v>(name: &str, value: &'v Value) -> Result<&'v Value, EvalError> {
    if value.is_callable() {
        Ok(value)
    } else {
        Err(expected(name, "a function", value))
    }
}

// ============================================================================
// Result Helpers
// ============================================================================

pub fn make_bool(b: bool) -> Value {
    Value::Bool(b)
}

pub fn make_number(n: Number) -> Value {
    Value::Number(n)
}

/// `Some(v)` becomes `v`, `None` becomes `nil`
pub fn or_nil(value: Option<Value>) -> Value {
    value.unwrap_or(Value::Nil)
}

//! Polymorphic behaviors shared by the builtins and the evaluator.
//!
//! Seq coercion, keyed lookup and ordering live here so every collection
//! function treats vectors, maps, strings and `nil` the same way.

use std::cmp::Ordering;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::EvalError;
use crate::language::{Keyword, MapValue, Value, VectorValue};
use crate::native::expected;
use crate::stack;

// ============================================================================
// Seq Abstraction
// ============================================================================

/// Realize a value as a sequence of items.
///
/// - vector: its elements
/// - `nil`: empty
/// - map: `[key value]` entry vectors in key order
/// - string: grapheme clusters as one-character strings
pub fn seq_items(name: &str, value: &Value) -> Result<VectorValue, EvalError> {
    match value {
        Value::Vector(items) => Ok(items.clone()),
        Value::Nil => Ok(VectorValue::new()),
        Value::Map(map) => Ok(map
            .iter()
            .map(|(k, v)| Value::vector([k.clone(), v.clone()]))
            .collect()),
        Value::String(s) => Ok(s.graphemes(true).map(Value::string).collect()),
        other => Err(expected(name, "a collection", other)),
    }
}

/// Number of items; strings count grapheme clusters
pub fn count(name: &str, value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::Vector(items) => Ok(items.len()),
        Value::Map(map) => Ok(map.len()),
        Value::String(s) => Ok(s.graphemes(true).count()),
        Value::Nil => Ok(0),
        other => Err(expected(name, "a collection", other)),
    }
}

pub fn is_empty(name: &str, value: &Value) -> Result<bool, EvalError> {
    count(name, value).map(|n| n == 0)
}

// ============================================================================
// Keyed Lookup
// ============================================================================

/// Spell a keyword key as a string key and vice versa
fn alternate_key(key: &Value) -> Option<Value> {
    match key {
        Value::Keyword(k) => Some(k.with_str(|s| Value::string(s))),
        // A name never interned cannot be a keyword key of any map
        Value::String(s) if !s.is_empty() => Keyword::get(s).map(Value::Keyword),
        _ => None,
    }
}

/// Look a key up in a map. A keyword key also finds the string key of the
/// same name and the other way around, so JSON-shaped data reads naturally.
pub fn map_get<'m>(map: &'m MapValue, key: &Value) -> Option<&'m Value> {
    map.get(key)
        .or_else(|| alternate_key(key).and_then(|alt| map.get(&alt)))
}

/// The key actually present in `map` for `key`, for updates that should
/// keep the original spelling
pub fn resolve_key(map: &MapValue, key: &Value) -> Value {
    if map.contains_key(key) {
        return key.clone();
    }
    match alternate_key(key) {
        Some(alt) if map.contains_key(&alt) => alt,
        _ => key.clone(),
    }
}

/// `get` on any value: maps by key, vectors by integer index, else `nil`
pub fn get_value(coll: &Value, key: &Value) -> Option<Value> {
    match (coll, key) {
        (Value::Map(map), _) => map_get(map, key).cloned(),
        (Value::Vector(items), Value::Number(n)) => {
            let idx = n.to_float();
            if idx >= 0.0 && idx.fract() == 0.0 {
                items.get(idx as usize).cloned()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Follow a path of keys; a missing step yields `None`
pub fn get_in(value: &Value, path: &[Value]) -> Option<Value> {
    let mut current = value.clone();
    for key in path {
        current = get_value(&current, key)?;
    }
    Some(current)
}

pub fn contains_key(coll: &Value, key: &Value) -> bool {
    match coll {
        Value::Map(map) => map_get(map, key).is_some(),
        Value::Vector(items) => key
            .as_number()
            .map(|n| n.to_float())
            .is_some_and(|i| i >= 0.0 && i.fract() == 0.0 && (i as usize) < items.len()),
        _ => false,
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Natural ordering for `sort`, `min-by` and friends. `nil` sorts first;
/// numbers, strings, keywords and vectors compare among themselves; any
/// other mix is a type error.
pub fn compare_values(name: &str, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(a.cmp(b)),
        (Value::Number(x), Value::Number(y)) => Ok(x.total_cmp(*y)),
        (Value::String(_), Value::String(_))
        | (Value::Keyword(_), Value::Keyword(_))
        | (Value::Bool(_), Value::Bool(_)) => Ok(a.cmp(b)),
        (Value::Vector(x), Value::Vector(y)) => stack::guarded(|| {
            for (p, q) in x.iter().zip(y.iter()) {
                match compare_values(name, p, q)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(x.len().cmp(&y.len()))
        }),
        _ => Err(EvalError::type_error(format!(
            "{name}: cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Stable merge sort with a fallible comparator.
///
/// `slice::sort_by` may panic when a user comparator is inconsistent and
/// cannot propagate errors, so sorting goes through here instead.
pub fn merge_sort_by<T, E, F>(items: Vec<T>, cmp: &mut F) -> Result<Vec<T>, E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, cmp)?;
    let right = merge_sort_by(right, cmp)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut right = right.into_iter().peekable();
    for item in left {
        while let Some(r) = right.peek() {
            if cmp(r, &item)? == Ordering::Less {
                if let Some(r) = right.next() {
                    merged.push(r);
                }
            } else {
                break;
            }
        }
        merged.push(item);
    }
    merged.extend(right);
    Ok(merged)
}

//! Map access and update
//!
//! Lookups fall back between keyword and string keys of the same name.
//! Updates through `update`/`update-in`/`dissoc` write back to whichever
//! spelling the map already uses.

use super::Registry;
use crate::abstractions::{contains_key, get_in, get_value, resolve_key, seq_items};
use crate::error::EvalError;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::{MapValue, Value};
use crate::native::{expected, extract_callable, extract_map, extract_vector, make_bool, or_nil};
use crate::numeric::Number;

// ============================================================================
// Lookup
// ============================================================================

/// Usage: (get m :k), (get m :k default), (get [1 2] 0) => 1
fn get(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(get_value(&args[0], &args[1]).unwrap_or(default))
}

/// Usage: (get-in m [:a :b]), (get-in m [:a :b] default)
fn get_in_fn(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let path = seq_items("get-in", &args[1])?;
    let path: Vec<Value> = path.into_iter().collect();
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(get_in(&args[0], &path).unwrap_or(default))
}

fn contains(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_bool(contains_key(&args[0], &args[1])))
}

fn keys(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let map = extract_map("keys", &args[0])?;
    Ok(Value::vector(map.keys().cloned()))
}

fn vals(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let map = extract_map("vals", &args[0])?;
    Ok(Value::vector(map.values().cloned()))
}

/// Usage: (select-keys {:a 1 :b 2} [:a :c]) => {:a 1}
fn select_keys(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let map = extract_map("select-keys", &args[0])?;
    let mut out = MapValue::new();
    for key in seq_items("select-keys", &args[1])? {
        let actual = resolve_key(&map, &key);
        if let Some(value) = map.get(&actual) {
            out.insert(actual, value.clone());
        }
    }
    Ok(Value::Map(out))
}

// ============================================================================
// Association
// ============================================================================

/// Set one key of a map or one index of a vector; nil becomes a map
fn assoc_one(name: &str, coll: Value, key: Value, value: Value) -> Result<Value, EvalError> {
    match coll {
        Value::Map(mut map) => {
            map.insert(key, value);
            Ok(Value::Map(map))
        }
        Value::Nil => Ok(Value::map([(key, value)])),
        Value::Vector(mut items) => {
            let index = match &key {
                Value::Number(Number::Int(i)) => usize::try_from(*i).ok(),
                _ => None,
            };
            match index {
                Some(i) if i < items.len() => {
                    items.set(i, value);
                    Ok(Value::Vector(items))
                }
                Some(i) if i == items.len() => {
                    items.push_back(value);
                    Ok(Value::Vector(items))
                }
                _ => Err(EvalError::type_error(format!(
                    "{name}: index {key} out of bounds for vector of length {}",
                    items.len()
                ))),
            }
        }
        other => Err(expected(name, "a map or vector", &other)),
    }
}

/// Key to write: the existing spelling when the map already has one
fn write_key(coll: &Value, key: &Value) -> Value {
    match coll {
        Value::Map(map) => resolve_key(map, key),
        _ => key.clone(),
    }
}

/// Usage: (assoc {:a 1} :b 2 :c 3) => {:a 1, :b 2, :c 3}
fn assoc(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    if args.len() % 2 == 0 {
        return Err(EvalError::type_error(
            "assoc: expected a collection followed by key/value pairs",
        )
        .into());
    }
    let mut iter = args.into_iter();
    let mut coll = or_nil(iter.next());
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        coll = assoc_one("assoc", coll, k, v)?;
    }
    Ok(coll)
}

fn assoc_in_path(coll: Value, path: &[Value], value: Value) -> Result<Value, EvalError> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(value);
    };
    let child = get_value(&coll, key).unwrap_or(Value::Nil);
    let updated = assoc_in_path(child, rest, value)?;
    let key = write_key(&coll, key);
    assoc_one("assoc-in", coll, key, updated)
}

/// Usage: (assoc-in {} [:a :b] 1) => {:a {:b 1}}
fn assoc_in(_interp: &mut Interpreter<'_>, mut args: Vec<Value>) -> Result<Value, Unwind> {
    let value = args.pop().unwrap_or(Value::Nil);
    let path: Vec<Value> = extract_vector("assoc-in", &args[1])?.into_iter().collect();
    let coll = args.swap_remove(0);
    Ok(assoc_in_path(coll, &path, value)?)
}

/// Usage: (update {:n 1} :n inc) => {:n 2}, (update m :n + 10)
fn update(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("update", &args[2])?;
    let key = write_key(&args[0], &args[1]);
    let old = get_value(&args[0], &args[1]).unwrap_or(Value::Nil);
    let mut call_args = vec![old];
    call_args.extend(args[3..].iter().cloned());
    let new = interp.apply(f, call_args)?;
    Ok(assoc_one("update", args[0].clone(), key, new)?)
}

fn update_in_path(
    interp: &mut Interpreter<'_>,
    coll: Value,
    path: &[Value],
    f: &Value,
    extra: &[Value],
) -> Result<Value, Unwind> {
    let Some((key, rest)) = path.split_first() else {
        let mut call_args = vec![coll];
        call_args.extend(extra.iter().cloned());
        return interp.apply(f, call_args);
    };
    let child = get_value(&coll, key).unwrap_or(Value::Nil);
    let updated = update_in_path(interp, child, rest, f, extra)?;
    let key = write_key(&coll, key);
    Ok(assoc_one("update-in", coll, key, updated)?)
}

/// Usage: (update-in m [:stats :count] inc)
fn update_in(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let path: Vec<Value> = extract_vector("update-in", &args[1])?.into_iter().collect();
    let f = extract_callable("update-in", &args[2])?;
    update_in_path(interp, args[0].clone(), &path, f, &args[3..])
}

/// Usage: (dissoc {:a 1 :b 2} :a) => {:b 2}
fn dissoc(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut map = match &args[0] {
        Value::Nil => return Ok(Value::Nil),
        other => extract_map("dissoc", other)?,
    };
    for key in &args[1..] {
        let actual = resolve_key(&map, key);
        map.remove(&actual);
    }
    Ok(Value::Map(map))
}

/// Usage: (merge {:a 1} {:a 2 :b 3}) => {:a 2, :b 3}; later maps win
fn merge(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut result: Option<MapValue> = None;
    for arg in &args {
        match arg {
            Value::Nil => continue,
            Value::Map(map) => {
                let acc = result.get_or_insert_with(MapValue::new);
                for (k, v) in map.iter() {
                    acc.insert(k.clone(), v.clone());
                }
            }
            other => return Err(expected("merge", "a map", other).into()),
        }
    }
    Ok(result.map_or(Value::Nil, Value::Map))
}

// ============================================================================
// Construction
// ============================================================================

/// Usage: (zipmap [:a :b] [1 2]) => {:a 1, :b 2}
fn zipmap(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let keys = seq_items("zipmap", &args[0])?;
    let vals = seq_items("zipmap", &args[1])?;
    Ok(Value::Map(keys.into_iter().zip(vals).collect()))
}

fn hash_map(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    if args.len() % 2 != 0 {
        return Err(EvalError::type_error("hash-map: expected an even number of arguments").into());
    }
    let mut map = MapValue::new();
    let mut iter = args.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        map.insert(k, v);
    }
    Ok(Value::Map(map))
}

pub(super) fn register(registry: &mut Registry) {
    registry.fixed("get", &[2, 3], get);
    registry.fixed("get-in", &[2, 3], get_in_fn);
    registry.fixed("contains?", &[2], contains);
    registry.fixed("keys", &[1], keys);
    registry.fixed("vals", &[1], vals);
    registry.fixed("select-keys", &[2], select_keys);

    registry.collect("assoc", 3, assoc);
    registry.fixed("assoc-in", &[3], assoc_in);
    registry.collect("update", 3, update);
    registry.collect("update-in", 3, update_in);
    registry.collect("dissoc", 1, dissoc);
    registry.collect("merge", 0, merge);

    registry.fixed("zipmap", &[2], zipmap);
    registry.collect("hash-map", 0, hash_map);
}

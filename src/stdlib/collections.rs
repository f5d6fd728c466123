//! Sequence and collection functions
//!
//! Everything here accepts any seqable value (see
//! [`seq_items`](crate::abstractions::seq_items)) and returns vectors.
//! Functions taking a predicate or key function apply it through the
//! interpreter, so closures, builtins, keywords and `where` predicates all
//! work in that position.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::Registry;
use crate::abstractions::{compare_values, count, get_value, is_empty, merge_sort_by, seq_items};
use crate::error::EvalError;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::{MapValue, Value, VectorValue};
use crate::native::{
    expected, extract_callable, extract_index, extract_int, extract_number, make_bool, or_nil,
};
use crate::numeric::Number;

/// Longest vector `range` will build
const MAX_RANGE: usize = 1_000_000;

fn call1(interp: &mut Interpreter<'_>, f: &Value, x: Value) -> Result<Value, Unwind> {
    interp.apply(f, vec![x])
}

fn truthy(interp: &mut Interpreter<'_>, f: &Value, x: &Value) -> Result<bool, Unwind> {
    Ok(call1(interp, f, x.clone())?.is_truthy())
}

// ============================================================================
// Size and Access
// ============================================================================

fn count_fn(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::int(count("count", &args[0])? as i64))
}

fn empty(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_bool(is_empty("empty?", &args[0])?))
}

/// Usage: (not-empty []) => nil, (not-empty [1]) => [1]
fn not_empty(_interp: &mut Interpreter<'_>, mut args: Vec<Value>) -> Result<Value, Unwind> {
    if is_empty("not-empty", &args[0])? {
        Ok(Value::Nil)
    } else {
        Ok(args.swap_remove(0))
    }
}

fn first(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(or_nil(seq_items("first", &args[0])?.front().cloned()))
}

fn second(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(or_nil(seq_items("second", &args[0])?.get(1).cloned()))
}

fn last(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(or_nil(seq_items("last", &args[0])?.back().cloned()))
}

/// Usage: (rest [1 2 3]) => [2 3], (rest []) => []
fn rest(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let items = seq_items("rest", &args[0])?;
    Ok(Value::Vector(drop_front(&items, 1)))
}

/// Usage: (next [1]) => nil
fn next(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let items = seq_items("next", &args[0])?;
    if items.len() <= 1 {
        Ok(Value::Nil)
    } else {
        Ok(Value::Vector(drop_front(&items, 1)))
    }
}

/// Usage: (nth [1 2 3] 1) => 2, (nth [1] 5 :none) => :none
fn nth(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let items = seq_items("nth", &args[0])?;
    let index = extract_int("nth", &args[1])?;
    let found = usize::try_from(index).ok().and_then(|i| items.get(i).cloned());
    Ok(found.unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::Nil)))
}

fn drop_front(items: &VectorValue, n: usize) -> VectorValue {
    items.skip(n.min(items.len()))
}

fn keep_front(items: &VectorValue, n: usize) -> VectorValue {
    items.take(n.min(items.len()))
}

fn take(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let n = extract_index("take", &args[0])?;
    Ok(Value::Vector(keep_front(&seq_items("take", &args[1])?, n)))
}

fn drop(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let n = extract_index("drop", &args[0])?;
    Ok(Value::Vector(drop_front(&seq_items("drop", &args[1])?, n)))
}

fn take_last(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let n = extract_index("take-last", &args[0])?;
    let items = seq_items("take-last", &args[1])?;
    let skip = items.len().saturating_sub(n);
    Ok(Value::Vector(drop_front(&items, skip)))
}

/// Usage: (drop-last [1 2 3]) => [1 2], (drop-last 2 [1 2 3]) => [1]
fn drop_last(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (n, coll) = match args.as_slice() {
        [n, coll] => (extract_index("drop-last", n)?, coll),
        _ => (1, &args[0]),
    };
    let items = seq_items("drop-last", coll)?;
    let keep = items.len().saturating_sub(n);
    Ok(Value::Vector(keep_front(&items, keep)))
}

// ============================================================================
// Filtering
// ============================================================================

fn take_while(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("take-while", &args[0])?;
    let mut out = VectorValue::new();
    for item in seq_items("take-while", &args[1])? {
        if !truthy(interp, pred, &item)? {
            break;
        }
        out.push_back(item);
    }
    Ok(Value::Vector(out))
}

fn drop_while(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("drop-while", &args[0])?;
    let items = seq_items("drop-while", &args[1])?;
    let mut skip = 0;
    for item in items.iter() {
        if !truthy(interp, pred, item)? {
            break;
        }
        skip += 1;
    }
    Ok(Value::Vector(drop_front(&items, skip)))
}

fn select(
    interp: &mut Interpreter<'_>,
    name: &str,
    args: &[Value],
    keep: bool,
) -> Result<Value, Unwind> {
    let pred = extract_callable(name, &args[0])?;
    let mut out = VectorValue::new();
    for item in seq_items(name, &args[1])? {
        if truthy(interp, pred, &item)? == keep {
            out.push_back(item);
        }
    }
    Ok(Value::Vector(out))
}

/// Usage: (filter (where :age > 18) users)
fn filter(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    select(interp, "filter", &args, true)
}

fn remove(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    select(interp, "remove", &args, false)
}

/// Usage: (find even? [1 2 3 4]) => 2
fn find(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("find", &args[0])?;
    for item in seq_items("find", &args[1])? {
        if truthy(interp, pred, &item)? {
            return Ok(item);
        }
    }
    Ok(Value::Nil)
}

/// First truthy result of `pred`, or nil
fn some(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("some", &args[0])?;
    for item in seq_items("some", &args[1])? {
        let result = call1(interp, pred, item)?;
        if result.is_truthy() {
            return Ok(result);
        }
    }
    Ok(Value::Nil)
}

fn every(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("every?", &args[0])?;
    for item in seq_items("every?", &args[1])? {
        if !truthy(interp, pred, &item)? {
            return Ok(make_bool(false));
        }
    }
    Ok(make_bool(true))
}

fn not_any(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pred = extract_callable("not-any?", &args[0])?;
    for item in seq_items("not-any?", &args[1])? {
        if truthy(interp, pred, &item)? {
            return Ok(make_bool(false));
        }
    }
    Ok(make_bool(true))
}

// ============================================================================
// Transformation
// ============================================================================

/// Usage: (map inc [1 2]) => [2 3], (map + [1 2] [10 20 30]) => [11 22]
fn map(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("map", &args[0])?;
    let colls = args[1..]
        .iter()
        .map(|c| seq_items("map", c))
        .collect::<Result<Vec<_>, _>>()?;
    let len = colls.iter().map(VectorValue::len).min().unwrap_or(0);
    let mut out = VectorValue::new();
    for i in 0..len {
        let call_args = colls.iter().filter_map(|c| c.get(i).cloned()).collect();
        out.push_back(interp.apply(f, call_args)?);
    }
    Ok(Value::Vector(out))
}

/// Usage: (map-indexed (fn [i x] [i x]) [:a :b]) => [[0 :a] [1 :b]]
fn map_indexed(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("map-indexed", &args[0])?;
    let mut out = VectorValue::new();
    for (i, item) in seq_items("map-indexed", &args[1])?.into_iter().enumerate() {
        out.push_back(interp.apply(f, vec![Value::int(i as i64), item])?);
    }
    Ok(Value::Vector(out))
}

/// Non-nil results of `f`
fn keep(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("keep", &args[0])?;
    let mut out = VectorValue::new();
    for item in seq_items("keep", &args[1])? {
        let result = call1(interp, f, item)?;
        if !result.is_nil() {
            out.push_back(result);
        }
    }
    Ok(Value::Vector(out))
}

fn reverse(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let items = seq_items("reverse", &args[0])?;
    Ok(Value::Vector(items.iter().rev().cloned().collect()))
}

fn distinct(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut seen = BTreeSet::new();
    let mut out = VectorValue::new();
    for item in seq_items("distinct", &args[0])? {
        if seen.insert(item.clone()) {
            out.push_back(item);
        }
    }
    Ok(Value::Vector(out))
}

fn concat(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut out = VectorValue::new();
    for coll in &args {
        out.append(seq_items("concat", coll)?);
    }
    Ok(Value::Vector(out))
}

/// Usage: (flatten [1 [2 [3]]]) => [1 2 3]
fn flatten(_interp: &mut Interpreter<'_>, mut args: Vec<Value>) -> Result<Value, Unwind> {
    let mut out = VectorValue::new();
    let Value::Vector(top) = args.swap_remove(0) else {
        return Ok(Value::Vector(out));
    };
    // Explicit work list of partially consumed vectors, innermost last
    let mut pending = vec![top.into_iter()];
    while let Some(items) = pending.last_mut() {
        match items.next() {
            Some(Value::Vector(inner)) => pending.push(inner.into_iter()),
            Some(other) => out.push_back(other),
            None => {
                pending.pop();
            }
        }
    }
    Ok(Value::Vector(out))
}

/// Usage: (zip [1 2] [:a :b]) => [[1 :a] [2 :b]]
fn zip(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let left = seq_items("zip", &args[0])?;
    let right = seq_items("zip", &args[1])?;
    Ok(Value::Vector(
        left.into_iter()
            .zip(right)
            .map(|(a, b)| Value::vector([a, b]))
            .collect(),
    ))
}

// ============================================================================
// Building Collections
// ============================================================================

fn insert_entry(name: &str, map: &mut MapValue, entry: Value) -> Result<(), EvalError> {
    match entry {
        Value::Map(other) => {
            map.extend(other);
            Ok(())
        }
        Value::Vector(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            if let (Some(k), Some(v)) = (pair.next(), pair.next()) {
                map.insert(k, v);
            }
            Ok(())
        }
        other => Err(expected(name, "a [key value] pair", &other)),
    }
}

/// Usage: (conj [1] 2 3) => [1 2 3], (conj {:a 1} [:b 2]) => {:a 1, :b 2}
fn conj(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut iter = args.into_iter();
    match iter.next() {
        Some(Value::Map(mut map)) => {
            for entry in iter {
                insert_entry("conj", &mut map, entry)?;
            }
            Ok(Value::Map(map))
        }
        Some(Value::Vector(mut items)) => {
            items.extend(iter);
            Ok(Value::Vector(items))
        }
        Some(Value::Nil) => Ok(Value::Vector(iter.collect())),
        Some(other) => Err(expected("conj", "a vector or map", &other).into()),
        None => Ok(Value::Vector(VectorValue::new())),
    }
}

/// Usage: (into {} [[:a 1]]) => {:a 1}, (into [1] [2 3]) => [1 2 3]
fn into(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let items = seq_items("into", &args[1])?;
    match &args[0] {
        Value::Map(map) => {
            let mut map = map.clone();
            for entry in items {
                insert_entry("into", &mut map, entry)?;
            }
            Ok(Value::Map(map))
        }
        Value::Vector(target) => {
            let mut target = target.clone();
            target.append(items);
            Ok(Value::Vector(target))
        }
        Value::Nil => Ok(Value::Vector(items)),
        other => Err(expected("into", "a vector or map", other).into()),
    }
}

/// Usage: (range 3) => [0 1 2], (range 1 10 3) => [1 4 7]
fn range(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = args
        .iter()
        .map(|a| extract_number("range", a))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, end, step) = match nums.as_slice() {
        [start, end, step] => (*start, *end, *step),
        [start, end] => (*start, *end, Number::Int(1)),
        _ => (Number::Int(0), nums[0], Number::Int(1)),
    };
    if step.is_zero() || step.is_nan() {
        return Err(EvalError::ArithmeticError("range: step must be non-zero".to_string()).into());
    }

    let len = range_len(start, end, step);
    if len > MAX_RANGE as u128 {
        return Err(EvalError::ArithmeticError(format!(
            "range: more than {MAX_RANGE} elements"
        ))
        .into());
    }

    let mut out = VectorValue::new();
    let mut current = start;
    for i in 0..len {
        if i > 0 {
            current = current.add(step)?;
        }
        out.push_back(Value::Number(current));
    }
    Ok(Value::Vector(out))
}

/// Element count of a range. Integer bounds are measured exactly in i128;
/// anything else goes through f64, saturating on huge spans.
fn range_len(start: Number, end: Number, step: Number) -> u128 {
    match (start, end, step) {
        (Number::Int(s), Number::Int(e), Number::Int(st)) => {
            let (distance, stride) = if st > 0 {
                (i128::from(e) - i128::from(s), i128::from(st))
            } else {
                (i128::from(s) - i128::from(e), -i128::from(st))
            };
            if distance <= 0 {
                0
            } else {
                ((distance + stride - 1) / stride) as u128
            }
        }
        _ => {
            let span = ((end.to_float() - start.to_float()) / step.to_float()).ceil();
            if span.is_nan() || span <= 0.0 {
                0
            } else {
                span as u128
            }
        }
    }
}

fn vector(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::vector(args))
}

fn identity(_interp: &mut Interpreter<'_>, mut args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(args.swap_remove(0))
}

/// Usage: (apply + 1 [2 3]) => 6
fn apply(interp: &mut Interpreter<'_>, mut args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("apply", &args[0])?.clone();
    let spread = args.pop().map(|last| seq_items("apply", &last)).transpose()?;
    let mut call_args: Vec<Value> = args.drain(1..).collect();
    call_args.extend(spread.into_iter().flatten());
    interp.apply(&f, call_args)
}

// ============================================================================
// Ordering
// ============================================================================

/// Order two values with a user comparator: `:asc`, `:desc`, a function
/// returning a number (negative, zero, positive) or a boolean "less than".
fn compare_with(
    interp: &mut Interpreter<'_>,
    name: &str,
    comparator: Option<&Value>,
    a: &Value,
    b: &Value,
) -> Result<Ordering, Unwind> {
    let Some(cmp) = comparator else {
        return Ok(compare_values(name, a, b)?);
    };
    if let Value::Keyword(k) = cmp {
        return match k.name().as_str() {
            "asc" => Ok(compare_values(name, a, b)?),
            "desc" => Ok(compare_values(name, b, a)?),
            other => Err(EvalError::type_error(format!(
                "{name}: unknown sort order :{other}, expected :asc or :desc"
            ))
            .into()),
        };
    }
    match interp.apply(cmp, vec![a.clone(), b.clone()])? {
        Value::Number(n) => Ok(n.num_cmp(Number::Int(0)).unwrap_or(Ordering::Equal)),
        result if result.is_truthy() => Ok(Ordering::Less),
        _ => {
            if interp.apply(cmp, vec![b.clone(), a.clone()])?.is_truthy() {
                Ok(Ordering::Greater)
            } else {
                Ok(Ordering::Equal)
            }
        }
    }
}

/// Usage: (sort [3 1 2]) => [1 2 3], (sort > [3 1 2]) => [3 2 1]
fn sort(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (comparator, coll) = match args.as_slice() {
        [cmp, coll] => (Some(cmp), coll),
        _ => (None, &args[0]),
    };
    let items: Vec<Value> = seq_items("sort", coll)?.into_iter().collect();
    let sorted = merge_sort_by(items, &mut |a: &Value, b: &Value| {
        compare_with(interp, "sort", comparator, a, b)
    })?;
    Ok(Value::vector(sorted))
}

/// Usage: (sort-by :age users), (sort-by :age :desc users)
fn sort_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (comparator, coll) = match args.as_slice() {
        [_, cmp, coll] => (Some(cmp), coll),
        _ => (None, &args[1]),
    };
    let keyfn = extract_callable("sort-by", &args[0])?;
    let mut keyed = Vec::new();
    for item in seq_items("sort-by", coll)? {
        keyed.push((call1(interp, keyfn, item.clone())?, item));
    }
    let sorted = merge_sort_by(keyed, &mut |a: &(Value, Value), b: &(Value, Value)| {
        compare_with(interp, "sort-by", comparator, &a.0, &b.0)
    })?;
    Ok(Value::vector(sorted.into_iter().map(|(_, item)| item)))
}

/// Item whose key is extreme; rows with a nil key are skipped
fn extreme_by(
    interp: &mut Interpreter<'_>,
    name: &str,
    args: &[Value],
    want: Ordering,
) -> Result<Value, Unwind> {
    let keyfn = extract_callable(name, &args[0])?;
    let mut best: Option<(Value, Value)> = None;
    for item in seq_items(name, &args[1])? {
        let key = call1(interp, keyfn, item.clone())?;
        if key.is_nil() {
            continue;
        }
        let replace = match &best {
            None => true,
            Some((best_key, _)) => compare_values(name, &key, best_key)? == want,
        };
        if replace {
            best = Some((key, item));
        }
    }
    Ok(or_nil(best.map(|(_, item)| item)))
}

fn min_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    extreme_by(interp, "min-by", &args, Ordering::Less)
}

fn max_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    extreme_by(interp, "max-by", &args, Ordering::Greater)
}

// ============================================================================
// Aggregation
// ============================================================================

/// Usage: (reduce + [1 2 3]) => 6, (reduce + 10 [1 2 3]) => 16
fn reduce(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("reduce", &args[0])?;
    let (init, coll) = match args.len() {
        3 => (Some(args[1].clone()), &args[2]),
        _ => (None, &args[1]),
    };
    let mut items = seq_items("reduce", coll)?.into_iter();
    let mut acc = match init.or_else(|| items.next()) {
        Some(acc) => acc,
        None => return interp.apply(f, Vec::new()),
    };
    for item in items {
        acc = interp.apply(f, vec![acc, item])?;
    }
    Ok(acc)
}

/// Usage: (group-by :dept rows) => {"eng" [...], "ops" [...]}
fn group_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let f = extract_callable("group-by", &args[0])?;
    let mut groups = MapValue::new();
    for item in seq_items("group-by", &args[1])? {
        let key = call1(interp, f, item.clone())?;
        let group = groups
            .entry(key)
            .or_insert_with(|| Value::Vector(VectorValue::new()));
        if let Value::Vector(members) = group {
            members.push_back(item);
        }
    }
    Ok(Value::Map(groups))
}

fn frequencies(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut counts = MapValue::new();
    for item in seq_items("frequencies", &args[0])? {
        let n = match counts.get(&item) {
            Some(Value::Number(Number::Int(n))) => n + 1,
            _ => 1,
        };
        counts.insert(item, Value::int(n));
    }
    Ok(Value::Map(counts))
}

/// Numeric values of `items`, skipping nil
fn numbers(name: &str, items: impl IntoIterator<Item = Value>) -> Result<Vec<Number>, EvalError> {
    items
        .into_iter()
        .filter(|v| !v.is_nil())
        .map(|v| extract_number(name, &v))
        .collect()
}

fn keyed_values(
    interp: &mut Interpreter<'_>,
    name: &str,
    args: &[Value],
) -> Result<Vec<Value>, Unwind> {
    let keyfn = extract_callable(name, &args[0])?;
    let mut out = Vec::new();
    for item in seq_items(name, &args[1])? {
        out.push(call1(interp, keyfn, item)?);
    }
    Ok(out)
}

fn total(nums: &[Number]) -> Result<Number, EvalError> {
    nums.iter().try_fold(Number::Int(0), |acc, n| acc.add(*n))
}

fn average(nums: &[Number]) -> Result<Value, EvalError> {
    if nums.is_empty() {
        return Ok(Value::Nil);
    }
    Ok(Value::Number(total(nums)?.div(Number::Int(nums.len() as i64))))
}

/// Usage: (sum [1 2 3]) => 6; nil entries are skipped
fn sum(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = numbers("sum", seq_items("sum", &args[0])?)?;
    Ok(Value::Number(total(&nums)?))
}

/// Usage: (sum-by :amount orders)
fn sum_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = numbers("sum-by", keyed_values(interp, "sum-by", &args)?)?;
    Ok(Value::Number(total(&nums)?))
}

/// Usage: (avg [1 2]) => 1.5, (avg []) => nil
fn avg(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = numbers("avg", seq_items("avg", &args[0])?)?;
    Ok(average(&nums)?)
}

fn avg_by(interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = numbers("avg-by", keyed_values(interp, "avg-by", &args)?)?;
    Ok(average(&nums)?)
}

/// Usage: (pluck :name users) => ["ada" "bob"]
fn pluck(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let key = &args[0];
    Ok(Value::Vector(
        seq_items("pluck", &args[1])?
            .iter()
            .map(|item| or_nil(get_value(item, key)))
            .collect(),
    ))
}

pub(super) fn register(registry: &mut Registry) {
    registry.fixed("count", &[1], count_fn);
    registry.fixed("empty?", &[1], empty);
    registry.fixed("not-empty", &[1], not_empty);
    registry.fixed("first", &[1], first);
    registry.fixed("second", &[1], second);
    registry.fixed("last", &[1], last);
    registry.fixed("rest", &[1], rest);
    registry.fixed("next", &[1], next);
    registry.fixed("nth", &[2, 3], nth);
    registry.fixed("take", &[2], take);
    registry.fixed("drop", &[2], drop);
    registry.fixed("take-last", &[2], take_last);
    registry.fixed("drop-last", &[1, 2], drop_last);

    registry.fixed("take-while", &[2], take_while);
    registry.fixed("drop-while", &[2], drop_while);
    registry.fixed("filter", &[2], filter);
    registry.fixed("remove", &[2], remove);
    registry.fixed("find", &[2], find);
    registry.fixed("some", &[2], some);
    registry.fixed("every?", &[2], every);
    registry.fixed("not-any?", &[2], not_any);

    registry.collect("map", 2, map);
    registry.collect("mapv", 2, map);
    registry.fixed("map-indexed", &[2], map_indexed);
    registry.fixed("keep", &[2], keep);
    registry.fixed("reverse", &[1], reverse);
    registry.fixed("distinct", &[1], distinct);
    registry.collect("concat", 0, concat);
    registry.fixed("flatten", &[1], flatten);
    registry.fixed("zip", &[2], zip);

    registry.collect("conj", 1, conj);
    registry.fixed("into", &[2], into);
    registry.fixed("range", &[1, 2, 3], range);
    registry.collect("vector", 0, vector);
    registry.collect("list", 0, vector);
    registry.fixed("identity", &[1], identity);
    registry.collect("apply", 2, apply);

    registry.fixed("sort", &[1, 2], sort);
    registry.fixed("sort-by", &[2, 3], sort_by);
    registry.fixed("min-by", &[2], min_by);
    registry.fixed("max-by", &[2], max_by);

    registry.fixed("reduce", &[2, 3], reduce);
    registry.fixed("group-by", &[2], group_by);
    registry.fixed("frequencies", &[1], frequencies);
    registry.fixed("sum", &[1], sum);
    registry.fixed("sum-by", &[2], sum_by);
    registry.fixed("avg", &[1], avg);
    registry.fixed("avg-by", &[2], avg_by);
    registry.fixed("pluck", &[2], pluck);
}

//! Type and numeric predicates

use super::Registry;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::Value;
use crate::native::{expected, extract_number, make_bool};
use crate::numeric::Number;

/// Usage: (not nil) => true, (not 0) => false
fn not(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_bool(!args[0].is_truthy()))
}

fn type_test(args: &[Value], test: fn(&Value) -> bool) -> Result<Value, Unwind> {
    Ok(make_bool(test(&args[0])))
}

fn is_nil(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Nil))
}

fn is_some(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| !matches!(v, Value::Nil))
}

fn is_boolean(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Bool(_)))
}

fn is_number(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Number(_)))
}

fn is_integer(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Number(Number::Int(_))))
}

fn is_float(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Number(Number::Float(_))))
}

fn is_string(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::String(_)))
}

fn is_keyword(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Keyword(_)))
}

fn is_vector(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Vector(_)))
}

fn is_map(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Map(_)))
}

fn is_coll(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| matches!(v, Value::Vector(_) | Value::Map(_)))
}

fn is_fn(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    type_test(&args, |v| {
        matches!(v, Value::Closure(_) | Value::Builtin(_) | Value::Tool(_))
    })
}

// ============================================================================
// Numeric Predicates
// ============================================================================

fn number_test(name: &str, args: &[Value], test: fn(Number) -> bool) -> Result<Value, Unwind> {
    Ok(make_bool(test(extract_number(name, &args[0])?)))
}

fn is_zero(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("zero?", &args, Number::is_zero)
}

fn is_pos(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("pos?", &args, |n| n.to_float() > 0.0)
}

fn is_neg(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("neg?", &args, |n| n.to_float() < 0.0)
}

fn is_nan(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("nan?", &args, Number::is_nan)
}

fn is_infinite(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("infinite?", &args, |n| n.to_float().is_infinite())
}

fn is_finite(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    number_test("finite?", &args, |n| n.to_float().is_finite())
}

fn parity(name: &str, args: &[Value], even: bool) -> Result<Value, Unwind> {
    match &args[0] {
        Value::Number(Number::Int(n)) => Ok(make_bool((n % 2 == 0) == even)),
        other => Err(expected(name, "an integer", other).into()),
    }
}

fn is_even(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    parity("even?", &args, true)
}

fn is_odd(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    parity("odd?", &args, false)
}

pub(super) fn register(registry: &mut Registry) {
    registry.fixed("not", &[1], not);
    registry.fixed("nil?", &[1], is_nil);
    registry.fixed("some?", &[1], is_some);
    registry.fixed("boolean?", &[1], is_boolean);
    registry.fixed("number?", &[1], is_number);
    registry.fixed("integer?", &[1], is_integer);
    registry.fixed("int?", &[1], is_integer);
    registry.fixed("float?", &[1], is_float);
    registry.fixed("string?", &[1], is_string);
    registry.fixed("keyword?", &[1], is_keyword);
    registry.fixed("vector?", &[1], is_vector);
    registry.fixed("map?", &[1], is_map);
    registry.fixed("coll?", &[1], is_coll);
    registry.fixed("fn?", &[1], is_fn);

    registry.fixed("zero?", &[1], is_zero);
    registry.fixed("pos?", &[1], is_pos);
    registry.fixed("neg?", &[1], is_neg);
    registry.fixed("even?", &[1], is_even);
    registry.fixed("odd?", &[1], is_odd);
    registry.fixed("nan?", &[1], is_nan);
    registry.fixed("infinite?", &[1], is_infinite);
    registry.fixed("finite?", &[1], is_finite);
}

//! Arithmetic and comparison
//!
//! Integer arithmetic is checked; a float anywhere makes the result a float
//! and IEEE 754 takes over for infinities and NaN. `nil` is never a number.

use std::cmp::Ordering;

use super::Registry;
use crate::error::EvalError;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::{Value, values_equal};
use crate::native::{expected, extract_number, make_bool, make_number};
use crate::numeric::Number;

// ============================================================================
// Arithmetic
// ============================================================================

fn add(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let x = extract_number("+", a)?;
    let y = extract_number("+", b)?;
    x.add(y).map(make_number)
}

fn sub(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let x = extract_number("-", a)?;
    let y = extract_number("-", b)?;
    x.sub(y).map(make_number)
}

fn mul(a: &Value, b: &Value) -> Result<Value, EvalError> {
    let x = extract_number("*", a)?;
    let y = extract_number("*", b)?;
    x.mul(y).map(make_number)
}

fn negate(a: &Value) -> Result<Value, EvalError> {
    extract_number("-", a)?.neg().map(make_number)
}

fn check_sum_operand(a: &Value) -> Result<Value, EvalError> {
    extract_number("+", a).map(make_number)
}

fn check_product_operand(a: &Value) -> Result<Value, EvalError> {
    extract_number("*", a).map(make_number)
}

/// Usage: (/ 1 2) => 0.5, (/ 4) => 0.25, (/ 1 0) => Infinity
fn div(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let nums = args
        .iter()
        .map(|a| extract_number("/", a))
        .collect::<Result<Vec<_>, _>>()?;
    let result = match nums.split_first() {
        Some((only, [])) => Number::Int(1).div(*only),
        Some((first, rest)) => rest.iter().fold(*first, |acc, n| acc.div(*n)),
        None => Number::Int(1),
    };
    Ok(make_number(result))
}

fn pick(a: &Value, b: &Value, name: &str, keep: Ordering) -> Result<Value, EvalError> {
    let x = extract_number(name, a)?;
    let y = extract_number(name, b)?;
    if x.is_nan() || y.is_nan() {
        return Ok(Value::float(f64::NAN));
    }
    match x.num_cmp(y) {
        Some(ord) if ord == keep => Ok(a.clone()),
        Some(Ordering::Equal) => Ok(a.clone()),
        _ => Ok(b.clone()),
    }
}

fn max(a: &Value, b: &Value) -> Result<Value, EvalError> {
    pick(a, b, "max", Ordering::Greater)
}

fn min(a: &Value, b: &Value) -> Result<Value, EvalError> {
    pick(a, b, "min", Ordering::Less)
}

fn unary(args: &[Value], name: &str) -> Result<Number, EvalError> {
    extract_number(name, &args[0])
}

fn inc(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_number(unary(&args, "inc")?.add(Number::Int(1))?))
}

fn dec(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_number(unary(&args, "dec")?.sub(Number::Int(1))?))
}

fn abs(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let n = match unary(&args, "abs")? {
        Number::Int(i) => Number::Int(i.checked_abs().ok_or_else(|| {
            EvalError::ArithmeticError("integer overflow in abs".to_string())
        })?),
        Number::Float(x) => Number::Float(x.abs()),
    };
    Ok(make_number(n))
}

fn binary(args: &[Value], name: &str) -> Result<(Number, Number), EvalError> {
    Ok((extract_number(name, &args[0])?, extract_number(name, &args[1])?))
}

fn modulo(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (a, b) = binary(&args, "mod")?;
    Ok(make_number(a.modulo(b)?))
}

fn rem(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (a, b) = binary(&args, "rem")?;
    Ok(make_number(a.rem(b)?))
}

fn quot(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (a, b) = binary(&args, "quot")?;
    Ok(make_number(a.quot(b)?))
}

/// Usage: (pow 2 10) => 1024.0
fn pow(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (a, b) = binary(&args, "pow")?;
    Ok(Value::float(a.to_float().powf(b.to_float())))
}

fn sqrt(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::float(unary(&args, "sqrt")?.to_float().sqrt()))
}

/// Whole floats within `i64` range become integers; others stay floats
fn float_to_int(x: f64) -> Number {
    if x.is_finite() && x.abs() < 9.0e18 {
        Number::Int(x as i64)
    } else {
        Number::Float(x)
    }
}

/// Usage: (round 2.5) => 3, (round 2.4) => 2
fn round(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_number(match unary(&args, "round")? {
        Number::Float(x) => float_to_int(x.round()),
        n => n,
    }))
}

fn floor(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_number(match unary(&args, "floor")? {
        Number::Float(x) => float_to_int(x.floor()),
        n => n,
    }))
}

fn ceil(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_number(match unary(&args, "ceil")? {
        Number::Float(x) => float_to_int(x.ceil()),
        n => n,
    }))
}

fn double(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::float(unary(&args, "double")?.to_float()))
}

/// Usage: (int 3.9) => 3. Truncates toward zero.
fn int(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    match unary(&args, "int")? {
        Number::Float(x) => match float_to_int(x.trunc()) {
            Number::Int(i) => Ok(Value::int(i)),
            _ => Err(EvalError::ArithmeticError(format!(
                "int: {} has no integer value",
                Number::Float(x)
            ))
            .into()),
        },
        n => Ok(make_number(n)),
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Ordering between two operands. `None` means incomparable (a `nil`
/// operand or NaN), which makes the comparison false.
fn order(name: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    match (a, b) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(None),
        (Value::Number(x), Value::Number(y)) => Ok(x.num_cmp(*y)),
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        (Value::Number(_) | Value::String(_), Value::Number(_) | Value::String(_)) => {
            Err(EvalError::type_error(format!(
                "{name}: cannot compare {} with {}",
                a.type_name(),
                b.type_name()
            )))
        }
        (Value::Number(_) | Value::String(_), other) | (other, _) => {
            Err(expected(name, "numbers or strings", other))
        }
    }
}

fn chain(name: &str, args: &[Value], test: fn(Ordering) -> bool) -> Result<Value, Unwind> {
    for pair in args.windows(2) {
        match order(name, &pair[0], &pair[1])? {
            Some(ord) if test(ord) => {}
            _ => return Ok(make_bool(false)),
        }
    }
    if let [only] = args {
        order(name, only, only)?;
    }
    Ok(make_bool(true))
}

fn lt(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    chain("<", &args, Ordering::is_lt)
}

fn gt(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    chain(">", &args, Ordering::is_gt)
}

fn lte(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    chain("<=", &args, Ordering::is_le)
}

fn gte(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    chain(">=", &args, Ordering::is_ge)
}

/// Usage: (= 1 1.0) => true, (= nil nil) => true, (= [1 2] [1 2]) => true
fn eq(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_bool(args.windows(2).all(|p| values_equal(&p[0], &p[1]))))
}

fn not_eq(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(make_bool(!args.windows(2).all(|p| values_equal(&p[0], &p[1]))))
}

pub(super) fn register(registry: &mut Registry) {
    registry.variadic("+", add, Value::int(0), Some(check_sum_operand));
    registry.variadic("-", sub, Value::int(0), Some(negate));
    registry.variadic("*", mul, Value::int(1), Some(check_product_operand));
    registry.collect("/", 1, div);
    registry.variadic_non_empty("max", max);
    registry.variadic_non_empty("min", min);

    registry.fixed("inc", &[1], inc);
    registry.fixed("dec", &[1], dec);
    registry.fixed("abs", &[1], abs);
    registry.fixed("mod", &[2], modulo);
    registry.fixed("rem", &[2], rem);
    registry.fixed("quot", &[2], quot);
    registry.fixed("pow", &[2], pow);
    registry.fixed("sqrt", &[1], sqrt);
    registry.fixed("round", &[1], round);
    registry.fixed("floor", &[1], floor);
    registry.fixed("ceil", &[1], ceil);
    registry.fixed("double", &[1], double);
    registry.fixed("int", &[1], int);

    registry.collect("=", 1, eq);
    registry.collect("not=", 1, not_eq);
    registry.collect("<", 1, lt);
    registry.collect(">", 1, gt);
    registry.collect("<=", 1, lte);
    registry.collect(">=", 1, gte);
}

use std::cmp::Ordering;
use std::fmt;

use crate::error::EvalError;

// ============================================================================
// Numeric Type System
// ============================================================================

/// A DSL number: a 64-bit integer or an IEEE 754 double.
///
/// Integer arithmetic is checked; mixing an integer with a float produces a
/// float, and floats follow IEEE 754 for infinities and NaN.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

pub const INFINITY_LITERAL: &str = "Infinity";
pub const NEG_INFINITY_LITERAL: &str = "-Infinity";
pub const NAN_LITERAL: &str = "NaN";

// ============================================================================
// Display Implementation
// ============================================================================

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => write!(f, "{}", format_float(*x)),
        }
    }
}

/// Render a float so that reading it back yields the same number.
///
/// Finite values always carry a decimal point or exponent; the special
/// values use their literal spellings.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        NAN_LITERAL.to_string()
    } else if x.is_infinite() {
        if x > 0.0 {
            INFINITY_LITERAL.to_string()
        } else {
            NEG_INFINITY_LITERAL.to_string()
        }
    } else {
        // Debug keeps a trailing ".0" and switches to exponent form for
        // very large/small magnitudes, both of which the lexer accepts.
        format!("{x:?}")
    }
}

/// Recognize the special float spellings.
pub fn special_float(text: &str) -> Option<f64> {
    match text {
        INFINITY_LITERAL | "##Inf" => Some(f64::INFINITY),
        NEG_INFINITY_LITERAL | "##-Inf" => Some(f64::NEG_INFINITY),
        NAN_LITERAL | "##NaN" => Some(f64::NAN),
        _ => None,
    }
}

// ============================================================================
// Equality and Comparison
// ============================================================================

/// Structural equality: same representation and same value, with NaN equal
/// to itself so that literals and map keys compare reliably. Use `num_eq`
/// for the DSL's `=`.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

impl Number {
    pub fn to_float(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Number::Float(x) if x.is_nan())
    }

    /// Numeric equality across representations: `1 == 1.0`, `NaN != NaN`.
    pub fn num_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.to_float() == b.to_float(),
        }
    }

    /// Numeric ordering; `None` whenever NaN is involved.
    pub fn num_cmp(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_float().partial_cmp(&b.to_float()),
        }
    }

    /// Total order used for sorting and map keys. NaN sorts after every
    /// other number; an int sorts before an equal float.
    pub fn total_cmp(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Float(a), Number::Float(b)) => a.total_cmp(&b),
            (a, b) => match (a.is_nan(), b.is_nan()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => a
                    .to_float()
                    .partial_cmp(&b.to_float())
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| match a {
                        Number::Int(_) => Ordering::Less,
                        Number::Float(_) => Ordering::Greater,
                    }),
            },
        }
    }
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

fn overflow(op: &str) -> EvalError {
    EvalError::ArithmeticError(format!("integer overflow in {op}"))
}

impl Number {
    pub fn add(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                a.checked_add(b).map(Number::Int).ok_or_else(|| overflow("+"))
            }
            (a, b) => Ok(Number::Float(a.to_float() + b.to_float())),
        }
    }

    pub fn sub(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                a.checked_sub(b).map(Number::Int).ok_or_else(|| overflow("-"))
            }
            (a, b) => Ok(Number::Float(a.to_float() - b.to_float())),
        }
    }

    pub fn mul(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                a.checked_mul(b).map(Number::Int).ok_or_else(|| overflow("*"))
            }
            (a, b) => Ok(Number::Float(a.to_float() * b.to_float())),
        }
    }

    /// Division always yields a float: `1/0 = Infinity`, `0/0 = NaN`.
    pub fn div(self, other: Number) -> Number {
        Number::Float(self.to_float() / other.to_float())
    }

    pub fn neg(self) -> Result<Number, EvalError> {
        match self {
            Number::Int(n) => n.checked_neg().map(Number::Int).ok_or_else(|| overflow("-")),
            Number::Float(x) => Ok(Number::Float(-x)),
        }
    }

    /// Truncating integer quotient (`quot`)
    pub fn quot(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::ArithmeticError(
                "quot: division by zero".to_string(),
            )),
            (Number::Int(a), Number::Int(b)) => {
                a.checked_div(b).map(Number::Int).ok_or_else(|| overflow("quot"))
            }
            (a, b) => Ok(Number::Float((a.to_float() / b.to_float()).trunc())),
        }
    }

    /// Remainder with the sign of the dividend (`rem`)
    pub fn rem(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::ArithmeticError(
                "rem: division by zero".to_string(),
            )),
            (Number::Int(a), Number::Int(b)) => {
                a.checked_rem(b).map(Number::Int).ok_or_else(|| overflow("rem"))
            }
            (a, b) => Ok(Number::Float(a.to_float() % b.to_float())),
        }
    }

    /// Modulus with the sign of the divisor (`mod`)
    pub fn modulo(self, other: Number) -> Result<Number, EvalError> {
        match (self, other) {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::ArithmeticError(
                "mod: division by zero".to_string(),
            )),
            (Number::Int(a), Number::Int(b)) => {
                let r = a.checked_rem(b).ok_or_else(|| overflow("mod"))?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(Number::Int(r + b))
                } else {
                    Ok(Number::Int(r))
                }
            }
            (a, b) => {
                let (a, b) = (a.to_float(), b.to_float());
                let r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    Ok(Number::Float(r + b))
                } else {
                    Ok(Number::Float(r))
                }
            }
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

impl Number {
    /// Parse a numeric literal as written in source: integers, decimals,
    /// exponent forms, and the special float spellings.
    pub fn parse_literal(text: &str) -> Option<Number> {
        if let Some(x) = special_float(text) {
            return Some(Number::Float(x));
        }
        let looks_float = text.contains(['.', 'e', 'E']);
        if looks_float {
            text.parse::<f64>().ok().filter(|x| x.is_finite()).map(Number::Float)
        } else {
            text.parse::<i64>().ok().map(Number::Int)
        }
    }
}

//! String functions and number parsing

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::Registry;
use crate::abstractions::seq_items;
use crate::error::EvalError;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::{Keyword, Value};
use crate::native::{expected, extract_index, extract_string, make_bool};
use crate::numeric::special_float;

static INTEGER_LITERAL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").ok());
static DECIMAL_LITERAL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").ok());

fn matches_literal(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

// ============================================================================
// Building Strings
// ============================================================================

/// Usage: (str "a" 1 :k nil) => "a1:k"
fn str_fn(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let joined: String = args.iter().map(Value::to_display_string).collect();
    Ok(Value::string(joined))
}

/// Usage: (join ["a" "b"]) => "ab", (join ", " ["a" "b"]) => "a, b"
fn join(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let (separator, coll) = match args.as_slice() {
        [sep, coll] => (extract_string("join", sep)?, coll),
        _ => ("", &args[0]),
    };
    let parts: Vec<String> = seq_items("join", coll)?
        .iter()
        .map(Value::to_display_string)
        .collect();
    Ok(Value::string(parts.join(separator)))
}

/// Usage: (subs "hello" 1 3) => "el". Indices count grapheme clusters.
fn subs(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let s = extract_string("subs", &args[0])?;
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    let start = extract_index("subs", &args[1])?;
    let end = match args.get(2) {
        Some(end) => extract_index("subs", end)?,
        None => graphemes.len(),
    };
    if start > end || end > graphemes.len() {
        return Err(EvalError::type_error(format!(
            "subs: range {start}..{end} out of bounds for string of length {}",
            graphemes.len()
        ))
        .into());
    }
    Ok(Value::string(graphemes[start..end].concat()))
}

/// Usage: (split "a,b" ",") => ["a" "b"]; an empty separator splits
/// into characters
fn split(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let s = extract_string("split", &args[0])?;
    let sep = extract_string("split", &args[1])?;
    if sep.is_empty() {
        return Ok(Value::vector(s.graphemes(true).map(Value::string)));
    }
    Ok(Value::vector(s.split(sep).map(Value::string)))
}

fn upper_case(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::string(extract_string("upper-case", &args[0])?.to_uppercase()))
}

fn lower_case(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::string(extract_string("lower-case", &args[0])?.to_lowercase()))
}

fn trim(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::string(extract_string("trim", &args[0])?.trim()))
}

/// Usage: (replace "a-b-c" "-" "_") => "a_b_c"
fn replace(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let s = extract_string("replace", &args[0])?;
    let from = extract_string("replace", &args[1])?;
    let to = extract_string("replace", &args[2])?;
    if from.is_empty() {
        return Ok(args[0].clone());
    }
    Ok(Value::string(s.replace(from, to)))
}

// ============================================================================
// Testing Strings
// ============================================================================

fn string_test(name: &str, args: &[Value], test: fn(&str, &str) -> bool) -> Result<Value, Unwind> {
    let s = extract_string(name, &args[0])?;
    let part = extract_string(name, &args[1])?;
    Ok(make_bool(test(s, part)))
}

fn includes(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    string_test("includes?", &args, |s, part| s.contains(part))
}

fn starts_with(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    string_test("starts-with?", &args, |s, part| s.starts_with(part))
}

fn ends_with(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    string_test("ends-with?", &args, |s, part| s.ends_with(part))
}

// ============================================================================
// Regular Expressions
// ============================================================================

fn compile(name: &str, pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern)
        .map_err(|e| EvalError::type_error(format!("{name}: invalid regex {pattern:?}: {e}")))
}

/// Whole match as a string, or `[match group1 ...]` when the pattern has
/// capture groups
fn match_value(caps: &regex::Captures<'_>) -> Value {
    if caps.len() == 1 {
        return caps.get(0).map_or(Value::Nil, |m| Value::string(m.as_str()));
    }
    Value::vector(
        caps.iter()
            .map(|g| g.map_or(Value::Nil, |m| Value::string(m.as_str()))),
    )
}

/// Usage: (re-find "\\d+" "abc123") => "123"
fn re_find(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let re = compile("re-find", extract_string("re-find", &args[0])?)?;
    let s = extract_string("re-find", &args[1])?;
    Ok(re.captures(s).map_or(Value::Nil, |caps| match_value(&caps)))
}

/// Usage: (re-matches "\\d+" "123") => "123", (re-matches "\\d+" "a1") => nil
fn re_matches(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let pattern = extract_string("re-matches", &args[0])?;
    // A non-capturing wrapper anchors the match without shifting groups
    let re = compile("re-matches", &format!("^(?:{pattern})$"))?;
    let s = extract_string("re-matches", &args[1])?;
    Ok(re.captures(s).map_or(Value::Nil, |caps| match_value(&caps)))
}

// ============================================================================
// Parsing and Conversion
// ============================================================================

/// Usage: (parse-long "42") => 42, (parse-long "4.2") => nil
fn parse_long(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let Value::String(s) = &args[0] else {
        return Ok(Value::Nil);
    };
    let text = s.trim();
    if !matches_literal(&INTEGER_LITERAL, text) {
        return Ok(Value::Nil);
    }
    Ok(text.parse::<i64>().map_or(Value::Nil, Value::int))
}

/// Usage: (parse-double "1.5") => 1.5, (parse-double "Infinity") => Infinity
fn parse_double(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let Value::String(s) = &args[0] else {
        return Ok(Value::Nil);
    };
    let text = s.trim();
    if let Some(x) = special_float(text) {
        return Ok(Value::float(x));
    }
    if !matches_literal(&DECIMAL_LITERAL, text) {
        return Ok(Value::Nil);
    }
    Ok(text.parse::<f64>().map_or(Value::Nil, Value::float))
}

/// Usage: (name :user) => "user"
fn name(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    match &args[0] {
        Value::Keyword(k) => Ok(Value::string(k.name())),
        Value::String(_) => Ok(args[0].clone()),
        other => Err(expected("name", "a keyword or string", other).into()),
    }
}

/// Usage: (keyword "user") => :user
fn keyword(_interp: &mut Interpreter<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    match &args[0] {
        Value::Keyword(_) => Ok(args[0].clone()),
        Value::String(s) if !s.is_empty() => Ok(Value::Keyword(Keyword::new(s))),
        Value::Nil => Ok(Value::Nil),
        other => Err(expected("keyword", "a non-empty string", other).into()),
    }
}

pub(super) fn register(registry: &mut Registry) {
    registry.collect("str", 0, str_fn);
    registry.fixed("join", &[1, 2], join);
    registry.fixed("subs", &[2, 3], subs);
    registry.fixed("split", &[2], split);
    registry.fixed("upper-case", &[1], upper_case);
    registry.fixed("lower-case", &[1], lower_case);
    registry.fixed("trim", &[1], trim);
    registry.fixed("replace", &[3], replace);

    registry.fixed("includes?", &[2], includes);
    registry.fixed("starts-with?", &[2], starts_with);
    registry.fixed("ends-with?", &[2], ends_with);

    registry.fixed("re-find", &[2], re_find);
    registry.fixed("re-matches", &[2], re_matches);

    registry.fixed("parse-long", &[1], parse_long);
    registry.fixed("parse-double", &[1], parse_double);
    registry.fixed("name", &[1], name);
    registry.fixed("keyword", &[1], keyword);
}

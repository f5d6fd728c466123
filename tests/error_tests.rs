//! Every failure comes back as a tagged error, never a panic.

use pretty_assertions::assert_eq;
use ptc_lisp::{
    AnalysisError, EvalConfig, Error, EvalError, MapValue, NoTools, RunOptions, Value, run,
    run_with_options,
};

fn eval(code: &str) -> Result<Value, Error> {
    run(code, &MapValue::new(), &MapValue::new(), &NoTools).map(|out| out.result)
}

fn kind(code: &str) -> &'static str {
    match eval(code) {
        Ok(value) => panic!("{code} should fail, got {value}"),
        Err(e) => e.kind(),
    }
}

// ============================================================================
// Reader
// ============================================================================

#[test]
fn test_parse_errors_report_position() {
    let Err(Error::Parse(err)) = eval("(+ 1\n  (* 2 3)") else {
        panic!("expected a parse error");
    };
    assert_eq!((err.line, err.column), (1, 1));
    assert!(err.message.contains("missing )"));

    let Err(Error::Parse(err)) = eval("(foo))") else {
        panic!("expected a parse error");
    };
    assert_eq!(err.column, 6);
}

#[test]
fn test_malformed_literals() {
    assert_eq!(kind("\"unterminated"), "parse_error");
    assert_eq!(kind("12abc"), "parse_error");
    assert_eq!(kind(":ns/key"), "parse_error");
    assert_eq!(kind("{:a}"), "parse_error");
    assert_eq!(kind("#{1 2}"), "parse_error");
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_terminal_forms_need_exactly_one_argument() {
    for code in ["(return)", "(return 1 2)", "(fail)", "(fail 1 2)"] {
        assert_eq!(kind(code), "invalid_arity", "{code}");
    }
}

#[test]
fn test_special_form_arity() {
    assert_eq!(kind("(if)"), "invalid_arity");
    assert_eq!(kind("(if 1 2 3 4)"), "invalid_arity");
    assert_eq!(kind("(where :a >)"), "invalid_arity");
    assert_eq!(kind("(def x)"), "invalid_arity");
}

#[test]
fn test_malformed_forms() {
    assert_eq!(kind("(let [x] x)"), "invalid_form");
    assert_eq!(kind("(fn x x)"), "invalid_form");
    assert_eq!(kind("(where :a like 1)"), "invalid_form");
    assert_eq!(kind("(let [{:keys x} {}] x)"), "invalid_pattern");
}

#[test]
fn test_recur_placement() {
    assert_eq!(kind("(recur 1)"), "invalid_recur");
    assert_eq!(kind("(loop [i 0] (+ 1 (recur i)))"), "invalid_recur");
    assert_eq!(kind("(loop [i 0] (recur 1 2))"), "invalid_recur");
}

#[test]
fn test_unknown_namespace() {
    assert_eq!(
        eval("state/x").unwrap_err(),
        Error::Analysis(AnalysisError::UnknownNamespace("state".to_string()))
    );
}

#[test]
fn test_empty_program() {
    assert_eq!(kind(""), "empty_program");
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_unbound_variable() {
    assert_eq!(
        eval("(+ 1 undefined)").unwrap_err(),
        Error::Eval(EvalError::UnboundVariable("undefined".to_string()))
    );
}

#[test]
fn test_not_callable() {
    assert_eq!(kind("(1 2)"), "not_callable");
    assert_eq!(kind("(\"f\" 1)"), "not_callable");
    assert_eq!(kind("(nil)"), "not_callable");
}

#[test]
fn test_keyword_call_arity() {
    assert_eq!(
        eval("(:a)").unwrap_err(),
        Error::Eval(EvalError::InvalidKeywordCall {
            keyword: ":a".to_string(),
            got: 0
        })
    );
    assert_eq!(kind("(:a {} 1 2)"), "invalid_keyword_call");
}

#[test]
fn test_destructure_errors() {
    let err = eval("(let [{:keys [a]} 5] a)").unwrap_err();
    assert_eq!(err.kind(), "destructure_error");
    assert!(err.to_string().contains("expected map"));

    let err = eval("(let [[a b] {:a 1}] a)").unwrap_err();
    assert_eq!(err.kind(), "destructure_error");
    assert!(err.to_string().contains("expected list"));
}

#[test]
fn test_builtins_cannot_be_redefined() {
    assert_eq!(
        eval("(def count 1)").unwrap_err(),
        Error::Eval(EvalError::Redefinition {
            name: "count".to_string()
        })
    );
}

#[test]
fn test_errors_stop_evaluation() {
    assert_eq!(kind("(do (+ 1 nil) (fail :never))"), "type_error");
    assert_eq!(kind("[1 (count 5) (fail :never)]"), "type_error");
}

#[test]
fn test_recursion_limit() {
    let down = "(defn down [n] (if (zero? n) 0 (+ 1 (down (dec n)))))";
    let run_down = |n: usize| eval(&format!("{down} (down {n})"));
    let limit = EvalConfig::default().recursion_limit;
    assert_eq!(
        run_down(1000).unwrap_err(),
        Error::Eval(EvalError::RecursionLimitExceeded { limit })
    );
    assert_eq!(run_down(200).unwrap(), Value::int(200));
}

#[test]
fn test_custom_recursion_limit() {
    let options = RunOptions::default().with_config(EvalConfig::default().with_recursion_limit(16));
    let err = run_with_options(
        "(defn down [n] (if (zero? n) 0 (+ 1 (down (dec n))))) (down 50)",
        &MapValue::new(),
        &MapValue::new(),
        &NoTools,
        options,
    )
    .unwrap_err();
    assert_eq!(err, Error::Eval(EvalError::RecursionLimitExceeded { limit: 16 }));
}

// ============================================================================
// Host Stack
// ============================================================================

#[test]
fn test_deeply_nested_calls_evaluate() {
    let depth = 200;
    let code = format!("{}0{}", "(+ 1 ".repeat(depth), ")".repeat(depth));
    assert_eq!(eval(&code).unwrap(), Value::int(depth as i64));
}

#[test]
fn test_deeply_nested_lets_evaluate() {
    let depth = 200;
    let mut code = String::from("(let [x0 0] ");
    for i in 1..depth {
        code.push_str(&format!("(let [x{i} (inc x{})] ", i - 1));
    }
    code.push_str(&format!("x{}", depth - 1));
    code.push_str(&")".repeat(depth));
    assert_eq!(eval(&code).unwrap(), Value::int(depth as i64 - 1));
}

#[test]
fn test_nesting_at_reader_limit_round_trips() {
    let depth = 500;
    let code = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(eval(&code).unwrap().to_string(), code);
}

#[test]
fn test_flatten_deeply_nested_vector() {
    let code = "(loop [i 0 acc []] (if (< i 2000) (recur (inc i) [acc]) (count (flatten [acc 1]))))";
    assert_eq!(eval(code).unwrap(), Value::int(1));
}

#[test]
fn test_loop_limit() {
    let options = RunOptions::default().with_config(EvalConfig::default().with_loop_limit(100));
    let err = run_with_options(
        "(loop [] (recur))",
        &MapValue::new(),
        &MapValue::new(),
        &NoTools,
        options,
    )
    .unwrap_err();
    assert_eq!(err, Error::Eval(EvalError::LoopLimitExceeded { limit: 100 }));
}

#[test]
fn test_kinds_are_snake_case() {
    let cases = [
        ("(", "parse_error"),
        ("(return)", "invalid_arity"),
        ("x", "unbound_variable"),
        ("((fn [] 1) 2)", "arity_mismatch"),
        ("(+ \"a\" 1)", "type_error"),
        ("(quot 1 0)", "arithmetic_error"),
        ("(fail 1)", "failed"),
    ];
    for (code, expected) in cases {
        assert_eq!(kind(code), expected, "{code}");
    }
}

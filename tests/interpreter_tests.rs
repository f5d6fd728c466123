//! End-to-end evaluation tests for the special forms.

use pretty_assertions::assert_eq;
use ptc_lisp::language::map_from_json;
use ptc_lisp::{Error, EvalError, MapValue, NoTools, RunOutput, Value, run};
use serde_json::json;

fn run_with_ctx(code: &str, ctx: &MapValue) -> Result<RunOutput, Error> {
    run(code, ctx, &MapValue::new(), &NoTools)
}

fn eval(code: &str) -> Result<Value, Error> {
    run_with_ctx(code, &MapValue::new()).map(|out| out.result)
}

fn eval_str(code: &str) -> String {
    match eval(code) {
        Ok(value) => value.to_string(),
        Err(e) => panic!("{code} failed: {e}"),
    }
}

fn eval_err(code: &str) -> Error {
    match eval(code) {
        Ok(value) => panic!("{code} should fail, got {value}"),
        Err(e) => e,
    }
}

// ============================================================================
// Documented Scenarios
// ============================================================================

#[test]
fn test_simple_arithmetic_leaves_memory_unchanged() {
    let memory = map_from_json(&json!({"seen": 1}));
    let out = run("(+ 1 2)", &MapValue::new(), &memory, &NoTools).unwrap();
    assert_eq!(out.result, Value::int(3));
    assert!(out.delta.is_empty());
    assert_eq!(out.memory, memory);
}

#[test]
fn test_map_result_is_cached_in_memory() {
    let ctx = map_from_json(&json!({"items": [1, 2, 3]}));
    let out = run_with_ctx("{:cached-count (count ctx/items)}", &ctx).unwrap();
    assert_eq!(out.result.to_string(), "{:cached-count 3}");
    assert_eq!(Value::Map(out.delta).to_string(), "{:cached-count 3}");
}

#[test]
fn test_result_key_splits_result_from_memory() {
    let out = run_with_ctx("{:result \"done\", :count 5}", &MapValue::new()).unwrap();
    assert_eq!(out.result, Value::string("done"));
    assert_eq!(Value::Map(out.delta).to_string(), "{:count 5}");
}

#[test]
fn test_new_values_overwrite_existing_memory_keys() {
    let memory = map_from_json(&json!({"count": 1, "kept": true}));
    let out = run(
        "{:result \"done\" :count 5}",
        &MapValue::new(),
        &memory,
        &NoTools,
    )
    .unwrap();
    assert_eq!(out.result, Value::string("done"));
    assert_eq!(Value::Map(out.memory).to_string(), "{:count 5, :kept true}");

    let out = run("{:count 7}", &MapValue::new(), &memory, &NoTools).unwrap();
    assert_eq!(Value::Map(out.memory).to_string(), "{:count 7, :kept true}");
}

#[test]
fn test_or_returns_last_value_uncoerced() {
    assert_eq!(eval("(or false nil)").unwrap(), Value::Nil);
    assert_eq!(eval("(or nil false)").unwrap(), Value::Bool(false));
}

#[test]
fn test_where_filter_skips_missing_and_nil_fields() {
    let ctx = map_from_json(&json!({
        "users": [{"age": 20}, {"age": null}, {"name": "x"}]
    }));
    let out = run_with_ctx("(filter (where :age > 18) ctx/users)", &ctx).unwrap();
    assert_eq!(out.result.to_string(), "[{:age 20}]");
}

#[test]
fn test_closure_arity_mismatch() {
    assert_eq!(
        eval_err("((fn [x] x) 1 2 3)"),
        Error::Eval(EvalError::ArityMismatch {
            expected: 1,
            got: 3
        })
    );
}

// ============================================================================
// Truthiness and Short-Circuiting
// ============================================================================

#[test]
fn test_and_returns_first_falsy_or_last() {
    assert_eq!(eval_str("(and 1 2 3)"), "3");
    assert_eq!(eval_str("(and 1 nil 3)"), "nil");
    assert_eq!(eval_str("(and)"), "true");
    assert_eq!(eval_str("(or)"), "nil");
    assert_eq!(eval_str("(or nil 0)"), "0");
}

#[test]
fn test_short_circuit_skips_errors() {
    assert_eq!(eval_str("(and false (undefined-fn))"), "false");
    assert_eq!(eval_str("(or 5 (undefined-fn))"), "5");
}

#[test]
fn test_only_nil_and_false_are_falsy() {
    assert_eq!(eval_str("(if 0 :yes :no)"), ":yes");
    assert_eq!(eval_str("(if \"\" :yes :no)"), ":yes");
    assert_eq!(eval_str("(if [] :yes :no)"), ":yes");
    assert_eq!(eval_str("(if nil :yes :no)"), ":no");
    assert_eq!(eval_str("(if false :yes)"), "nil");
}

// ============================================================================
// Bindings and Closures
// ============================================================================

#[test]
fn test_let_bindings_see_earlier_ones() {
    assert_eq!(eval_str("(let [x 1 y (+ x 1)] (* x y))"), "2");
}

#[test]
fn test_closures_capture_their_scope() {
    let code = "(let [n 10
                      add-n (fn [x] (+ x n))
                      n 100]
                  (add-n 1))";
    assert_eq!(eval_str(code), "11");
}

#[test]
fn test_anonymous_fn_shorthand() {
    assert_eq!(eval_str("(map #(* % 2) [1 2 3])"), "[2 4 6]");
    assert_eq!(eval_str("(#(+ %1 %2) 3 4)"), "7");
}

#[test]
fn test_map_destructuring_with_defaults() {
    let code = "(let [{:keys [name role] :or {role \"guest\"} :as user} {:name \"ada\"}]
                  [name role (count user)])";
    assert_eq!(eval_str(code), "[\"ada\" \"guest\" 1]");
}

#[test]
fn test_map_destructuring_reads_string_keys() {
    let ctx = map_from_json(&json!({"user": {"name": "ada"}}));
    let out = run_with_ctx("(let [{:keys [name]} ctx/user] name)", &ctx).unwrap();
    assert_eq!(out.result, Value::string("ada"));
}

#[test]
fn test_sequence_destructuring() {
    assert_eq!(eval_str("(let [[a b & more] [1 2 3 4]] [a b more])"), "[1 2 [3 4]]");
    assert_eq!(eval_str("(let [[a _ c :as all] [1 2 3]] [a c (count all)])"), "[1 3 3]");
}

#[test]
fn test_short_sequence_binds_nil() {
    assert_eq!(eval_str("(let [[a b c] [1 2]] [a b c])"), "[1 2 nil]");
}

#[test]
fn test_fn_parameters_destructure() {
    assert_eq!(eval_str("((fn [{:keys [x y]}] (+ x y)) {:x 1 :y 2})"), "3");
    assert_eq!(eval_str("(map (fn [[k v]] v) {:a 1 :b 2})"), "[1 2]");
}

#[test]
fn test_if_let_and_when_let() {
    assert_eq!(eval_str("(if-let [x (first [5])] (* x 2) :none)"), "10");
    assert_eq!(eval_str("(if-let [x (first [])] (* x 2) :none)"), ":none");
    assert_eq!(eval_str("(when-let [x nil] :never)"), "nil");
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_cond_and_when() {
    let code = "(let [n 5] (cond (< n 0) :negative (= n 0) :zero :else :positive))";
    assert_eq!(eval_str(code), ":positive");
    assert_eq!(eval_str("(cond false 1)"), "nil");
    assert_eq!(eval_str("(when true 1 2)"), "2");
    assert_eq!(eval_str("(when-not true 1)"), "nil");
}

#[test]
fn test_threading_macros() {
    assert_eq!(eval_str("(-> 5 (- 2) inc)"), "4");
    assert_eq!(eval_str("(->> [1 2 3 4] (filter even?) (map inc))"), "[3 5]");
}

#[test]
fn test_loop_recur_accumulates() {
    let code = "(loop [i 0 acc []] (if (< i 3) (recur (inc i) (conj acc i)) acc))";
    assert_eq!(eval_str(code), "[0 1 2]");
}

#[test]
fn test_loop_does_not_grow_the_stack() {
    let code = "(loop [i 0] (if (< i 9000) (recur (inc i)) i))";
    assert_eq!(eval_str(code), "9000");
}

#[test]
fn test_recur_in_fn_body() {
    let code = "(defn countdown [n] (if (zero? n) :done (recur (dec n))))
                (countdown 5000)";
    assert_eq!(eval_str(code), ":done");
}

#[test]
fn test_return_stops_early() {
    let out = run_with_ctx("(do (return {:a 1}) (fail \"unreachable\"))", &MapValue::new())
        .unwrap();
    assert!(out.returned);
    assert_eq!(out.result.to_string(), "{:a 1}");
}

#[test]
fn test_return_from_inside_a_builtin_callback() {
    assert_eq!(eval_str("(map (fn [x] (if (> x 1) (return x) x)) [1 2 3])"), "2");
}

#[test]
fn test_fail_carries_value() {
    assert_eq!(
        eval_err("(fail {:reason \"bad input\"})").to_string(),
        "program failed: {:reason \"bad input\"}"
    );
}

// ============================================================================
// Keywords, Namespaces and Definitions
// ============================================================================

#[test]
fn test_keyword_as_accessor() {
    assert_eq!(eval_str("(:a {:a 1})"), "1");
    assert_eq!(eval_str("(:missing {:a 1} :default)"), ":default");
    assert_eq!(eval_str("(:a nil)"), "nil");
    assert_eq!(eval_str("(map :name [{:name \"a\"} {:name \"b\"}])"), "[\"a\" \"b\"]");
}

#[test]
fn test_memory_namespace_reads_input_memory() {
    let memory = map_from_json(&json!({"count": 2}));
    let out = run("(inc memory/count)", &MapValue::new(), &memory, &NoTools).unwrap();
    assert_eq!(out.result, Value::int(3));
    let out = run("memory/missing", &MapValue::new(), &memory, &NoTools).unwrap();
    assert_eq!(out.result, Value::Nil);
}

#[test]
fn test_def_and_defn() {
    let code = "(def limit 2)
                (defn top \"first few\" [xs] (take limit xs))
                (top [5 6 7])";
    assert_eq!(eval_str(code), "[5 6]");
}

#[test]
fn test_predicate_combinators() {
    let ctx = map_from_json(&json!({
        "rows": [
            {"status": "open", "priority": 3},
            {"status": "closed", "priority": 5},
            {"status": "open", "priority": 1}
        ]
    }));
    let out = run_with_ctx(
        "(count (filter (all-of (where :status = \"open\") (where :priority >= 2)) ctx/rows))",
        &ctx,
    )
    .unwrap();
    assert_eq!(out.result, Value::int(1));

    let out = run_with_ctx(
        "(count (filter (none-of (where :status = \"closed\")) ctx/rows))",
        &ctx,
    )
    .unwrap();
    assert_eq!(out.result, Value::int(2));
}

#[test]
fn test_empty_combinators() {
    assert_eq!(eval_str("((all-of) {})"), "true");
    assert_eq!(eval_str("((any-of) {})"), "false");
    assert_eq!(eval_str("((none-of) {})"), "true");
}

#[test]
fn test_where_nil_equality_and_membership() {
    assert_eq!(eval_str("((where :x = nil) {:y 1})"), "true");
    assert_eq!(eval_str("((where :x = nil) {:x 1})"), "false");
    assert_eq!(eval_str("((where :tag in [\"a\" \"b\"]) {:tag \"b\"})"), "true");
    assert_eq!(eval_str("((where :tag in [\"a\"]) {})"), "false");
    assert_eq!(eval_str("((where :name includes \"da\") {:name \"ada\"})"), "true");
    assert_eq!(eval_str("((where [:a :b] > 1) {:a {:b 2}})"), "true");
    assert_eq!(eval_str("((where :active) {:active true})"), "true");
}

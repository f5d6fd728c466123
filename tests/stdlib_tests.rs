//! Builtin library behavior, exercised through whole programs.

use pretty_assertions::assert_eq;
use ptc_lisp::{Error, MapValue, NoTools, Value, run};

fn eval(code: &str) -> Result<Value, Error> {
    run(code, &MapValue::new(), &MapValue::new(), &NoTools).map(|out| out.result)
}

fn eval_str(code: &str) -> String {
    match eval(code) {
        Ok(value) => value.to_string(),
        Err(e) => panic!("{code} failed: {e}"),
    }
}

fn eval_kind(code: &str) -> &'static str {
    match eval(code) {
        Ok(value) => panic!("{code} should fail, got {value}"),
        Err(e) => e.kind(),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_variadic_identities() {
    assert_eq!(eval_str("(+)"), "0");
    assert_eq!(eval_str("(*)"), "1");
    assert_eq!(eval_str("(+ 7)"), "7");
    assert_eq!(eval_str("(- 7)"), "-7");
    assert_eq!(eval_str("(- 10 3 2)"), "5");
    assert_eq!(eval_str("(* 2 3 4)"), "24");
}

#[test]
fn test_mixed_arithmetic_widens_to_float() {
    assert_eq!(eval_str("(+ 1 2.5)"), "3.5");
    assert_eq!(eval_str("(/ 1 2)"), "0.5");
    assert_eq!(eval_str("(/ 6 3)"), "2.0");
}

#[test]
fn test_special_float_arithmetic() {
    assert_eq!(eval_str("(/ 1 0)"), "Infinity");
    assert_eq!(eval_str("(/ -1 0)"), "-Infinity");
    assert_eq!(eval_str("(/ 0 0)"), "NaN");
    assert_eq!(eval_str("(+ Infinity -Infinity)"), "NaN");
    assert_eq!(eval_str("(* Infinity 0)"), "NaN");
    assert_eq!(eval_str("(+ ##Inf 1)"), "Infinity");
}

#[test]
fn test_nan_comparisons_are_false() {
    assert_eq!(eval_str("(> NaN 1)"), "false");
    assert_eq!(eval_str("(< NaN 1)"), "false");
    assert_eq!(eval_str("(= NaN NaN)"), "false");
    assert_eq!(eval_str("(nan? (/ 0 0))"), "true");
}

#[test]
fn test_nil_operands() {
    assert_eq!(eval_kind("(+ 1 nil)"), "type_error");
    assert_eq!(eval_kind("(* nil 2)"), "type_error");
    assert_eq!(eval_str("(> nil 1)"), "false");
    assert_eq!(eval_str("(<= 1 nil)"), "false");
    assert_eq!(eval_str("(= nil nil)"), "true");
}

#[test]
fn test_integer_overflow_is_an_error() {
    assert_eq!(eval_kind("(+ 9223372036854775807 1)"), "arithmetic_error");
}

#[test]
fn test_max_min_need_an_argument() {
    assert_eq!(eval_str("(max 3 9 2)"), "9");
    assert_eq!(eval_str("(min 3 9 2)"), "2");
    assert_eq!(eval_kind("(max)"), "arity_mismatch");
}

#[test]
fn test_rounding() {
    assert_eq!(eval_str("(round 2.5)"), "3");
    assert_eq!(eval_str("(floor 2.7)"), "2");
    assert_eq!(eval_str("(ceil 2.1)"), "3");
    assert_eq!(eval_str("(int 3.9)"), "3");
    assert_eq!(eval_str("(double 2)"), "2.0");
    assert_eq!(eval_str("(mod -7 3)"), "2");
    assert_eq!(eval_str("(rem -7 3)"), "-1");
}

#[test]
fn test_chained_comparison() {
    assert_eq!(eval_str("(< 1 2 3)"), "true");
    assert_eq!(eval_str("(< 1 3 2)"), "false");
    assert_eq!(eval_str("(= 1 1.0)"), "true");
    assert_eq!(eval_str("(not= 1 2)"), "true");
    assert_eq!(eval_str("(< \"a\" \"b\")"), "true");
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_sequence_access() {
    assert_eq!(eval_str("(first [1 2 3])"), "1");
    assert_eq!(eval_str("(first [])"), "nil");
    assert_eq!(eval_str("(last [1 2 3])"), "3");
    assert_eq!(eval_str("(rest [1 2 3])"), "[2 3]");
    assert_eq!(eval_str("(next [1])"), "nil");
    assert_eq!(eval_str("(nth [1 2 3] 1)"), "2");
    assert_eq!(eval_str("(nth [1] 5 :none)"), ":none");
}

#[test]
fn test_slicing() {
    assert_eq!(eval_str("(take 2 [1 2 3])"), "[1 2]");
    assert_eq!(eval_str("(drop 2 [1 2 3])"), "[3]");
    assert_eq!(eval_str("(take 10 [1])"), "[1]");
    assert_eq!(eval_str("(take-while pos? [2 1 0 3])"), "[2 1]");
    assert_eq!(eval_str("(drop-while pos? [2 1 0 3])"), "[0 3]");
    assert_eq!(eval_str("(take-last 2 [1 2 3])"), "[2 3]");
    assert_eq!(eval_str("(drop-last [1 2 3])"), "[1 2]");
}

#[test]
fn test_filtering() {
    assert_eq!(eval_str("(filter even? [1 2 3 4])"), "[2 4]");
    assert_eq!(eval_str("(remove even? [1 2 3 4])"), "[1 3]");
    assert_eq!(eval_str("(find even? [1 2 3 4])"), "2");
    assert_eq!(eval_str("(find even? [1 3])"), "nil");
    assert_eq!(eval_str("(some even? [1 2])"), "true");
    assert_eq!(eval_str("(every? even? [2 4])"), "true");
    assert_eq!(eval_str("(every? even? [])"), "true");
    assert_eq!(eval_str("(filter even? nil)"), "[]");
}

#[test]
fn test_mapping() {
    assert_eq!(eval_str("(map inc [1 2])"), "[2 3]");
    assert_eq!(eval_str("(map + [1 2] [10 20 30])"), "[11 22]");
    assert_eq!(eval_str("(map-indexed (fn [i x] [i x]) [:a :b])"), "[[0 :a] [1 :b]]");
    assert_eq!(eval_str("(keep :a [{:a 1} {:b 2}])"), "[1]");
}

#[test]
fn test_reshaping() {
    assert_eq!(eval_str("(reverse [1 2 3])"), "[3 2 1]");
    assert_eq!(eval_str("(distinct [1 2 1 3 2])"), "[1 2 3]");
    assert_eq!(eval_str("(concat [1] [2 3] nil)"), "[1 2 3]");
    assert_eq!(eval_str("(flatten [1 [2 [3]]])"), "[1 2 3]");
    assert_eq!(eval_str("(zip [1 2] [:a :b :c])"), "[[1 :a] [2 :b]]");
    assert_eq!(eval_str("(conj [1] 2 3)"), "[1 2 3]");
    assert_eq!(eval_str("(into {} [[:a 1]])"), "{:a 1}");
    assert_eq!(eval_str("(range 3)"), "[0 1 2]");
    assert_eq!(eval_str("(range 1 10 3)"), "[1 4 7]");
}

#[test]
fn test_range_guards() {
    assert_eq!(eval_kind("(range 0 10 0)"), "arithmetic_error");
    assert_eq!(eval_kind("(range 100000000)"), "arithmetic_error");
}

#[test]
fn test_range_near_integer_bounds() {
    assert_eq!(
        eval_str("(range 9223372036854775806 9223372036854775807)"),
        "[9223372036854775806]"
    );
    assert_eq!(
        eval_str("(range 9223372036854775800 9223372036854775807 5)"),
        "[9223372036854775800 9223372036854775805]"
    );
    assert_eq!(
        eval_str("(range 0 -9223372036854775807 -9223372036854775807)"),
        "[0]"
    );
    assert_eq!(eval_str("(range 5 0 -2)"), "[5 3 1]");
    assert_eq!(eval_str("(range 0 1 0.25)"), "[0 0.25 0.5 0.75]");
}

#[test]
fn test_sorting() {
    assert_eq!(eval_str("(sort [3 1 2])"), "[1 2 3]");
    assert_eq!(eval_str("(sort > [3 1 2])"), "[3 2 1]");
    assert_eq!(eval_str("(sort :desc [3 1 2])"), "[3 2 1]");
    assert_eq!(
        eval_str("(sort-by :age [{:age 30} {:age 20}])"),
        "[{:age 20} {:age 30}]"
    );
    assert_eq!(
        eval_str("(sort-by :age :desc [{:age 20} {:age 30}])"),
        "[{:age 30} {:age 20}]"
    );
}

#[test]
fn test_sort_by_is_stable() {
    let code = "(map :id (sort-by :k [{:id 1 :k 2} {:id 2 :k 1} {:id 3 :k 2} {:id 4 :k 1}]))";
    assert_eq!(eval_str(code), "[2 4 1 3]");
}

#[test]
fn test_extremes_by_key() {
    let rows = "[{:n \"a\" :v 3} {:n \"b\" :v nil} {:n \"c\" :v 7}]";
    assert_eq!(eval_str(&format!("(:n (max-by :v {rows}))")), "\"c\"");
    assert_eq!(eval_str(&format!("(:n (min-by :v {rows}))")), "\"a\"");
    assert_eq!(eval_str("(max-by :v [])"), "nil");
}

#[test]
fn test_aggregation() {
    assert_eq!(eval_str("(reduce + [1 2 3])"), "6");
    assert_eq!(eval_str("(reduce + 10 [1 2 3])"), "16");
    assert_eq!(eval_str("(reduce + [])"), "0");
    assert_eq!(eval_str("(sum [1 2 nil 3])"), "6");
    assert_eq!(eval_str("(avg [1 2])"), "1.5");
    assert_eq!(eval_str("(avg [])"), "nil");
    assert_eq!(eval_str("(sum-by :amount [{:amount 2} {:amount 5}])"), "7");
    assert_eq!(eval_str("(avg-by :amount [{:amount 2} {} {:amount 4}])"), "3.0");
    assert_eq!(eval_str("(frequencies [:a :b :a])"), "{:a 2, :b 1}");
    assert_eq!(eval_str("(pluck :name [{:name \"a\"} {}])"), "[\"a\" nil]");
}

#[test]
fn test_group_by() {
    let code = "(group-by :dept [{:dept \"eng\" :id 1} {:dept \"ops\" :id 2} {:dept \"eng\" :id 3}])";
    let value = eval(code).unwrap();
    let Value::Map(groups) = value else {
        panic!("expected a map, got {value}");
    };
    assert_eq!(groups.len(), 2);
    let eng = groups.get(&Value::string("eng")).unwrap();
    assert_eq!(eng.to_string(), "[{:dept \"eng\", :id 1} {:dept \"eng\", :id 3}]");
}

#[test]
fn test_counting() {
    assert_eq!(eval_str("(count [1 2])"), "2");
    assert_eq!(eval_str("(count {:a 1})"), "1");
    assert_eq!(eval_str("(count nil)"), "0");
    assert_eq!(eval_str("(count \"héllo\")"), "5");
    assert_eq!(eval_str("(empty? [])"), "true");
    assert_eq!(eval_str("(not-empty [])"), "nil");
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_map_lookup() {
    assert_eq!(eval_str("(get {:a 1} :a)"), "1");
    assert_eq!(eval_str("(get {:a 1} :b 0)"), "0");
    assert_eq!(eval_str("(get [10 20] 1)"), "20");
    assert_eq!(eval_str("(get-in {:a {:b 2}} [:a :b])"), "2");
    assert_eq!(eval_str("(get-in {:a {:b 2}} [:a :c] :none)"), ":none");
    assert_eq!(eval_str("(contains? {:a nil} :a)"), "true");
    assert_eq!(eval_str("(keys {:a 1 :b 2})"), "[:a :b]");
    assert_eq!(eval_str("(vals {:a 1 :b 2})"), "[1 2]");
    assert_eq!(eval_str("(select-keys {:a 1 :b 2} [:a :c])"), "{:a 1}");
}

#[test]
fn test_map_updates() {
    assert_eq!(eval_str("(assoc {:a 1} :b 2)"), "{:a 1, :b 2}");
    assert_eq!(eval_str("(assoc [1 2] 1 :x)"), "[1 :x]");
    assert_eq!(eval_str("(assoc-in {} [:a :b] 1)"), "{:a {:b 1}}");
    assert_eq!(eval_str("(update {:n 1} :n inc)"), "{:n 2}");
    assert_eq!(eval_str("(update {:n 1} :n + 10)"), "{:n 11}");
    assert_eq!(eval_str("(update-in {:s {:c 1}} [:s :c] inc)"), "{:s {:c 2}}");
    assert_eq!(eval_str("(dissoc {:a 1 :b 2} :a)"), "{:b 2}");
    assert_eq!(eval_str("(merge {:a 1} {:a 2 :b 3})"), "{:a 2, :b 3}");
    assert_eq!(eval_str("(merge)"), "nil");
    assert_eq!(eval_str("(zipmap [:a :b] [1 2])"), "{:a 1, :b 2}");
}

// ============================================================================
// Predicates
// ============================================================================

#[test]
fn test_type_predicates() {
    assert_eq!(eval_str("(nil? nil)"), "true");
    assert_eq!(eval_str("(some? false)"), "true");
    assert_eq!(eval_str("(integer? 1)"), "true");
    assert_eq!(eval_str("(integer? 1.0)"), "false");
    assert_eq!(eval_str("(float? 1.0)"), "true");
    assert_eq!(eval_str("(keyword? :a)"), "true");
    assert_eq!(eval_str("(map? {})"), "true");
    assert_eq!(eval_str("(fn? inc)"), "true");
    assert_eq!(eval_str("(fn? #(+ % 1))"), "true");
    assert_eq!(eval_str("(coll? [])"), "true");
}

#[test]
fn test_numeric_predicates() {
    assert_eq!(eval_str("(zero? 0.0)"), "true");
    assert_eq!(eval_str("(pos? -1)"), "false");
    assert_eq!(eval_str("(neg? -1)"), "true");
    assert_eq!(eval_str("(even? 4)"), "true");
    assert_eq!(eval_str("(odd? 4)"), "false");
    assert_eq!(eval_str("(infinite? -Infinity)"), "true");
    assert_eq!(eval_str("(finite? 1.5)"), "true");
    assert_eq!(eval_kind("(zero? nil)"), "type_error");
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_building() {
    assert_eq!(eval_str("(str \"a\" 1 :k nil)"), "\"a1:k\"");
    assert_eq!(eval_str("(join \", \" [\"a\" \"b\"])"), "\"a, b\"");
    assert_eq!(eval_str("(subs \"hello\" 1 3)"), "\"el\"");
    assert_eq!(eval_str("(split \"a,b\" \",\")"), "[\"a\" \"b\"]");
    assert_eq!(eval_str("(upper-case \"ab\")"), "\"AB\"");
    assert_eq!(eval_str("(trim \"  x \")"), "\"x\"");
    assert_eq!(eval_str("(replace \"a-b-c\" \"-\" \"_\")"), "\"a_b_c\"");
    assert_eq!(eval_kind("(subs \"abc\" 2 9)"), "type_error");
}

#[test]
fn test_string_tests() {
    assert_eq!(eval_str("(includes? \"hello\" \"ell\")"), "true");
    assert_eq!(eval_str("(starts-with? \"hello\" \"he\")"), "true");
    assert_eq!(eval_str("(ends-with? \"hello\" \"x\")"), "false");
}

#[test]
fn test_regex() {
    assert_eq!(eval_str("(re-find \"\\\\d+\" \"abc123def\")"), "\"123\"");
    assert_eq!(eval_str("(re-matches \"\\\\d+\" \"123\")"), "\"123\"");
    assert_eq!(eval_str("(re-matches \"\\\\d+\" \"a123\")"), "nil");
    assert_eq!(
        eval_str("(re-find \"(\\\\w+)@(\\\\w+)\" \"mail ada@host\")"),
        "[\"ada@host\" \"ada\" \"host\"]"
    );
    assert_eq!(eval_kind("(re-find \"(\" \"x\")"), "type_error");
}

#[test]
fn test_number_parsing() {
    assert_eq!(eval_str("(parse-long \"42\")"), "42");
    assert_eq!(eval_str("(parse-long \"4.2\")"), "nil");
    assert_eq!(eval_str("(parse-long \"abc\")"), "nil");
    assert_eq!(eval_str("(parse-long nil)"), "nil");
    assert_eq!(eval_str("(parse-double \"1.5\")"), "1.5");
    assert_eq!(eval_str("(parse-double \"Infinity\")"), "Infinity");
    assert_eq!(eval_str("(parse-double \"-Infinity\")"), "-Infinity");
    assert_eq!(eval_str("(nan? (parse-double \"NaN\"))"), "true");
    assert_eq!(eval_str("(parse-double \"1.5x\")"), "nil");
}

#[test]
fn test_name_and_keyword() {
    assert_eq!(eval_str("(name :user)"), "\"user\"");
    assert_eq!(eval_str("(keyword \"user\")"), ":user");
    assert_eq!(eval_str("((keyword \"a\") {:a 1})"), "1");
}

// ============================================================================
// Higher-Order Helpers
// ============================================================================

#[test]
fn test_apply_and_identity() {
    assert_eq!(eval_str("(apply + 1 [2 3])"), "6");
    assert_eq!(eval_str("(identity :x)"), ":x");
    assert_eq!(eval_str("(vector 1 2)"), "[1 2]");
}

#[test]
fn test_builtin_arity_errors() {
    let err = eval("(count)").unwrap_err();
    assert_eq!(err.kind(), "arity_mismatch");
    assert_eq!(
        err.to_string(),
        "count: wrong number of arguments, expected 1, got 0"
    );
}

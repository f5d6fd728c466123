//! Host tool invocation from DSL programs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use ptc_lisp::language::map_from_json;
use ptc_lisp::{Error, EvalError, MapValue, Tools, Value, run};
use serde_json::json;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Route tool-call logs to the test output; `RUST_LOG=debug` shows them
fn init_tracing() {
    let _ = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Tools plus a counter of how many times `search` ran
fn counting_tools() -> (Tools, Arc<AtomicUsize>) {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut tools = Tools::new();
    tools.insert("search", move |args: MapValue| {
        counter.fetch_add(1, Ordering::SeqCst);
        let query = args
            .get(&Value::keyword("query"))
            .cloned()
            .unwrap_or(Value::Nil);
        Ok(Value::vector([query]))
    });
    tools.insert("flaky", |_args: MapValue| Err("rate limited".to_string()));
    tools.insert_json("lookup-user", |args| {
        Ok(json!({ "id": args["id"], "name": "ada", "tags": ["admin"] }))
    });
    (tools, calls)
}

fn eval_with(code: &str, tools: &Tools) -> Result<Value, Error> {
    run(code, &MapValue::new(), &MapValue::new(), tools).map(|out| out.result)
}

#[test]
fn test_tool_called_by_name() {
    let (tools, calls) = counting_tools();
    let result = eval_with("(search {:query \"rust\"})", &tools).unwrap();
    assert_eq!(result.to_string(), "[\"rust\"]");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_explicit_call_form() {
    let (tools, _) = counting_tools();
    let result = eval_with("(call \"search\" {:query \"q\"})", &tools).unwrap();
    assert_eq!(result.to_string(), "[\"q\"]");
    let result = eval_with("(call \"search\")", &tools).unwrap();
    assert_eq!(result.to_string(), "[nil]");
    let err = eval_with("(call \"search\" [1 2])", &tools).unwrap_err();
    assert_eq!(err.kind(), "invalid_tool_args");
}

#[test]
fn test_short_circuit_never_calls_tools() {
    let (tools, calls) = counting_tools();
    assert_eq!(
        eval_with("(and false (search {:query \"x\"}))", &tools).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        eval_with("(or 5 (search {:query \"x\"}))", &tools).unwrap(),
        Value::int(5)
    );
    assert_eq!(
        eval_with("(if true :skip (search {:query \"x\"}))", &tools).unwrap(),
        Value::keyword("skip")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_positional_arguments_rejected() {
    let (tools, calls) = counting_tools();
    let err = eval_with("(search \"rust\")", &tools).unwrap_err();
    assert_eq!(err.kind(), "invalid_tool_args");
    assert!(err.to_string().contains("(search {:key value})"));

    let err = eval_with("(search {:query 1} {:query 2})", &tools).unwrap_err();
    assert_eq!(err.kind(), "invalid_tool_args");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_tool_failure_is_structured() {
    let (tools, _) = counting_tools();
    let err = eval_with("(flaky {})", &tools).unwrap_err();
    assert_eq!(
        err,
        Error::Eval(EvalError::ToolError {
            tool: "flaky".to_string(),
            reason: "rate limited".to_string(),
        })
    );
}

#[test]
fn test_unknown_tools() {
    let (tools, _) = counting_tools();
    assert_eq!(
        eval_with("(call \"nope\" {})", &tools).unwrap_err(),
        Error::Eval(EvalError::UnknownTool("nope".to_string()))
    );
    assert_eq!(
        eval_with("(nope {})", &tools).unwrap_err(),
        Error::Eval(EvalError::UnboundVariable("nope".to_string()))
    );
}

#[test]
fn test_json_tool_results_are_dsl_values() {
    let (tools, _) = counting_tools();
    let code = "(let [user (lookup-user {:id 7})] [(:id user) (:name user) (first (:tags user))])";
    assert_eq!(eval_with(code, &tools).unwrap().to_string(), "[7 \"ada\" \"admin\"]");
}

#[test]
fn test_tools_are_values() {
    let (tools, calls) = counting_tools();
    let code = "(map search [{:query \"a\"} {:query \"b\"}])";
    assert_eq!(eval_with(code, &tools).unwrap().to_string(), "[[\"a\"] [\"b\"]]");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_tool_results_feed_memory() {
    let (tools, _) = counting_tools();
    let ctx = map_from_json(&json!({"topic": "lisp"}));
    let out = run(
        "{:result :ok :last-search (search {:query ctx/topic})}",
        &ctx,
        &MapValue::new(),
        &tools,
    )
    .unwrap();
    assert_eq!(out.result, Value::keyword("ok"));
    assert_eq!(Value::Map(out.memory).to_string(), "{:last-search [\"lisp\"]}");
}

#[test]
fn test_local_binding_shadows_tool() {
    let (tools, calls) = counting_tools();
    let code = "(let [search (fn [m] :local)] (search {:query \"x\"}))";
    assert_eq!(eval_with(code, &tools).unwrap(), Value::keyword("local"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

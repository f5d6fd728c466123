//! Tree-walking evaluator over [`Expr`].
//!
//! Evaluation is a recursive match over the node kinds. Non-local exits
//! (`return`, `recur`) and errors travel together on [`Unwind`], so every
//! composite node simply propagates with `?` and stops at the first one.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::abstractions::{get_in, map_get};
use crate::ast::{Combinator, Expr, Lambda, Pattern, ROW, WhereOp};
use crate::config::EvalConfig;
use crate::environment::Environment;
use crate::error::EvalError;
use crate::interner::Symbol;
use crate::language::{Closure, Keyword, MapValue, Value, values_equal};
use crate::stack;
use crate::stdlib;
use crate::tool::ToolExecutor;

/// Run-scoped definitions made with `def`/`defn`, keyed by name
pub type Definitions = BTreeMap<String, Value>;

static ROW_SYMBOL: Lazy<Symbol> = Lazy::new(|| Symbol::new(ROW));

/// Why evaluation of a subexpression stopped early
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Unwind {
    Error(EvalError),
    /// `(return v)`: finish the whole program with `v`
    Return(Value),
    /// `(recur ...)`: restart the enclosing loop or fn with new values
    Recur(Vec<Value>),
}

impl From<EvalError> for Unwind {
    fn from(err: EvalError) -> Self {
        Unwind::Error(err)
    }
}

/// Outcome of evaluating a program against one context and memory
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub memory: MapValue,
    /// True when the program stopped through `(return v)`
    pub returned: bool,
    pub definitions: Definitions,
}

// ============================================================================
// Interpreter
// ============================================================================

pub struct Interpreter<'a> {
    ctx: MapValue,
    memory: MapValue,
    definitions: Definitions,
    tools: &'a dyn ToolExecutor,
    config: EvalConfig,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: MapValue, memory: MapValue, tools: &'a dyn ToolExecutor) -> Self {
        Interpreter {
            ctx,
            memory,
            definitions: Definitions::new(),
            tools,
            config: EvalConfig::default(),
            depth: 0,
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Start with definitions carried over from an earlier run
    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        self.definitions = definitions;
        self
    }

    /// Evaluate a whole program, converting `return` into a normal result.
    pub fn evaluate(mut self, expr: &Expr, env: &Environment) -> Result<Evaluation, EvalError> {
        let (value, returned) = match self.eval_expr(expr, env) {
            Ok(value) => (value, false),
            Err(Unwind::Return(value)) => (value, true),
            Err(Unwind::Error(err)) => return Err(err),
            Err(Unwind::Recur(_)) => {
                return Err(EvalError::type_error(
                    "recur used outside of loop or fn",
                ));
            }
        };
        Ok(Evaluation {
            value,
            memory: self.memory,
            returned,
            definitions: self.definitions,
        })
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Result<Value, Unwind> {
        stack::guarded(|| self.eval_node(expr, env))
    }

    fn eval_node(&mut self, expr: &Expr, env: &Environment) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Vector(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_expr(item, env)?);
                }
                Ok(Value::vector(out))
            }

            Expr::Map(entries) => {
                let mut map = MapValue::new();
                for (k, v) in entries {
                    let key = self.eval_expr(k, env)?;
                    let value = self.eval_expr(v, env)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }

            Expr::Var(name) => self.lookup(*name, env),

            Expr::Ctx(key) => Ok(namespace_get(&self.ctx, *key)),
            Expr::Memory(key) => Ok(namespace_get(&self.memory, *key)),

            Expr::Let { bindings, body } => {
                let mut scope = env.clone();
                for binding in bindings {
                    let value = self.eval_expr(&binding.value, &scope)?;
                    scope = self.bind_pattern(&binding.pattern, value, scope)?;
                }
                self.eval_expr(body, &scope)
            }

            Expr::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval_expr(test, env)?.is_truthy() {
                    self.eval_expr(then, env)
                } else {
                    self.eval_expr(otherwise, env)
                }
            }

            Expr::And(exprs) => {
                let mut last = Value::Bool(true);
                for e in exprs {
                    last = self.eval_expr(e, env)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }

            Expr::Or(exprs) => {
                let mut last = Value::Nil;
                for e in exprs {
                    last = self.eval_expr(e, env)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }

            Expr::Do(exprs) => {
                let mut last = Value::Nil;
                for e in exprs {
                    last = self.eval_expr(e, env)?;
                }
                Ok(last)
            }

            Expr::Fn(lambda) => Ok(Value::Closure(Arc::new(Closure {
                lambda: lambda.clone(),
                env: env.clone(),
            }))),

            Expr::Call { callee, args } => {
                let f = self.eval_expr(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                self.apply(&f, values)
            }

            Expr::Where { path, op, operand } => {
                let operand = match operand {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                Ok(row_predicate(Expr::RowTest {
                    path: path.clone(),
                    op: *op,
                    operand,
                }))
            }

            Expr::Combinator { kind, predicates } => {
                let mut fns = Vec::with_capacity(predicates.len());
                for p in predicates {
                    let f = self.eval_expr(p, env)?;
                    if !f.is_callable() {
                        return Err(EvalError::type_error(format!(
                            "predicate combinator expects functions, got {} {f}",
                            f.type_name()
                        ))
                        .into());
                    }
                    fns.push(f);
                }
                Ok(row_predicate(Expr::CombinedTest {
                    kind: *kind,
                    predicates: fns,
                }))
            }

            Expr::RowTest { path, op, operand } => {
                let row = self.row(env);
                let field = get_in(&row, path).unwrap_or(Value::Nil);
                Ok(Value::Bool(where_matches(*op, &field, operand)))
            }

            Expr::CombinedTest { kind, predicates } => {
                let row = self.row(env);
                let mut matches = predicates.iter().map(|p| {
                    self.apply(p, vec![row.clone()])
                        .map(|v| v.is_truthy())
                });
                let result = match kind {
                    Combinator::AllOf => try_all(&mut matches)?,
                    Combinator::AnyOf => try_any(&mut matches)?,
                    Combinator::NoneOf => !try_any(&mut matches)?,
                };
                Ok(Value::Bool(result))
            }

            Expr::ToolCall { name, args } => {
                let args = self.eval_expr(args, env)?;
                self.call_tool(name, vec![args])
            }

            Expr::Return(value) => {
                let value = self.eval_expr(value, env)?;
                Err(Unwind::Return(value))
            }

            Expr::Fail(value) => {
                let value = self.eval_expr(value, env)?;
                Err(EvalError::Failed(value).into())
            }

            Expr::Loop { bindings, body } => {
                let mut scope = env.clone();
                for binding in bindings {
                    let value = self.eval_expr(&binding.value, &scope)?;
                    scope = self.bind_pattern(&binding.pattern, value, scope)?;
                }
                let mut iterations = 0;
                loop {
                    match self.eval_expr(body, &scope) {
                        Err(Unwind::Recur(values)) => {
                            iterations += 1;
                            self.check_loop_limit(iterations)?;
                            scope = env.clone();
                            for (binding, value) in bindings.iter().zip(values) {
                                scope = self.bind_pattern(&binding.pattern, value, scope)?;
                            }
                        }
                        other => return other,
                    }
                }
            }

            Expr::Recur(args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                Err(Unwind::Recur(values))
            }

            Expr::Def { name, value } => {
                let name = name.resolve();
                if stdlib::is_builtin(&name) {
                    return Err(EvalError::Redefinition { name }.into());
                }
                let value = self.eval_expr(value, env)?;
                self.definitions.insert(name, value.clone());
                Ok(value)
            }
        }
    }

    /// Lexical scope first, then run definitions, then host tools
    fn lookup(&self, name: Symbol, env: &Environment) -> Result<Value, Unwind> {
        if let Some(value) = env.lookup(name) {
            return Ok(value.clone());
        }
        let name = name.resolve();
        if let Some(value) = self.definitions.get(&name) {
            Ok(value.clone())
        } else if self.tools.has_tool(&name) {
            Ok(Value::Tool(Arc::from(name)))
        } else {
            Err(EvalError::UnboundVariable(name).into())
        }
    }

    fn row(&self, env: &Environment) -> Value {
        env.lookup(*ROW_SYMBOL).cloned().unwrap_or(Value::Nil)
    }

    fn check_loop_limit(&self, iterations: usize) -> Result<(), EvalError> {
        if iterations > self.config.loop_limit {
            Err(EvalError::LoopLimitExceeded {
                limit: self.config.loop_limit,
            })
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Apply any callable value to already-evaluated arguments.
    pub(crate) fn apply(&mut self, f: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
        if self.depth >= self.config.recursion_limit {
            return Err(EvalError::RecursionLimitExceeded {
                limit: self.config.recursion_limit,
            }
            .into());
        }
        self.depth += 1;
        let result = stack::guarded(|| self.dispatch(f, args));
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, f: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
        match f {
            Value::Keyword(k) => keyword_get(*k, &args),
            Value::Closure(closure) => self.call_closure(closure, args),
            Value::Builtin(builtin) => stdlib::call_builtin(self, builtin, args),
            Value::Tool(name) => self.call_tool(name, args),
            other => Err(EvalError::NotCallable(format!("{} {other}", other.type_name())).into()),
        }
    }

    /// Bind parameters and run the body; a `recur` in tail position loops
    /// here instead of growing the host stack.
    fn call_closure(&mut self, closure: &Closure, mut args: Vec<Value>) -> Result<Value, Unwind> {
        let lambda: &Lambda = &closure.lambda;
        let mut iterations = 0;
        loop {
            if args.len() != lambda.params.len() {
                return Err(EvalError::ArityMismatch {
                    expected: lambda.params.len(),
                    got: args.len(),
                }
                .into());
            }
            let mut scope = closure.env.clone();
            for (param, arg) in lambda.params.iter().zip(args) {
                scope = self.bind_pattern(param, arg, scope)?;
            }
            match self.eval_expr(&lambda.body, &scope) {
                Err(Unwind::Recur(next)) => {
                    iterations += 1;
                    self.check_loop_limit(iterations)?;
                    args = next;
                }
                other => return other,
            }
        }
    }

    fn call_tool(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Unwind> {
        if !self.tools.has_tool(name) {
            return Err(EvalError::UnknownTool(name.to_string()).into());
        }
        let map = match <[Value; 1]>::try_from(args) {
            Ok([Value::Map(map)]) => map,
            _ => return Err(EvalError::invalid_tool_args(name).into()),
        };

        tracing::debug!(tool = name, args = map.len(), "calling tool");
        match self.tools.call(name, map) {
            Ok(value) => {
                tracing::debug!(tool = name, result = value.type_name(), "tool returned");
                Ok(value)
            }
            Err(reason) => {
                tracing::warn!(tool = name, %reason, "tool failed");
                Err(EvalError::ToolError {
                    tool: name.to_string(),
                    reason,
                }
                .into())
            }
        }
    }

    // ========================================================================
    // Destructuring
    // ========================================================================

    fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: Environment,
    ) -> Result<Environment, Unwind> {
        stack::guarded(|| self.bind_node(pattern, value, env))
    }

    fn bind_node(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: Environment,
    ) -> Result<Environment, Unwind> {
        match pattern {
            Pattern::Bind(name) => Ok(env.bind(*name, value)),
            Pattern::Ignore => Ok(env),
            Pattern::As { name, inner } => {
                let env = self.bind_pattern(inner, value.clone(), env)?;
                Ok(env.bind(*name, value))
            }
            Pattern::Map(entries) => {
                let Value::Map(map) = value else {
                    return Err(EvalError::DestructureError(format!(
                        "expected map, got {}",
                        value.type_name()
                    ))
                    .into());
                };
                let mut env = env;
                for entry in entries {
                    let found = map_get(&map, &entry.key).cloned();
                    let bound = match (found, &entry.default) {
                        (Some(v), _) => v,
                        (None, Some(default)) => self.eval_expr(default, &env)?,
                        (None, None) => Value::Nil,
                    };
                    env = self.bind_pattern(&entry.target, bound, env)?;
                }
                Ok(env)
            }
            Pattern::Seq { items, rest } => {
                let Value::Vector(values) = value else {
                    return Err(EvalError::DestructureError(format!(
                        "expected list, got {}",
                        value.type_name()
                    ))
                    .into());
                };
                let mut env = env;
                for (i, item) in items.iter().enumerate() {
                    let v = values.get(i).cloned().unwrap_or(Value::Nil);
                    env = self.bind_pattern(item, v, env)?;
                }
                if let Some(rest) = rest {
                    let remaining = if values.len() > items.len() {
                        Value::Vector(values.skip(items.len()))
                    } else {
                        Value::Nil
                    };
                    env = self.bind_pattern(rest, remaining, env)?;
                }
                Ok(env)
            }
        }
    }
}

/// Evaluate `expr` with a fresh interpreter.
pub fn eval(
    expr: &Expr,
    ctx: &MapValue,
    memory: &MapValue,
    env: &Environment,
    tools: &dyn ToolExecutor,
) -> Result<Evaluation, EvalError> {
    Interpreter::new(ctx.clone(), memory.clone(), tools).evaluate(expr, env)
}

// ============================================================================
// Helpers
// ============================================================================

fn namespace_get(map: &MapValue, key: Keyword) -> Value {
    map_get(map, &Value::Keyword(key))
        .cloned()
        .unwrap_or(Value::Nil)
}

/// `(:key m)` and `(:key m default)`
fn keyword_get(key: Keyword, args: &[Value]) -> Result<Value, Unwind> {
    let default = match args.len() {
        1 => Value::Nil,
        2 => args[1].clone(),
        got => {
            return Err(EvalError::InvalidKeywordCall {
                keyword: key.to_string(),
                got,
            }
            .into());
        }
    };
    Ok(match &args[0] {
        Value::Map(map) => map_get(map, &Value::Keyword(key)).cloned().unwrap_or(default),
        _ => default,
    })
}

/// Wrap a row test as a one-argument closure over [`ROW`]
fn row_predicate(body: Expr) -> Value {
    Value::Closure(Arc::new(Closure {
        lambda: Arc::new(Lambda {
            params: vec![Pattern::Bind(*ROW_SYMBOL)],
            body,
        }),
        env: Environment::new(),
    }))
}

fn try_all<I>(iter: &mut I) -> Result<bool, Unwind>
where
    I: Iterator<Item = Result<bool, Unwind>>,
{
    for item in iter {
        if !item? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn try_any<I>(iter: &mut I) -> Result<bool, Unwind>
where
    I: Iterator<Item = Result<bool, Unwind>>,
{
    for item in iter {
        if item? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Compare a row's field against a `where` operand.
///
/// Only `=`/`not=` can match a `nil` field; every other operator treats
/// `nil` as a non-match so filters skip rows with missing fields.
fn where_matches(op: WhereOp, field: &Value, operand: &Value) -> bool {
    match op {
        WhereOp::Truthy => field.is_truthy(),
        WhereOp::Eq => field_equals(field, operand),
        WhereOp::NotEq => !field_equals(field, operand),
        WhereOp::Gt | WhereOp::Lt | WhereOp::Gte | WhereOp::Lte => {
            let ordering = match (field, operand) {
                (Value::Number(a), Value::Number(b)) => a.num_cmp(*b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            ordering.is_some_and(|ord| match op {
                WhereOp::Gt => ord.is_gt(),
                WhereOp::Lt => ord.is_lt(),
                WhereOp::Gte => ord.is_ge(),
                _ => ord.is_le(),
            })
        }
        WhereOp::Includes => match (field, operand) {
            (Value::String(s), Value::String(needle)) => s.contains(needle.as_ref()),
            (Value::Vector(items), needle) => items.iter().any(|i| values_equal(i, needle)),
            _ => false,
        },
        WhereOp::In => match (field, operand) {
            (Value::Nil, _) => false,
            (needle, Value::Vector(items)) => items.iter().any(|i| values_equal(i, needle)),
            (Value::String(needle), Value::String(s)) => s.contains(needle.as_ref()),
            _ => false,
        },
    }
}

fn field_equals(field: &Value, operand: &Value) -> bool {
    match (field, operand) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        (a, b) => values_equal(a, b),
    }
}

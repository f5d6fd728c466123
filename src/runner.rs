//! Top-level entry point: source text in, result and memory update out.

use tracing::debug;

use crate::analyzer::analyze_program;
use crate::ast::Expr;
use crate::config::EvalConfig;
use crate::error::Result;
use crate::interpreter::{Definitions, Interpreter};
use crate::language::{MapValue, Value};
use crate::memory::apply_memory_contract;
use crate::parser::parse;
use crate::stdlib;
use crate::tool::ToolExecutor;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: EvalConfig,
    /// Definitions from an earlier run, visible as plain symbols
    pub definitions: Definitions,
}

impl RunOptions {
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        self.definitions = definitions;
        self
    }
}

/// Result of one successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub result: Value,
    /// Keys the program wrote to memory
    pub delta: MapValue,
    /// Memory to hand to the next run
    pub memory: MapValue,
    /// Every `def`/`defn` made during the run, including carried-over ones
    pub definitions: Definitions,
    /// The program finished through `(return v)`
    pub returned: bool,
}

/// Read and analyze a program without running it.
pub fn compile(source: &str) -> Result<Expr> {
    let forms = parse(source)?;
    Ok(analyze_program(&forms)?)
}

/// Run a program with default options.
///
/// ```
/// use ptc_lisp::{run, MapValue, NoTools, Value};
///
/// let out = run("(+ 1 2)", &MapValue::new(), &MapValue::new(), &NoTools).unwrap();
/// assert_eq!(out.result, Value::int(3));
/// assert!(out.delta.is_empty());
/// ```
pub fn run(
    source: &str,
    context: &MapValue,
    memory: &MapValue,
    tools: &dyn ToolExecutor,
) -> Result<RunOutput> {
    run_with_options(source, context, memory, tools, RunOptions::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(source_len = source.len()))]
pub fn run_with_options(
    source: &str,
    context: &MapValue,
    memory: &MapValue,
    tools: &dyn ToolExecutor,
    options: RunOptions,
) -> Result<RunOutput> {
    let program = compile(source)?;
    let env = stdlib::initial_environment();

    let evaluation = Interpreter::new(context.clone(), memory.clone(), tools)
        .with_config(options.config)
        .with_definitions(options.definitions)
        .evaluate(&program, &env)
        .inspect_err(|err| debug!(kind = err.kind(), "evaluation failed"))?;

    let update = apply_memory_contract(evaluation.value, evaluation.memory);
    debug!(
        delta_keys = update.delta.len(),
        returned = evaluation.returned,
        "run finished"
    );

    Ok(RunOutput {
        result: update.result,
        delta: update.delta,
        memory: update.memory,
        definitions: evaluation.definitions,
        returned: evaluation.returned,
    })
}

//! PTC-Lisp: a small sandboxed Lisp for programmatic tool calling.
//!
//! Source is read into [`Form`]s, analyzed into a validated [`Expr`] tree,
//! evaluated against a context map, a memory map and host tools, and the
//! final value is reduced through the memory contract.

pub mod abstractions;
pub mod analyzer;
pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod interner;
pub mod interpreter;
pub mod language;
pub mod lexer;
pub mod memory;
pub mod native;
pub mod numeric;
pub mod parser;
pub mod runner;
mod stack;
pub mod stdlib;
pub mod tool;

// Re-export commonly used items for convenience
pub use analyzer::{analyze, analyze_program};
pub use ast::Expr;
pub use config::EvalConfig;
pub use environment::Environment;
pub use error::{AnalysisError, Error, EvalError, ParseError, Result};
pub use interpreter::{Definitions, Evaluation, eval};
pub use language::{Keyword, MapValue, Value, VectorValue};
pub use memory::{MemoryUpdate, apply_memory_contract};
pub use numeric::Number;
pub use parser::{Form, parse};
pub use runner::{RunOptions, RunOutput, compile, run, run_with_options};
pub use stdlib::initial_environment;
pub use tool::{NoTools, ToolExecutor, Tools};

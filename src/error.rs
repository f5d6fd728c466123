//! Error types for every stage of the pipeline.
//!
//! All failures are ordinary values so a driving agent loop can render them
//! as retry feedback. `kind()` gives each a stable snake_case tag.

use thiserror::Error;

use crate::language::Value;

/// Reader failure with the 1-based position where it was detected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn kind(&self) -> &'static str {
        "parse_error"
    }
}

/// Static rejection of a syntactically valid but malformed program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{form}: expected {expected} argument(s), got {got}")]
    InvalidArity {
        form: String,
        expected: String,
        got: usize,
    },

    #[error("invalid {form}: {message}")]
    InvalidForm { form: String, message: String },

    #[error("invalid binding pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid recur: {0}")]
    InvalidRecur(String),

    #[error("unknown namespace '{0}' (only ctx/ and memory/ are available)")]
    UnknownNamespace(String),

    #[error("empty program")]
    EmptyProgram,
}

impl AnalysisError {
    pub fn arity(form: &str, expected: impl Into<String>, got: usize) -> Self {
        AnalysisError::InvalidArity {
            form: form.to_string(),
            expected: expected.into(),
            got,
        }
    }

    pub fn form(form: &str, message: impl Into<String>) -> Self {
        AnalysisError::InvalidForm {
            form: form.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidArity { .. } => "invalid_arity",
            AnalysisError::InvalidForm { .. } => "invalid_form",
            AnalysisError::InvalidPattern(_) => "invalid_pattern",
            AnalysisError::InvalidRecur(_) => "invalid_recur",
            AnalysisError::UnknownNamespace(_) => "unknown_namespace",
            AnalysisError::EmptyProgram => "empty_program",
        }
    }
}

/// Runtime failure raised while evaluating a program
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("not callable: {0}")]
    NotCallable(String),

    #[error("arity mismatch: expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("{name}: wrong number of arguments, expected {expected}, got {got}")]
    WrongArgCount {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("type error: {0}")]
    TypeError(String),

    #[error("keyword {keyword} takes a map and an optional default, got {got} argument(s)")]
    InvalidKeywordCall { keyword: String, got: usize },

    #[error("destructure error: {0}")]
    DestructureError(String),

    #[error("invalid arguments to tool {tool}: {message}")]
    InvalidToolArgs { tool: String, message: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool {tool} failed: {reason}")]
    ToolError { tool: String, reason: String },

    #[error("arithmetic error: {0}")]
    ArithmeticError(String),

    #[error("loop exceeded {limit} iterations")]
    LoopLimitExceeded { limit: usize },

    #[error("call depth exceeded {limit}")]
    RecursionLimitExceeded { limit: usize },

    #[error("cannot redefine builtin {name}")]
    Redefinition { name: String },

    #[error("program failed: {0}")]
    Failed(Value),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError(message.into())
    }

    pub fn invalid_tool_args(tool: &str) -> Self {
        EvalError::InvalidToolArgs {
            tool: tool.to_string(),
            message: format!(
                "tools take a single map of named arguments, e.g. ({tool} {{:key value}})"
            ),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::UnboundVariable(_) => "unbound_variable",
            EvalError::NotCallable(_) => "not_callable",
            EvalError::ArityMismatch { .. } => "arity_mismatch",
            EvalError::WrongArgCount { .. } => "arity_mismatch",
            EvalError::TypeError(_) => "type_error",
            EvalError::InvalidKeywordCall { .. } => "invalid_keyword_call",
            EvalError::DestructureError(_) => "destructure_error",
            EvalError::InvalidToolArgs { .. } => "invalid_tool_args",
            EvalError::UnknownTool(_) => "unknown_tool",
            EvalError::ToolError { .. } => "tool_error",
            EvalError::ArithmeticError(_) => "arithmetic_error",
            EvalError::LoopLimitExceeded { .. } => "loop_limit_exceeded",
            EvalError::RecursionLimitExceeded { .. } => "recursion_limit_exceeded",
            EvalError::Redefinition { .. } => "redefinition",
            EvalError::Failed(_) => "failed",
        }
    }
}

/// Any failure of a complete `run`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(e) => e.kind(),
            Error::Analysis(e) => e.kind(),
            Error::Eval(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

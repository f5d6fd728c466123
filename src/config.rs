use serde::{Deserialize, Serialize};

/// Limits that keep generated programs from running away with the host.
///
/// These are crash guards. Wall-clock and memory limits belong to whatever
/// harness invokes the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum `recur` iterations of a single `loop` or function body
    pub loop_limit: usize,
    /// Maximum nesting of function applications
    pub recursion_limit: usize,
}

pub const DEFAULT_LOOP_LIMIT: usize = 10_000;
pub const DEFAULT_RECURSION_LIMIT: usize = 256;

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            loop_limit: DEFAULT_LOOP_LIMIT,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl EvalConfig {
    pub fn with_loop_limit(mut self, limit: usize) -> Self {
        self.loop_limit = limit;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

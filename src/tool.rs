//! Host tools callable from DSL code.
//!
//! A tool receives one map of named arguments and returns a value or a
//! failure reason. The interpreter only sees the [`ToolExecutor`] trait;
//! [`Tools`] is the ready-made registry hosts usually hand in.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use crate::language::{MapValue, Value};

pub trait ToolExecutor {
    fn has_tool(&self, name: &str) -> bool;

    /// Invoke `name` with its argument map. `Err` carries the host's reason.
    fn call(&self, name: &str, args: MapValue) -> Result<Value, String>;
}

/// Executor with no tools at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

impl ToolExecutor for NoTools {
    fn has_tool(&self, _name: &str) -> bool {
        false
    }

    fn call(&self, name: &str, _args: MapValue) -> Result<Value, String> {
        Err(format!("no tool named {name}"))
    }
}

type ToolFn = Arc<dyn Fn(MapValue) -> Result<Value, String> + Send + Sync>;

/// Name to function registry
#[derive(Clone, Default)]
pub struct Tools {
    tools: FxHashMap<String, ToolFn>,
}

impl Tools {
    pub fn new() -> Self {
        Tools::default()
    }

    /// Register a tool working on DSL values
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(MapValue) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.tools.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a tool working on JSON. Arguments arrive as a JSON object
    /// (keyword keys lose their colon) and the result is converted back.
    pub fn insert_json<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(JsonValue) -> Result<JsonValue, String> + Send + Sync + 'static,
    {
        self.insert(name, move |args: MapValue| {
            let json = Value::Map(args).to_json();
            f(json).map(|out| Value::from_json(&out))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolExecutor for Tools {
    fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    fn call(&self, name: &str, args: MapValue) -> Result<Value, String> {
        match self.tools.get(name) {
            Some(f) => f(args),
            None => Err(format!("no tool named {name}")),
        }
    }
}

impl fmt::Debug for Tools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Tools").field("names", &names).finish()
    }
}

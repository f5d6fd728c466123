//! Lexical environment for variable bindings
//!
//! An Environment is an immutable persistent map from name to value.
//! Extending it returns a new environment that shares structure with the
//! old one, so closures can hold a cheap snapshot of their defining scope
//! and nothing a later scope binds can leak back into it.

use im::HashMap as ImHashMap;

use crate::interner::Symbol;
use crate::language::Value;

#[derive(Clone, Default)]
pub struct Environment {
    bindings: ImHashMap<Symbol, Value>,
}

impl Environment {
    /// Create a new, empty environment
    pub fn new() -> Self {
        Environment {
            bindings: ImHashMap::new(),
        }
    }

    /// Return a child environment with one more binding
    pub fn bind(&self, name: Symbol, value: Value) -> Self {
        Environment {
            bindings: self.bindings.update(name, value),
        }
    }

    /// Add a binding to this environment value in place
    pub fn define(&mut self, name: Symbol, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Value> {
        self.bindings.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.bindings.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<environment with {} bindings>", self.bindings.len())
    }
}

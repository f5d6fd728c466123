//! Standard library native functions
//!
//! Builtins are registered once into a global table and bound by name in
//! [`initial_environment`]. Each is a descriptor the interpreter applies
//! according to its [`BuiltinKind`].

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::environment::Environment;
use crate::error::EvalError;
use crate::interner::Symbol;
use crate::interpreter::{Interpreter, Unwind};
use crate::language::Value;

mod collections;
mod maps;
mod math;
mod predicates;
mod strings;

pub(crate) type NativeFn = fn(&mut Interpreter<'_>, Vec<Value>) -> Result<Value, Unwind>;
pub(crate) type ReduceFn = fn(&Value, &Value) -> Result<Value, EvalError>;
pub(crate) type UnaryFn = fn(&Value) -> Result<Value, EvalError>;

// ============================================================================
// Builtin Descriptors
// ============================================================================

pub struct Builtin {
    name: &'static str,
    pub(crate) kind: BuiltinKind,
}

pub(crate) enum BuiltinKind {
    /// Exactly one of the listed argument counts
    Fixed {
        arities: &'static [usize],
        func: NativeFn,
    },
    /// Binary reducer with an identity for zero arguments. A single argument
    /// goes through `unary` when present and is returned unchanged otherwise.
    Variadic {
        reducer: ReduceFn,
        identity: Value,
        unary: Option<UnaryFn>,
    },
    /// Binary reducer that needs at least one argument
    VariadicNonEmpty { reducer: ReduceFn },
    /// At least `min` arguments, handed over as a whole
    Collect { min: usize, func: NativeFn },
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<builtin {}>", self.name)
    }
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Default)]
pub(crate) struct Registry {
    table: FxHashMap<&'static str, Arc<Builtin>>,
}

impl Registry {
    fn add(&mut self, name: &'static str, kind: BuiltinKind) {
        self.table.insert(name, Arc::new(Builtin { name, kind }));
    }

    pub(crate) fn fixed(&mut self, name: &'static str, arities: &'static [usize], func: NativeFn) {
        self.add(name, BuiltinKind::Fixed { arities, func });
    }

    pub(crate) fn variadic(
        &mut self,
        name: &'static str,
        reducer: ReduceFn,
        identity: Value,
        unary: Option<UnaryFn>,
    ) {
        self.add(
            name,
            BuiltinKind::Variadic {
                reducer,
                identity,
                unary,
            },
        );
    }

    pub(crate) fn variadic_non_empty(&mut self, name: &'static str, reducer: ReduceFn) {
        self.add(name, BuiltinKind::VariadicNonEmpty { reducer });
    }

    pub(crate) fn collect(&mut self, name: &'static str, min: usize, func: NativeFn) {
        self.add(name, BuiltinKind::Collect { min, func });
    }
}

static BUILTINS: Lazy<FxHashMap<&'static str, Arc<Builtin>>> = Lazy::new(|| {
    let mut registry = Registry::default();
    math::register(&mut registry);
    predicates::register(&mut registry);
    collections::register(&mut registry);
    maps::register(&mut registry);
    strings::register(&mut registry);
    registry.table
});

static INITIAL_ENV: Lazy<Environment> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, builtin) in BUILTINS.iter() {
        env.define(Symbol::new(name), Value::Builtin(builtin.clone()));
    }
    env
});

/// The environment every program starts in: all builtins bound by name.
pub fn initial_environment() -> Environment {
    INITIAL_ENV.clone()
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name)
}

/// Names of every builtin, sorted
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

// ============================================================================
// Dispatch
// ============================================================================

fn describe_arities(arities: &[usize]) -> String {
    match arities {
        [n] => n.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(usize::to_string).collect();
            format!("{} or {last}", init.join(", "))
        }
        [] => "0".to_string(),
    }
}

fn wrong_count(name: &str, expected: String, got: usize) -> Unwind {
    EvalError::WrongArgCount {
        name: name.to_string(),
        expected,
        got,
    }
    .into()
}

pub(crate) fn call_builtin(
    interp: &mut Interpreter<'_>,
    builtin: &Builtin,
    args: Vec<Value>,
) -> Result<Value, Unwind> {
    match &builtin.kind {
        BuiltinKind::Fixed { arities, func } => {
            if !arities.contains(&args.len()) {
                return Err(wrong_count(builtin.name, describe_arities(arities), args.len()));
            }
            func(interp, args)
        }
        BuiltinKind::Variadic {
            reducer,
            identity,
            unary,
        } => {
            let mut iter = args.into_iter();
            let Some(first) = iter.next() else {
                return Ok(identity.clone());
            };
            let Some(second) = iter.next() else {
                return match unary {
                    Some(u) => Ok(u(&first)?),
                    None => Ok(first),
                };
            };
            let mut acc = reducer(&first, &second)?;
            for arg in iter {
                acc = reducer(&acc, &arg)?;
            }
            Ok(acc)
        }
        BuiltinKind::VariadicNonEmpty { reducer } => {
            let mut iter = args.into_iter();
            let Some(first) = iter.next() else {
                return Err(wrong_count(builtin.name, "at least 1".to_string(), 0));
            };
            // Reducing a lone argument with itself type-checks it
            let mut acc = reducer(&first, &first)?;
            for arg in iter {
                acc = reducer(&acc, &arg)?;
            }
            Ok(acc)
        }
        BuiltinKind::Collect { min, func } => {
            if args.len() < *min {
                return Err(wrong_count(builtin.name, format!("at least {min}"), args.len()));
            }
            func(interp, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_arities() {
        assert_eq!(describe_arities(&[1]), "1");
        assert_eq!(describe_arities(&[1, 2]), "1 or 2");
        assert_eq!(describe_arities(&[1, 2, 3]), "1, 2 or 3");
    }

    #[test]
    fn test_core_builtins_are_registered() {
        for name in ["+", "-", "max", "filter", "get-in", "parse-long", "str", "not"] {
            assert!(is_builtin(name), "{name} should be a builtin");
        }
        assert!(!is_builtin("where"));
    }

    #[test]
    fn test_initial_environment_binds_builtins() {
        let env = initial_environment();
        assert_eq!(env.len(), builtin_names().len());
        assert!(matches!(env.lookup(Symbol::new("count")), Some(Value::Builtin(_))));
    }
}

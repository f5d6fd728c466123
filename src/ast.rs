//! Validated, desugared program tree consumed by the interpreter.

use std::sync::Arc;

use crate::interner::Symbol;
use crate::language::{Keyword, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Vector(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Var(Symbol),
    /// `ctx/name`
    Ctx(Keyword),
    /// `memory/name`
    Memory(Keyword),
    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    If {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Do(Vec<Expr>),
    Fn(Arc<Lambda>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Where {
        path: Vec<Value>,
        op: WhereOp,
        operand: Option<Box<Expr>>,
    },
    Combinator {
        kind: Combinator,
        predicates: Vec<Expr>,
    },
    ToolCall {
        name: String,
        args: Box<Expr>,
    },
    Return(Box<Expr>),
    Fail(Box<Expr>),
    Loop {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    Recur(Vec<Expr>),
    Def {
        name: Symbol,
        value: Box<Expr>,
    },
    /// Body of a `where` predicate; reads the row bound to [`ROW`]
    RowTest {
        path: Vec<Value>,
        op: WhereOp,
        operand: Value,
    },
    /// Body of a combinator predicate; reads the row bound to [`ROW`]
    CombinedTest {
        kind: Combinator,
        predicates: Vec<Value>,
    },
}

/// Name the synthesized predicate closures bind their argument to.
/// `$` never lexes as a symbol character, so user code cannot shadow it.
pub const ROW: &str = "$row";

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub pattern: Pattern,
    pub value: Expr,
}

/// Parameter patterns and body of a `fn`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Pattern>,
    pub body: Expr,
}

// ============================================================================
// Destructuring Patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Bind(Symbol),
    /// `_`
    Ignore,
    /// `{:keys [a b] :or {a 1}}` and `{name :key}`
    Map(Vec<MapEntryPattern>),
    /// `[a b & more]`
    Seq {
        items: Vec<Pattern>,
        rest: Option<Box<Pattern>>,
    },
    /// Binds the whole value to `name` and matches `inner` against it
    As {
        name: Symbol,
        inner: Box<Pattern>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntryPattern {
    pub target: Pattern,
    pub key: Value,
    pub default: Option<Expr>,
}

// ============================================================================
// Predicate Builders
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOp {
    /// `(where :field)` with no operator tests truthiness
    Truthy,
    Eq,
    NotEq,
    Gt,
    Lt,
    Gte,
    Lte,
    Includes,
    In,
}

impl WhereOp {
    pub fn from_symbol(name: &str) -> Option<WhereOp> {
        Some(match name {
            "=" => WhereOp::Eq,
            "not=" => WhereOp::NotEq,
            ">" => WhereOp::Gt,
            "<" => WhereOp::Lt,
            ">=" => WhereOp::Gte,
            "<=" => WhereOp::Lte,
            "includes" => WhereOp::Includes,
            "in" => WhereOp::In,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    NoneOf,
}

impl Combinator {
    pub fn from_symbol(name: &str) -> Option<Combinator> {
        match name {
            "all-of" => Some(Combinator::AllOf),
            "any-of" => Some(Combinator::AnyOf),
            "none-of" => Some(Combinator::NoneOf),
            _ => None,
        }
    }
}

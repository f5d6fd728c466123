//! Static analysis: raw forms to a validated [`Expr`] tree.
//!
//! Special forms are recognized by their head symbol, checked for shape and
//! arity, and desugared (`when`, `cond`, `->`, `if-let`, `defn`, ...) into the
//! small set of nodes the interpreter understands. Variable resolution is
//! left to evaluation time.

use std::sync::Arc;

use crate::ast::{Binding, Combinator, Expr, Lambda, MapEntryPattern, Pattern, WhereOp};
use crate::error::AnalysisError;
use crate::interner::Symbol;
use crate::language::{Keyword, Value};
use crate::parser::Form;
use crate::stack;

type Result<T> = std::result::Result<T, AnalysisError>;

/// Analyze a single form.
pub fn analyze(form: &Form) -> Result<Expr> {
    Analyzer::default().analyze(form, true)
}

/// Analyze a whole program. Several top-level forms run in sequence and the
/// last one supplies the result.
pub fn analyze_program(forms: &[Form]) -> Result<Expr> {
    let mut analyzer = Analyzer::default();
    match forms {
        [] => Err(AnalysisError::EmptyProgram),
        [single] => analyzer.analyze(single, true),
        many => analyzer.analyze_body(many, true),
    }
}

#[derive(Default)]
struct Analyzer {
    /// Arity of the innermost `loop` or `fn` a `recur` would jump to
    recur_arity: Option<usize>,
    gensym: usize,
}

impl Analyzer {
    fn analyze(&mut self, form: &Form, tail: bool) -> Result<Expr> {
        stack::guarded(|| self.analyze_form(form, tail))
    }

    fn analyze_form(&mut self, form: &Form, tail: bool) -> Result<Expr> {
        match form {
            Form::Nil => Ok(Expr::Literal(Value::Nil)),
            Form::Bool(b) => Ok(Expr::Literal(Value::Bool(*b))),
            Form::Number(n) => Ok(Expr::Literal(Value::Number(*n))),
            Form::String(s) => Ok(Expr::Literal(Value::string(s))),
            Form::Keyword(k) => Ok(Expr::Literal(Value::keyword(k))),
            Form::Symbol(s) => Ok(Expr::Var(Symbol::new(s))),
            Form::NsSymbol { ns, name } => match ns.as_str() {
                "ctx" => Ok(Expr::Ctx(Keyword::new(name))),
                "memory" => Ok(Expr::Memory(Keyword::new(name))),
                _ => Err(AnalysisError::UnknownNamespace(ns.clone())),
            },
            Form::Vector(items) => Ok(Expr::Vector(self.analyze_all(items)?)),
            Form::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    out.push((self.analyze(k, false)?, self.analyze(v, false)?));
                }
                Ok(Expr::Map(out))
            }
            Form::List(items) => self.analyze_list(items, tail),
        }
    }

    fn analyze_all(&mut self, forms: &[Form]) -> Result<Vec<Expr>> {
        forms.iter().map(|f| self.analyze(f, false)).collect()
    }

    /// A sequence of body forms; only the last is in tail position
    fn analyze_body(&mut self, forms: &[Form], tail: bool) -> Result<Expr> {
        match forms {
            [] => Ok(Expr::Literal(Value::Nil)),
            [single] => self.analyze(single, tail),
            [init @ .., last] => {
                let mut exprs = self.analyze_all(init)?;
                exprs.push(self.analyze(last, tail)?);
                Ok(Expr::Do(exprs))
            }
        }
    }

    fn analyze_list(&mut self, items: &[Form], tail: bool) -> Result<Expr> {
        let Some((head, args)) = items.split_first() else {
            return Ok(Expr::Literal(Value::vector([])));
        };

        if let Some(name) = head.as_symbol() {
            match name {
                "let" => return self.analyze_let(args, tail),
                "if" => return self.analyze_if(args, tail),
                "when" => return self.analyze_when(args, tail, false),
                "when-not" => return self.analyze_when(args, tail, true),
                "cond" => return self.analyze_cond(args, tail),
                "and" => return self.analyze_logic(args, tail, Expr::And),
                "or" => return self.analyze_logic(args, tail, Expr::Or),
                "do" => return self.analyze_body(args, tail),
                "fn" => return self.analyze_fn(args).map(Expr::Fn),
                "defn" => return self.analyze_defn(args),
                "def" => return self.analyze_def(args),
                "loop" => return self.analyze_loop(args),
                "recur" => return self.analyze_recur(args, tail),
                "where" => return self.analyze_where(args),
                "return" => return Ok(Expr::Return(Box::new(self.terminal("return", args)?))),
                "fail" => return Ok(Expr::Fail(Box::new(self.terminal("fail", args)?))),
                "call" => return self.analyze_call(args),
                "->" => return self.analyze_thread(args, tail, false),
                "->>" => return self.analyze_thread(args, tail, true),
                "if-let" => return self.analyze_if_let(args, tail, false),
                "when-let" => return self.analyze_if_let(args, tail, true),
                _ => {}
            }
            if let Some(kind) = Combinator::from_symbol(name) {
                return Ok(Expr::Combinator {
                    kind,
                    predicates: self.analyze_all(args)?,
                });
            }
        }

        Ok(Expr::Call {
            callee: Box::new(self.analyze(head, false)?),
            args: self.analyze_all(args)?,
        })
    }

    // ========================================================================
    // Binding Forms
    // ========================================================================

    fn analyze_bindings(&mut self, form_name: &str, form: Option<&Form>) -> Result<Vec<Binding>> {
        let Some(Form::Vector(items)) = form else {
            return Err(AnalysisError::form(form_name, "expected a binding vector"));
        };
        if items.len() % 2 != 0 {
            return Err(AnalysisError::form(
                form_name,
                "binding vector needs an even number of forms",
            ));
        }
        items
            .chunks(2)
            .map(|pair| {
                Ok(Binding {
                    pattern: self.analyze_pattern(&pair[0])?,
                    value: self.analyze(&pair[1], false)?,
                })
            })
            .collect()
    }

    fn analyze_let(&mut self, args: &[Form], tail: bool) -> Result<Expr> {
        if args.is_empty() {
            return Err(AnalysisError::arity("let", "at least 1", 0));
        }
        let bindings = self.analyze_bindings("let", args.first())?;
        let body = self.analyze_body(&args[1..], tail)?;
        Ok(Expr::Let {
            bindings,
            body: Box::new(body),
        })
    }

    fn analyze_loop(&mut self, args: &[Form]) -> Result<Expr> {
        if args.is_empty() {
            return Err(AnalysisError::arity("loop", "at least 1", 0));
        }
        let bindings = self.analyze_bindings("loop", args.first())?;
        let outer = self.recur_arity.replace(bindings.len());
        let body = self.analyze_body(&args[1..], true);
        self.recur_arity = outer;
        Ok(Expr::Loop {
            bindings,
            body: Box::new(body?),
        })
    }

    fn analyze_recur(&mut self, args: &[Form], tail: bool) -> Result<Expr> {
        let Some(expected) = self.recur_arity else {
            return Err(AnalysisError::InvalidRecur(
                "recur used outside of loop or fn".to_string(),
            ));
        };
        if !tail {
            return Err(AnalysisError::InvalidRecur(
                "recur must be in tail position".to_string(),
            ));
        }
        if args.len() != expected {
            return Err(AnalysisError::InvalidRecur(format!(
                "expected {expected} argument(s), got {}",
                args.len()
            )));
        }
        Ok(Expr::Recur(self.analyze_all(args)?))
    }

    fn analyze_if_let(&mut self, args: &[Form], tail: bool, is_when: bool) -> Result<Expr> {
        let name = if is_when { "when-let" } else { "if-let" };
        if !is_when && !(2..=3).contains(&args.len()) {
            return Err(AnalysisError::arity(name, "2 or 3", args.len()));
        }
        if is_when && args.is_empty() {
            return Err(AnalysisError::arity(name, "at least 1", 0));
        }
        let mut bindings = self.analyze_bindings(name, args.first())?;
        if bindings.len() != 1 {
            return Err(AnalysisError::form(name, "expected exactly one binding"));
        }
        let Binding { pattern, value } = bindings.remove(0);

        self.gensym += 1;
        let temp = Symbol::new(&format!("${name}{}", self.gensym));
        let (then, otherwise) = if is_when {
            (self.analyze_body(&args[1..], tail)?, Expr::Literal(Value::Nil))
        } else {
            let otherwise = match args.get(2) {
                Some(form) => self.analyze(form, tail)?,
                None => Expr::Literal(Value::Nil),
            };
            (self.analyze(&args[1], tail)?, otherwise)
        };

        Ok(Expr::Let {
            bindings: vec![Binding {
                pattern: Pattern::Bind(temp),
                value,
            }],
            body: Box::new(Expr::If {
                test: Box::new(Expr::Var(temp)),
                then: Box::new(Expr::Let {
                    bindings: vec![Binding {
                        pattern,
                        value: Expr::Var(temp),
                    }],
                    body: Box::new(then),
                }),
                otherwise: Box::new(otherwise),
            }),
        })
    }

    // ========================================================================
    // Conditionals
    // ========================================================================

    fn analyze_if(&mut self, args: &[Form], tail: bool) -> Result<Expr> {
        if !(2..=3).contains(&args.len()) {
            return Err(AnalysisError::arity("if", "2 or 3", args.len()));
        }
        let otherwise = match args.get(2) {
            Some(form) => self.analyze(form, tail)?,
            None => Expr::Literal(Value::Nil),
        };
        Ok(Expr::If {
            test: Box::new(self.analyze(&args[0], false)?),
            then: Box::new(self.analyze(&args[1], tail)?),
            otherwise: Box::new(otherwise),
        })
    }

    fn analyze_when(&mut self, args: &[Form], tail: bool, negate: bool) -> Result<Expr> {
        let Some((test, body)) = args.split_first() else {
            let name = if negate { "when-not" } else { "when" };
            return Err(AnalysisError::arity(name, "at least 1", 0));
        };
        let test = self.analyze(test, false)?;
        let body = self.analyze_body(body, tail)?;
        let nil = Expr::Literal(Value::Nil);
        let (then, otherwise) = if negate { (nil, body) } else { (body, nil) };
        Ok(Expr::If {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn analyze_cond(&mut self, args: &[Form], tail: bool) -> Result<Expr> {
        if args.len() % 2 != 0 {
            return Err(AnalysisError::form(
                "cond",
                "expected an even number of test/expression forms",
            ));
        }
        let mut clauses = Vec::with_capacity(args.len() / 2);
        for pair in args.chunks(2) {
            clauses.push((self.analyze(&pair[0], false)?, self.analyze(&pair[1], tail)?));
        }
        Ok(clauses
            .into_iter()
            .rev()
            .fold(Expr::Literal(Value::Nil), |otherwise, (test, then)| Expr::If {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }))
    }

    fn analyze_logic(
        &mut self,
        args: &[Form],
        tail: bool,
        build: fn(Vec<Expr>) -> Expr,
    ) -> Result<Expr> {
        let mut exprs = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            exprs.push(self.analyze(arg, tail && i + 1 == args.len())?);
        }
        Ok(build(exprs))
    }

    // ========================================================================
    // Functions and Definitions
    // ========================================================================

    fn analyze_fn(&mut self, args: &[Form]) -> Result<Arc<Lambda>> {
        let Some(Form::Vector(params)) = args.first() else {
            return Err(AnalysisError::form("fn", "expected a parameter vector"));
        };
        if params.iter().any(|p| p.as_symbol() == Some("&")) {
            return Err(AnalysisError::form(
                "fn",
                "variadic parameters are not supported",
            ));
        }
        let params = params
            .iter()
            .map(|p| self.analyze_pattern(p))
            .collect::<Result<Vec<_>>>()?;

        let outer = self.recur_arity.replace(params.len());
        let body = self.analyze_body(&args[1..], true);
        self.recur_arity = outer;
        Ok(Arc::new(Lambda { params, body: body? }))
    }

    fn analyze_defn(&mut self, args: &[Form]) -> Result<Expr> {
        let Some((name, rest)) = args.split_first() else {
            return Err(AnalysisError::arity("defn", "at least 2", 0));
        };
        let name = definition_name("defn", name)?;
        // An optional docstring sits between the name and the parameters
        let rest = match rest {
            [Form::String(_), tail @ ..] if !tail.is_empty() => tail,
            _ => rest,
        };
        if rest.is_empty() {
            return Err(AnalysisError::arity("defn", "at least 2", args.len()));
        }
        let lambda = self.analyze_fn(rest)?;
        Ok(Expr::Def {
            name,
            value: Box::new(Expr::Fn(lambda)),
        })
    }

    fn analyze_def(&mut self, args: &[Form]) -> Result<Expr> {
        let [name, value] = args else {
            return Err(AnalysisError::arity("def", "2", args.len()));
        };
        Ok(Expr::Def {
            name: definition_name("def", name)?,
            value: Box::new(self.analyze(value, false)?),
        })
    }

    // ========================================================================
    // Predicates, Tools and Terminals
    // ========================================================================

    fn analyze_where(&mut self, args: &[Form]) -> Result<Expr> {
        if args.len() != 1 && args.len() != 3 {
            return Err(AnalysisError::arity("where", "1 or 3", args.len()));
        }
        let path = where_path(&args[0])?;
        if args.len() == 1 {
            return Ok(Expr::Where {
                path,
                op: WhereOp::Truthy,
                operand: None,
            });
        }
        let op = args[1]
            .as_symbol()
            .and_then(WhereOp::from_symbol)
            .ok_or_else(|| {
                AnalysisError::form(
                    "where",
                    format!(
                        "unknown operator {}; expected one of = not= > < >= <= includes in",
                        args[1]
                    ),
                )
            })?;
        Ok(Expr::Where {
            path,
            op,
            operand: Some(Box::new(self.analyze(&args[2], false)?)),
        })
    }

    fn analyze_call(&mut self, args: &[Form]) -> Result<Expr> {
        if args.is_empty() || args.len() > 2 {
            return Err(AnalysisError::arity("call", "1 or 2", args.len()));
        }
        let Form::String(name) = &args[0] else {
            return Err(AnalysisError::form("call", "tool name must be a string literal"));
        };
        let map_args = match args.get(1) {
            Some(form) => self.analyze(form, false)?,
            None => Expr::Map(Vec::new()),
        };
        Ok(Expr::ToolCall {
            name: name.clone(),
            args: Box::new(map_args),
        })
    }

    fn terminal(&mut self, name: &str, args: &[Form]) -> Result<Expr> {
        match args {
            [value] => self.analyze(value, false),
            _ => Err(AnalysisError::arity(name, "1", args.len())),
        }
    }

    /// `(-> x (f a) g)` becomes `(g (f x a))`; `->>` threads into last position
    fn analyze_thread(&mut self, args: &[Form], tail: bool, last: bool) -> Result<Expr> {
        let Some((init, steps)) = args.split_first() else {
            let name = if last { "->>" } else { "->" };
            return Err(AnalysisError::arity(name, "at least 1", 0));
        };
        let threaded = steps.iter().fold(init.clone(), |acc, step| match step {
            Form::List(items) if !items.is_empty() => {
                let mut call = items.clone();
                if last {
                    call.push(acc);
                } else {
                    call.insert(1, acc);
                }
                Form::List(call)
            }
            other => Form::List(vec![other.clone(), acc]),
        });
        self.analyze(&threaded, tail)
    }

    // ========================================================================
    // Destructuring Patterns
    // ========================================================================

    fn analyze_pattern(&mut self, form: &Form) -> Result<Pattern> {
        match form {
            Form::Symbol(s) if s == "_" => Ok(Pattern::Ignore),
            Form::Symbol(s) if s == "&" => Err(AnalysisError::InvalidPattern(
                "& must be followed by a rest binding inside a vector pattern".to_string(),
            )),
            Form::Symbol(s) => Ok(Pattern::Bind(Symbol::new(s))),
            Form::Vector(items) => stack::guarded(|| self.analyze_seq_pattern(items)),
            Form::Map(entries) => stack::guarded(|| self.analyze_map_pattern(entries)),
            other => Err(AnalysisError::InvalidPattern(format!(
                "cannot bind to {other}"
            ))),
        }
    }

    fn analyze_seq_pattern(&mut self, items: &[Form]) -> Result<Pattern> {
        let mut positional = Vec::new();
        let mut rest = None;
        let mut as_name = None;
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            match item {
                Form::Symbol(s) if s == "&" => {
                    let target = iter.next().ok_or_else(|| {
                        AnalysisError::InvalidPattern("& must be followed by a binding".to_string())
                    })?;
                    if rest.is_some() {
                        return Err(AnalysisError::InvalidPattern(
                            "only one & rest binding is allowed".to_string(),
                        ));
                    }
                    rest = Some(Box::new(self.analyze_pattern(target)?));
                }
                Form::Keyword(k) if k == "as" => {
                    as_name = Some(as_binding(iter.next())?);
                }
                _ if rest.is_some() => {
                    return Err(AnalysisError::InvalidPattern(
                        "positional bindings cannot follow the & rest binding".to_string(),
                    ));
                }
                other => positional.push(self.analyze_pattern(other)?),
            }
        }
        let pattern = Pattern::Seq {
            items: positional,
            rest,
        };
        Ok(wrap_as(pattern, as_name))
    }

    fn analyze_map_pattern(&mut self, entries: &[(Form, Form)]) -> Result<Pattern> {
        let mut out = Vec::new();
        let mut defaults = Vec::new();
        let mut as_name = None;

        for (k, v) in entries {
            match k.as_keyword() {
                Some(directive @ ("keys" | "strs")) => {
                    let Form::Vector(names) = v else {
                        return Err(AnalysisError::InvalidPattern(format!(
                            ":{directive} expects a vector of names"
                        )));
                    };
                    for name in names {
                        let name = match name {
                            Form::Symbol(s) | Form::Keyword(s) => s,
                            other => {
                                return Err(AnalysisError::InvalidPattern(format!(
                                    ":{directive} entries must be symbols, got {other}"
                                )));
                            }
                        };
                        let key = if directive == "keys" {
                            Value::keyword(name)
                        } else {
                            Value::string(name)
                        };
                        out.push(MapEntryPattern {
                            target: Pattern::Bind(Symbol::new(name)),
                            key,
                            default: None,
                        });
                    }
                }
                Some("or") => {
                    let Form::Map(pairs) = v else {
                        return Err(AnalysisError::InvalidPattern(
                            ":or expects a map of defaults".to_string(),
                        ));
                    };
                    for (name, default) in pairs {
                        let Some(name) = name.as_symbol() else {
                            return Err(AnalysisError::InvalidPattern(format!(
                                ":or keys must be symbols, got {name}"
                            )));
                        };
                        defaults.push((Symbol::new(name), self.analyze(default, false)?));
                    }
                }
                Some("as") => as_name = Some(as_binding(Some(v))?),
                _ => {
                    let key = literal_key(v)?;
                    out.push(MapEntryPattern {
                        target: self.analyze_pattern(k)?,
                        key,
                        default: None,
                    });
                }
            }
        }

        for (name, default) in defaults {
            let entry = out
                .iter_mut()
                .find(|e| e.target == Pattern::Bind(name))
                .ok_or_else(|| {
                    AnalysisError::InvalidPattern(format!(":or default for unbound name {name}"))
                })?;
            entry.default = Some(default);
        }

        Ok(wrap_as(Pattern::Map(out), as_name))
    }
}

fn definition_name(form: &str, name: &Form) -> Result<Symbol> {
    match name.as_symbol() {
        Some(s) => Ok(Symbol::new(s)),
        None => Err(AnalysisError::form(
            form,
            format!("expected a symbol name, got {name}"),
        )),
    }
}

fn where_path(form: &Form) -> Result<Vec<Value>> {
    let step = |f: &Form| match f {
        Form::Keyword(k) => Ok(Value::keyword(k)),
        Form::String(s) => Ok(Value::string(s)),
        other => Err(AnalysisError::form(
            "where",
            format!("field must be a keyword, string or vector of them, got {other}"),
        )),
    };
    match form {
        Form::Vector(items) if !items.is_empty() => items.iter().map(step).collect(),
        other => Ok(vec![step(other)?]),
    }
}

fn literal_key(form: &Form) -> Result<Value> {
    match form {
        Form::Keyword(k) => Ok(Value::keyword(k)),
        Form::String(s) => Ok(Value::string(s)),
        Form::Number(n) => Ok(Value::Number(*n)),
        Form::Bool(b) => Ok(Value::Bool(*b)),
        Form::Nil => Ok(Value::Nil),
        other => Err(AnalysisError::InvalidPattern(format!(
            "map pattern keys must be literals, got {other}"
        ))),
    }
}

fn as_binding(form: Option<&Form>) -> Result<Symbol> {
    match form.and_then(Form::as_symbol) {
        Some(s) => Ok(Symbol::new(s)),
        None => Err(AnalysisError::InvalidPattern(
            ":as must be followed by a symbol".to_string(),
        )),
    }
}

fn wrap_as(pattern: Pattern, name: Option<Symbol>) -> Pattern {
    match name {
        Some(name) => Pattern::As {
            name,
            inner: Box::new(pattern),
        },
        None => pattern,
    }
}

//! Reader: source text to raw syntax forms.
//!
//! The reader knows nothing about special forms; it only recognizes
//! literals, symbols (plain and `ns/name`), keywords and the three
//! collection brackets. `#(...)` is expanded here into an ordinary
//! `(fn [...] ...)` list.

use std::fmt;

use crate::error::ParseError;
use crate::lexer::{Lexer, Position, Token};
use crate::numeric::Number;
use crate::stack;

/// Nesting deeper than this is rejected
const MAX_DEPTH: usize = 512;

// ============================================================================
// Raw Syntax Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Nil,
    Bool(bool),
    Number(Number),
    String(String),
    Keyword(String),
    Symbol(String),
    NsSymbol { ns: String, name: String },
    List(Vec<Form>),
    Vector(Vec<Form>),
    Map(Vec<(Form, Form)>),
}

impl Form {
    pub fn symbol(name: &str) -> Form {
        Form::Symbol(name.to_string())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Form::Keyword(k) => Some(k),
            _ => None,
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    lexer: Lexer,
    peeked: Option<(Token, Position)>,
    depth: usize,
    in_anon_fn: bool,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            peeked: None,
            depth: 0,
            in_anon_fn: false,
        }
    }

    fn next(&mut self) -> Result<(Token, Position), ParseError> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let next = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        Ok(&self.peeked.insert(next).0)
    }

    fn parse_form(&mut self) -> Result<Form, ParseError> {
        stack::guarded(|| self.read_form())
    }

    fn read_form(&mut self) -> Result<Form, ParseError> {
        let (token, pos) = self.next()?;
        match token {
            Token::Number(n) => Ok(Form::Number(n)),
            Token::String(s) => Ok(Form::String(s)),
            Token::Keyword(k) => Ok(Form::Keyword(k)),
            Token::Symbol(s) => Ok(match s.as_str() {
                "nil" => Form::Nil,
                "true" => Form::Bool(true),
                "false" => Form::Bool(false),
                _ => Form::Symbol(s),
            }),
            Token::NsSymbol { ns, name } => Ok(Form::NsSymbol { ns, name }),
            Token::LParen => Ok(Form::List(self.parse_seq(Token::RParen, ")", pos)?)),
            Token::LBracket => Ok(Form::Vector(self.parse_seq(Token::RBracket, "]", pos)?)),
            Token::LBrace => self.parse_map(pos),
            Token::FnOpen => self.parse_anon_fn(pos),
            Token::RParen | Token::RBracket | Token::RBrace => Err(ParseError::new(
                format!("unexpected closing delimiter {}", closing_text(&token)),
                pos.line,
                pos.column,
            )),
            Token::Eof => Err(ParseError::new("unexpected end of input", pos.line, pos.column)),
        }
    }

    fn parse_seq(
        &mut self,
        close: Token,
        close_text: &str,
        open: Position,
    ) -> Result<Vec<Form>, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new(
                format!("nesting deeper than {MAX_DEPTH} levels"),
                open.line,
                open.column,
            ));
        }

        let mut items = Vec::new();
        loop {
            let next = self.peek()?;
            if *next == close {
                self.next()?;
                break;
            }
            if *next == Token::Eof {
                return Err(ParseError::new(
                    format!("unbalanced delimiter: missing {close_text}"),
                    open.line,
                    open.column,
                ));
            }
            items.push(self.parse_form()?);
        }

        self.depth -= 1;
        Ok(items)
    }

    fn parse_map(&mut self, open: Position) -> Result<Form, ParseError> {
        let items = self.parse_seq(Token::RBrace, "}", open)?;
        if items.len() % 2 != 0 {
            return Err(ParseError::new(
                "map literal must contain an even number of forms",
                open.line,
                open.column,
            ));
        }
        let mut entries = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            entries.push((k, v));
        }
        Ok(Form::Map(entries))
    }

    /// `#(+ % 1)` reads as `(fn [%1] (+ %1 1))`
    fn parse_anon_fn(&mut self, open: Position) -> Result<Form, ParseError> {
        if self.in_anon_fn {
            return Err(ParseError::new(
                "nested #() function literals are not allowed",
                open.line,
                open.column,
            ));
        }
        self.in_anon_fn = true;
        let body = self.parse_seq(Token::RParen, ")", open);
        self.in_anon_fn = false;

        let mut max_arg = 0;
        let body = Form::List(rename_anon_args(body?, &mut max_arg));
        let params = (1..=max_arg).map(|i| Form::Symbol(format!("%{i}"))).collect();
        Ok(Form::List(vec![Form::symbol("fn"), Form::Vector(params), body]))
    }
}

fn closing_text(token: &Token) -> &'static str {
    match token {
        Token::RParen => ")",
        Token::RBracket => "]",
        _ => "}",
    }
}

fn rename_anon_args(forms: Vec<Form>, max_arg: &mut usize) -> Vec<Form> {
    forms
        .into_iter()
        .map(|form| rename_anon_arg(form, max_arg))
        .collect()
}

fn rename_anon_arg(form: Form, max_arg: &mut usize) -> Form {
    match form {
        Form::Symbol(s) if s == "%" => {
            *max_arg = (*max_arg).max(1);
            Form::Symbol("%1".to_string())
        }
        Form::Symbol(s) => {
            if let Some(n) = s.strip_prefix('%').and_then(|d| d.parse::<usize>().ok())
                && (1..=9).contains(&n)
            {
                *max_arg = (*max_arg).max(n);
            }
            Form::Symbol(s)
        }
        Form::List(items) => Form::List(rename_anon_args(items, max_arg)),
        Form::Vector(items) => Form::Vector(rename_anon_args(items, max_arg)),
        Form::Map(entries) => Form::Map(
            entries
                .into_iter()
                .map(|(k, v)| (rename_anon_arg(k, max_arg), rename_anon_arg(v, max_arg)))
                .collect(),
        ),
        other => other,
    }
}

/// Read every top-level form in `input`.
pub fn parse(input: &str) -> Result<Vec<Form>, ParseError> {
    let mut parser = Parser::new(input);
    let mut forms = Vec::new();
    while *parser.peek()? != Token::Eof {
        forms.push(parser.parse_form()?);
    }
    Ok(forms)
}

/// Read exactly one form.
pub fn parse_one(input: &str) -> Result<Form, ParseError> {
    let mut forms = parse(input)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        0 => Err(ParseError::new("expected a form, found end of input", 1, 1)),
        n => Err(ParseError::new(format!("expected a single form, found {n}"), 1, 1)),
    }
}

// ============================================================================
// Printer
// ============================================================================

pub(crate) fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            '\0' => result.push_str("\\0"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            c => result.push(c),
        }
    }
    result
}

fn write_spaced(f: &mut fmt::Formatter, items: &[Form]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Prints source that reads back to an equal form
impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Form::Nil => write!(f, "nil"),
            Form::Bool(b) => write!(f, "{b}"),
            Form::Number(n) => write!(f, "{n}"),
            Form::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Form::Keyword(k) => write!(f, ":{k}"),
            Form::Symbol(s) => write!(f, "{s}"),
            Form::NsSymbol { ns, name } => write!(f, "{ns}/{name}"),
            Form::List(items) => {
                write!(f, "(")?;
                write_spaced(f, items)?;
                write!(f, ")")
            }
            Form::Vector(items) => {
                write!(f, "[")?;
                write_spaced(f, items)?;
                write!(f, "]")
            }
            Form::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

use crate::error::ParseError;
use crate::numeric::{Number, special_float};

// ============================================================================
// Token Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// `#(` opening an anonymous function literal
    FnOpen,
    Symbol(String),
    /// `ns/name`, e.g. `ctx/items`
    NsSymbol {
        ns: String,
        name: String,
    },
    Keyword(String),
    Number(Number),
    String(String),
    Eof,
}

/// 1-based source position of a token's first character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

// ============================================================================
// Lexer
// ============================================================================

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> char {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, n: usize) -> char {
        self.input.get(self.position + n).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(&ch) = self.input.get(self.position) {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error_at(&self, pos: Position, message: impl Into<String>) -> ParseError {
        ParseError::new(message, pos.line, pos.column)
    }

    fn skip_whitespace(&mut self) {
        loop {
            // Commas are whitespace, as in Clojure
            while !self.is_eof() && (self.current_char().is_whitespace() || self.current_char() == ',')
            {
                self.advance();
            }

            if self.current_char() == ';' && !self.is_eof() {
                while !self.is_eof() && self.current_char() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    // ========================================================================
    // String Parsing
    // ========================================================================

    fn read_string(&mut self, start: Position) -> Result<Token, ParseError> {
        self.advance(); // opening quote
        let mut content = String::new();

        while self.current_char() != '"' && !self.is_eof() {
            if self.current_char() == '\\' {
                let escape_pos = self.here();
                self.advance();
                content.push(self.read_escape_sequence(escape_pos)?);
            } else {
                content.push(self.current_char());
                self.advance();
            }
        }

        if self.is_eof() {
            return Err(self.error_at(start, "unterminated string"));
        }

        self.advance(); // closing quote
        Ok(Token::String(content))
    }

    fn read_escape_sequence(&mut self, pos: Position) -> Result<char, ParseError> {
        if self.is_eof() {
            return Err(self.error_at(pos, "unterminated escape sequence"));
        }
        let c = self.current_char();
        self.advance();

        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '0' => Ok('\0'),
            'u' => self.read_unicode_escape(pos),
            _ => Err(self.error_at(pos, format!("unknown escape sequence: \\{c}"))),
        }
    }

    /// Read a four-digit escape such as `\u00e9`
    fn read_unicode_escape(&mut self, pos: Position) -> Result<char, ParseError> {
        let mut hex = String::new();
        for _ in 0..4 {
            let ch = self.current_char();
            if !ch.is_ascii_hexdigit() {
                return Err(self.error_at(pos, "invalid hex digit in \\u escape"));
            }
            hex.push(ch);
            self.advance();
        }

        let code_point = u32::from_str_radix(&hex, 16)
            .map_err(|e| self.error_at(pos, format!("invalid unicode escape: {e}")))?;
        char::from_u32(code_point)
            .ok_or_else(|| self.error_at(pos, format!("invalid unicode code point: {code_point}")))
    }

    // ========================================================================
    // Number, Symbol and Keyword Parsing
    // ========================================================================

    fn is_symbol_char(c: char) -> bool {
        c.is_alphanumeric()
            || matches!(
                c,
                '-' | '_' | '+' | '*' | '!' | '?' | '<' | '>' | '=' | '%' | '/' | '&' | '.'
            )
    }

    fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';' | ',' | '\0')
    }

    /// Collect characters up to the next delimiter
    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while !self.is_eof() && !Self::is_delimiter(self.current_char()) {
            text.push(self.current_char());
            self.advance();
        }
        text
    }

    fn read_number(&mut self, start: Position) -> Result<Token, ParseError> {
        let text = self.read_word();
        Number::parse_literal(&text)
            .map(Token::Number)
            .ok_or_else(|| self.error_at(start, format!("invalid number literal: {text}")))
    }

    fn read_keyword(&mut self, start: Position) -> Result<Token, ParseError> {
        self.advance(); // ':'
        let name = self.read_word();
        if name.is_empty() {
            return Err(self.error_at(start, "empty keyword"));
        }
        if name.contains('/') {
            return Err(self.error_at(
                start,
                format!("namespaced keywords are not supported: :{name}"),
            ));
        }
        if let Some(bad) = name.chars().find(|c| !Self::is_symbol_char(*c)) {
            return Err(self.error_at(start, format!("invalid character '{bad}' in keyword :{name}")));
        }
        Ok(Token::Keyword(name))
    }

    fn read_symbol(&mut self, start: Position) -> Result<Token, ParseError> {
        let text = self.read_word();

        if let Some(bad) = text.chars().find(|c| !Self::is_symbol_char(*c)) {
            return Err(self.error_at(start, format!("unexpected character '{bad}' in {text}")));
        }
        if special_float(&text).is_some() {
            return Number::parse_literal(&text)
                .map(Token::Number)
                .ok_or_else(|| self.error_at(start, format!("invalid number literal: {text}")));
        }
        if text == "/" || !text.contains('/') {
            return Ok(Token::Symbol(text));
        }

        let mut parts = text.splitn(2, '/');
        let ns = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if ns.is_empty() || name.is_empty() || name.contains('/') {
            return Err(self.error_at(start, format!("malformed namespaced symbol: {text}")));
        }
        Ok(Token::NsSymbol {
            ns: ns.to_string(),
            name: name.to_string(),
        })
    }

    fn read_dispatch(&mut self, start: Position) -> Result<Token, ParseError> {
        match self.peek_ahead(1) {
            '(' => {
                self.advance();
                self.advance();
                Ok(Token::FnOpen)
            }
            '#' => {
                let text = self.read_word();
                special_float(&text)
                    .map(|x| Token::Number(Number::Float(x)))
                    .ok_or_else(|| self.error_at(start, format!("unsupported literal: {text}")))
            }
            '{' => Err(self.error_at(start, "set literals are not supported")),
            other => Err(self.error_at(start, format!("unsupported dispatch syntax: #{other}"))),
        }
    }

    // ========================================================================
    // Main Tokenization
    // ========================================================================

    pub fn next_token(&mut self) -> Result<(Token, Position), ParseError> {
        self.skip_whitespace();
        let start = self.here();

        if self.is_eof() {
            return Ok((Token::Eof, start));
        }

        let ch = self.current_char();
        let single = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok((token, start));
        }

        let token = match ch {
            '"' => self.read_string(start)?,
            ':' => self.read_keyword(start)?,
            '#' => self.read_dispatch(start)?,
            ch if ch.is_ascii_digit() => self.read_number(start)?,
            '-' | '+' if self.peek_ahead(1).is_ascii_digit() => self.read_number(start)?,
            ch if Self::is_symbol_char(ch) => self.read_symbol(start)?,
            other => return Err(self.error_at(start, format!("unexpected character '{other}'"))),
        };
        Ok((token, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let (token, _) = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_namespaced_symbol_is_one_token() {
        assert_eq!(
            tokens("ctx/items"),
            vec![Token::NsSymbol {
                ns: "ctx".to_string(),
                name: "items".to_string()
            }]
        );
        assert_eq!(tokens("/"), vec![Token::Symbol("/".to_string())]);
    }

    #[test]
    fn test_special_floats() {
        match &tokens("-Infinity")[..] {
            [Token::Number(Number::Float(x))] => assert_eq!(*x, f64::NEG_INFINITY),
            other => panic!("unexpected tokens {other:?}"),
        }
        assert!(matches!(&tokens("##NaN")[..], [Token::Number(n)] if n.is_nan()));
    }

    #[test]
    fn test_namespaced_keyword_rejected() {
        let mut lexer = Lexer::new(":a/b");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_positions_track_lines() {
        let mut lexer = Lexer::new("(a\n  \"unterminated");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn test_commas_and_comments_are_whitespace() {
        assert_eq!(
            tokens("[1, 2] ; trailing"),
            vec![
                Token::LBracket,
                Token::Number(Number::Int(1)),
                Token::Number(Number::Int(2)),
                Token::RBracket
            ]
        );
    }
}

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/*
The scanner's job is to scan source code as a sequence of characters and group sequences of
characters together into lexemes. Each lexeme is then packaged into a token for the parser.

Tokens carry three things: a tag naming what kind of lexeme it is, an optional decoded value
(the payload a number/string/boolean/identifier token carries), and the byte offset into the
source where the lexeme started. Punctuation tokens carry no value.
*/

pub static KEYWORDS: Lazy<HashMap<&'static str, TokenTag>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("function", TokenTag::Function);
    m.insert("return", TokenTag::Return);
    m.insert("if", TokenTag::If);
    m.insert("else", TokenTag::Else);
    m.insert("while", TokenTag::While);
    m.insert("for", TokenTag::For);
    m.insert("break", TokenTag::Break);
    m.insert("continue", TokenTag::Continue);
    m.insert("print", TokenTag::Print);
    m.insert("import", TokenTag::Import);
    m.insert("external", TokenTag::External);
    m.insert("input", TokenTag::Input);
    m.insert("exit", TokenTag::Exit);
    m.insert("assert", TokenTag::Assert);
    m.insert("true", TokenTag::True);
    m.insert("false", TokenTag::False);
    m.insert("null", TokenTag::Null);
    // textual alternates for the symbolic logical operators
    m.insert("and", TokenTag::AndAnd);
    m.insert("or", TokenTag::OrOr);
    m.insert("not", TokenTag::Bang);
    m
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenTag {
    // literals
    Number,
    String,
    Identifier,
    True,
    False,
    Null,

    // keywords
    Function,
    Return,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Print,
    Import,
    External,
    Input,
    Exit,
    Assert,

    // single character tokens
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Dot,
    Comma,
    SemiColon,
    Colon,

    // one or two character tokens
    Equal,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,

    Eof,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/*
A value is only non-absent for number, string, boolean, and identifier tokens; every other
tag carries `Nil`. Integers and floats are kept distinct so the evaluator can preserve exact
integers the way the data model specifies ("exact-integer preservation for integer literals").
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Identifier(String),
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tag: TokenTag,
    pub value: Literal,
    pub position: usize,
}

impl Token {
    pub fn new(tag: TokenTag, value: Literal, position: usize) -> Self {
        Self { tag, value, position }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {:?} @{}", self.tag, self.value, self.position)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Syntax error: illegal character {character:?} at position {position}")]
pub struct ScanError {
    pub character: String,
    pub position: usize,
}

/*
The scanner walks the source left to right. At each offset it tries a fixed set of patterns,
in priority order, and the first one that matches wins. Keywords are recognized before the
general identifier rule so `if`, `while`, etc. become their own tags instead of `Identifier`.
*/
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.tokens.push(Token::new(TokenTag::Eof, Literal::Nil, self.current));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), ScanError> {
        let ch = self.advance();
        match ch {
            '(' => self.add_token(TokenTag::LeftParen),
            ')' => self.add_token(TokenTag::RightParen),
            '{' => self.add_token(TokenTag::LeftBrace),
            '}' => self.add_token(TokenTag::RightBrace),
            '[' => self.add_token(TokenTag::LeftBracket),
            ']' => self.add_token(TokenTag::RightBracket),
            ',' => self.add_token(TokenTag::Comma),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.leading_dot_number();
                } else {
                    self.add_token(TokenTag::Dot);
                }
            }
            ':' => self.add_token(TokenTag::Colon),
            ';' => self.add_token(TokenTag::SemiColon),
            '+' => self.add_token(TokenTag::Plus),
            '-' => self.add_token(TokenTag::Minus),
            '*' => self.add_token(TokenTag::Star),
            '%' => self.add_token(TokenTag::Percent),
            '!' => {
                let tag = if self.match_char('=') { TokenTag::BangEqual } else { TokenTag::Bang };
                self.add_token(tag);
            }
            '=' => {
                let tag = if self.match_char('=') { TokenTag::EqualEqual } else { TokenTag::Equal };
                self.add_token(tag);
            }
            '<' => {
                let tag = if self.match_char('=') { TokenTag::LessEqual } else { TokenTag::Less };
                self.add_token(tag);
            }
            '>' => {
                let tag = if self.match_char('=') { TokenTag::GreaterEqual } else { TokenTag::Greater };
                self.add_token(tag);
            }
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenTag::AndAnd);
                } else {
                    return Err(self.error("&"));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenTag::OrOr);
                } else {
                    return Err(self.error("|"));
                }
            }
            '/' => {
                if self.match_char('/') {
                    // a line comment runs to the end of the line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenTag::Slash);
                }
            }
            c if c.is_whitespace() => {}
            '"' => self.string()?,
            c => {
                if c.is_ascii_digit() {
                    self.number();
                } else if is_identifier_start(c) {
                    self.identifier();
                } else {
                    return Err(self.error(&c.to_string()));
                }
            }
        }
        Ok(())
    }

    fn error(&self, text: &str) -> ScanError {
        ScanError { character: text.to_string(), position: self.start }
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.current..].chars().next().unwrap();
        self.current += ch.len_utf8();
        ch
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current..].chars().next().unwrap()
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.current += expected.len_utf8();
        true
    }

    fn string(&mut self) -> Result<(), ScanError> {
        // an embedded `""` is a literal `"`; only a lone, unmatched `"` closes the string
        loop {
            if self.is_at_end() {
                return Err(ScanError {
                    character: "\"".to_string(),
                    position: self.start,
                });
            }
            if self.peek() == '"' {
                if self.peek_next() == '"' {
                    self.advance();
                    self.advance();
                    continue;
                }
                break;
            }
            self.advance();
        }
        self.advance(); // closing quote
        let raw = &self.source[self.start + 1..self.current - 1];
        let decoded = raw.replace("\"\"", "\"");
        self.add_token_with_value(TokenTag::String, Literal::Str(decoded));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == '.' {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = &self.source[self.start..self.current];
        if is_float {
            let value: f64 = text.parse().unwrap();
            self.add_token_with_value(TokenTag::Number, Literal::Float(value));
        } else {
            let value: i64 = text.parse().unwrap();
            self.add_token_with_value(TokenTag::Number, Literal::Integer(value));
        }
    }

    /// A number that starts with `.` (the leading digit was already consumed as the `.` itself).
    fn leading_dot_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let text = &self.source[self.start..self.current];
        let value: f64 = text.parse().unwrap();
        self.add_token_with_value(TokenTag::Number, Literal::Float(value));
    }

    fn identifier(&mut self) {
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
        let text = &self.source[self.start..self.current];
        match KEYWORDS.get(text) {
            Some(TokenTag::True) => self.add_token_with_value(TokenTag::True, Literal::Bool(true)),
            Some(TokenTag::False) => self.add_token_with_value(TokenTag::False, Literal::Bool(false)),
            Some(&tag) => self.add_token(tag),
            None => self.add_token_with_value(TokenTag::Identifier, Literal::Identifier(text.to_string())),
        }
    }

    fn add_token(&mut self, tag: TokenTag) {
        self.add_token_with_value(tag, Literal::Nil);
    }

    fn add_token_with_value(&mut self, tag: TokenTag, value: Literal) {
        self.tokens.push(Token::new(tag, value, self.start));
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize a complete source string, consuming it into an ordered token list ending in `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    Scanner::new(source).scan_tokens()
}

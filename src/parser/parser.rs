use crate::lexer::{Literal, Token, TokenTag};
use crate::parser::ast::{BinaryOp, Expr, Program, Stmt};

/*
A hand-written recursive-descent parser. Precedence, loosest to tightest:

    expression     = assignment
    assignment     = logical_or [ "=" assignment ]              (right-associative)
    logical_or     = logical_and { "||" logical_and }
    logical_and    = relational  { "&&" relational }
    relational     = additive    { ("<"|">"|"<="|">="|"=="|"!=") additive }
    additive       = multiplicative { ("+"|"-") multiplicative }
    multiplicative = complex { ("*"|"/") complex }
    complex        = simple { "[" expression "]" | "." identifier | "(" [args] ")" }
    simple         = identifier | number | string | boolean | null
                   | list | object | function
                   | "-" simple | "!" simple
                   | "(" expression ")"

All binary-operator rules are left-associative; assignment is right-associative, so
`a = b = 4` parses as `a = (b = 4)`.
*/

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Parse error at position {position}: expected {expected}, found {found}")]
pub struct ParseError {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(mut self) -> PResult<Program> {
        let statements = self.statements_until_eof()?;
        Ok(Program { statements })
    }

    fn statements_until_eof(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            while self.check(TokenTag::SemiColon) {
                self.advance();
            }
            if self.check(TokenTag::Eof) {
                return Ok(statements);
            }
            let stmt = self.statement()?;
            let block_terminated = is_block_terminated(&stmt);
            statements.push(stmt);
            if block_terminated {
                continue;
            }
            if !self.check(TokenTag::SemiColon) && !self.check(TokenTag::Eof) {
                return Err(self.error("';' or end of input"));
            }
        }
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.consume(TokenTag::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        loop {
            if self.check(TokenTag::RightBrace) {
                self.advance();
                return Ok(statements);
            }
            if self.check(TokenTag::SemiColon) {
                self.advance();
                continue;
            }
            let stmt = self.statement()?;
            let block_terminated = is_block_terminated(&stmt);
            statements.push(stmt);
            if block_terminated {
                continue;
            }
            if !self.check(TokenTag::SemiColon) && !self.check(TokenTag::RightBrace) {
                return Err(self.error("';' or '}'"));
            }
        }
    }

    fn statement(&mut self) -> PResult<Stmt> {
        match self.peek().tag {
            TokenTag::If => self.if_statement(),
            TokenTag::While => self.while_statement(),
            TokenTag::Function => self.function_statement(),
            TokenTag::Return => self.return_statement(),
            TokenTag::Print => self.print_statement(),
            TokenTag::Exit => self.exit_statement(),
            TokenTag::Import => self.import_statement(),
            TokenTag::Break => {
                self.advance();
                Ok(Stmt::Break)
            }
            TokenTag::Continue => {
                self.advance();
                Ok(Stmt::Continue)
            }
            TokenTag::Assert => self.assert_statement(),
            _ => Ok(Stmt::Expression(self.expression()?)),
        }
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'if'
        self.consume(TokenTag::LeftParen, "'('")?;
        let condition = self.expression()?;
        self.consume(TokenTag::RightParen, "')'")?;
        let then_branch = self.block()?;
        let else_branch = if self.check(TokenTag::Else) {
            self.advance();
            if self.check(TokenTag::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'while'
        self.consume(TokenTag::LeftParen, "'('")?;
        let condition = self.expression()?;
        self.consume(TokenTag::RightParen, "')'")?;
        let body = self.block()?;
        Ok(Stmt::While { condition, body })
    }

    /// `function NAME (params) body` is sugar for `NAME = function(params) body`.
    fn function_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'function'
        let name = self.identifier_name()?;
        let (parameters, body) = self.function_tail()?;
        let value = Expr::Function { parameters, body };
        Ok(Stmt::Expression(Expr::Assign {
            target: Box::new(Expr::Identifier(name)),
            value: Box::new(value),
        }))
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'return'
        if self.at_statement_boundary() {
            Ok(Stmt::Return(None))
        } else {
            Ok(Stmt::Return(Some(self.expression()?)))
        }
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'print'
        if self.at_statement_boundary() {
            Ok(Stmt::Print(None))
        } else {
            Ok(Stmt::Print(Some(self.expression()?)))
        }
    }

    fn exit_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'exit'
        if self.at_statement_boundary() {
            Ok(Stmt::Exit(None))
        } else {
            Ok(Stmt::Exit(Some(self.expression()?)))
        }
    }

    fn import_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'import'
        Ok(Stmt::Import(self.expression()?))
    }

    fn assert_statement(&mut self) -> PResult<Stmt> {
        self.advance(); // 'assert'
        let condition = self.expression()?;
        let explanation = if self.check(TokenTag::Comma) {
            self.advance();
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Stmt::Assert { condition, explanation })
    }

    fn at_statement_boundary(&self) -> bool {
        matches!(self.peek().tag, TokenTag::RightBrace | TokenTag::SemiColon | TokenTag::Eof)
    }

    // ---- expressions ----

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let target = self.logical_or()?;
        if self.check(TokenTag::Equal) {
            self.advance();
            let value = self.assignment()?;
            return Ok(Expr::Assign { target: Box::new(target), value: Box::new(value) });
        }
        Ok(target)
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        let mut node = self.logical_and()?;
        while self.check(TokenTag::OrOr) {
            self.advance();
            let right = self.logical_and()?;
            node = Expr::Binary { op: BinaryOp::Or, left: Box::new(node), right: Box::new(right) };
        }
        Ok(node)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        let mut node = self.relational()?;
        while self.check(TokenTag::AndAnd) {
            self.advance();
            let right = self.relational()?;
            node = Expr::Binary { op: BinaryOp::And, left: Box::new(node), right: Box::new(right) };
        }
        Ok(node)
    }

    fn relational(&mut self) -> PResult<Expr> {
        let mut node = self.additive()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Less => BinaryOp::Less,
                TokenTag::Greater => BinaryOp::Greater,
                TokenTag::LessEqual => BinaryOp::LessEqual,
                TokenTag::GreaterEqual => BinaryOp::GreaterEqual,
                TokenTag::EqualEqual => BinaryOp::Equal,
                TokenTag::BangEqual => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            node = Expr::Binary { op, left: Box::new(node), right: Box::new(right) };
        }
        Ok(node)
    }

    fn additive(&mut self) -> PResult<Expr> {
        let mut node = self.multiplicative()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Plus => BinaryOp::Add,
                TokenTag::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            node = Expr::Binary { op, left: Box::new(node), right: Box::new(right) };
        }
        Ok(node)
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        let mut node = self.complex_expression()?;
        loop {
            let op = match self.peek().tag {
                TokenTag::Star => BinaryOp::Mul,
                TokenTag::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.complex_expression()?;
            node = Expr::Binary { op, left: Box::new(node), right: Box::new(right) };
        }
        Ok(node)
    }

    fn complex_expression(&mut self) -> PResult<Expr> {
        let mut node = self.simple_expression()?;
        loop {
            match self.peek().tag {
                TokenTag::LeftBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.consume(TokenTag::RightBracket, "']'")?;
                    node = Expr::Index { base: Box::new(node), index: Box::new(index) };
                }
                TokenTag::Dot => {
                    self.advance();
                    let name = self.identifier_name()?;
                    node = Expr::Index { base: Box::new(node), index: Box::new(Expr::Str(name)) };
                }
                TokenTag::LeftParen => {
                    self.advance();
                    let mut arguments = Vec::new();
                    if !self.check(TokenTag::RightParen) {
                        arguments.push(self.expression()?);
                        while self.check(TokenTag::Comma) {
                            self.advance();
                            if self.check(TokenTag::RightParen) {
                                break; // trailing comma
                            }
                            arguments.push(self.expression()?);
                        }
                    }
                    self.consume(TokenTag::RightParen, "')'")?;
                    node = Expr::Call { function: Box::new(node), arguments };
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn simple_expression(&mut self) -> PResult<Expr> {
        let token = self.peek().clone();
        match token.tag {
            TokenTag::Identifier => {
                self.advance();
                match token.value {
                    Literal::Identifier(name) => Ok(Expr::Identifier(name)),
                    _ => unreachable!("identifier token without identifier value"),
                }
            }
            TokenTag::True | TokenTag::False => {
                self.advance();
                match token.value {
                    Literal::Bool(b) => Ok(Expr::Bool(b)),
                    _ => unreachable!("boolean token without boolean value"),
                }
            }
            TokenTag::Number => {
                self.advance();
                match token.value {
                    Literal::Integer(n) => Ok(Expr::Integer(n)),
                    Literal::Float(n) => Ok(Expr::Number(n)),
                    _ => unreachable!("number token without numeric value"),
                }
            }
            TokenTag::String => {
                self.advance();
                match token.value {
                    Literal::Str(s) => Ok(Expr::Str(s)),
                    _ => unreachable!("string token without string value"),
                }
            }
            TokenTag::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenTag::LeftBracket => self.list_literal(),
            TokenTag::LeftBrace => self.object_literal(),
            TokenTag::Minus => {
                self.advance();
                Ok(Expr::Negate(Box::new(self.simple_expression()?)))
            }
            TokenTag::Bang => {
                self.advance();
                Ok(Expr::Not(Box::new(self.simple_expression()?)))
            }
            TokenTag::Function => {
                self.advance();
                let (parameters, body) = self.function_tail()?;
                Ok(Expr::Function { parameters, body })
            }
            TokenTag::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenTag::RightParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error("an expression")),
        }
    }

    fn list_literal(&mut self) -> PResult<Expr> {
        self.consume(TokenTag::LeftBracket, "'['")?;
        let mut items = Vec::new();
        if !self.check(TokenTag::RightBracket) {
            items.push(self.expression()?);
            while self.check(TokenTag::Comma) {
                self.advance();
                if self.check(TokenTag::RightBracket) {
                    break; // trailing comma
                }
                items.push(self.expression()?);
            }
        }
        self.consume(TokenTag::RightBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn object_literal(&mut self) -> PResult<Expr> {
        self.consume(TokenTag::LeftBrace, "'{'")?;
        let mut items = Vec::new();
        if !self.check(TokenTag::RightBrace) {
            items.push(self.object_entry()?);
            while self.check(TokenTag::Comma) {
                self.advance();
                if self.check(TokenTag::RightBrace) {
                    break; // trailing comma
                }
                items.push(self.object_entry()?);
            }
        }
        self.consume(TokenTag::RightBrace, "'}'")?;
        Ok(Expr::Object(items))
    }

    fn object_entry(&mut self) -> PResult<(Expr, Expr)> {
        let key = self.expression()?;
        self.consume(TokenTag::Colon, "':'")?;
        let value = self.expression()?;
        Ok((key, value))
    }

    /// Shared by the `function` expression and `function NAME(...)` sugar: `"(" [params] ")" block`.
    fn function_tail(&mut self) -> PResult<(Vec<Token>, Vec<Stmt>)> {
        self.consume(TokenTag::LeftParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.check(TokenTag::RightParen) {
            parameters.push(self.consume(TokenTag::Identifier, "identifier")?);
            while self.check(TokenTag::Comma) {
                self.advance();
                parameters.push(self.consume(TokenTag::Identifier, "identifier")?);
            }
        }
        self.consume(TokenTag::RightParen, "')'")?;
        let body = self.block()?;
        Ok((parameters, body))
    }

    fn identifier_name(&mut self) -> PResult<String> {
        let token = self.consume(TokenTag::Identifier, "identifier")?;
        match token.value {
            Literal::Identifier(name) => Ok(name),
            _ => unreachable!("identifier token without identifier value"),
        }
    }

    // ---- token cursor helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn check(&self, tag: TokenTag) -> bool {
        self.peek().tag == tag
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.check(TokenTag::Eof) {
            self.current += 1;
        }
        token
    }

    fn consume(&mut self, tag: TokenTag, expected: &str) -> PResult<Token> {
        if self.check(tag) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        ParseError {
            position: self.peek().position,
            expected: expected.to_string(),
            found: format!("{}", self.peek().tag),
        }
    }
}

fn is_block_terminated(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::If { .. } | Stmt::While { .. } => true,
        Stmt::Expression(Expr::Assign { value, .. }) => matches!(**value, Expr::Function { .. }),
        _ => false,
    }
}

/// Parse a complete token stream into a program.
pub fn parse(tokens: Vec<Token>) -> PResult<Program> {
    Parser::new(tokens).parse()
}

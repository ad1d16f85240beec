//! Recursive descent parser for script modules.
//!
//! ```text
//! module     := statement*
//! statement  := "import" STRING ";"
//!             | "import" "{" binding ("," binding)* "}" "from" STRING ";"
//!             | "export" "let" IDENT "=" expr ";"
//!             | "export" "{" spec ("," spec)* "}" ";"
//!             | "let" IDENT "=" expr ";"
//!             | IDENT "=" expr ";"
//!             | expr ";"
//! expr       := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := "-" unary | call
//! call       := primary ("(" args? ")")*
//! primary    := NUMBER | STRING | "true" | "false" | "null" | IDENT | "(" expr ")"
//! ```

use crate::ast::*;
use crate::error::ScriptError;
use crate::lexer::{tokenize, Span, Token};

/// Parse a whole source text into a module
pub fn parse(source: &str) -> Result<Module, ScriptError> {
    Parser::new(source)?.parse_module()
}

pub struct Parser {
    /// Pre-tokenized input
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Position reported for errors at end of input
    eof_span: Span,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ScriptError> {
        let tokens = tokenize(source)?;

        let (line, column) = source
            .lines()
            .enumerate()
            .last()
            .map(|(i, last)| (i as u32 + 1, last.chars().count() as u32 + 1))
            .unwrap_or((1, 1));

        Ok(Self {
            tokens,
            pos: 0,
            eof_span: Span::new(source.len(), source.len(), line, column),
        })
    }

    pub fn parse_module(mut self) -> Result<Module, ScriptError> {
        let mut statements = Vec::new();
        while !self.at_eof() {
            statements.push(self.parse_statement()?);
        }
        Ok(Module { statements })
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or(self.eof_span)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, expected: &Token) -> bool {
        self.current() == Some(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Span, ScriptError> {
        let span = self.current_span();
        if self.eat(&expected) {
            Ok(span)
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), ScriptError> {
        let span = self.current_span();
        match self.current() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_string(&mut self) -> Result<String, ScriptError> {
        match self.current() {
            Some(Token::StringLiteral(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("a module specifier string")),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        let span = self.current_span();
        let found = match self.current() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };
        ScriptError::Parse {
            line: span.line,
            column: span.column,
            message: format!("expected {}, found {}", expected, found),
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Result<Statement, ScriptError> {
        match self.current() {
            Some(Token::Import) => self.parse_import(),
            Some(Token::Export) => self.parse_export(),
            Some(Token::Let) => {
                self.advance();
                self.parse_let(false)
            }
            Some(Token::Identifier(_)) if self.peek() == Some(&Token::Equal) => self.parse_assign(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Expression(expr))
            }
        }
    }

    fn parse_import(&mut self) -> Result<Statement, ScriptError> {
        let span = self.expect(Token::Import)?;

        let mut bindings = Vec::new();
        if self.eat(&Token::LeftBrace) {
            loop {
                let (imported, binding_span) = self.expect_identifier()?;
                let local = if self.eat(&Token::As) {
                    self.expect_identifier()?.0
                } else {
                    imported.clone()
                };
                bindings.push(ImportBinding {
                    imported,
                    local,
                    span: binding_span,
                });

                if !self.eat(&Token::Comma) || self.check(&Token::RightBrace) {
                    break;
                }
            }
            self.expect(Token::RightBrace)?;
            self.expect(Token::From)?;
        }

        let specifier = self.expect_string()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Import(ImportDecl {
            specifier,
            bindings,
            span,
        }))
    }

    fn parse_export(&mut self) -> Result<Statement, ScriptError> {
        self.expect(Token::Export)?;

        if self.eat(&Token::Let) {
            return self.parse_let(true);
        }

        self.expect(Token::LeftBrace)?;
        let mut specifiers = Vec::new();
        while !self.check(&Token::RightBrace) {
            let (local, span) = self.expect_identifier()?;
            let exported = if self.eat(&Token::As) {
                self.expect_identifier()?.0
            } else {
                local.clone()
            };
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span,
            });

            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightBrace)?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::ExportList(specifiers))
    }

    /// `IDENT "=" expr ";"`, after `let`
    fn parse_let(&mut self, exported: bool) -> Result<Statement, ScriptError> {
        let (name, span) = self.expect_identifier()?;
        self.expect(Token::Equal)?;
        let init = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Let {
            name,
            init,
            exported,
            span,
        })
    }

    fn parse_assign(&mut self) -> Result<Statement, ScriptError> {
        let (name, span) = self.expect_identifier()?;
        self.expect(Token::Equal)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Assign { name, value, span })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Result<Expression, ScriptError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expression, ScriptError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ScriptError> {
        if self.eat(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Negate(Box::new(operand)));
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expression, ScriptError> {
        let mut expr = self.parse_primary()?;

        while self.check(&Token::LeftParen) {
            let span = self.current_span();
            self.advance();

            let mut args = Vec::new();
            while !self.check(&Token::RightParen) {
                args.push(self.parse_expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;

            expr = Expression::Call {
                callee: Box::new(expr),
                args,
                span,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ScriptError> {
        let span = self.current_span();
        let expr = match self.current() {
            Some(Token::Number(n)) => Expression::Number(*n),
            Some(Token::StringLiteral(s)) => Expression::String(s.clone()),
            Some(Token::True) => Expression::Bool(true),
            Some(Token::False) => Expression::Bool(false),
            Some(Token::Null) => Expression::Null,
            Some(Token::Identifier(name)) => Expression::Identifier {
                name: name.clone(),
                span,
            },
            Some(Token::LeftParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(expr)
    }
}

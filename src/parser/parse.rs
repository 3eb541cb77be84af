//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the body parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: Parsing statements (declarations, if, while, for, etc.)
//! - `expressions`: Parsing expressions with one method per precedence level
//!
//! The parser only ever sees the text of one function body; function headers
//! are recognised textually by [`crate::parser::extract`]. Scope is tracked by
//! the token stream, so braces inside character literals cannot unbalance a
//! body once it has been extracted.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {}, column {}: {message}", location.line, location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for function bodies
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_origin(source, SourceLocation::new(1, 1))
    }

    /// Create a parser for body text that starts at `origin` in the user's
    /// source.
    pub fn with_origin(source: &str, origin: SourceLocation) -> Result<Self, ParseError> {
        let mut lexer = Lexer::with_origin(source, origin);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a whole function body (the text between its braces)
    pub fn parse_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::RBrace) {
                return Err(ParseError {
                    message: "Unexpected '}' in function body".to_string(),
                    location: self.current_location(),
                });
            }
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    // ===== Helper methods =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Long
                | TokenKind::Short
                | TokenKind::Char
                | TokenKind::Bool
                | TokenKind::Unsigned
                | TokenKind::Const
        )
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Compares by variant, so `Number(0.0)` matches any number
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: &TokenKind,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::LParen, &format!("Expected '(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::RParen, &format!("Expected ')' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::RBrace, &format!("Expected '}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::Semicolon, &format!("Expected ';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError {
                message: format!("Expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_body() {
        let mut parser = Parser::new("int x = 1 + 2 * 3; motor(x, x);").unwrap();
        let body = parser.parse_body().unwrap();

        assert_eq!(body.len(), 2);
        match &body[0] {
            Stmt::Declaration {
                decl_type,
                declarators,
                ..
            } => {
                assert_eq!(decl_type.base, PrimitiveType::Int);
                assert_eq!(declarators[0].name, "x");
                assert!(matches!(
                    declarators[0].init,
                    Some(Expr::Binary { op: BinOp::Add, .. })
                ));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_body() {
        let mut parser = Parser::new("  \n ").unwrap();
        assert!(parser.parse_body().unwrap().is_empty());
    }

    #[test]
    fn test_stray_closing_brace() {
        let mut parser = Parser::new("x = 1; }").unwrap();
        let err = parser.parse_body().unwrap_err();
        assert!(err.message.contains("Unexpected '}'"));
    }

    #[test]
    fn test_error_location_uses_origin() {
        let mut parser = Parser::with_origin("\nx = ;", SourceLocation::new(3, 20)).unwrap();
        let err = parser.parse_body().unwrap_err();
        assert_eq!(err.location.line, 4);
    }
}

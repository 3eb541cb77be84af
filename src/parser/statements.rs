//! Statement parsing implementation
//!
//! This module handles parsing of the statement forms accepted in robot
//! control functions:
//!
//! - Variable declarations: `int x = 42;`, `const unsigned int a = 1, b;`
//! - Control flow: `if`, `while`, `for`, `do-while`
//! - Jump statements: `return`, `break`, `continue`
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | if_stmt | while_stmt | for_stmt
//!             | do_while_stmt | return_stmt | break_stmt
//!             | continue_stmt | block | expr_stmt | ';'
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse block statements (inside braces, excluding the braces themselves)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.current_location();

        if self.match_token(&TokenKind::Return) {
            return self.parse_return_statement();
        }

        if self.match_token(&TokenKind::If) {
            return self.parse_if_statement();
        }

        if self.match_token(&TokenKind::While) {
            return self.parse_while_statement();
        }

        if self.match_token(&TokenKind::Do) {
            return self.parse_do_while_statement();
        }

        if self.match_token(&TokenKind::For) {
            return self.parse_for_statement();
        }

        if self.match_token(&TokenKind::Break) {
            self.expect_semicolon("after 'break'")?;
            return Ok(Stmt::Break { location: loc });
        }

        if self.match_token(&TokenKind::Continue) {
            self.expect_semicolon("after 'continue'")?;
            return Ok(Stmt::Continue { location: loc });
        }

        if self.match_token(&TokenKind::LBrace) {
            let statements = self.parse_block_statements()?;
            self.expect_rbrace("after block")?;
            return Ok(Stmt::Block {
                statements,
                location: loc,
            });
        }

        // Empty statement
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(Stmt::Block {
                statements: Vec::new(),
                location: loc,
            });
        }

        if self.is_type_keyword() {
            return self.parse_variable_declaration();
        }

        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Stmt::Expression {
            expr,
            location: loc,
        })
    }

    /// Parse `[const] [unsigned] type name [= init] {, name [= init]} ;`
    pub(crate) fn parse_variable_declaration(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.current_location();
        let decl_type = self.parse_decl_type()?;

        let mut declarators = Vec::new();
        loop {
            let name_loc = self.current_location();
            if self.check(&TokenKind::Star) {
                return Err(ParseError {
                    message: "Pointer declarations are not supported".to_string(),
                    location: name_loc,
                });
            }
            let name = self.expect_identifier()?;
            if self.check(&TokenKind::LBracket) {
                return Err(ParseError {
                    message: format!("Array declaration '{}[]' is not supported", name),
                    location: self.current_location(),
                });
            }

            let init = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };

            declarators.push(Declarator {
                name,
                init,
                location: name_loc,
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_semicolon("after declaration")?;

        Ok(Stmt::Declaration {
            decl_type,
            declarators,
            location: loc,
        })
    }

    /// Parse the qualifier and primitive-type keywords of a declaration.
    ///
    /// Qualifiers may appear in any order; multi-keyword types such as
    /// `long int` or `unsigned long long` collapse to their first base
    /// keyword, and a bare `unsigned` means `unsigned int`.
    fn parse_decl_type(&mut self) -> Result<DeclType, ParseError> {
        let loc = self.current_location();
        let mut is_const = false;
        let mut is_unsigned = false;
        let mut base = None;

        loop {
            let next = match self.peek().kind {
                TokenKind::Const => {
                    is_const = true;
                    None
                }
                TokenKind::Unsigned => {
                    is_unsigned = true;
                    None
                }
                TokenKind::Int => Some(PrimitiveType::Int),
                TokenKind::Float => Some(PrimitiveType::Float),
                TokenKind::Double => Some(PrimitiveType::Double),
                TokenKind::Long => Some(PrimitiveType::Long),
                TokenKind::Short => Some(PrimitiveType::Short),
                TokenKind::Char => Some(PrimitiveType::Char),
                TokenKind::Bool => Some(PrimitiveType::Bool),
                _ => break,
            };
            if let Some(ty) = next {
                base.get_or_insert(ty);
            }
            self.advance();
        }

        let base = match base {
            Some(base) => base,
            None if is_unsigned => PrimitiveType::Int,
            None => {
                return Err(ParseError {
                    message: format!("Expected type after 'const', found {}", self.peek()),
                    location: loc,
                });
            }
        };

        Ok(DeclType {
            base,
            is_unsigned,
            is_const,
        })
    }

    /// Parse a statement; a braced block is flattened into its statements
    pub(crate) fn parse_statement_or_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.match_token(&TokenKind::LBrace) {
            let statements = self.parse_block_statements()?;
            self.expect_rbrace("after block")?;
            Ok(statements)
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.previous_location();

        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_semicolon("after return")?;

        Ok(Stmt::Return {
            expr,
            location: loc,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after if condition")?;

        let then_branch = self.parse_statement_or_block()?;

        let else_branch = if self.match_token(&TokenKind::Else) {
            Some(self.parse_statement_or_block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after while condition")?;

        let body = self.parse_statement_or_block()?;

        Ok(Stmt::While {
            condition,
            body,
            location: loc,
        })
    }

    fn parse_do_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.previous_location();

        let body = self.parse_statement_or_block()?;

        self.expect_token(
            &TokenKind::While,
            "Expected 'while' after do body",
        )?;
        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after do-while condition")?;
        self.expect_semicolon("after do-while")?;

        Ok(Stmt::DoWhile {
            body,
            condition,
            location: loc,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'for'")?;

        // Init (optional)
        let init = if self.match_token(&TokenKind::Semicolon) {
            None
        } else if self.is_type_keyword() {
            // Declaration consumes its own semicolon
            Some(Box::new(self.parse_variable_declaration()?))
        } else {
            let init_loc = self.current_location();
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for init")?;
            Some(Box::new(Stmt::Expression {
                expr,
                location: init_loc,
            }))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after for condition")?;

        let increment = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_rparen("after for clauses")?;

        let body = self.parse_statement_or_block()?;

        Ok(Stmt::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse(source: &str) -> Vec<Stmt> {
        Parser::new(source).unwrap().parse_body().unwrap()
    }

    #[test]
    fn test_const_unsigned_declaration() {
        let body = parse("const unsigned int limit = 10, other;");

        match &body[0] {
            Stmt::Declaration {
                decl_type,
                declarators,
                ..
            } => {
                assert!(decl_type.is_const);
                assert!(decl_type.is_unsigned);
                assert_eq!(decl_type.base, PrimitiveType::Int);
                assert_eq!(declarators.len(), 2);
                assert!(declarators[1].init.is_none());
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_while_true_loop() {
        let body = parse("while (TRUE) { motor(40, 40); }");

        match &body[0] {
            Stmt::While {
                condition, body, ..
            } => {
                assert!(condition.is_variable("TRUE"));
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let body = parse("if (a < 1) x = 1; else if (a < 2) x = 2; else { x = 3; }");

        match &body[0] {
            Stmt::If { else_branch, .. } => {
                let else_branch = else_branch.as_ref().unwrap();
                assert!(matches!(else_branch[0], Stmt::If { .. }));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_declaration() {
        let body = parse("for (int i = 0; i < 3; i++) { }");

        match &body[0] {
            Stmt::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                assert!(matches!(init.as_deref(), Some(Stmt::Declaration { .. })));
                assert!(condition.is_some());
                assert!(increment.is_some());
                assert!(body.is_empty());
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_do_while() {
        let body = parse("do { n--; } while (n > 0);");
        assert!(matches!(body[0], Stmt::DoWhile { .. }));
    }

    #[test]
    fn test_pointer_declaration_rejected() {
        let err = Parser::new("int *p;").unwrap().parse_body().unwrap_err();
        assert!(err.message.contains("Pointer"));
    }
}

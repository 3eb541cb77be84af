//! Expression parsing implementation
//!
//! This module handles parsing of expressions with one recursive-descent
//! method per C precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, hex, characters
//! - Identifiers
//! - Binary operators: arithmetic, comparison, logical, bitwise
//! - Unary operators: `-`, `+`, `!`, `~`, `++`, `--`
//! - Postfix: `[]`, `()`, `++`, `--`
//! - Ternary: `? :`
//! - Assignment: `=`, `+=`, `-=`, `*=`, `/=`, `%=`
//!
//! Casts are not parsed: upper-case casts are stripped by the normalizer and
//! any other `(type)` prefix is reported as an error.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment_expression()
    }

    /// Parse assignment or ternary (right-associative)
    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_ternary()?;

        let loc = self.current_location();
        let op = if self.match_token(&TokenKind::Eq) {
            AssignOp::Assign
        } else if self.match_token(&TokenKind::PlusEq) {
            AssignOp::Compound(BinOp::Add)
        } else if self.match_token(&TokenKind::MinusEq) {
            AssignOp::Compound(BinOp::Sub)
        } else if self.match_token(&TokenKind::StarEq) {
            AssignOp::Compound(BinOp::Mul)
        } else if self.match_token(&TokenKind::SlashEq) {
            AssignOp::Compound(BinOp::Div)
        } else if self.match_token(&TokenKind::PercentEq) {
            AssignOp::Compound(BinOp::Mod)
        } else {
            return Ok(expr);
        };

        let value = Box::new(self.parse_assignment_expression()?);
        Ok(Expr::Assign {
            op,
            target: Box::new(expr),
            value,
            location: loc,
        })
    }

    /// Parse ternary: condition ? then_expr : else_expr
    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_logical_or()?;

        if self.match_token(&TokenKind::Question) {
            let loc = self.previous_location();
            let then_expr = Box::new(self.parse_expression()?);
            self.expect_token(
                &TokenKind::Colon,
                "Expected ':' in ternary expression",
            )?;
            let else_expr = Box::new(self.parse_ternary()?);

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_expr,
                else_expr,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Shared loop for the left-associative binary levels.
    ///
    /// `ops` maps each accepted token (compared by discriminant) to its
    /// operator; `next` parses the operands at the next-tighter level.
    fn parse_binary_level(
        &mut self,
        ops: &[(TokenKind, BinOp)],
        next: fn(&mut Parser) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        'outer: loop {
            let loc = self.current_location();
            for (kind, op) in ops {
                if self.match_token(kind) {
                    let right = Box::new(next(self)?);
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right,
                        location: loc,
                    };
                    continue 'outer;
                }
            }
            break;
        }

        Ok(left)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::OrOr, BinOp::Or)], Parser::parse_logical_and)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::AndAnd, BinOp::And)], Parser::parse_bitwise_or)
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Pipe, BinOp::BitOr)], Parser::parse_bitwise_xor)
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Caret, BinOp::BitXor)], Parser::parse_bitwise_and)
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[(TokenKind::Amp, BinOp::BitAnd)], Parser::parse_equality)
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::Ne)],
            Parser::parse_relational,
        )
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Lt, BinOp::Lt),
                (TokenKind::Le, BinOp::Le),
                (TokenKind::Gt, BinOp::Gt),
                (TokenKind::Ge, BinOp::Ge),
            ],
            Parser::parse_shift,
        )
    }

    /// Parse bitwise shift (<< >>)
    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::LtLt, BinOp::BitShl), (TokenKind::GtGt, BinOp::BitShr)],
            Parser::parse_additive,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
            Parser::parse_multiplicative,
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                (TokenKind::Star, BinOp::Mul),
                (TokenKind::Slash, BinOp::Div),
                (TokenKind::Percent, BinOp::Mod),
            ],
            Parser::parse_unary,
        )
    }

    /// Parse unary (! ~ - + ++ --)
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        let op = if self.match_token(&TokenKind::Bang) {
            UnOp::Not
        } else if self.match_token(&TokenKind::Tilde) {
            UnOp::BitNot
        } else if self.match_token(&TokenKind::Minus) {
            UnOp::Neg
        } else if self.match_token(&TokenKind::PlusPlus) {
            UnOp::PreInc
        } else if self.match_token(&TokenKind::MinusMinus) {
            UnOp::PreDec
        } else if self.match_token(&TokenKind::Plus) {
            // Unary plus: just return the operand
            return self.parse_unary();
        } else {
            return self.parse_postfix();
        };

        let operand = Box::new(self.parse_unary()?);
        Ok(Expr::Unary {
            op,
            operand,
            location: loc,
        })
    }

    /// Parse postfix (++ -- [] ())
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.match_token(&TokenKind::PlusPlus) {
                expr = Expr::Unary {
                    op: UnOp::PostInc,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&TokenKind::MinusMinus) {
                expr = Expr::Unary {
                    op: UnOp::PostDec,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&TokenKind::LBracket) {
                let index = Box::new(self.parse_expression()?);
                self.expect_token(
                    &TokenKind::RBracket,
                    "Expected ']' after array index",
                )?;
                expr = Expr::Index {
                    array: Box::new(expr),
                    index,
                    location: loc,
                };
            } else if self.match_token(&TokenKind::LParen) {
                let args = self.parse_argument_list()?;
                self.expect_rparen("after function arguments")?;

                let (name, call_loc) = match expr {
                    Expr::Variable(n, l) => (n, l),
                    _ => {
                        return Err(ParseError {
                            message: "Function call must be on identifier".to_string(),
                            location: loc,
                        });
                    }
                };

                expr = Expr::Call {
                    callee: Callee::Named(name),
                    args,
                    location: call_loc,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list: (expr, expr, ...)
    fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_assignment_expression()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, identifiers, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n, loc))
            }
            TokenKind::CharLiteral(c) => {
                self.advance();
                Ok(Expr::Number(c as u32 as f64, loc))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Variable(name, loc))
            }
            TokenKind::LParen => {
                self.advance();
                if self.is_type_keyword() || self.check(&TokenKind::Void) {
                    return Err(ParseError {
                        message: format!("Type casts are not supported: ({} ...)", self.peek()),
                        location: loc,
                    });
                }
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            other => Err(ParseError {
                message: format!("Unexpected token: {}", other),
                location: loc,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> Expr {
        let body = Parser::new(&format!("{};", source))
            .unwrap()
            .parse_body()
            .unwrap();
        match body.into_iter().next() {
            Some(Stmt::Expression { expr, .. }) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match expr("1 + 2 * 3") {
            Expr::Binary {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. })),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_left_associative_subtraction() {
        // 8 - 4 - 2 parses as (8 - 4) - 2
        match expr("8 - 4 - 2") {
            Expr::Binary {
                op: BinOp::Sub,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(*right, Expr::Number(n, _) if n == 2.0));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_sensor_comparison() {
        match expr("gAD[CN2] < black && gAD[CN5] > white") {
            Expr::Binary {
                op: BinOp::And,
                left,
                ..
            } => match *left {
                Expr::Binary {
                    op: BinOp::Lt,
                    left,
                    ..
                } => assert!(matches!(*left, Expr::Index { .. })),
                other => panic!("Unexpected tree {:?}", other),
            },
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment_is_right_associative() {
        match expr("a = b += 2") {
            Expr::Assign {
                op: AssignOp::Assign,
                value,
                ..
            } => assert!(matches!(
                *value,
                Expr::Assign {
                    op: AssignOp::Compound(BinOp::Add),
                    ..
                }
            )),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_call_and_postfix() {
        match expr("turn(i++, -x)") {
            Expr::Call { callee, args, .. } => {
                assert_eq!(callee, Callee::Named("turn".to_string()));
                assert!(matches!(args[0], Expr::Unary { op: UnOp::PostInc, .. }));
                assert!(matches!(args[1], Expr::Unary { op: UnOp::Neg, .. }));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_ternary() {
        assert!(matches!(expr("a > 0 ? 1 : 2"), Expr::Ternary { .. }));
    }

    #[test]
    fn test_lowercase_cast_rejected() {
        let err = Parser::new("x = (int)y;").unwrap().parse_body().unwrap_err();
        assert!(err.message.contains("casts"));
    }
}

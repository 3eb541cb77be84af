//! Body transformer
//!
//! Lowers a parsed function body into suspension-aware IR:
//! - declarations become untyped bindings (`const` stays immutable)
//! - `while (TRUE)` becomes an unconditional [`Node::Loop`] whose body starts
//!   with a [`Node::Tick`], so every iteration hands control back once
//! - the statement `wait_ms(expr);` becomes [`Node::Wait`]
//! - calls to other user functions become [`Callee::Delegate`] and `motor`
//!   becomes [`Callee::Builtin`]
//!
//! Any other call name is left as [`Callee::Named`]; the assembler reports it.

use crate::compiler::errors::CompileError;
use crate::interpreter::constants::{ACTUATE_FN, TRUE_LITERAL, WAIT_FN};
use crate::parser::ast::*;
use crate::parser::extract::FunctionDefinition;
use crate::parser::parse::Parser;
use rustc_hash::FxHashSet;

/// A function after lowering
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Node>,
    pub location: SourceLocation,
}

/// Lowered statements
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Untyped binding; one per declarator
    Bind {
        name: String,
        mutable: bool,
        init: Option<Expr>,
        location: SourceLocation,
    },
    Expr {
        expr: Expr,
        location: SourceLocation,
    },
    /// Unconditional suspension point, one per infinite-loop iteration
    Tick { location: SourceLocation },
    /// Timed suspension point
    Wait {
        millis: Expr,
        location: SourceLocation,
    },
    If {
        condition: Expr,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
        location: SourceLocation,
    },
    /// Infinite loop; the body's first node is a `Tick`
    Loop {
        body: Vec<Node>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Vec<Node>,
        location: SourceLocation,
    },
    DoWhile {
        body: Vec<Node>,
        condition: Expr,
        location: SourceLocation,
    },
    For {
        init: Vec<Node>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Vec<Node>,
        location: SourceLocation,
    },
    Block {
        body: Vec<Node>,
        location: SourceLocation,
    },
    Break { location: SourceLocation },
    Continue { location: SourceLocation },
    Return {
        expr: Option<Expr>,
        location: SourceLocation,
    },
}

/// Lowers bodies with knowledge of which names are user subroutines
pub struct Transformer<'a> {
    subroutines: &'a FxHashSet<String>,
}

impl<'a> Transformer<'a> {
    pub fn new(subroutines: &'a FxHashSet<String>) -> Self {
        Self { subroutines }
    }

    /// Parse and lower one extracted function
    pub fn transform(&self, definition: &FunctionDefinition) -> Result<Function, CompileError> {
        let statements = Parser::with_origin(&definition.body, definition.body_origin)?
            .parse_body()?;

        Ok(Function {
            name: definition.name.clone(),
            params: definition.params.clone(),
            body: self.lower_all(statements)?,
            location: definition.location,
        })
    }

    fn lower_all(&self, statements: Vec<Stmt>) -> Result<Vec<Node>, CompileError> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            self.lower_into(stmt, &mut out)?;
        }
        Ok(out)
    }

    fn lower_into(&self, stmt: Stmt, out: &mut Vec<Node>) -> Result<(), CompileError> {
        match stmt {
            Stmt::Declaration {
                decl_type,
                declarators,
                ..
            } => {
                for declarator in declarators {
                    let init = declarator.init.map(|e| self.rewrite_expr(e)).transpose()?;
                    out.push(Node::Bind {
                        name: declarator.name,
                        mutable: !decl_type.is_const,
                        init,
                        location: declarator.location,
                    });
                }
            }

            Stmt::Expression { expr, location } => {
                out.push(self.lower_expression_statement(expr, location)?);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => out.push(Node::If {
                condition: self.rewrite_expr(condition)?,
                then_branch: self.lower_all(then_branch)?,
                else_branch: else_branch.map(|b| self.lower_all(b)).transpose()?,
                location,
            }),

            Stmt::While {
                condition,
                body,
                location,
            } if condition.is_variable(TRUE_LITERAL) => {
                let mut lowered = vec![Node::Tick { location }];
                for stmt in body {
                    self.lower_into(stmt, &mut lowered)?;
                }
                out.push(Node::Loop {
                    body: lowered,
                    location,
                });
            }

            Stmt::While {
                condition,
                body,
                location,
            } => out.push(Node::While {
                condition: self.rewrite_expr(condition)?,
                body: self.lower_all(body)?,
                location,
            }),

            Stmt::DoWhile {
                body,
                condition,
                location,
            } => out.push(Node::DoWhile {
                body: self.lower_all(body)?,
                condition: self.rewrite_expr(condition)?,
                location,
            }),

            Stmt::For {
                init,
                condition,
                increment,
                body,
                location,
            } => {
                let mut lowered_init = Vec::new();
                if let Some(init) = init {
                    self.lower_into(*init, &mut lowered_init)?;
                }
                out.push(Node::For {
                    init: lowered_init,
                    condition: condition.map(|c| self.rewrite_expr(c)).transpose()?,
                    increment: increment.map(|i| self.rewrite_expr(i)).transpose()?,
                    body: self.lower_all(body)?,
                    location,
                });
            }

            Stmt::Block {
                statements,
                location,
            } => out.push(Node::Block {
                body: self.lower_all(statements)?,
                location,
            }),

            Stmt::Break { location } => out.push(Node::Break { location }),
            Stmt::Continue { location } => out.push(Node::Continue { location }),

            Stmt::Return { expr, location } => out.push(Node::Return {
                expr: expr.map(|e| self.rewrite_expr(e)).transpose()?,
                location,
            }),
        }
        Ok(())
    }

    /// `wait_ms(expr);` is the one call that is a statement form
    fn lower_expression_statement(
        &self,
        expr: Expr,
        location: SourceLocation,
    ) -> Result<Node, CompileError> {
        match expr {
            Expr::Call {
                callee: Callee::Named(name),
                mut args,
                location: call_loc,
            } if name == WAIT_FN => {
                if args.len() != 1 {
                    return Err(CompileError::failed(
                        format!("'{}' expects 1 argument, got {}", WAIT_FN, args.len()),
                        call_loc,
                    ));
                }
                let millis = self.rewrite_expr(args.remove(0))?;
                Ok(Node::Wait { millis, location })
            }
            expr => Ok(Node::Expr {
                expr: self.rewrite_expr(expr)?,
                location,
            }),
        }
    }

    /// Resolve call targets throughout an expression
    fn rewrite_expr(&self, expr: Expr) -> Result<Expr, CompileError> {
        Ok(match expr {
            Expr::Number(..) | Expr::Variable(..) => expr,

            Expr::Binary {
                op,
                left,
                right,
                location,
            } => Expr::Binary {
                op,
                left: Box::new(self.rewrite_expr(*left)?),
                right: Box::new(self.rewrite_expr(*right)?),
                location,
            },

            Expr::Unary {
                op,
                operand,
                location,
            } => Expr::Unary {
                op,
                operand: Box::new(self.rewrite_expr(*operand)?),
                location,
            },

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                location,
            } => Expr::Ternary {
                condition: Box::new(self.rewrite_expr(*condition)?),
                then_expr: Box::new(self.rewrite_expr(*then_expr)?),
                else_expr: Box::new(self.rewrite_expr(*else_expr)?),
                location,
            },

            Expr::Assign {
                op,
                target,
                value,
                location,
            } => Expr::Assign {
                op,
                target: Box::new(self.rewrite_expr(*target)?),
                value: Box::new(self.rewrite_expr(*value)?),
                location,
            },

            Expr::Index {
                array,
                index,
                location,
            } => Expr::Index {
                array: Box::new(self.rewrite_expr(*array)?),
                index: Box::new(self.rewrite_expr(*index)?),
                location,
            },

            Expr::Call {
                callee,
                args,
                location,
            } => {
                let callee = match callee {
                    Callee::Named(name) if name == WAIT_FN => {
                        return Err(CompileError::failed(
                            format!("'{}' can only be used as a statement", WAIT_FN),
                            location,
                        ));
                    }
                    Callee::Named(name) if name == ACTUATE_FN => Callee::Builtin(Builtin::Actuate),
                    Callee::Named(name) if self.subroutines.contains(&name) => {
                        Callee::Delegate(name)
                    }
                    other => other,
                };
                let args = args
                    .into_iter()
                    .map(|a| self.rewrite_expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::Call {
                    callee,
                    args,
                    location,
                }
            }
        })
    }
}

//! Robot control source parser
//!
//! This module turns user source text into per-function syntax trees:
//! - [`normalize`]: Textual cleanup (comments, upper-case casts)
//! - [`extract`]: Brace-balanced function extraction and parameter lists
//! - [`lexer`]: Tokenization of one function body
//! - [`parse`]: Recursive descent parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Supported C Subset
//!
//! Function bodies accept:
//! - Types: `int`, `float`, `double`, `long`, `short`, `char`, `bool`,
//!   optionally `unsigned` and/or `const`; all values are untyped numbers
//! - Statements: declarations, assignments, `if`/`else`, `while`, `for`,
//!   `do-while`, `break`, `continue`, `return`, blocks
//! - Expressions: arithmetic, comparison, logical, bitwise, ternary,
//!   increment/decrement, calls, `gAD[i]`/`gV[i]` indexing
//! - No pointers, arrays, strings, structs, `switch` or casts
//!
//! # Parser Implementation
//!
//! Function boundaries are found by counting braces over the whole text;
//! bodies are then parsed by a hand-written recursive descent parser, one
//! method per precedence level. No external parser generator dependencies.

pub mod ast;
pub mod extract;
pub mod lexer;
pub mod normalize;
pub mod parse;

mod expressions;
mod statements;

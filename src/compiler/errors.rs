//! Compile-time error types
//!
//! Every failure of [`crate::compiler::compile`] is one of three kinds:
//! structural (braces do not balance), a missing entry function, or a
//! syntax/name error inside some function body. Compilation is all or
//! nothing; no partially built program is ever returned alongside an error.

use crate::parser::ast::SourceLocation;
use crate::parser::parse::ParseError;
use std::fmt;
use thiserror::Error;

/// Errors reported by the compile step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// An opening brace has no matching closer
    #[error(
        "Unbalanced braces: '{{' at line {}, column {} is never closed",
        location.line,
        location.column
    )]
    UnbalancedBraces { location: SourceLocation },

    /// No function carries the fixed entry-point name
    #[error("Missing entry point: no function named '{name}'")]
    MissingEntryPoint { name: String },

    /// Syntax or name-resolution error while building the executable form
    #[error("Compilation failed: {diagnostic}")]
    CompilationFailed { diagnostic: Diagnostic },
}

/// Human-readable description of a compilation failure
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "line {}, column {}: {}", loc.line, loc.column, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::CompilationFailed {
            diagnostic: Diagnostic::at(err.message, err.location),
        }
    }
}

impl CompileError {
    /// Shorthand for a located `CompilationFailed`
    pub(crate) fn failed(message: impl Into<String>, location: SourceLocation) -> Self {
        CompileError::CompilationFailed {
            diagnostic: Diagnostic::at(message, location),
        }
    }

    /// Source position of the failure, when one is known
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CompileError::UnbalancedBraces { location } => Some(*location),
            CompileError::MissingEntryPoint { .. } => None,
            CompileError::CompilationFailed { diagnostic } => diagnostic.location,
        }
    }
}

//! Runtime fault types for robot programs
//!
//! This module defines [`RuntimeFault`], which represents every error that can
//! occur while a program instance is being resumed (as opposed to compile
//! errors, which are reported before a program ever runs).
//!
//! All runtime faults are terminal: the scheduler moves to `Faulted` and never
//! resumes the instance again.

use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime faults raised during a resume
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeFault {
    /// `/` or `%` with a zero right operand
    #[error("Division by zero at line {}, column {}", location.line, location.column)]
    DivisionByZero { location: SourceLocation },

    /// `gAD[i]`/`gV[i]` with `i` not an integer in `0..10`
    #[error(
        "Index {index} out of bounds for '{array}' at line {}, column {}",
        location.line,
        location.column
    )]
    IndexOutOfBounds {
        array: &'static str,
        index: f64,
        location: SourceLocation,
    },

    /// `wait_ms` with a duration that is not a finite number
    #[error(
        "Invalid wait duration {millis} ms at line {}, column {}",
        location.line,
        location.column
    )]
    InvalidWait {
        millis: f64,
        location: SourceLocation,
    },

    /// Delegated calls nested deeper than the configured limit
    #[error(
        "Call depth limit of {depth} exceeded at line {}, column {}",
        location.line,
        location.column
    )]
    CallDepthExceeded {
        depth: usize,
        location: SourceLocation,
    },

    /// More than the configured number of ops ran without a suspension point
    #[error(
        "Program ran {budget} operations without yielding (line {}, column {})",
        location.line,
        location.column
    )]
    StepBudgetExceeded {
        budget: u64,
        location: SourceLocation,
    },

    /// Call with the wrong number of arguments
    #[error(
        "Function '{function}' expects {expected} argument(s), got {got} at line {}, column {}",
        location.line,
        location.column
    )]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Operand stack or program counter inconsistency
    #[error("Stack underflow at line {}, column {}", location.line, location.column)]
    StackUnderflow { location: SourceLocation },
}

impl RuntimeFault {
    /// Get the source location of this fault
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeFault::DivisionByZero { location }
            | RuntimeFault::IndexOutOfBounds { location, .. }
            | RuntimeFault::InvalidWait { location, .. }
            | RuntimeFault::CallDepthExceeded { location, .. }
            | RuntimeFault::StepBudgetExceeded { location, .. }
            | RuntimeFault::ArgumentCountMismatch { location, .. }
            | RuntimeFault::StackUnderflow { location } => *location,
        }
    }
}

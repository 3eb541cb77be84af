//! Stack-machine instruction set
//!
//! Each user function compiles to one [`FunctionCode`]. Operands live on a
//! single value stack shared by all frames; locals live in the frame.
//! Suspension is an instruction ([`Op::Tick`], [`Op::Wait`]), so a paused
//! program is nothing more than its frames' program counters.

use crate::parser::ast::{BinOp, SourceLocation};

/// Runtime-provided constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    CenterChannel,
    LeftChannel,
    RightChannel,
    True,
}

/// Runtime-provided arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotArray {
    /// `gAD`, read-only to programs
    SensorChannels,
    /// `gV`
    VariableSlots,
}

/// What an increment/decrement writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementTarget {
    Local(usize),
    /// `gV[i]`, index taken from the stack
    VariableSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Push(f64),
    Load(usize),
    /// Store the top of stack into a local, leaving it on the stack
    Store(usize),
    Binding(Binding),
    /// Pop an index, push the element
    LoadSlot(SlotArray),
    /// Pop value then index, write `gV[index]`, push value
    StoreSlot,
    /// Push the old value when `postfix`, the new one otherwise
    Increment {
        target: IncrementTarget,
        delta: f64,
        postfix: bool,
    },
    Unary(UnaryOp),
    /// Never `And`/`Or`; those compile to jumps
    Binary(BinOp),
    Jump(usize),
    /// Pop; jump when falsy
    JumpIfFalse(usize),
    /// Pop; jump when truthy
    JumpIfTrue(usize),
    Pop,
    Dup,
    /// Delegating call into another user function
    Call { function: usize, argc: usize },
    /// Pop the return value and leave the frame
    Return,
    /// Pop second then first argument, drive the actuator, push 0
    Actuate,
    /// Suspend with a tick event
    Tick,
    /// Pop a duration in milliseconds and suspend with a wait event
    Wait,
}

/// Compiled form of one function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCode {
    pub name: String,
    pub arity: usize,
    /// Parameters occupy the first `arity` locals
    pub local_count: usize,
    pub ops: Vec<Op>,
    /// Source location of each op, parallel to `ops`
    pub locations: Vec<SourceLocation>,
    pub location: SourceLocation,
}

impl FunctionCode {
    pub fn new(name: impl Into<String>, arity: usize, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            arity,
            local_count: arity,
            ops: Vec::new(),
            locations: Vec::new(),
            location,
        }
    }

    /// Append an op and return its index
    pub fn emit(&mut self, op: Op, location: SourceLocation) -> usize {
        self.ops.push(op);
        self.locations.push(location);
        self.ops.len() - 1
    }

    /// Index the next emitted op will get
    pub fn here(&self) -> usize {
        self.ops.len()
    }

    /// Point the jump at `at` to `target`
    pub fn patch(&mut self, at: usize, target: usize) {
        match &mut self.ops[at] {
            Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) => *t = target,
            _ => {}
        }
    }

    pub fn location_of(&self, pc: usize) -> SourceLocation {
        self.locations.get(pc).copied().unwrap_or(self.location)
    }

    /// Number of suspension ops in this function
    pub fn suspension_points(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Tick | Op::Wait))
            .count()
    }
}

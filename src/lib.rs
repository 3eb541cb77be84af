//! # Introduction
//!
//! linetracer compiles small C-like control programs for a simulated
//! line-following robot and runs them one logical tick at a time against a
//! differential-drive physics model and a reflectance sensor model.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Normalizer → Extractor → Parser → Transformer → Assembler → CompiledProgram
//!                                                                          │ instantiate
//!                  Sensors → Scheduler::tick → ProgramInstance::resume ◀───┘
//!                                   │
//!                               Physics
//! ```
//!
//! 1. [`parser`]: strips comments and casts, finds functions by brace
//!    counting, and parses each body into an AST.
//! 2. [`compiler`]: lowers bodies to suspension-aware IR (`while (TRUE)` gets
//!    a per-iteration tick, `wait_ms` becomes a wait) and assembles bytecode.
//! 3. [`interpreter`]: the resumable program instance, its runtime bindings
//!    and the tick-driven [`interpreter::Scheduler`].
//! 4. [`sim`]: robot pose, physics, sensors, configuration and the
//!    [`sim::Simulation`] host loop.
//!
//! ## Supported language
//!
//! One required entry function `user_main` plus any number of helpers.
//! Inside bodies: untyped numeric locals, `if/else`, `while`, `for`,
//! `do-while`, `break`, `continue`, `return`, the usual C operators, and the
//! runtime names `gAD[]`, `gV[]`, `motor()`, `wait_ms()`, `CN2`/`CN5`/`CN6`,
//! `TRUE` and `VAR_A`..`VAR_J`.
//!
//! The library emits [`tracing`] events and never installs a subscriber.

pub mod compiler;
pub mod interpreter;
pub mod parser;
pub mod sim;

pub use compiler::{compile, CompileError, CompiledProgram};
pub use interpreter::{ExecutionState, RuntimeBindings, RuntimeFault, Scheduler};
pub use sim::{RobotConfig, RobotPose, Simulation};

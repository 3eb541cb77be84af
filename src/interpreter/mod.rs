//! Robot program runtime
//!
//! This module provides the execution side of the pipeline:
//! - [`bindings`]: Arrays, actuator sink and constants visible to programs
//! - [`engine`]: Resumable program instance (bytecode VM with a frame stack)
//! - [`scheduler`]: Tick-driven state machine over one instance
//! - [`errors`]: Runtime fault types
//! - [`constants`]: Fixed names and sizes of the runtime surface
//!
//! # Execution Model
//!
//! Programs are cooperative. An instance only runs while the scheduler
//! resumes it, and each resume stops at the next `tick` or `wait` suspension
//! point. Nothing here is shared across threads.

pub mod bindings;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod scheduler;

pub use bindings::{Actuator, ChannelConstants, RuntimeBindings};
pub use engine::{Event, ProgramInstance, Resumed, RuntimeLimits};
pub use errors::RuntimeFault;
pub use scheduler::{ExecutionState, Scheduler};

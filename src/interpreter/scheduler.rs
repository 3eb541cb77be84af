//! Execution scheduler
//!
//! Advances one program instance by at most one suspension point per
//! simulation tick and owns its [`ExecutionState`]:
//!
//! ```text
//! Idle ──tick──▶ Running ──wait d──▶ WaitingUntil(now + d)
//!                  │  ▲                    │
//!                  │  └──── now ≥ deadline ┘ (resumed in the same tick)
//!                  ├──done──▶ Completed
//!                  └──fault─▶ Faulted
//! ```
//!
//! Deadlines are absolute: a late tick resumes once, it never replays the
//! ticks it missed. Waits of zero or less resolve on the tick that issued
//! them and the program continues on the next tick.

use crate::interpreter::bindings::{Actuator, RuntimeBindings};
use crate::interpreter::engine::{Event, ProgramInstance, Resumed};
use crate::interpreter::errors::RuntimeFault;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Lifecycle of one program run
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState {
    Idle,
    Running,
    WaitingUntil(Instant),
    Completed,
    Faulted(RuntimeFault),
}

impl ExecutionState {
    /// `Completed` and `Faulted` never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Faulted(_))
    }

    pub fn fault(&self) -> Option<&RuntimeFault> {
        match self {
            ExecutionState::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Drives a [`ProgramInstance`] from an external tick stream
pub struct Scheduler<A> {
    instance: ProgramInstance<A>,
    state: ExecutionState,
    resumes: u64,
}

impl<A: Actuator> Scheduler<A> {
    pub fn new(instance: ProgramInstance<A>) -> Self {
        Self {
            instance,
            state: ExecutionState::Idle,
            resumes: 0,
        }
    }

    /// Handle one simulation tick at wall-clock time `now`
    pub fn tick(&mut self, now: Instant) -> &ExecutionState {
        match self.state {
            ExecutionState::Completed | ExecutionState::Faulted(_) => {}
            ExecutionState::WaitingUntil(deadline) if now < deadline => {
                trace!(remaining = ?deadline.saturating_duration_since(now), "program waiting");
            }
            _ => self.advance(now),
        }
        &self.state
    }

    fn advance(&mut self, now: Instant) {
        if self.state == ExecutionState::Idle {
            debug!("program started");
        }

        self.resumes += 1;
        self.state = match self.instance.resume() {
            Ok(Resumed::Yielded(Event::Tick)) => {
                trace!(resumes = self.resumes, "program yielded tick");
                ExecutionState::Running
            }
            Ok(Resumed::Yielded(Event::Wait { millis })) => self.wait_state(now, millis),
            Ok(Resumed::Completed) => {
                info!(resumes = self.resumes, "program completed");
                ExecutionState::Completed
            }
            Err(fault) => Self::faulted(fault),
        };
    }

    fn wait_state(&self, now: Instant, millis: f64) -> ExecutionState {
        if millis <= 0.0 {
            trace!(millis, "non-positive wait resolved immediately");
            return ExecutionState::Running;
        }

        let nanos = (millis * 1_000_000.0).round();
        let deadline = (nanos < u64::MAX as f64)
            .then(|| Duration::from_nanos(nanos as u64))
            .and_then(|duration| now.checked_add(duration));

        match deadline {
            Some(deadline) => {
                trace!(millis, "program waiting");
                ExecutionState::WaitingUntil(deadline)
            }
            None => Self::faulted(RuntimeFault::InvalidWait {
                millis,
                location: self.instance.location().unwrap_or_default(),
            }),
        }
    }

    fn faulted(fault: RuntimeFault) -> ExecutionState {
        warn!(%fault, "program faulted");
        ExecutionState::Faulted(fault)
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Number of resumes performed so far
    pub fn resumes(&self) -> u64 {
        self.resumes
    }

    pub fn instance(&self) -> &ProgramInstance<A> {
        &self.instance
    }

    pub fn bindings(&self) -> &RuntimeBindings<A> {
        self.instance.bindings()
    }

    pub fn bindings_mut(&mut self) -> &mut RuntimeBindings<A> {
        self.instance.bindings_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    fn scheduler(source: &str) -> Scheduler<impl FnMut(f64, f64)> {
        let program = compile(source).unwrap();
        Scheduler::new(program.instantiate(RuntimeBindings::with_actuator(|_: f64, _: f64| {})))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_idle_until_first_tick() {
        let mut s = scheduler("void user_main(void) { while (TRUE) { } }");
        assert_eq!(*s.state(), ExecutionState::Idle);
        assert_eq!(s.resumes(), 0);

        assert_eq!(*s.tick(Instant::now()), ExecutionState::Running);
        assert_eq!(s.resumes(), 1);
    }

    #[test]
    fn test_straight_line_completes_then_stops() {
        let mut s = scheduler("void user_main(void) { gV[0] = 1; gV[1] = 2; }");
        let t0 = Instant::now();

        assert_eq!(*s.tick(t0), ExecutionState::Completed);
        assert_eq!(s.bindings().variable_slots()[1], 2.0);

        s.tick(t0 + ms(16));
        s.tick(t0 + ms(32));
        assert_eq!(s.resumes(), 1);
        assert!(s.state().is_terminal());
    }

    #[test]
    fn test_wait_blocks_until_deadline() {
        let mut s = scheduler("void user_main(void) { wait_ms(500); gV[0] = 1; while (TRUE) { } }");
        let t0 = Instant::now();

        assert_eq!(*s.tick(t0), ExecutionState::WaitingUntil(t0 + ms(500)));

        for offset in [16, 100, 499] {
            s.tick(t0 + ms(offset));
            assert_eq!(s.resumes(), 1);
            assert_eq!(s.bindings().variable_slots()[0], 0.0);
        }

        assert_eq!(*s.tick(t0 + ms(500)), ExecutionState::Running);
        assert_eq!(s.resumes(), 2);
        assert_eq!(s.bindings().variable_slots()[0], 1.0);
    }

    #[test]
    fn test_late_tick_does_not_catch_up() {
        let mut s = scheduler(
            "void user_main(void) { while (TRUE) { wait_ms(10); gV[0]++; } }",
        );
        let t0 = Instant::now();

        s.tick(t0); // tick event at loop head
        s.tick(t0); // wait issued
        assert_eq!(*s.state(), ExecutionState::WaitingUntil(t0 + ms(10)));

        // A tick far past the deadline resumes exactly once
        s.tick(t0 + ms(1_000));
        assert_eq!(s.bindings().variable_slots()[0], 1.0);
        assert_eq!(*s.state(), ExecutionState::Running);
    }

    #[test]
    fn test_non_positive_wait_resolves_on_same_tick() {
        let mut s = scheduler("void user_main(void) { wait_ms(0); wait_ms(-5); gV[0] = 1; }");
        let t0 = Instant::now();

        assert_eq!(*s.tick(t0), ExecutionState::Running);
        assert_eq!(*s.tick(t0), ExecutionState::Running);
        assert_eq!(*s.tick(t0), ExecutionState::Completed);
        assert_eq!(s.bindings().variable_slots()[0], 1.0);
    }

    #[test]
    fn test_fault_is_terminal() {
        let mut s = scheduler("void user_main(void) { while (TRUE) { gV[0] = 1 % gV[1]; } }");
        let t0 = Instant::now();

        assert_eq!(*s.tick(t0), ExecutionState::Running);
        let state = s.tick(t0 + ms(16)).clone();
        assert!(matches!(
            state.fault(),
            Some(RuntimeFault::DivisionByZero { .. })
        ));

        s.tick(t0 + ms(32));
        assert_eq!(s.resumes(), 2);
        assert_eq!(*s.state(), state);
    }

    #[test]
    fn test_oversized_wait_faults() {
        let mut s = scheduler("void user_main(void) { wait_ms(1e300); }");
        let state = s.tick(Instant::now()).clone();
        assert!(matches!(
            state.fault(),
            Some(RuntimeFault::InvalidWait { .. })
        ));
    }
}

//! Resumable program instance
//!
//! A [`ProgramInstance`] executes bytecode on an explicit frame stack. Each
//! call to [`ProgramInstance::resume`] runs until the next suspension op, the
//! end of the entry function, or a fault. Because delegated calls are just
//! more frames, a `wait_ms` deep inside a subroutine suspends the whole
//! instance and the next resume continues in that same frame.
//!
//! # Values
//!
//! Every value is an `f64`. Comparisons and logical operators produce `1` or
//! `0`; a value is true when it is non-zero and not NaN. Bitwise operators
//! work on the value wrapped to a 32-bit signed integer.

use crate::compiler::bytecode::*;
use crate::interpreter::bindings::{Actuator, RuntimeBindings};
use crate::interpreter::constants::{CHANNEL_COUNT, SENSOR_ARRAY, SLOT_ARRAY, SLOT_COUNT};
use crate::interpreter::errors::RuntimeFault;
use crate::parser::ast::{BinOp, SourceLocation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bounds that turn runaway programs into faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeLimits {
    /// Ops one resume may execute before reaching a suspension point
    pub max_ops_per_resume: u64,
    /// Maximum number of live frames, entry function included
    pub max_call_depth: usize,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_ops_per_resume: 1_000_000,
            max_call_depth: 256,
        }
    }
}

/// What a suspension point hands back to the scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Tick,
    Wait { millis: f64 },
}

/// Outcome of one resume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resumed {
    Yielded(Event),
    Completed,
}

#[derive(Debug, Clone)]
struct Frame {
    function: usize,
    pc: usize,
    locals: Vec<f64>,
    /// Operand stack height when the frame was entered
    stack_base: usize,
}

/// A running robot program.
///
/// Once it completes or faults the frame stack is empty and every further
/// resume reports [`Resumed::Completed`].
pub struct ProgramInstance<A> {
    functions: Arc<[FunctionCode]>,
    frames: Vec<Frame>,
    stack: Vec<f64>,
    bindings: RuntimeBindings<A>,
    limits: RuntimeLimits,
}

impl<A: Actuator> ProgramInstance<A> {
    pub(crate) fn new(
        functions: Arc<[FunctionCode]>,
        entry: usize,
        bindings: RuntimeBindings<A>,
        limits: RuntimeLimits,
    ) -> Self {
        let frames = match functions.get(entry) {
            Some(code) => vec![Frame {
                function: entry,
                pc: 0,
                locals: vec![0.0; code.local_count],
                stack_base: 0,
            }],
            None => Vec::new(),
        };

        Self {
            functions,
            frames,
            stack: Vec::new(),
            bindings,
            limits,
        }
    }

    /// Run to the next suspension point.
    ///
    /// A fault discards all frames, so the instance never runs again.
    pub fn resume(&mut self) -> Result<Resumed, RuntimeFault> {
        let result = self.run();
        if result.is_err() {
            self.frames.clear();
            self.stack.clear();
        }
        result
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of live frames
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Source location of the most recently executed op
    pub fn location(&self) -> Option<SourceLocation> {
        let frame = self.frames.last()?;
        let code = self.functions.get(frame.function)?;
        Some(code.location_of(frame.pc.saturating_sub(1)))
    }

    pub fn limits(&self) -> RuntimeLimits {
        self.limits
    }

    pub fn bindings(&self) -> &RuntimeBindings<A> {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut RuntimeBindings<A> {
        &mut self.bindings
    }

    fn run(&mut self) -> Result<Resumed, RuntimeFault> {
        let functions = Arc::clone(&self.functions);
        let mut executed: u64 = 0;

        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(Resumed::Completed);
            };
            let code = &functions[frame.function];
            let location = code.location_of(frame.pc);
            let Some(&op) = code.ops.get(frame.pc) else {
                return Err(RuntimeFault::StackUnderflow { location });
            };
            frame.pc += 1;

            executed += 1;
            if executed > self.limits.max_ops_per_resume {
                return Err(RuntimeFault::StepBudgetExceeded {
                    budget: self.limits.max_ops_per_resume,
                    location,
                });
            }

            match op {
                Op::Push(value) => self.stack.push(value),

                Op::Load(slot) => self.stack.push(frame.locals[slot]),

                Op::Store(slot) => {
                    frame.locals[slot] = peek(&self.stack, location)?;
                }

                Op::Binding(binding) => {
                    let constants = self.bindings.channel_constants();
                    let value = match binding {
                        Binding::CenterChannel => constants.center as f64,
                        Binding::LeftChannel => constants.left as f64,
                        Binding::RightChannel => constants.right as f64,
                        Binding::True => self.bindings.boolean_true(),
                    };
                    self.stack.push(value);
                }

                Op::LoadSlot(array) => {
                    let index = pop(&mut self.stack, location)?;
                    let i = slot_index(array, index, location)?;
                    let value = match array {
                        SlotArray::SensorChannels => self.bindings.sensor_channels()[i],
                        SlotArray::VariableSlots => self.bindings.variable_slots()[i],
                    };
                    self.stack.push(value);
                }

                Op::StoreSlot => {
                    let value = pop(&mut self.stack, location)?;
                    let index = pop(&mut self.stack, location)?;
                    let i = slot_index(SlotArray::VariableSlots, index, location)?;
                    self.bindings.variable_slots_mut()[i] = value;
                    self.stack.push(value);
                }

                Op::Increment {
                    target,
                    delta,
                    postfix,
                } => {
                    let old = match target {
                        IncrementTarget::Local(slot) => {
                            let old = frame.locals[slot];
                            frame.locals[slot] = old + delta;
                            old
                        }
                        IncrementTarget::VariableSlot => {
                            let index = pop(&mut self.stack, location)?;
                            let i = slot_index(SlotArray::VariableSlots, index, location)?;
                            let slots = self.bindings.variable_slots_mut();
                            let old = slots[i];
                            slots[i] = old + delta;
                            old
                        }
                    };
                    self.stack.push(if postfix { old } else { old + delta });
                }

                Op::Unary(op) => {
                    let value = pop(&mut self.stack, location)?;
                    self.stack.push(unary(op, value));
                }

                Op::Binary(op) => {
                    let right = pop(&mut self.stack, location)?;
                    let left = pop(&mut self.stack, location)?;
                    self.stack.push(binary(op, left, right, location)?);
                }

                Op::Jump(target) => frame.pc = target,

                Op::JumpIfFalse(target) => {
                    if !truthy(pop(&mut self.stack, location)?) {
                        frame.pc = target;
                    }
                }

                Op::JumpIfTrue(target) => {
                    if truthy(pop(&mut self.stack, location)?) {
                        frame.pc = target;
                    }
                }

                Op::Pop => {
                    pop(&mut self.stack, location)?;
                }

                Op::Dup => {
                    let value = peek(&self.stack, location)?;
                    self.stack.push(value);
                }

                Op::Call { function, argc } => {
                    let Some(callee) = functions.get(function) else {
                        return Err(RuntimeFault::StackUnderflow { location });
                    };
                    if argc != callee.arity {
                        return Err(RuntimeFault::ArgumentCountMismatch {
                            function: callee.name.clone(),
                            expected: callee.arity,
                            got: argc,
                            location,
                        });
                    }
                    if self.frames.len() >= self.limits.max_call_depth {
                        return Err(RuntimeFault::CallDepthExceeded {
                            depth: self.limits.max_call_depth,
                            location,
                        });
                    }
                    let Some(stack_base) = self.stack.len().checked_sub(argc) else {
                        return Err(RuntimeFault::StackUnderflow { location });
                    };

                    let mut locals = vec![0.0; callee.local_count.max(argc)];
                    locals[..argc].copy_from_slice(&self.stack[stack_base..]);
                    self.stack.truncate(stack_base);

                    self.frames.push(Frame {
                        function,
                        pc: 0,
                        locals,
                        stack_base,
                    });
                }

                Op::Return => {
                    let value = pop(&mut self.stack, location)?;
                    let base = frame.stack_base;
                    self.stack.truncate(base);
                    self.frames.pop();
                    if self.frames.is_empty() {
                        return Ok(Resumed::Completed);
                    }
                    self.stack.push(value);
                }

                Op::Actuate => {
                    let second = pop(&mut self.stack, location)?;
                    let first = pop(&mut self.stack, location)?;
                    self.bindings.actuate(first, second);
                    self.stack.push(0.0);
                }

                Op::Tick => return Ok(Resumed::Yielded(Event::Tick)),

                Op::Wait => {
                    let millis = pop(&mut self.stack, location)?;
                    if !millis.is_finite() {
                        return Err(RuntimeFault::InvalidWait { millis, location });
                    }
                    return Ok(Resumed::Yielded(Event::Wait { millis }));
                }
            }
        }
    }
}

fn pop(stack: &mut Vec<f64>, location: SourceLocation) -> Result<f64, RuntimeFault> {
    stack.pop().ok_or(RuntimeFault::StackUnderflow { location })
}

fn peek(stack: &[f64], location: SourceLocation) -> Result<f64, RuntimeFault> {
    stack
        .last()
        .copied()
        .ok_or(RuntimeFault::StackUnderflow { location })
}

fn slot_index(
    array: SlotArray,
    index: f64,
    location: SourceLocation,
) -> Result<usize, RuntimeFault> {
    let (name, len) = match array {
        SlotArray::SensorChannels => (SENSOR_ARRAY, CHANNEL_COUNT),
        SlotArray::VariableSlots => (SLOT_ARRAY, SLOT_COUNT),
    };
    if index >= 0.0 && index < len as f64 && index.fract() == 0.0 {
        Ok(index as usize)
    } else {
        Err(RuntimeFault::IndexOutOfBounds {
            array: name,
            index,
            location,
        })
    }
}

pub(crate) fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Wrap to a 32-bit signed integer; non-finite values become 0
fn to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    (value.trunc() % 4_294_967_296.0) as i64 as u32 as i32
}

fn unary(op: UnaryOp, value: f64) -> f64 {
    match op {
        UnaryOp::Neg => -value,
        UnaryOp::Not => bool_value(!truthy(value)),
        UnaryOp::BitNot => f64::from(!to_i32(value)),
    }
}

fn binary(op: BinOp, left: f64, right: f64, location: SourceLocation) -> Result<f64, RuntimeFault> {
    Ok(match op {
        BinOp::Add => left + right,
        BinOp::Sub => left - right,
        BinOp::Mul => left * right,
        BinOp::Div | BinOp::Mod if right == 0.0 => {
            return Err(RuntimeFault::DivisionByZero { location });
        }
        BinOp::Div => left / right,
        BinOp::Mod => left % right,
        BinOp::Eq => bool_value(left == right),
        BinOp::Ne => bool_value(left != right),
        BinOp::Lt => bool_value(left < right),
        BinOp::Le => bool_value(left <= right),
        BinOp::Gt => bool_value(left > right),
        BinOp::Ge => bool_value(left >= right),
        BinOp::And => bool_value(truthy(left) && truthy(right)),
        BinOp::Or => bool_value(truthy(left) || truthy(right)),
        BinOp::BitAnd => f64::from(to_i32(left) & to_i32(right)),
        BinOp::BitOr => f64::from(to_i32(left) | to_i32(right)),
        BinOp::BitXor => f64::from(to_i32(left) ^ to_i32(right)),
        BinOp::BitShl => f64::from(to_i32(left).wrapping_shl(to_i32(right) as u32)),
        BinOp::BitShr => f64::from(to_i32(left).wrapping_shr(to_i32(right) as u32)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    type Calls = Vec<(f64, f64)>;

    fn instance(source: &str) -> ProgramInstance<impl FnMut(f64, f64)> {
        instance_with_limits(source, RuntimeLimits::default())
    }

    fn instance_with_limits(
        source: &str,
        limits: RuntimeLimits,
    ) -> ProgramInstance<impl FnMut(f64, f64)> {
        let program = compile(source).unwrap();
        let bindings = RuntimeBindings::with_actuator(|_: f64, _: f64| {});
        program.instantiate_with_limits(bindings, limits)
    }

    fn run_main(body: &str) -> [f64; SLOT_COUNT] {
        let mut program = instance(&format!("void user_main(void) {{ {} }}", body));
        assert_eq!(program.resume().unwrap(), Resumed::Completed);
        *program.bindings().variable_slots()
    }

    #[test]
    fn test_straight_line_completes_in_one_resume() {
        let slots = run_main("int a = 2 + 3 * 4; gV[VAR_A] = a; gV[VAR_B] = (a - 4) / 4;");
        assert_eq!(slots[0], 14.0);
        assert_eq!(slots[1], 2.5);
    }

    #[test]
    fn test_comparisons_and_logic() {
        let slots = run_main(
            "gV[0] = 3 < 4; gV[1] = 3 == 4; gV[2] = 1 && 0; \
             gV[3] = 0 || 7; gV[4] = !5; gV[5] = 2 ? 8 : 9;",
        );
        assert_eq!(&slots[..6], &[1.0, 0.0, 0.0, 1.0, 0.0, 8.0]);
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        let slots = run_main("int n = 0; if (0 && (n = 1)) { } if (1 || (n = 2)) { } gV[0] = n;");
        assert_eq!(slots[0], 0.0);
    }

    #[test]
    fn test_bitwise_operators() {
        let slots = run_main(
            "gV[0] = 5 & 3; gV[1] = 1 << 4; gV[2] = ~0; \
             gV[3] = -8 >> 1; gV[4] = 6 ^ 3; gV[5] = 0x10 | 1;",
        );
        assert_eq!(&slots[..6], &[1.0, 16.0, -1.0, -4.0, 5.0, 17.0]);
    }

    #[test]
    fn test_increments_and_compound_assignment() {
        let slots = run_main(
            "int i = 5; gV[0] = i++; gV[1] = ++i; gV[2] = 10; gV[2] -= 4; \
             gV[3]++; gV[4] = gV[3]--; i *= 2; gV[5] = i;",
        );
        assert_eq!(&slots[..6], &[5.0, 7.0, 6.0, 0.0, 1.0, 14.0]);
    }

    #[test]
    fn test_for_with_break_and_continue() {
        let slots = run_main(
            "for (int i = 0; i < 10; i++) { if (i == 3) continue; if (i == 5) break; gV[0] += i; }",
        );
        assert_eq!(slots[0], 0.0 + 1.0 + 2.0 + 4.0);
    }

    #[test]
    fn test_while_and_do_while() {
        let slots = run_main(
            "int n = 3; while (n > 0) { gV[0] += n; n--; } do { gV[1]++; } while (0);",
        );
        assert_eq!(slots[0], 6.0);
        assert_eq!(slots[1], 1.0);
    }

    #[test]
    fn test_runtime_constants() {
        let slots = run_main("gV[0] = CN2; gV[1] = CN5; gV[2] = CN6; gV[3] = TRUE; gV[4] = VAR_J;");
        assert_eq!(&slots[..5], &[2.0, 5.0, 6.0, 1.0, 9.0]);
    }

    #[test]
    fn test_subroutine_return_value() {
        let mut program = instance(
            "int scale(int x, int k) { return x * k; }\n\
             void user_main(void) { gV[0] = scale(3, 4) + scale(1, 1); }",
        );
        assert_eq!(program.resume().unwrap(), Resumed::Completed);
        assert_eq!(program.bindings().variable_slots()[0], 13.0);
    }

    #[test]
    fn test_actuator_receives_arguments_in_order() {
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Calls::new()));
        let sink = std::rc::Rc::clone(&calls);
        let program = compile("void user_main(void) { motor(40, -20); }").unwrap();
        let bindings =
            RuntimeBindings::with_actuator(move |a: f64, b: f64| sink.borrow_mut().push((a, b)));
        let mut instance = program.instantiate(bindings);

        instance.resume().unwrap();
        assert_eq!(*calls.borrow(), vec![(40.0, -20.0)]);
    }

    #[test]
    fn test_sensor_channels_are_readable() {
        let program = compile("void user_main(void) { gV[0] = gAD[CN5] / 2; }").unwrap();
        let mut instance = program.instantiate(RuntimeBindings::with_actuator(|_: f64, _: f64| {}));
        instance.bindings_mut().sensor_channels_mut()[5] = 700.0;

        instance.resume().unwrap();
        assert_eq!(instance.bindings().variable_slots()[0], 350.0);
    }

    #[test]
    fn test_infinite_loop_yields_tick_each_resume() {
        let mut program = instance("void user_main(void) { while (TRUE) { gV[0]++; } }");

        for expected in 0..5 {
            assert_eq!(program.resume().unwrap(), Resumed::Yielded(Event::Tick));
            assert_eq!(program.bindings().variable_slots()[0], expected as f64);
        }
    }

    #[test]
    fn test_wait_inside_subroutine_suspends_caller() {
        let mut program = instance(
            "void pause(int ms) { wait_ms(ms); gV[1] = 1; }\n\
             void user_main(void) { pause(20); gV[2] = 2; }",
        );

        assert_eq!(
            program.resume().unwrap(),
            Resumed::Yielded(Event::Wait { millis: 20.0 })
        );
        assert_eq!(program.call_depth(), 2);
        assert_eq!(program.bindings().variable_slots()[1], 0.0);

        assert_eq!(program.resume().unwrap(), Resumed::Completed);
        assert_eq!(program.bindings().variable_slots()[1], 1.0);
        assert_eq!(program.bindings().variable_slots()[2], 2.0);
    }

    #[test]
    fn test_locals_survive_suspension() {
        let mut program = instance(
            "void user_main(void) { int n = 41; wait_ms(1); n++; gV[0] = n; }",
        );
        program.resume().unwrap();
        assert_eq!(program.resume().unwrap(), Resumed::Completed);
        assert_eq!(program.bindings().variable_slots()[0], 42.0);
    }

    #[test]
    fn test_division_by_zero_faults_and_stops() {
        let mut program = instance("void user_main(void) { gV[0] = 1 / 0; }");

        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::DivisionByZero { .. })
        ));
        assert!(program.is_finished());
        assert_eq!(program.resume().unwrap(), Resumed::Completed);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut program = instance("void user_main(void) { gV[10] = 1; }");
        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::IndexOutOfBounds { array: "gV", .. })
        ));

        let mut program = instance("void user_main(void) { gV[0] = gAD[1.5]; }");
        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::IndexOutOfBounds { array: "gAD", .. })
        ));
    }

    #[test]
    fn test_non_yielding_loop_hits_budget() {
        let limits = RuntimeLimits {
            max_ops_per_resume: 1_000,
            ..RuntimeLimits::default()
        };
        let mut program = instance_with_limits("void user_main(void) { while (1) { } }", limits);

        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::StepBudgetExceeded { budget: 1_000, .. })
        ));
    }

    #[test]
    fn test_unbounded_recursion_hits_depth_limit() {
        let limits = RuntimeLimits {
            max_call_depth: 16,
            ..RuntimeLimits::default()
        };
        let mut program = instance_with_limits(
            "void dive(int n) { dive(n + 1); }\nvoid user_main(void) { dive(0); }",
            limits,
        );

        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::CallDepthExceeded { depth: 16, .. })
        ));
    }

    #[test]
    fn test_infinite_wait_is_a_fault() {
        let mut program = instance("void user_main(void) { wait_ms(1e308 * 10); }");
        assert!(matches!(
            program.resume(),
            Err(RuntimeFault::InvalidWait { .. })
        ));
    }
}

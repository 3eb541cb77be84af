//! Program assembler
//!
//! Compiles lowered functions to bytecode, resolving every name up front:
//! locals to frame slots, runtime names to [`Op::Binding`]/[`Op::LoadSlot`],
//! `VAR_A`..`VAR_J` to constants and delegating calls to function indices.
//! The result is a [`CompiledProgram`], an immutable factory for
//! [`ProgramInstance`]s.

use crate::compiler::bytecode::*;
use crate::compiler::errors::CompileError;
use crate::compiler::transform::{Function, Node};
use crate::interpreter::bindings::{Actuator, RuntimeBindings};
use crate::interpreter::constants::*;
use crate::interpreter::engine::{ProgramInstance, RuntimeLimits};
use crate::parser::ast::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A compiled robot program.
///
/// Function 0 is the entry function; subroutines follow in source order.
/// Cloning is cheap and instances created from clones share the bytecode.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    functions: Arc<[FunctionCode]>,
    entry: usize,
    subroutines: FxHashMap<String, usize>,
    constant_slots: FxHashMap<String, usize>,
}

impl CompiledProgram {
    /// Create a fresh program instance with default runtime limits
    pub fn instantiate<A: Actuator>(&self, bindings: RuntimeBindings<A>) -> ProgramInstance<A> {
        self.instantiate_with_limits(bindings, RuntimeLimits::default())
    }

    pub fn instantiate_with_limits<A: Actuator>(
        &self,
        bindings: RuntimeBindings<A>,
        limits: RuntimeLimits,
    ) -> ProgramInstance<A> {
        ProgramInstance::new(Arc::clone(&self.functions), self.entry, bindings, limits)
    }

    pub fn entry(&self) -> &FunctionCode {
        &self.functions[self.entry]
    }

    pub fn subroutine(&self, name: &str) -> Option<&FunctionCode> {
        self.subroutines.get(name).map(|&i| &self.functions[i])
    }

    pub fn subroutine_names(&self) -> impl Iterator<Item = &str> {
        self.subroutines.keys().map(String::as_str)
    }

    /// Slot index of a symbolic name such as `VAR_C`
    pub fn constant_slot(&self, name: &str) -> Option<usize> {
        self.constant_slots.get(name).copied()
    }

    pub fn constant_slots(&self) -> &FxHashMap<String, usize> {
        &self.constant_slots
    }

    pub fn functions(&self) -> &[FunctionCode] {
        &self.functions
    }
}

/// Build the program from the lowered entry function and subroutines.
///
/// Entry-function parameters are ignored; the entry is always called with
/// no arguments.
pub fn assemble(
    entry: Function,
    subroutines: Vec<Function>,
) -> Result<CompiledProgram, CompileError> {
    let mut table = FxHashMap::default();
    for (i, function) in subroutines.iter().enumerate() {
        if is_reserved_name(&function.name) {
            return Err(CompileError::failed(
                format!("'{}' is a reserved name", function.name),
                function.location,
            ));
        }
        table.insert(function.name.clone(), (i + 1, function.params.len()));
    }

    let mut functions = Vec::with_capacity(subroutines.len() + 1);
    let assembler = FunctionAssembler::new(&table, &entry.name, &[], entry.location)?;
    functions.push(assembler.finish(&entry.body)?);
    for function in &subroutines {
        let assembler =
            FunctionAssembler::new(&table, &function.name, &function.params, function.location)?;
        functions.push(assembler.finish(&function.body)?);
    }

    let subroutines = table.into_iter().map(|(name, (index, _))| (name, index)).collect();
    let constant_slots = SLOT_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect();

    Ok(CompiledProgram {
        functions: functions.into(),
        entry: 0,
        subroutines,
        constant_slots,
    })
}

#[derive(Debug, Clone, Copy)]
struct Local {
    slot: usize,
    mutable: bool,
}

struct Scope {
    names: FxHashMap<String, Local>,
    /// First slot this scope may allocate; slots are reused after it closes
    base: usize,
}

#[derive(Default)]
struct LoopContext {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// Compiles one function body
struct FunctionAssembler<'a> {
    /// name → (function index, arity)
    table: &'a FxHashMap<String, (usize, usize)>,
    code: FunctionCode,
    scopes: Vec<Scope>,
    next_slot: usize,
    loops: Vec<LoopContext>,
}

impl<'a> FunctionAssembler<'a> {
    fn new(
        table: &'a FxHashMap<String, (usize, usize)>,
        name: &str,
        params: &[String],
        location: SourceLocation,
    ) -> Result<Self, CompileError> {
        let mut assembler = Self {
            table,
            code: FunctionCode::new(name, params.len(), location),
            scopes: vec![Scope {
                names: FxHashMap::default(),
                base: 0,
            }],
            next_slot: 0,
            loops: Vec::new(),
        };
        for param in params {
            assembler.declare(param, true, location)?;
        }
        Ok(assembler)
    }

    fn finish(mut self, body: &[Node]) -> Result<FunctionCode, CompileError> {
        self.emit_nodes(body)?;
        let end = self.code.location;
        self.code.emit(Op::Push(0.0), end);
        self.code.emit(Op::Return, end);
        Ok(self.code)
    }

    // ===== Scopes =====

    fn push_scope(&mut self) {
        self.scopes.push(Scope {
            names: FxHashMap::default(),
            base: self.next_slot,
        });
    }

    fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            self.next_slot = scope.base;
        }
    }

    fn declare(
        &mut self,
        name: &str,
        mutable: bool,
        location: SourceLocation,
    ) -> Result<usize, CompileError> {
        if is_reserved_name(name) {
            return Err(CompileError::failed(
                format!("'{}' is a reserved name", name),
                location,
            ));
        }

        let slot = self.next_slot;
        let Some(scope) = self.scopes.last_mut() else {
            return Err(CompileError::failed("No open scope", location));
        };
        if scope.names.contains_key(name) {
            return Err(CompileError::failed(
                format!("Redeclaration of '{}'", name),
                location,
            ));
        }
        scope.names.insert(name.to_string(), Local { slot, mutable });

        self.next_slot += 1;
        self.code.local_count = self.code.local_count.max(self.next_slot);
        Ok(slot)
    }

    fn lookup(&self, name: &str) -> Option<Local> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).copied())
    }

    fn emit_scoped(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        self.push_scope();
        let result = self.emit_nodes(nodes);
        self.pop_scope();
        result
    }

    // ===== Statements =====

    fn emit_nodes(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            self.emit_node(node)?;
        }
        Ok(())
    }

    fn emit_node(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Bind {
                name,
                mutable,
                init,
                location,
            } => {
                match init {
                    Some(expr) => self.emit_expr(expr)?,
                    None if !*mutable => {
                        return Err(CompileError::failed(
                            format!("const '{}' must be initialized", name),
                            *location,
                        ));
                    }
                    None => {
                        self.code.emit(Op::Push(0.0), *location);
                    }
                }
                let slot = self.declare(name, *mutable, *location)?;
                self.code.emit(Op::Store(slot), *location);
                self.code.emit(Op::Pop, *location);
            }

            Node::Expr { expr, location } => {
                self.emit_expr(expr)?;
                self.code.emit(Op::Pop, *location);
            }

            Node::Tick { location } => {
                self.code.emit(Op::Tick, *location);
            }

            Node::Wait { millis, location } => {
                self.emit_expr(millis)?;
                self.code.emit(Op::Wait, *location);
            }

            Node::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => {
                self.emit_expr(condition)?;
                let skip_then = self.code.emit(Op::JumpIfFalse(0), *location);
                self.emit_scoped(then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        let skip_else = self.code.emit(Op::Jump(0), *location);
                        self.code.patch(skip_then, self.code.here());
                        self.emit_scoped(else_branch)?;
                        self.code.patch(skip_else, self.code.here());
                    }
                    None => self.code.patch(skip_then, self.code.here()),
                }
            }

            Node::Loop { body, location } => {
                let start = self.code.here();
                self.loops.push(LoopContext::default());
                self.emit_scoped(body)?;
                self.code.emit(Op::Jump(start), *location);
                self.close_loop(start);
            }

            Node::While {
                condition,
                body,
                location,
            } => {
                let start = self.code.here();
                self.emit_expr(condition)?;
                let exit = self.code.emit(Op::JumpIfFalse(0), *location);
                self.loops.push(LoopContext::default());
                self.emit_scoped(body)?;
                self.code.emit(Op::Jump(start), *location);
                self.code.patch(exit, self.code.here());
                self.close_loop(start);
            }

            Node::DoWhile {
                body,
                condition,
                location,
            } => {
                let start = self.code.here();
                self.loops.push(LoopContext::default());
                self.emit_scoped(body)?;
                let check = self.code.here();
                self.emit_expr(condition)?;
                self.code.emit(Op::JumpIfTrue(start), *location);
                self.close_loop(check);
            }

            Node::For {
                init,
                condition,
                increment,
                body,
                location,
            } => {
                self.push_scope();
                let result =
                    self.emit_for(init, condition.as_ref(), increment.as_ref(), body, *location);
                self.pop_scope();
                result?;
            }

            Node::Block { body, .. } => self.emit_scoped(body)?,

            Node::Break { location } => {
                let jump = self.code.emit(Op::Jump(0), *location);
                match self.loops.last_mut() {
                    Some(ctx) => ctx.breaks.push(jump),
                    None => {
                        return Err(CompileError::failed("'break' outside of a loop", *location));
                    }
                }
            }

            Node::Continue { location } => {
                let jump = self.code.emit(Op::Jump(0), *location);
                match self.loops.last_mut() {
                    Some(ctx) => ctx.continues.push(jump),
                    None => {
                        return Err(CompileError::failed(
                            "'continue' outside of a loop",
                            *location,
                        ));
                    }
                }
            }

            Node::Return { expr, location } => {
                match expr {
                    Some(expr) => self.emit_expr(expr)?,
                    None => {
                        self.code.emit(Op::Push(0.0), *location);
                    }
                }
                self.code.emit(Op::Return, *location);
            }
        }
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: &[Node],
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &[Node],
        location: SourceLocation,
    ) -> Result<(), CompileError> {
        self.emit_nodes(init)?;

        let start = self.code.here();
        let exit = match condition {
            Some(condition) => {
                self.emit_expr(condition)?;
                Some(self.code.emit(Op::JumpIfFalse(0), location))
            }
            None => None,
        };

        self.loops.push(LoopContext::default());
        self.emit_scoped(body)?;

        let step = self.code.here();
        if let Some(increment) = increment {
            self.emit_expr(increment)?;
            self.code.emit(Op::Pop, location);
        }
        self.code.emit(Op::Jump(start), location);

        if let Some(exit) = exit {
            self.code.patch(exit, self.code.here());
        }
        self.close_loop(step);
        Ok(())
    }

    /// Patch the innermost loop's breaks to here and continues to `continue_target`
    fn close_loop(&mut self, continue_target: usize) {
        if let Some(ctx) = self.loops.pop() {
            let end = self.code.here();
            for at in ctx.breaks {
                self.code.patch(at, end);
            }
            for at in ctx.continues {
                self.code.patch(at, continue_target);
            }
        }
    }

    // ===== Expressions =====

    /// Emit code leaving exactly one value on the stack
    fn emit_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Number(value, loc) => {
                self.code.emit(Op::Push(*value), *loc);
            }

            Expr::Variable(name, loc) => self.emit_variable(name, *loc)?,

            Expr::Binary {
                op: BinOp::And,
                left,
                right,
                location,
            } => self.emit_short_circuit(left, right, false, *location)?,

            Expr::Binary {
                op: BinOp::Or,
                left,
                right,
                location,
            } => self.emit_short_circuit(left, right, true, *location)?,

            Expr::Binary {
                op,
                left,
                right,
                location,
            } => {
                self.emit_expr(left)?;
                self.emit_expr(right)?;
                self.code.emit(Op::Binary(*op), *location);
            }

            Expr::Unary {
                op,
                operand,
                location,
            } => match op {
                UnOp::Neg => self.emit_unary(operand, UnaryOp::Neg, *location)?,
                UnOp::Not => self.emit_unary(operand, UnaryOp::Not, *location)?,
                UnOp::BitNot => self.emit_unary(operand, UnaryOp::BitNot, *location)?,
                UnOp::PreInc => self.emit_increment(operand, 1.0, false, *location)?,
                UnOp::PreDec => self.emit_increment(operand, -1.0, false, *location)?,
                UnOp::PostInc => self.emit_increment(operand, 1.0, true, *location)?,
                UnOp::PostDec => self.emit_increment(operand, -1.0, true, *location)?,
            },

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                location,
            } => {
                self.emit_expr(condition)?;
                let to_else = self.code.emit(Op::JumpIfFalse(0), *location);
                self.emit_expr(then_expr)?;
                let to_end = self.code.emit(Op::Jump(0), *location);
                self.code.patch(to_else, self.code.here());
                self.emit_expr(else_expr)?;
                self.code.patch(to_end, self.code.here());
            }

            Expr::Assign {
                op,
                target,
                value,
                location,
            } => self.emit_assign(*op, target, value, *location)?,

            Expr::Call {
                callee,
                args,
                location,
            } => self.emit_call(callee, args, *location)?,

            Expr::Index {
                array,
                index,
                location,
            } => {
                let array = slot_array(array)?;
                self.emit_expr(index)?;
                self.code.emit(Op::LoadSlot(array), *location);
            }
        }
        Ok(())
    }

    fn emit_variable(&mut self, name: &str, loc: SourceLocation) -> Result<(), CompileError> {
        if let Some(local) = self.lookup(name) {
            self.code.emit(Op::Load(local.slot), loc);
            return Ok(());
        }

        let op = match name {
            CENTER_CHANNEL => Op::Binding(Binding::CenterChannel),
            LEFT_CHANNEL => Op::Binding(Binding::LeftChannel),
            RIGHT_CHANNEL => Op::Binding(Binding::RightChannel),
            TRUE_LITERAL => Op::Binding(Binding::True),
            SENSOR_ARRAY | SLOT_ARRAY => {
                return Err(CompileError::failed(
                    format!("'{}' must be indexed", name),
                    loc,
                ));
            }
            _ => match SLOT_NAMES.iter().position(|slot| *slot == name) {
                Some(index) => Op::Push(index as f64),
                None => {
                    return Err(CompileError::failed(
                        format!("Unknown identifier '{}'", name),
                        loc,
                    ));
                }
            },
        };
        self.code.emit(op, loc);
        Ok(())
    }

    /// `&&` when `is_or` is false, `||` otherwise; the result is 0 or 1
    fn emit_short_circuit(
        &mut self,
        left: &Expr,
        right: &Expr,
        is_or: bool,
        loc: SourceLocation,
    ) -> Result<(), CompileError> {
        let decide = |target: usize| {
            if is_or {
                Op::JumpIfTrue(target)
            } else {
                Op::JumpIfFalse(target)
            }
        };

        self.emit_expr(left)?;
        let first = self.code.emit(decide(0), loc);
        self.emit_expr(right)?;
        let second = self.code.emit(decide(0), loc);

        let (fallthrough, decided) = if is_or { (0.0, 1.0) } else { (1.0, 0.0) };
        self.code.emit(Op::Push(fallthrough), loc);
        let to_end = self.code.emit(Op::Jump(0), loc);
        let decided_at = self.code.here();
        self.code.emit(Op::Push(decided), loc);
        let end = self.code.here();

        self.code.patch(first, decided_at);
        self.code.patch(second, decided_at);
        self.code.patch(to_end, end);
        Ok(())
    }

    fn emit_unary(
        &mut self,
        operand: &Expr,
        op: UnaryOp,
        loc: SourceLocation,
    ) -> Result<(), CompileError> {
        self.emit_expr(operand)?;
        self.code.emit(Op::Unary(op), loc);
        Ok(())
    }

    fn emit_increment(
        &mut self,
        operand: &Expr,
        delta: f64,
        postfix: bool,
        loc: SourceLocation,
    ) -> Result<(), CompileError> {
        let target = match operand {
            Expr::Variable(name, var_loc) => {
                IncrementTarget::Local(self.writable_local(name, *var_loc)?)
            }
            Expr::Index { array, index, .. } => {
                self.writable_array(array)?;
                self.emit_expr(index)?;
                IncrementTarget::VariableSlot
            }
            _ => {
                return Err(CompileError::failed(
                    "Increment/decrement needs a variable",
                    loc,
                ));
            }
        };
        self.code.emit(
            Op::Increment {
                target,
                delta,
                postfix,
            },
            loc,
        );
        Ok(())
    }

    fn emit_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        loc: SourceLocation,
    ) -> Result<(), CompileError> {
        match target {
            Expr::Variable(name, var_loc) => {
                let slot = self.writable_local(name, *var_loc)?;
                if let AssignOp::Compound(bin) = op {
                    self.code.emit(Op::Load(slot), loc);
                    self.emit_expr(value)?;
                    self.code.emit(Op::Binary(bin), loc);
                } else {
                    self.emit_expr(value)?;
                }
                self.code.emit(Op::Store(slot), loc);
            }

            Expr::Index { array, index, .. } => {
                self.writable_array(array)?;
                self.emit_expr(index)?;
                if let AssignOp::Compound(bin) = op {
                    self.code.emit(Op::Dup, loc);
                    self.code.emit(Op::LoadSlot(SlotArray::VariableSlots), loc);
                    self.emit_expr(value)?;
                    self.code.emit(Op::Binary(bin), loc);
                } else {
                    self.emit_expr(value)?;
                }
                self.code.emit(Op::StoreSlot, loc);
            }

            _ => return Err(CompileError::failed("Invalid assignment target", loc)),
        }
        Ok(())
    }

    fn emit_call(
        &mut self,
        callee: &Callee,
        args: &[Expr],
        loc: SourceLocation,
    ) -> Result<(), CompileError> {
        match callee {
            Callee::Builtin(Builtin::Actuate) => {
                check_arity(ACTUATE_FN, 2, args.len(), loc)?;
                for arg in args {
                    self.emit_expr(arg)?;
                }
                self.code.emit(Op::Actuate, loc);
            }

            Callee::Delegate(name) => {
                let Some(&(function, arity)) = self.table.get(name) else {
                    return Err(CompileError::failed(
                        format!("Unknown function '{}'", name),
                        loc,
                    ));
                };
                check_arity(name, arity, args.len(), loc)?;
                for arg in args {
                    self.emit_expr(arg)?;
                }
                self.code.emit(
                    Op::Call {
                        function,
                        argc: args.len(),
                    },
                    loc,
                );
            }

            Callee::Named(name) if name == ENTRY_POINT => {
                return Err(CompileError::failed(
                    format!("Entry function '{}' cannot be called", ENTRY_POINT),
                    loc,
                ));
            }

            Callee::Named(name) => {
                return Err(CompileError::failed(
                    format!("Unknown function '{}'", name),
                    loc,
                ));
            }
        }
        Ok(())
    }

    fn writable_local(&self, name: &str, loc: SourceLocation) -> Result<usize, CompileError> {
        match self.lookup(name) {
            Some(Local { slot, mutable: true }) => Ok(slot),
            Some(_) => Err(CompileError::failed(
                format!("Cannot assign to const '{}'", name),
                loc,
            )),
            None if is_reserved_name(name) => Err(CompileError::failed(
                format!("Cannot assign to '{}'", name),
                loc,
            )),
            None => Err(CompileError::failed(
                format!("Unknown identifier '{}'", name),
                loc,
            )),
        }
    }

    fn writable_array(&self, array: &Expr) -> Result<(), CompileError> {
        match slot_array(array)? {
            SlotArray::VariableSlots => Ok(()),
            SlotArray::SensorChannels => Err(CompileError::failed(
                format!("'{}' is read-only", SENSOR_ARRAY),
                array.location(),
            )),
        }
    }
}

fn slot_array(array: &Expr) -> Result<SlotArray, CompileError> {
    match array {
        Expr::Variable(name, _) if name == SENSOR_ARRAY => Ok(SlotArray::SensorChannels),
        Expr::Variable(name, _) if name == SLOT_ARRAY => Ok(SlotArray::VariableSlots),
        other => Err(CompileError::failed(
            format!("Only '{}' and '{}' can be indexed", SENSOR_ARRAY, SLOT_ARRAY),
            other.location(),
        )),
    }
}

fn check_arity(
    name: &str,
    expected: usize,
    got: usize,
    loc: SourceLocation,
) -> Result<(), CompileError> {
    if expected == got {
        Ok(())
    } else {
        Err(CompileError::failed(
            format!("'{}' expects {} argument(s), got {}", name, expected, got),
            loc,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::compile;
    use crate::compiler::bytecode::Op;
    use crate::compiler::errors::CompileError;

    fn compile_error(source: &str) -> String {
        match compile(source) {
            Err(CompileError::CompilationFailed { diagnostic }) => diagnostic.message,
            other => panic!("Expected CompilationFailed, got {:?}", other),
        }
    }

    /// Diagnostic for a `user_main` with the given body
    fn main_error(body: &str) -> String {
        compile_error(&format!("void user_main(void) {{ {} }}", body))
    }

    #[test]
    fn test_symbol_table() {
        let program = compile("void user_main(void) { }").unwrap();

        assert_eq!(program.constant_slot("VAR_A"), Some(0));
        assert_eq!(program.constant_slot("VAR_J"), Some(9));
        assert_eq!(program.constant_slot("VAR_K"), None);
        assert_eq!(program.constant_slots().len(), 10);
    }

    #[test]
    fn test_subroutines_are_indexed() {
        let program = compile(
            "int twice(int x) { return x * 2; }\n\
             void user_main(void) { gV[0] = twice(4); }",
        )
        .unwrap();

        let twice = program.subroutine("twice").unwrap();
        assert_eq!(twice.arity, 1);
        assert_eq!(program.subroutine_names().collect::<Vec<_>>(), vec!["twice"]);
        assert!(program
            .entry()
            .ops
            .iter()
            .any(|op| matches!(op, Op::Call { function: 1, argc: 1 })));
    }

    #[test]
    fn test_loop_has_one_tick_per_iteration() {
        let program = compile("void user_main(void) { while (TRUE) { motor(1, 1); } }").unwrap();
        assert_eq!(program.entry().suspension_points(), 1);
    }

    #[test]
    fn test_unknown_identifier() {
        assert!(main_error("x = 1;").contains("Unknown identifier 'x'"));
    }

    #[test]
    fn test_unknown_function() {
        assert!(main_error("spin(1);").contains("Unknown function 'spin'"));
    }

    #[test]
    fn test_calling_entry_is_rejected() {
        assert!(main_error("user_main();").contains("cannot be called"));
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(main_error("motor(1);").contains("expects 2"));
        assert!(compile_error(
            "void f(int a) { }\nvoid user_main(void) { f(1, 2); }"
        )
        .contains("expects 1"));
    }

    #[test]
    fn test_const_assignment_rejected() {
        assert!(main_error("const int k = 1; k = 2;").contains("const 'k'"));
        assert!(main_error("const int k = 1; k++;").contains("const 'k'"));
    }

    #[test]
    fn test_sensor_channels_are_read_only() {
        assert!(main_error("gAD[CN2] = 1;").contains("read-only"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert!(main_error("int a; int a;").contains("Redeclaration"));
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_allowed() {
        assert!(compile("void user_main(void) { int a = 1; { int a = 2; gV[0] = a; } }").is_ok());
    }

    #[test]
    fn test_break_outside_loop() {
        assert!(main_error("break;").contains("outside of a loop"));
    }

    #[test]
    fn test_reserved_names_cannot_be_declared() {
        assert!(main_error("int CN2 = 0;").contains("reserved"));
        assert!(main_error("int VAR_A;").contains("reserved"));
    }

    #[test]
    fn test_uninitialized_const_rejected() {
        assert!(main_error("const int k;").contains("must be initialized"));
    }

    #[test]
    fn test_bare_array_name_rejected() {
        assert!(main_error("int a = gV;").contains("must be indexed"));
    }
}

//! Robot program compiler
//!
//! Turns user source text into a [`CompiledProgram`]:
//! - [`crate::parser::normalize`] and [`crate::parser::extract`] find the
//!   functions
//! - [`transform`]: parses each body and lowers it to suspension-aware IR
//! - [`assemble`]: resolves names and emits [`bytecode`]
//! - [`errors`]: compile-time error taxonomy
//!
//! Compilation and instantiation are separate steps: one compiled program
//! can be instantiated any number of times.

pub mod assemble;
pub mod bytecode;
pub mod errors;
pub mod transform;

pub use assemble::CompiledProgram;
pub use errors::{CompileError, Diagnostic};

use crate::parser::extract::{extract_functions, split_entry};
use crate::parser::normalize::normalize;
use rustc_hash::FxHashSet;
use tracing::debug;
use transform::Transformer;

/// Compile user source into a program factory.
///
/// Fails with [`CompileError::UnbalancedBraces`], [`CompileError::MissingEntryPoint`]
/// or [`CompileError::CompilationFailed`]; nothing is returned on failure.
pub fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
    let normalized = normalize(source);
    let definitions = extract_functions(&normalized)?;
    debug!(functions = definitions.len(), "extracted function definitions");

    let (entry, subroutines) = split_entry(definitions)?;
    let names: FxHashSet<String> = subroutines.iter().map(|f| f.name.clone()).collect();
    let transformer = Transformer::new(&names);

    let entry = transformer.transform(&entry)?;
    let subroutines = subroutines
        .iter()
        .map(|definition| transformer.transform(definition))
        .collect::<Result<Vec<_>, _>>()?;

    let program = assemble::assemble(entry, subroutines)?;
    debug!(
        functions = program.functions().len(),
        ops = program.functions().iter().map(|f| f.ops.len()).sum::<usize>(),
        "assembled program"
    );
    Ok(program)
}

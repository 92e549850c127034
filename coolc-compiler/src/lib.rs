//! The compiler core: hierarchy and feature building, type checking,
//! layout arrangement, and x86-64 emission (spec.md §1/§2). `coolc-cli`
//! is the only intended consumer of [`compile`]; every other item here is
//! exposed for the crate's own integration tests.

pub mod classtable;
pub mod codegen;
pub mod features;
pub mod hierarchy;
pub mod layout;
pub mod scope;
pub mod typecheck;

use coolc_ast::Program;
use coolc_diagnostics::DiagnosticEngine;
use thiserror::Error;

/// A phase of the pipeline failed with one or more diagnostics already
/// recorded in the caller's [`DiagnosticEngine`] (spec.md §7). The `usize`
/// payloads are error counts, not the diagnostics themselves — `coolc-cli`
/// prints the engine's own diagnostics and uses these only for the
/// summary line and exit code.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0} error(s) building the class hierarchy")]
    Hierarchy(usize),
    #[error("{0} error(s) checking features")]
    Features(usize),
    #[error("{0} error(s) type checking")]
    Typing(usize),
    #[error("{0}")]
    Entry(String),
}

/// Runs the full pipeline over an already-parsed, merged `Program`
/// (spec.md §2): build the class hierarchy, collect and validate
/// features, type check every expression, arrange layout, then emit
/// assembly. Stops at the first phase that reports errors.
pub fn compile(program: &Program, diags: &mut DiagnosticEngine) -> Result<String, CompileError> {
    let mut table = hierarchy::build(program, diags)?;
    features::collect(&mut table, program, diags)?;
    let annotations = typecheck::check(&table, program, diags)?;
    layout::arrange(&mut table);
    Ok(codegen::generate(&table, &annotations))
}

//! x86-64 GNU-`as` assembly emission (spec.md §4.5/§6), grounded throughout
//! on `examples/original_source/src/cg.cc`/`cg.hh`. Emission happens in a
//! single pass over an already laid-out `ClassTable`: prototypes, method
//! (dispatch) tables and the class-id-indexed `prototype_table` first, then
//! every user-written method body, then the hand-written built-in runtime
//! and `main`, with the constant pool (accumulated incrementally by every
//! prior section) emitted last into its own `.data` block.

pub mod builtins;
pub mod constants;
pub mod expressions;
pub mod labels;
pub mod methods;
pub mod prototypes;

use crate::classtable::ClassTable;
use crate::typecheck::Annotations;
use constants::ConstantPool;
use labels::LabelGen;

pub fn generate(table: &ClassTable, annotations: &Annotations) -> String {
    let mut out = String::new();
    let mut pool = ConstantPool::new();
    let mut labels = LabelGen::new();

    out.push_str("\t.text\n");
    prototypes::emit(&mut out, table, &mut pool);
    methods::emit(&mut out, table, &mut pool, annotations, &mut labels);
    builtins::emit(&mut out, table, &mut pool);
    pool.emit(&mut out, table);

    out
}

//! Assembly label naming, shared by every `codegen` submodule so a
//! prototype, its method table, and its methods always agree on what to
//! call each other. Names follow spec.md §6's public label contract
//! (`<class>_prototype`, `<class>_method_table`, `<class>.<method>`),
//! adapted from `orig/cg.cc`'s `<class>_protObj`/`<class>_dispTab`
//! convention. A class's runtime name string is not labeled here — it is
//! interned through the shared `ConstantPool` like any other string
//! literal (see `codegen::constants::ConstantPool::class_name_label`).

use crate::classtable::{ClassId, ClassTable};

pub fn proto_label(table: &ClassTable, id: ClassId) -> String {
    format!("{}_prototype", table.get(id).name)
}

pub fn method_table_label(table: &ClassTable, id: ClassId) -> String {
    format!("{}_method_table", table.get(id).name)
}

pub fn method_label(table: &ClassTable, owner: ClassId, method: &str) -> String {
    format!("{}.{}", table.get(owner).name, method)
}

/// Monotonic label counter for branch/loop targets, threaded through a
/// whole compilation (`orig/cg.hh`'s `next_label`/`label_no` field) so every
/// generated `.L` label across the entire emitted file is unique.
#[derive(Debug, Default)]
pub struct LabelGen(u32);

impl LabelGen {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> String {
        let n = self.0;
        self.0 += 1;
        format!(".Lcoolc{n}")
    }
}

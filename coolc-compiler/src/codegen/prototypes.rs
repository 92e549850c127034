//! Object prototypes and method (dispatch) tables: spec.md §4.3/§4.5,
//! grounded on `orig/cg.cc`'s `generate_prototypes`. A prototype is the
//! zero-initialized template `Object.copy` memcpy's for every `new`; a
//! method table is a flat array of code pointers, one per vtable slot,
//! indexed identically across a class and every one of its subclasses so a
//! dynamic dispatch can always find the right code through a statically
//! known slot number.

use crate::classtable::{ClassId, ClassTable, BOOL_ID, INT_ID, STRING_ID};
use crate::codegen::constants::ConstantPool;
use crate::codegen::labels::{method_label, method_table_label, proto_label};
use crate::layout::HEADER_WORDS;

pub fn emit(out: &mut String, table: &ClassTable, pool: &mut ConstantPool) {
    for id in table.iter_ids() {
        emit_prototype(out, table, id, pool);
    }
    for id in table.iter_ids() {
        emit_method_table(out, table, id);
    }
    emit_prototype_table(out, table);
}

/// spec.md §6's `prototype_table`: a flat array of prototype pointers
/// indexed by class id, entry 0 a zero pad since id 0 (`ERROR_ID`) is never
/// a real class (spec.md §4.5, §8 invariant 2).
fn emit_prototype_table(out: &mut String, table: &ClassTable) {
    out.push_str("\t.balign 8\n");
    out.push_str("prototype_table:\n");
    out.push_str("\t.quad 0\n");
    for id in table.iter_ids() {
        out.push_str(&format!("\t.quad {}\n", proto_label(table, id)));
    }
}

/// A default-valued object of the given class, used as the per-class
/// field default (`String`→empty string, `Int`→0, `Bool`→false, anything
/// else→the null pointer spec.md §3 calls void).
fn default_operand(table: &ClassTable, pool: &mut ConstantPool, type_id: ClassId) -> String {
    if type_id == STRING_ID {
        ConstantPool::string_label(pool.intern_string(""))
    } else if type_id == INT_ID {
        ConstantPool::int_label(pool.intern_int(0))
    } else if type_id == BOOL_ID {
        "bool_constant_false".to_string()
    } else {
        let _ = table;
        "0".to_string()
    }
}

fn emit_prototype(out: &mut String, table: &ClassTable, id: ClassId, pool: &mut ConstantPool) {
    let class = table.get(id);
    let label = proto_label(table, id);
    let field_count = class.ordered_fields.len();
    // String/Int carry one extra payload word beyond their declared fields
    // (the raw bytes / the i64 value); Bool reuses that slot for its 0/1.
    let extra = if id == STRING_ID || id == INT_ID || id == BOOL_ID { 1 } else { 0 };

    out.push_str("\t.balign 8\n");
    out.push_str(&format!("{label}:\n"));
    // Object size in bytes (spec.md §4.5), not words: `Object.copy` passes
    // this straight to `malloc`/`memcpy`.
    out.push_str(&format!("\t.quad {}\n", (HEADER_WORDS + field_count + extra) * 8));
    out.push_str("\t.quad 0\n"); // GC tag, reserved and unused (SPEC_FULL.md §9 Open Question 7)
    out.push_str(&format!("\t.quad {}\n", id.0));
    let name_idx = pool.intern_string(&class.name);
    out.push_str(&format!("\t.quad {}\n", ConstantPool::string_label(name_idx)));
    out.push_str(&format!("\t.quad {}\n", method_table_label(table, id)));
    for name in &class.ordered_fields {
        let type_id = class
            .fields
            .get(name)
            .map(|f| f.type_id)
            .unwrap_or(crate::classtable::OBJECT_ID);
        out.push_str(&format!("\t.quad {}\n", default_operand(table, pool, type_id)));
    }
    if id == STRING_ID {
        let empty = pool.intern_string("");
        out.push_str(&format!("\t.quad {}\n", ConstantPool::string_data_label(empty)));
    } else if id == INT_ID || id == BOOL_ID {
        out.push_str("\t.quad 0\n");
    }
}

fn emit_method_table(out: &mut String, table: &ClassTable, id: ClassId) {
    let class = table.get(id);
    let label = method_table_label(table, id);
    out.push_str("\t.balign 8\n");
    out.push_str(&format!("{label}:\n"));
    for name in &class.ordered_methods {
        let owner = *class.method_owner.get(name).unwrap_or(&id);
        out.push_str(&format!("\t.quad {}\n", method_label(table, owner, name)));
    }
}

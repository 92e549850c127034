//! Per-method emission: prologue, scope setup, epilogue. spec.md §4.5's
//! calling convention, grounded on `orig/cg.cc`'s `generate_methods`/
//! `generate_class_methods` and `orig/cg.hh`'s `CodeGenerator` fields
//! (`scope`, `selfClass`, `offset_rbp`). The per-`ExprKind` instruction
//! sequences themselves live in `codegen::expressions`; this module only
//! wires a method body's field/formal bindings into the shared scope stack
//! before handing it off.

use crate::classtable::{ClassId, ClassTable, MethodInfo, OBJECT_ID};
use crate::codegen::constants::ConstantPool;
use crate::codegen::expressions;
use crate::codegen::labels::{method_label, LabelGen};
use crate::layout::HEADER_WORDS;
use crate::scope::Scope;
use crate::typecheck::Annotations;

/// Threaded through a single method body's emission: the class table and
/// constant pool (read-only and accumulating, respectively), the scope
/// stack mapping a name to its storage operand, which class is being
/// compiled (self-dispatch without an explicit receiver resolves against
/// this), the shared monotonic label counter, and the shadow `offset_rbp`
/// counter `Let`/`Case` use to name their stack slots (spec.md §4.5).
pub struct EmitCtx<'a> {
    pub table: &'a ClassTable,
    pub pool: &'a mut ConstantPool,
    pub annotations: &'a Annotations,
    pub scope: Scope<String>,
    pub self_class: ClassId,
    pub labels: &'a mut LabelGen,
    pub offset_rbp: usize,
}

/// Emits every class's own methods that carry a body: user-written methods
/// and each class's synthesized `__init__` (except `Object`'s, whose
/// `__init__` is the hand-written identity in `codegen::builtins`). A
/// class's `methods` map holds only what it itself declares — inherited
/// names live in `ordered_methods`/`method_slot` instead — so no override
/// filtering is needed here.
pub fn emit(
    out: &mut String,
    table: &ClassTable,
    pool: &mut ConstantPool,
    annotations: &Annotations,
    labels: &mut LabelGen,
) {
    for id in table.iter_ids() {
        let mut names: Vec<&String> = table.get(id).methods.keys().collect();
        names.sort();
        for name in names {
            let method = &table.get(id).methods[name];
            if method.body.is_none() {
                continue; // hand-written in codegen::builtins
            }
            emit_method(out, table, pool, annotations, labels, id, method);
        }
    }
}

fn emit_method(
    out: &mut String,
    table: &ClassTable,
    pool: &mut ConstantPool,
    annotations: &Annotations,
    labels: &mut LabelGen,
    class_id: ClassId,
    method: &MethodInfo,
) {
    let label = method_label(table, class_id, &method.name);
    out.push_str(&format!("\t.globl {label}\n"));
    out.push_str(&format!("{label}:\n"));
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");

    let mut ctx = EmitCtx {
        table,
        pool,
        annotations,
        scope: Scope::new(),
        self_class: class_id,
        labels,
        offset_rbp: 0,
    };
    ctx.scope.enter();

    // Fields live at fixed offsets off `%rbx` (always `self`), identical
    // for every class that inherits them — spec.md §4.3's layout.
    let class = table.get(class_id);
    for (i, name) in class.ordered_fields.iter().enumerate() {
        ctx.scope
            .add(name.clone(), format!("{}(%rbx)", 8 * (HEADER_WORDS + i)));
    }
    // Formals were pushed right-to-left by the caller, so the first formal
    // sits nearest `%rbp` (spec.md §4.5).
    for (i, formal) in method.formals.iter().enumerate() {
        ctx.scope.add(formal.name.clone(), format!("{}(%rbp)", 16 + 8 * i));
    }

    if let Some(body) = &method.body {
        expressions::emit_expr(&mut ctx, out, body);
    } else {
        // Unreachable: `emit` only calls this when `body.is_some()`, but an
        // empty result keeps codegen total if that guarantee ever slips.
        let _ = OBJECT_ID;
    }
    ctx.scope.exit();

    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n");
}

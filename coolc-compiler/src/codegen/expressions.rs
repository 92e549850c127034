//! Per-expression x86-64 emission: spec.md §4.5's "per-expression emission
//! sketch". Every `ExprKind` is one visitor arm; on return from `emit_expr`
//! the expression's value (an untagged object pointer, or for `Invoke`'s
//! argument-count arithmetic the raw pop/push bookkeeping) is in `%rax`.
//! Grounded directly on spec.md §4.5's prose plus the register/stack
//! conventions captured from `orig/cg.cc`'s hand-written runtime methods
//! (there is no surviving `Expression::generate` implementation in
//! `examples/original_source` to transcribe instruction-for-instruction).

use coolc_ast::{CaseBranch, Expr, ExprKind};

use crate::classtable::{ClassId, ClassTable, BOOL_ID, INT_ID, STRING_ID};
use crate::codegen::constants::ConstantPool;
use crate::codegen::labels::{method_table_label, proto_label};
use crate::codegen::methods::EmitCtx;

pub fn emit_expr(ctx: &mut EmitCtx, out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Void => out.push_str("\tmovq $0, %rax\n"),
        ExprKind::IntConst(n) => {
            let i = ctx.pool.intern_int(*n);
            out.push_str(&format!("\tmovq ${}, %rax\n", ConstantPool::int_label(i)));
        }
        ExprKind::StrConst(s) => {
            let i = ctx.pool.intern_string(s);
            out.push_str(&format!("\tmovq ${}, %rax\n", ConstantPool::string_label(i)));
        }
        ExprKind::BoolConst(b) => {
            out.push_str(&format!(
                "\tmovq ${}, %rax\n",
                if *b { "bool_constant_true" } else { "bool_constant_false" }
            ));
        }
        ExprKind::Var(name) if name == "self" => out.push_str("\tmovq %rbx, %rax\n"),
        ExprKind::Var(name) => {
            let operand = ctx.scope.find(name).unwrap_or_else(|| "%rbx".to_string());
            out.push_str(&format!("\tmovq {operand}, %rax\n"));
        }
        ExprKind::Assign { name, value } => {
            emit_expr(ctx, out, value);
            let operand = ctx.scope.find(name).unwrap_or_else(|| "%rbx".to_string());
            out.push_str(&format!("\tmovq %rax, {operand}\n"));
        }
        ExprKind::New { type_name } => {
            let type_id = ctx.table.id_of(type_name).unwrap_or(crate::classtable::OBJECT_ID);
            emit_new(out, ctx.table, type_id);
        }
        ExprKind::IsVoid(e) => {
            emit_expr(ctx, out, e);
            emit_bool_from_zero_test(ctx, out, "je");
        }
        ExprKind::Add(a, b) => emit_arith(ctx, out, "addq", a, b),
        ExprKind::Sub(a, b) => emit_arith(ctx, out, "subq", a, b),
        ExprKind::Mul(a, b) => emit_arith(ctx, out, "imulq", a, b),
        ExprKind::Div(a, b) => emit_div(ctx, out, a, b),
        ExprKind::Neg(e) => {
            emit_expr(ctx, out, e);
            out.push_str("\tmovq 40(%rax), %rax\n");
            out.push_str("\tnegq %rax\n");
            emit_box_int(out);
        }
        ExprKind::LessThan(a, b) => emit_compare(ctx, out, "jl", a, b),
        ExprKind::LessOrEqual(a, b) => emit_compare(ctx, out, "jle", a, b),
        ExprKind::Equal(a, b) => emit_compare(ctx, out, "je", a, b),
        ExprKind::Not(e) => {
            emit_expr(ctx, out, e);
            out.push_str("\tmovq 40(%rax), %rax\n");
            emit_bool_from_zero_test(ctx, out, "je");
        }
        ExprKind::If { predicate, then_branch, else_branch } => {
            emit_expr(ctx, out, predicate);
            out.push_str("\tmovq 40(%rax), %rax\n");
            out.push_str("\tcmpq $0, %rax\n");
            let l_else = ctx.labels.next();
            let l_end = ctx.labels.next();
            out.push_str(&format!("\tje {l_else}\n"));
            emit_expr(ctx, out, then_branch);
            out.push_str(&format!("\tjmp {l_end}\n"));
            out.push_str(&format!("{l_else}:\n"));
            emit_expr(ctx, out, else_branch);
            out.push_str(&format!("{l_end}:\n"));
        }
        ExprKind::While { predicate, body } => {
            let l_start = ctx.labels.next();
            let l_end = ctx.labels.next();
            out.push_str(&format!("{l_start}:\n"));
            emit_expr(ctx, out, predicate);
            out.push_str("\tmovq 40(%rax), %rax\n");
            out.push_str("\tcmpq $0, %rax\n");
            out.push_str(&format!("\tje {l_end}\n"));
            emit_expr(ctx, out, body);
            out.push_str(&format!("\tjmp {l_start}\n"));
            out.push_str(&format!("{l_end}:\n"));
            // SPEC_FULL.md §9 Open Question 2: a `While`'s runtime value is
            // always the raw `0`, never read by well-typed code.
            out.push_str("\tmovq $0, %rax\n");
        }
        ExprKind::Block(exprs) => {
            for e in exprs {
                emit_expr(ctx, out, e);
            }
        }
        ExprKind::Let { name, type_name, init, body } => emit_let(ctx, out, name, type_name, init, body),
        ExprKind::Case { scrutinee, branches } => emit_case(ctx, out, scrutinee, branches),
        ExprKind::Invoke { receiver, static_type, method, args } => {
            emit_invoke(ctx, out, receiver, static_type.as_deref(), method, args)
        }
    }
}

/// Leaves `bool_constant_true` in `%rax` if the just-computed `cmpq $0,
/// %rax` took the given conditional jump, `bool_constant_false` otherwise —
/// the shared tail of `IsVoid`/`Not`/comparisons (spec.md §4.5: "emit a
/// compare-and-jump producing `bool_constant_true`/`false`").
fn emit_bool_from_zero_test(ctx: &mut EmitCtx, out: &mut String, jump: &str) {
    let l_true = ctx.labels.next();
    let l_end = ctx.labels.next();
    out.push_str(&format!("\t{jump} {l_true}\n"));
    out.push_str("\tmovq $bool_constant_false, %rax\n");
    out.push_str(&format!("\tjmp {l_end}\n"));
    out.push_str(&format!("{l_true}:\n"));
    out.push_str("\tmovq $bool_constant_true, %rax\n");
    out.push_str(&format!("{l_end}:\n"));
}

/// `rax = Int.__new__(rax)`: box a raw 64-bit value as an `Int` object.
/// `Int.__new__` saves/restores `%rbx` internally (`codegen::builtins`), so
/// arithmetic doesn't need to protect `self` around this call itself.
fn emit_box_int(out: &mut String) {
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\tcall Int.__new__\n");
}

/// Evaluates `rhs` then `lhs` (rhs pushed as scratch, popped back after lhs
/// is in `%rax`), unboxes both payloads, leaves `%rax` = lhs payload,
/// `%rcx` = rhs payload. The scratch push/pop is transient: it never
/// touches `offset_rbp`, since that only tracks *named* `Let`/`Case`
/// bindings addressed relative to `%rbp` (spec.md §4.5).
fn emit_operand_pair(ctx: &mut EmitCtx, out: &mut String, lhs: &Expr, rhs: &Expr) {
    emit_expr(ctx, out, rhs);
    out.push_str("\tpushq %rax\n");
    emit_expr(ctx, out, lhs);
    out.push_str("\tpopq %rcx\n");
    out.push_str("\tmovq 40(%rax), %rax\n");
    out.push_str("\tmovq 40(%rcx), %rcx\n");
}

fn emit_arith(ctx: &mut EmitCtx, out: &mut String, op: &str, lhs: &Expr, rhs: &Expr) {
    emit_operand_pair(ctx, out, lhs, rhs);
    out.push_str(&format!("\t{op} %rcx, %rax\n"));
    emit_box_int(out);
}

fn emit_div(ctx: &mut EmitCtx, out: &mut String, lhs: &Expr, rhs: &Expr) {
    emit_operand_pair(ctx, out, lhs, rhs);
    out.push_str("\tcqto\n");
    out.push_str("\tidivq %rcx\n");
    emit_box_int(out);
}

fn emit_compare(ctx: &mut EmitCtx, out: &mut String, jump: &str, lhs: &Expr, rhs: &Expr) {
    emit_operand_pair(ctx, out, lhs, rhs);
    out.push_str("\tcmpq %rcx, %rax\n");
    emit_bool_from_zero_test(ctx, out, jump);
}

fn emit_default(ctx: &mut EmitCtx, out: &mut String, type_id: ClassId) {
    if type_id == INT_ID {
        let i = ctx.pool.intern_int(0);
        out.push_str(&format!("\tmovq ${}, %rax\n", ConstantPool::int_label(i)));
    } else if type_id == STRING_ID {
        let i = ctx.pool.intern_string("");
        out.push_str(&format!("\tmovq ${}, %rax\n", ConstantPool::string_label(i)));
    } else if type_id == BOOL_ID {
        out.push_str("\tmovq $bool_constant_false, %rax\n");
    } else {
        out.push_str("\tmovq $0, %rax\n");
    }
}

fn emit_let(
    ctx: &mut EmitCtx,
    out: &mut String,
    name: &str,
    type_name: &str,
    init: &Option<Box<Expr>>,
    body: &Expr,
) {
    match init {
        Some(e) => emit_expr(ctx, out, e),
        None => {
            let type_id = ctx.table.id_of(type_name).unwrap_or(crate::classtable::OBJECT_ID);
            emit_default(ctx, out, type_id);
        }
    }
    out.push_str("\tpushq %rax\n");
    ctx.offset_rbp += 1;
    let slot = format!("-{}(%rbp)", 8 * ctx.offset_rbp);
    ctx.scope.enter();
    ctx.scope.add(name.to_string(), slot);
    emit_expr(ctx, out, body);
    ctx.scope.exit();
    out.push_str("\taddq $8, %rsp\n");
    ctx.offset_rbp -= 1;
}

/// SPEC_FULL.md §9 Open Question 3: exact class-id match in source order,
/// first match wins — not the canonical most-specific-ancestor selection.
fn emit_case(ctx: &mut EmitCtx, out: &mut String, scrutinee: &Expr, branches: &[CaseBranch]) {
    emit_expr(ctx, out, scrutinee);
    out.push_str("\tpushq %rax\n");
    ctx.offset_rbp += 1;
    let slot = format!("-{}(%rbp)", 8 * ctx.offset_rbp);

    out.push_str(&format!("\tmovq {slot}, %rax\n"));
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _case_on_void\n");

    let l_end = ctx.labels.next();
    let next_labels: Vec<String> = branches.iter().map(|_| ctx.labels.next()).collect();
    for (branch, l_next) in branches.iter().zip(&next_labels) {
        let class_id = ctx.table.id_of(&branch.type_name).unwrap_or(crate::classtable::ERROR_ID);
        out.push_str(&format!("\tmovq {slot}, %rax\n"));
        out.push_str("\tmovq 16(%rax), %rax\n");
        out.push_str(&format!("\tcmpq ${}, %rax\n", class_id.0));
        out.push_str(&format!("\tjne {l_next}\n"));
        ctx.scope.enter();
        ctx.scope.add(branch.name.clone(), slot.clone());
        emit_expr(ctx, out, &branch.body);
        ctx.scope.exit();
        out.push_str(&format!("\tjmp {l_end}\n"));
        out.push_str(&format!("{l_next}:\n"));
    }
    out.push_str("\tjmp _case_no_match\n");
    out.push_str(&format!("{l_end}:\n"));
    out.push_str("\taddq $8, %rsp\n");
    ctx.offset_rbp -= 1;
}

fn emit_invoke(
    ctx: &mut EmitCtx,
    out: &mut String,
    receiver: &Option<Box<Expr>>,
    static_type: Option<&str>,
    method: &str,
    args: &[Expr],
) {
    out.push_str("\tpushq %rbx\n");
    for arg in args.iter().rev() {
        emit_expr(ctx, out, arg);
        out.push_str("\tpushq %rax\n");
    }
    match receiver {
        Some(r) => emit_expr(ctx, out, r),
        None => out.push_str("\tmovq %rbx, %rax\n"),
    }
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _invoke_on_void\n");

    // SPEC_FULL.md §9 Open Question 5: static dispatch type-checks against
    // `T` but always emits through `T`'s own method table, ignoring the
    // receiver's dynamic class — by design, not a bug.
    let slot = match static_type {
        Some(t) => {
            let type_id = ctx.table.id_of(t).unwrap_or(crate::classtable::OBJECT_ID);
            out.push_str(&format!("\tmovq ${}, %rcx\n", method_table_label(ctx.table, type_id)));
            ctx.table.get(type_id).method_slot.get(method).copied().unwrap_or(0)
        }
        None => {
            let dispatch_type = match receiver {
                Some(r) => ctx.annotations.type_of(r.id),
                None => ctx.self_class,
            };
            out.push_str("\tmovq 32(%rax), %rcx\n");
            ctx.table.get(dispatch_type).method_slot.get(method).copied().unwrap_or(0)
        }
    };
    out.push_str("\tmovq %rax, %rbx\n");
    out.push_str(&format!("\tcall *{}(%rcx)\n", slot * 8));
    if !args.is_empty() {
        out.push_str(&format!("\taddq ${}, %rsp\n", 8 * args.len()));
    }
    out.push_str("\tpopq %rbx\n");
}

/// `New T`: copy `T`'s prototype through `T`'s own method table (dynamic,
/// vtable-indexed, per spec.md §4.5: "`New T` calls `T_method_table
/// [copy_slot]`"), then run `__init__` the same way. Shared by
/// `ExprKind::New` and `codegen::builtins::emit_main`'s allocation of the
/// initial `Main` instance, since both are the exact same sequence.
pub fn emit_new(out: &mut String, table: &ClassTable, type_id: ClassId) {
    out.push_str("\tpushq %rbx\n");
    out.push_str(&format!("\tmovq ${}, %rbx\n", proto_label(table, type_id)));
    let table_label = method_table_label(table, type_id);
    let copy_slot = table
        .get(crate::classtable::OBJECT_ID)
        .method_slot
        .get("copy")
        .copied()
        .unwrap_or(0);
    out.push_str(&format!("\tmovq ${table_label}, %rcx\n"));
    out.push_str(&format!("\tcall *{}(%rcx)\n", copy_slot * 8));
    out.push_str("\tmovq %rax, %rbx\n");
    let init_slot = table.get(type_id).method_slot.get("__init__").copied().unwrap_or(0);
    out.push_str(&format!("\tmovq ${table_label}, %rcx\n"));
    out.push_str(&format!("\tcall *{}(%rcx)\n", init_slot * 8));
    out.push_str("\tpopq %rbx\n");
}

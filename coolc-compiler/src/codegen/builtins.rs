//! The hand-written runtime: every built-in method body spec.md §4.5 says
//! is "hand-written" rather than compiled from a COOL expression tree, plus
//! the fatal trampolines and `main`. Every instruction sequence here is
//! adapted line-for-line from `examples/original_source/src/cg.cc`'s
//! `generate_object_methods`/`generate_string_methods`/
//! `generate_int_methods`/`generate_bool_methods`/`generate_io_methods`/
//! `generate_system_methods` — the one part of codegen where spec.md
//! explicitly defers to the original's exact register shuffle (SPEC_FULL.md
//! §4) rather than leaving the sequence to this crate's judgment.

use crate::classtable::{ClassTable, INT_ID, OBJECT_ID, STRING_ID};
use crate::codegen::constants::ConstantPool;
use crate::codegen::expressions::emit_new;
use crate::codegen::labels::proto_label;

pub fn emit(out: &mut String, table: &ClassTable, pool: &mut ConstantPool) {
    emit_object_methods(out);
    emit_string_methods(out, table, pool);
    emit_int_methods(out, table, pool);
    emit_bool_methods(out);
    emit_io_methods(out, pool);
    emit_system_methods(out, pool);
    emit_main(out, table);
}

fn emit_object_methods(out: &mut String) {
    out.push_str("Object.__init__:\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tret\n\n");

    // `Object.copy`: `malloc` the header-declared size, `memcpy` the
    // prototype over it. The only built-in that touches libc directly
    // without going through a `*.__new__` helper, so it owns the 16-byte
    // stack realignment itself.
    out.push_str("Object.copy:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq 0(%rbx), %rdi\n");
    out.push_str("\tcall malloc\n");
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _error\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tsubq $8, %rsp\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\tmovq %rbx, %rsi\n");
    out.push_str("\tmovq 0(%rbx), %rdx\n");
    out.push_str("\tcall memcpy\n");
    out.push_str("\taddq $8, %rsp\n");
    out.push_str("\tpopq %rax\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    out.push_str("Object.abort:\n");
    out.push_str("\tjmp _abort\n\n");

    out.push_str("Object.type_name:\n");
    out.push_str("\tmovq 24(%rbx), %rax\n");
    out.push_str("\tret\n\n");
}

fn emit_string_methods(out: &mut String, table: &ClassTable, pool: &mut ConstantPool) {
    out.push_str("String.__init__:\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tret\n\n");

    out.push_str("String.length:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq 40(%rbx), %rdi\n");
    out.push_str("\tcall strlen\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    // str3 <- str1.concat(str2): str2 is the sole formal, at 16(%rbp).
    out.push_str("String.concat:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq 16(%rbp), %rdi\n");
    out.push_str("\tmovq 40(%rdi), %rdi\n");
    out.push_str("\tcall strlen\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tmovq 40(%rbx), %rdi\n");
    out.push_str("\tcall strlen\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\tpopq %rax\n");
    out.push_str("\tpopq %rax\n");
    out.push_str("\taddq %rax, %rdi\n");
    out.push_str("\tincq %rdi\n");
    out.push_str("\tcall malloc\n");
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _error\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\tmovq 40(%rbx), %rsi\n");
    out.push_str("\tcall strcpy\n");
    out.push_str("\tmovq (%rsp), %rdi\n");
    out.push_str("\tmovq 16(%rbp), %rsi\n");
    out.push_str("\tmovq 40(%rsi), %rsi\n");
    out.push_str("\tcall strcat\n");
    out.push_str("\tpopq %rdi\n");
    out.push_str("\tpopq %rdi\n");
    out.push_str("\tcall String.__new__\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    // str2 <- str1.substr(begin, end): half-open [begin, end) (SPEC_FULL.md
    // §9 Open Question 4 — not the canonical (start, length) pair).
    let empty_label = ConstantPool::string_label(pool.intern_string(""));
    out.push_str("String.substr:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq 40(%rbx), %rdi\n");
    out.push_str("\tcall strlen\n");
    out.push_str("\tmovq 16(%rbp), %rdi\n");
    out.push_str("\tmovq 40(%rdi), %rdi\n");
    out.push_str("\tmovq 24(%rbp), %rsi\n");
    out.push_str("\tmovq 40(%rsi), %rsi\n");
    out.push_str("\tcmpq %rax, %rdi\n");
    out.push_str("\tjae 3f\n");
    out.push_str("\tcmpq %rax, %rsi\n");
    out.push_str("\tjbe 1f\n");
    out.push_str("\tmovq %rax, %rsi\n");
    out.push_str("1:\n");
    out.push_str("\tcmpq %rdi, %rsi\n");
    out.push_str("\tjbe 3f\n");
    out.push_str("\tpushq %rdi\n");
    out.push_str("\tsubq %rdi, %rsi\n");
    out.push_str("\tincq %rsi\n");
    out.push_str("\tpushq %rsi\n");
    out.push_str("\tmovq %rsi, %rdi\n");
    out.push_str("\tcall malloc\n");
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _error\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\txorq %rsi, %rsi\n");
    out.push_str("\tmovq 16(%rsp), %rdx\n");
    out.push_str("\tcall memset\n");
    out.push_str("\tmovq 8(%rsp), %rdi\n");
    out.push_str("\tmovq 16(%rsp), %rdx\n");
    out.push_str("\tdecq %rdx\n");
    out.push_str("\tmovq 24(%rsp), %rsi\n");
    out.push_str("\taddq 40(%rbx), %rsi\n");
    out.push_str("\tcall memcpy\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\taddq $32, %rsp\n");
    out.push_str("\tcall String.__new__\n");
    out.push_str("\tjmp 4f\n");
    out.push_str("3:\n");
    out.push_str(&format!("\tmovq ${empty_label}, %rax\n"));
    out.push_str("4:\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    out.push_str("String.to_int:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq 40(%rbx), %rdi\n");
    out.push_str("\tcall atol\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str("\tcall Int.__new__\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    emit_new_helper(out, table, "String", STRING_ID);
}

fn emit_int_methods(out: &mut String, table: &ClassTable, pool: &mut ConstantPool) {
    out.push_str("Int.__init__:\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tret\n\n");

    let fmt_label = ConstantPool::string_data_label(pool.intern_string("%ld"));
    out.push_str("Int.to_string:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tmovq $32, %rdi\n");
    out.push_str("\tcall malloc\n");
    out.push_str("\tcmpq $0, %rax\n");
    out.push_str("\tje _error\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tpushq %rax\n");
    out.push_str("\tmovq %rax, %rdi\n");
    out.push_str(&format!("\tmovq ${fmt_label}, %rsi\n"));
    out.push_str("\tmovq 40(%rbx), %rdx\n");
    out.push_str("\tcall sprintf\n");
    out.push_str("\tpopq %rdi\n");
    out.push_str("\tpopq %rdi\n");
    out.push_str("\tcall String.__new__\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    emit_new_helper(out, table, "Int", INT_ID);
}

fn emit_bool_methods(out: &mut String) {
    out.push_str("Bool.__init__:\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tret\n\n");
}

fn emit_io_methods(out: &mut String, pool: &mut ConstantPool) {
    out.push_str("IO.__init__:\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tret\n\n");

    out.push_str("IO.in_string:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str("\tpushq $0\n");
    out.push_str("\tpushq $0\n");
    out.push_str("\tleaq 8(%rsp), %rdi\n");
    out.push_str("\tmovq %rsp, %rsi\n");
    out.push_str("\tmovq stdin, %rdx\n");
    out.push_str("\tcall getline\n");
    out.push_str("\tpop %rdi\n");
    out.push_str("\tpop %rdi\n");
    out.push_str("\tcall String.__new__\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");

    let fmt_label = ConstantPool::string_data_label(pool.intern_string("%s"));
    out.push_str("IO.out_string:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str(&format!("\tmovq ${fmt_label}, %rdi\n"));
    out.push_str("\tmovq 16(%rbp), %rsi\n");
    out.push_str("\tmovq 40(%rsi), %rsi\n");
    out.push_str("\tcall printf\n");
    out.push_str("\tmovq %rbx, %rax\n");
    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");
}

/// `String.__new__`/`Int.__new__`: copy the class's prototype (a direct
/// call to `Object.copy`, not a vtable-indexed one — these are
/// hand-written runtime helpers, not compiled `New` expressions, so
/// they don't go through the generalized dispatch `codegen::expressions
/// ::emit_new` uses for the COOL-level `New T` construct) and set the
/// payload from `%rdi`.
fn emit_new_helper(out: &mut String, table: &ClassTable, class_name: &str, class_id: crate::classtable::ClassId) {
    let proto = proto_label(table, class_id);
    out.push_str(&format!("{class_name}.__new__:\n"));
    out.push_str("\tpushq %rdi\n");
    out.push_str("\tpushq %rbx\n");
    out.push_str(&format!("\tmovq ${proto}, %rbx\n"));
    out.push_str("\tcall Object.copy\n");
    out.push_str("\tpopq %rbx\n");
    out.push_str("\tpopq %rdi\n");
    out.push_str("\tmovq %rdi, 40(%rax)\n");
    out.push_str("\tret\n\n");
}

fn emit_system_methods(out: &mut String, pool: &mut ConstantPool) {
    let invoke_msg = ConstantPool::string_data_label(pool.intern_string("fatal error: invoke on void\n"));
    let case_void_msg = ConstantPool::string_data_label(pool.intern_string("fatal error: case on void\n"));
    let case_match_msg = ConstantPool::string_data_label(pool.intern_string("fatal error: case no match\n"));

    out.push_str("_invoke_on_void:\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str(&format!("\tmovq ${invoke_msg}, %rdi\n"));
    out.push_str("\tmovq stderr, %rsi\n");
    out.push_str("\tcall fputs\n");
    out.push_str("\tjmp _abort\n\n");

    out.push_str("_case_on_void:\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str(&format!("\tmovq ${case_void_msg}, %rdi\n"));
    out.push_str("\tmovq stderr, %rsi\n");
    out.push_str("\tcall fputs\n");
    out.push_str("\tjmp _abort\n\n");

    out.push_str("_case_no_match:\n");
    out.push_str("\tandq $-16, %rsp\n");
    out.push_str(&format!("\tmovq ${case_match_msg}, %rdi\n"));
    out.push_str("\tmovq stderr, %rsi\n");
    out.push_str("\tcall fputs\n");
    out.push_str("\tjmp _abort\n\n");

    out.push_str("_error:\n");
    out.push_str("\txorq %rdi, %rdi\n");
    out.push_str("\tcall perror\n\n");

    out.push_str("_abort:\n");
    out.push_str("\tmovq $-1, %rdi\n");
    out.push_str("\tcall exit\n");
    out.push_str("\tjmp .\n\n");
}

/// `main`: allocate a `Main` (the same prototype-copy/`__init__` sequence
/// as any `New` expression), call `Main.main` directly (not through a
/// vtable — `Main` is never dynamically dispatched to), and return the
/// unboxed `Int` result as the process exit code.
fn emit_main(out: &mut String, table: &ClassTable) {
    let main_id = table.id_of("Main").unwrap_or(OBJECT_ID);
    out.push_str("\t.globl main\n");
    out.push_str("main:\n");
    out.push_str("\tpushq %rbp\n");
    out.push_str("\tmovq %rsp, %rbp\n");
    emit_new(out, table, main_id);
    out.push_str("\tpushq %rbx\n");
    out.push_str("\tmovq %rax, %rbx\n");
    out.push_str("\tcall Main.main\n");
    out.push_str("\tpopq %rbx\n");
    out.push_str("\tmovq 40(%rax), %rax\n");
    out.push_str("\tpopq %rbp\n");
    out.push_str("\tret\n\n");
}

//! Crate-level black-box tests for §4.2's expression type checker
//! (SPEC_FULL.md §8): each program is expected to fail typing with a
//! `CompileError::Typing`, driven through the public `compile()` entry
//! point rather than `typecheck`'s own internal `Checker`.

use coolc_ast::Program;
use coolc_compiler::{compile, CompileError};
use coolc_diagnostics::DiagnosticEngine;
use coolc_parser::Parser;

fn parse(src: &str) -> Program {
    Parser::new("test.cl", src)
        .expect("lexing should succeed")
        .parse_program()
        .expect("parsing should succeed")
}

fn compile_ok(src: &str) {
    let program = parse(src);
    let mut diags = DiagnosticEngine::new();
    if let Err(err) = compile(&program, &mut diags) {
        panic!("expected compilation to succeed, got {err}: {diags:?}");
    }
}

fn compile_err(src: &str) -> CompileError {
    let program = parse(src);
    let mut diags = DiagnosticEngine::new();
    compile(&program, &mut diags).expect_err("expected compilation to fail")
}

#[test]
fn mismatched_assign_type_is_a_typing_error() {
    let err = compile_err(
        r#"
        class Main {
            x: Int <- "not an int";
            main(): Int { 0 };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

#[test]
fn undefined_variable_is_a_typing_error() {
    let err = compile_err(
        r#"
        class Main {
            main(): Int { nope };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

#[test]
fn wrong_argument_count_is_a_typing_error() {
    let err = compile_err(
        r#"
        class Main {
            helper(x: Int): Int { x };
            main(): Int { helper(1, 2) };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

#[test]
fn wrong_argument_type_is_a_typing_error() {
    let err = compile_err(
        r#"
        class Main {
            helper(x: Int): Int { x };
            main(): Int { helper("oops") };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

#[test]
fn non_int_operand_to_arithmetic_is_a_typing_error() {
    let err = compile_err(
        r#"
        class Main {
            main(): Int { 1 + "two" };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

#[test]
fn if_branches_type_check_to_their_least_upper_bound() {
    // A and B are unrelated except through Object, so the LUB of the two
    // branches (spec.md §4.4) is Object, which the Bool-typed main body
    // isn't expected to accept directly — only that the whole program
    // still type checks since the if's result is discarded in a block.
    compile_ok(
        r#"
        class A {};
        class B {};
        class Main {
            main(): Int {
                {
                    if true then (new A) else (new B) fi;
                    0;
                }
            };
        };
        "#,
    );
}

#[test]
fn static_dispatch_to_a_non_ancestor_type_is_a_typing_error() {
    let err = compile_err(
        r#"
        class A {};
        class B {};
        class Main {
            main(): Int { (new A)@B.abort() };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Typing(_)));
}

//! Crate-level black-box tests for §4.1's hierarchy/feature phase
//! (SPEC_FULL.md §8): drives the full pipeline through the public
//! `compile()` entry point and asserts on the diagnostics/`CompileError`
//! the phase produces, rather than reaching into `hierarchy`/`features`
//! internals (those have their own `#[cfg(test)]` unit tests).

use coolc_ast::Program;
use coolc_compiler::{classtable::ClassId, compile, CompileError};
use coolc_diagnostics::DiagnosticEngine;
use coolc_parser::Parser;

fn parse(src: &str) -> Program {
    Parser::new("test.cl", src)
        .expect("lexing should succeed")
        .parse_program()
        .expect("parsing should succeed")
}

fn compile_err(src: &str) -> CompileError {
    let program = parse(src);
    let mut diags = DiagnosticEngine::new();
    compile(&program, &mut diags).expect_err("expected compilation to fail")
}

#[test]
fn missing_main_class_is_an_entry_error() {
    let err = compile_err(
        r#"
        class A {};
        "#,
    );
    assert!(matches!(err, CompileError::Entry(_)));
}

#[test]
fn main_with_wrong_arity_is_an_entry_error() {
    let err = compile_err(
        r#"
        class Main {
            main(x: Int): Int { x };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Entry(_)));
}

#[test]
fn main_with_wrong_return_type_is_an_entry_error() {
    let err = compile_err(
        r#"
        class Main {
            main(): Bool { true };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Entry(_)));
}

#[test]
fn inheriting_from_int_is_a_hierarchy_error() {
    let err = compile_err(
        r#"
        class A inherits Int {};
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Hierarchy(_)));
}

#[test]
fn duplicate_class_name_is_a_hierarchy_error() {
    let err = compile_err(
        r#"
        class A {};
        class A {};
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Hierarchy(_)));
}

#[test]
fn undefined_parent_is_a_hierarchy_error() {
    let err = compile_err(
        r#"
        class A inherits Nonexistent {};
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Hierarchy(_)));
}

#[test]
fn two_class_parent_cycle_is_a_hierarchy_error() {
    let err = compile_err(
        r#"
        class A inherits B {};
        class B inherits A {};
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Hierarchy(_)));
}

#[test]
fn undefined_type_in_a_field_is_a_feature_error() {
    let err = compile_err(
        r#"
        class Main {
            x: Nonexistent;
            main(): Int { 0 };
        };
        "#,
    );
    assert!(matches!(err, CompileError::Features(_)));
}

#[test]
fn duplicate_method_name_is_a_feature_error() {
    let err = compile_err(
        r#"
        class A {
            m(): Int { 0 };
            m(): Int { 1 };
        };
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Features(_)));
}

#[test]
fn override_with_mismatched_signature_is_a_feature_error() {
    let err = compile_err(
        r#"
        class A {
            m(x: Int): Int { x };
        };
        class B inherits A {
            m(x: Bool): Int { 0 };
        };
        class Main { main(): Int { 0 }; };
        "#,
    );
    assert!(matches!(err, CompileError::Features(_)));
}

#[test]
fn builtin_class_ids_are_assigned_in_spec_order() {
    // spec.md §4.3: Object, String, Int, Bool, IO at ids 1..5, then user
    // classes in declaration order from 6.
    let program = parse(
        r#"
        class Main { main(): Int { 0 }; };
        "#,
    );
    let mut diags = DiagnosticEngine::new();
    let table = coolc_compiler::hierarchy::build(&program, &mut diags).expect("hierarchy builds");
    assert_eq!(table.id_of("Object"), Some(ClassId(1)));
    assert_eq!(table.id_of("String"), Some(ClassId(2)));
    assert_eq!(table.id_of("Int"), Some(ClassId(3)));
    assert_eq!(table.id_of("Bool"), Some(ClassId(4)));
    assert_eq!(table.id_of("IO"), Some(ClassId(5)));
    assert_eq!(table.id_of("Main"), Some(ClassId(6)));
}

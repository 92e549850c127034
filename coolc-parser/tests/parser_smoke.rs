use coolc_ast::{ExprKind, Feature};
use coolc_parser::Parser;

fn parse(src: &str) -> coolc_ast::Program {
    Parser::new("test.cl", src)
        .expect("lexing should succeed")
        .parse_program()
        .expect("parsing should succeed")
}

#[test]
fn parses_minimal_main_class() {
    let program = parse(
        r#"
        class Main {
            main(): Int { 0 };
        };
        "#,
    );
    assert_eq!(program.classes.len(), 1);
    assert_eq!(program.classes[0].name, "Main");
    assert_eq!(program.classes[0].features.len(), 1);
}

#[test]
fn parses_inheritance_and_fields() {
    let program = parse(
        r#"
        class A inherits IO {
            x : Int <- 5;
            get_x(): Int { x };
        };
        "#,
    );
    let class = &program.classes[0];
    assert_eq!(class.parent_name.as_deref(), Some("IO"));
    match &class.features[0] {
        Feature::Field(f) => assert_eq!(f.name, "x"),
        _ => panic!("expected a field"),
    }
}

#[test]
fn arithmetic_precedence_groups_mul_before_add() {
    let program = parse(
        r#"
        class Main {
            main(): Int { 2 + 3 * 4 };
        };
        "#,
    );
    let Feature::Method(m) = &program.classes[0].features[0] else {
        panic!("expected a method")
    };
    match &m.body.kind {
        ExprKind::Add(lhs, rhs) => {
            assert!(matches!(lhs.kind, ExprKind::IntConst(2)));
            assert!(matches!(rhs.kind, ExprKind::Mul(_, _)));
        }
        other => panic!("expected Add at the top, got {other:?}"),
    }
}

#[test]
fn dispatch_chain_and_static_dispatch() {
    let program = parse(
        r#"
        class Main {
            main(): Int {
                (new A)@A.m(1, 2).length()
            };
        };
        "#,
    );
    let Feature::Method(m) = &program.classes[0].features[0] else {
        panic!("expected a method")
    };
    match &m.body.kind {
        ExprKind::Invoke { method, receiver, .. } => {
            assert_eq!(method, "length");
            let Some(inner) = receiver else {
                panic!("expected a receiver")
            };
            match &inner.kind {
                ExprKind::Invoke {
                    method,
                    static_type,
                    args,
                    ..
                } => {
                    assert_eq!(method, "m");
                    assert_eq!(static_type.as_deref(), Some("A"));
                    assert_eq!(args.len(), 2);
                }
                other => panic!("expected inner Invoke, got {other:?}"),
            }
        }
        other => panic!("expected Invoke, got {other:?}"),
    }
}

#[test]
fn let_with_multiple_bindings_desugars_to_nested_lets() {
    let program = parse(
        r#"
        class Main {
            main(): Int { let a: Int <- 1, b: Int <- 2 in a + b };
        };
        "#,
    );
    let Feature::Method(m) = &program.classes[0].features[0] else {
        panic!("expected a method")
    };
    match &m.body.kind {
        ExprKind::Let { name, body, .. } => {
            assert_eq!(name, "a");
            assert!(matches!(body.kind, ExprKind::Let { .. }));
        }
        other => panic!("expected Let, got {other:?}"),
    }
}

#[test]
fn case_expression_parses_all_branches() {
    let program = parse(
        r#"
        class Main {
            main(): Int {
                case (new Object) of
                    x: Int => 1;
                    y: String => 2;
                esac
            };
        };
        "#,
    );
    let Feature::Method(m) = &program.classes[0].features[0] else {
        panic!("expected a method")
    };
    match &m.body.kind {
        ExprKind::Case { branches, .. } => assert_eq!(branches.len(), 2),
        other => panic!("expected Case, got {other:?}"),
    }
}

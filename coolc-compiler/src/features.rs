//! Feature collector: spec.md §4.1's second half. Per class, partitions
//! declared features into `name→field`/`name→method` maps, validates every
//! referenced type, and checks override compatibility against ancestors.
//! Finishes with the `Main.main` entry-point check, which spec.md §7 says
//! raises immediately rather than accumulating like the rest of this phase.
//! Grounded on `orig/sa.cc`'s feature-collection loop in
//! `build_and_check_class_hierarchy`; error text matches it verbatim.

use coolc_ast::{Feature, Program};
use coolc_diagnostics::{error_codes, fuzzy, DiagnosticEngine};

use crate::classtable::{ClassTable, FieldInfo, FormalInfo, MethodInfo, ReturnType};
use crate::CompileError;

pub fn collect(
    table: &mut ClassTable,
    program: &Program,
    diags: &mut DiagnosticEngine,
) -> Result<(), CompileError> {
    for cls in &program.classes {
        let Some(class_id) = table.id_of(&cls.name) else {
            continue; // discarded in hierarchy::build (duplicate/reserved name)
        };
        for feature in &cls.features {
            match feature {
                Feature::Method(m) => {
                    if table.get(class_id).methods.contains_key(&m.name) {
                        diags.emit_error(
                            error_codes::REDEFINED_METHOD,
                            format!("redefined method \"{}.{}\"", cls.name, m.name),
                            m.span.clone(),
                        );
                        continue;
                    }

                    let mut formals = Vec::with_capacity(m.formals.len());
                    for formal in &m.formals {
                        match table.id_of(&formal.type_name) {
                            Some(t) => formals.push(FormalInfo {
                                name: formal.name.clone(),
                                type_id: t,
                            }),
                            None => {
                                diags.emit_error(
                                    error_codes::UNKNOWN_TYPE,
                                    format!("unknown type \"{}\"", formal.type_name),
                                    formal.span.clone(),
                                );
                            }
                        }
                    }

                    let return_type = if m.return_type == "SELF_TYPE" {
                        Some(ReturnType::SelfType)
                    } else {
                        match table.id_of(&m.return_type) {
                            Some(t) => Some(ReturnType::Class(t)),
                            None => {
                                diags.emit_error(
                                    error_codes::UNKNOWN_TYPE,
                                    format!("unknown type \"{}\"", m.return_type),
                                    m.span.clone(),
                                );
                                None
                            }
                        }
                    };
                    let Some(return_type) = return_type else { continue };
                    if formals.len() != m.formals.len() {
                        continue; // an unresolved formal type already errored
                    }

                    table.get_mut(class_id).methods.insert(
                        m.name.clone(),
                        MethodInfo {
                            span: m.span.clone(),
                            name: m.name.clone(),
                            formals,
                            return_type,
                            body: Some(m.body.clone()),
                            owner: class_id,
                        },
                    );
                }
                Feature::Field(f) => {
                    if table.get(class_id).fields.contains_key(&f.name) {
                        diags.emit_error(
                            error_codes::REDEFINED_FIELD,
                            format!("redefined field \"{}.{}\"", cls.name, f.name),
                            f.span.clone(),
                        );
                        continue;
                    }
                    match table.id_of(&f.type_name) {
                        Some(t) => {
                            let class = table.get_mut(class_id);
                            class.own_field_order.push(f.name.clone());
                            class.fields.insert(
                                f.name.clone(),
                                FieldInfo {
                                    span: f.span.clone(),
                                    name: f.name.clone(),
                                    type_id: t,
                                    init: f.init.clone(),
                                },
                            );
                        }
                        None => {
                            diags.emit_error(
                                error_codes::UNKNOWN_TYPE,
                                format!("unknown type \"{}\"", f.type_name),
                                f.span.clone(),
                            );
                        }
                    }
                }
            }
        }
    }
    if diags.has_errors() {
        return Err(CompileError::Features(diags.error_count()));
    }

    check_overrides(table, program, diags);
    if diags.has_errors() {
        return Err(CompileError::Features(diags.error_count()));
    }

    check_entry_point(table)
}

/// An override must match its nearest ancestor definition exactly: same
/// formal count, same formal types in order, same return type (spec.md
/// §3's invariants, §4.1's override check).
fn check_overrides(table: &ClassTable, program: &Program, diags: &mut DiagnosticEngine) {
    for cls in &program.classes {
        let Some(class_id) = table.id_of(&cls.name) else { continue };
        let Some(parent_id) = table.get(class_id).parent else { continue };
        for (name, method) in &table.get(class_id).methods {
            let Some((_, parent_method)) = table.find_method(parent_id, name) else {
                continue;
            };
            if !same_signature(method, parent_method) {
                diags.emit_error(
                    error_codes::INVALID_OVERRIDE,
                    format!("invalid overriding \"{}.{}\"", cls.name, name),
                    method.span.clone(),
                );
            }
        }
    }
}

fn same_signature(a: &MethodInfo, b: &MethodInfo) -> bool {
    a.formals.len() == b.formals.len()
        && a.formals
            .iter()
            .zip(&b.formals)
            .all(|(x, y)| x.type_id == y.type_id)
        && a.return_type == b.return_type
}

/// spec.md §7: "Missing-entry conditions raise immediately" rather than
/// accumulating through the diagnostic engine like the rest of this phase.
fn check_entry_point(table: &ClassTable) -> Result<(), CompileError> {
    let Some(main_id) = table.id_of("Main") else {
        return Err(CompileError::Entry("class \"Main\" is not defined".into()));
    };
    let Some(main_method) = table.get(main_id).methods.get("main") else {
        return Err(CompileError::Entry(
            "method \"Main.main\" is not defined".into(),
        ));
    };
    if !main_method.formals.is_empty() || main_method.return_type != ReturnType::Class(crate::classtable::INT_ID)
    {
        return Err(CompileError::Entry(
            "method \"Main.main\" is invalid".into(),
        ));
    }
    Ok(())
}

/// "Did you mean?" helper shared by the type checker for unresolved type
/// names — kept here since both phases validate type names the same way.
pub fn suggest_type(table: &ClassTable, name: &str) -> Option<String> {
    fuzzy::find_similar(name, &table.class_names(), 0.7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy;
    use coolc_ast::{Class as AstClass, Expr, ExprKind, Field, Formal, Method, NodeId};
    use coolc_diagnostics::Span;

    fn void_expr() -> Expr {
        Expr::new(NodeId(0), Span::unknown(), ExprKind::Void)
    }

    fn main_class_with(extra_features: Vec<Feature>) -> AstClass {
        let mut features = vec![Feature::Method(Method {
            id: NodeId(1),
            span: Span::unknown(),
            name: "main".to_string(),
            formals: vec![],
            return_type: "Int".to_string(),
            body: Expr::new(NodeId(2), Span::unknown(), ExprKind::IntConst(0)),
        })];
        features.extend(extra_features);
        AstClass {
            span: Span::unknown(),
            name: "Main".to_string(),
            parent_name: None,
            features,
        }
    }

    #[test]
    fn well_formed_main_passes() {
        let program = Program {
            classes: vec![main_class_with(vec![])],
        };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        assert!(collect(&mut table, &program, &mut diags).is_ok());
    }

    #[test]
    fn missing_main_class_is_an_immediate_error() {
        let program = Program {
            classes: vec![AstClass {
                span: Span::unknown(),
                name: "A".to_string(),
                parent_name: None,
                features: vec![],
            }],
        };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        let err = collect(&mut table, &program, &mut diags).unwrap_err();
        assert!(matches!(err, CompileError::Entry(_)));
    }

    #[test]
    fn duplicate_field_is_an_error() {
        let mut main = main_class_with(vec![
            Feature::Field(Field {
                id: NodeId(3),
                span: Span::unknown(),
                name: "x".to_string(),
                type_name: "Int".to_string(),
                init: None,
            }),
            Feature::Field(Field {
                id: NodeId(4),
                span: Span::unknown(),
                name: "x".to_string(),
                type_name: "Int".to_string(),
                init: None,
            }),
        ]);
        main.features.push(Feature::Field(Field {
            id: NodeId(5),
            span: Span::unknown(),
            name: "_unused".to_string(),
            type_name: "Object".to_string(),
            init: Some(void_expr()),
        }));
        let program = Program { classes: vec![main] };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        assert!(collect(&mut table, &program, &mut diags).is_err());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn mismatched_override_is_rejected() {
        let a = AstClass {
            span: Span::unknown(),
            name: "A".to_string(),
            parent_name: None,
            features: vec![Feature::Method(Method {
                id: NodeId(10),
                span: Span::unknown(),
                name: "m".to_string(),
                formals: vec![],
                return_type: "Int".to_string(),
                body: Expr::new(NodeId(11), Span::unknown(), ExprKind::IntConst(1)),
            })],
        };
        let b = AstClass {
            span: Span::unknown(),
            name: "B".to_string(),
            parent_name: Some("A".to_string()),
            features: vec![Feature::Method(Method {
                id: NodeId(12),
                span: Span::unknown(),
                name: "m".to_string(),
                formals: vec![Formal {
                    span: Span::unknown(),
                    name: "extra".to_string(),
                    type_name: "Int".to_string(),
                }],
                return_type: "Int".to_string(),
                body: Expr::new(NodeId(13), Span::unknown(), ExprKind::IntConst(2)),
            })],
        };
        let program = Program {
            classes: vec![main_class_with(vec![]), a, b],
        };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        assert!(collect(&mut table, &program, &mut diags).is_err());
    }
}

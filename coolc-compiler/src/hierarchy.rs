//! Hierarchy builder: spec.md §4.1's first half — register built-ins,
//! register user classes, resolve parents, reject illegal shapes, detect
//! inheritance cycles (SPEC_FULL.md §9 Open Question 6). Grounded on
//! `orig/sa.cc`'s `build_and_check_class_hierarchy`; error message text is
//! taken from there verbatim where it names one.

use coolc_ast::Program;
use coolc_diagnostics::{error_codes, DiagnosticEngine, Span};

use crate::classtable::{
    Class, ClassId, ClassTable, FieldInfo, FormalInfo, MethodInfo, ReturnType, BOOL_ID, INT_ID,
    IO_ID, OBJECT_ID, STRING_ID,
};
use crate::CompileError;

/// Register `Object`, `String`, `Int`, `Bool`, `IO` with the method stubs
/// spec.md §6 names, in the fixed order that fixes their ids at 1..5.
/// Bodies are `None`: their implementations are the hand-written assembly
/// in `codegen::builtins`, not COOL expression trees.
fn register_builtins(table: &mut ClassTable) {
    let stub = |name: &str, formals: &[(&str, ClassId)], ret: ReturnType, owner: ClassId| {
        MethodInfo {
            span: Span::unknown(),
            name: name.to_string(),
            formals: formals
                .iter()
                .map(|(n, t)| FormalInfo {
                    name: n.to_string(),
                    type_id: *t,
                })
                .collect(),
            return_type: ret,
            body: None,
            owner,
        }
    };

    let mut object = Class::default();
    object.name = "Object".to_string();
    object.parent = None;
    object
        .methods
        .insert("copy".into(), stub("copy", &[], ReturnType::SelfType, OBJECT_ID));
    object.methods.insert(
        "abort".into(),
        stub("abort", &[], ReturnType::Class(OBJECT_ID), OBJECT_ID),
    );
    object.methods.insert(
        "type_name".into(),
        stub("type_name", &[], ReturnType::Class(STRING_ID), OBJECT_ID),
    );
    // `__init__` is never written in COOL source; it needs a method-table
    // slot like any other name, so `Object` seeds one here (identity body,
    // hand-written in `codegen::builtins`) for `layout::arrange_methods` to
    // inherit down the whole tree before any class's own synthesized
    // `__init__` reuses the slot (spec.md §4.3).
    object.methods.insert(
        "__init__".into(),
        stub("__init__", &[], ReturnType::SelfType, OBJECT_ID),
    );

    let mut string = Class::default();
    string.name = "String".to_string();
    string.parent = Some(OBJECT_ID);
    string.methods.insert(
        "length".into(),
        stub("length", &[], ReturnType::Class(INT_ID), STRING_ID),
    );
    string.methods.insert(
        "concat".into(),
        stub(
            "concat",
            &[("other", STRING_ID)],
            ReturnType::Class(STRING_ID),
            STRING_ID,
        ),
    );
    string.methods.insert(
        "substr".into(),
        stub(
            "substr",
            &[("begin", INT_ID), ("end", INT_ID)],
            ReturnType::Class(STRING_ID),
            STRING_ID,
        ),
    );
    string.methods.insert(
        "to_int".into(),
        stub("to_int", &[], ReturnType::Class(INT_ID), STRING_ID),
    );

    let mut int = Class::default();
    int.name = "Int".to_string();
    int.parent = Some(OBJECT_ID);
    int.methods.insert(
        "to_string".into(),
        stub("to_string", &[], ReturnType::Class(STRING_ID), INT_ID),
    );

    let mut boolean = Class::default();
    boolean.name = "Bool".to_string();
    boolean.parent = Some(OBJECT_ID);

    let mut io = Class::default();
    io.name = "IO".to_string();
    io.parent = Some(OBJECT_ID);
    io.methods.insert(
        "in_string".into(),
        stub("in_string", &[], ReturnType::Class(STRING_ID), IO_ID),
    );
    io.methods.insert(
        "out_string".into(),
        stub(
            "out_string",
            &[("x", STRING_ID)],
            ReturnType::SelfType,
            IO_ID,
        ),
    );

    for (id, cls) in [
        (OBJECT_ID, object),
        (STRING_ID, string),
        (INT_ID, int),
        (BOOL_ID, boolean),
        (IO_ID, io),
    ] {
        table.name_to_id.insert(cls.name.clone(), id);
        table.classes.push(cls);
    }
    // `String`/`Int`/`Bool`/`IO` set their own `parent` field above but
    // `Object.children` has to be told about them explicitly, the same way
    // pass 2 below wires up every user class's parent/children pair.
    for id in [STRING_ID, INT_ID, BOOL_ID, IO_ID] {
        table.get_mut(OBJECT_ID).children.push(id);
    }
}

pub fn build(program: &Program, diags: &mut DiagnosticEngine) -> Result<ClassTable, CompileError> {
    let mut table = ClassTable::default();
    register_builtins(&mut table);

    // Pass 1: register every non-duplicate, non-reserved user class name so
    // forward references (`class A inherits B` appearing before `class B`)
    // resolve in pass 2. `own_ids[i]` is `None` for a class discarded here
    // (duplicate name or `SELF_TYPE`) — its parent is never resolved and
    // it never gains an id.
    let mut own_ids: Vec<Option<ClassId>> = Vec::with_capacity(program.classes.len());
    for cls in &program.classes {
        if table.name_to_id.contains_key(&cls.name) {
            diags.emit_error(
                error_codes::REDEFINED_CLASS,
                format!("redefined class \"{}\"", cls.name),
                cls.span.clone(),
            );
            own_ids.push(None);
            continue;
        }
        if cls.name == "SELF_TYPE" {
            diags.emit_error(
                error_codes::RESERVED_CLASS_NAME,
                format!("invalid class name \"{}\"", cls.name),
                cls.span.clone(),
            );
            own_ids.push(None);
            continue;
        }
        let id = ClassId(table.classes.len() as u32 + 1);
        let mut c = Class::default();
        c.span = cls.span.clone();
        c.name = cls.name.clone();
        table.name_to_id.insert(c.name.clone(), id);
        table.classes.push(c);
        own_ids.push(Some(id));
    }
    if diags.has_errors() {
        return Err(CompileError::Hierarchy(diags.error_count()));
    }

    // Pass 2: resolve parents (missing `parent_name` defaults to `Object`),
    // reject `String`/`Int`/`Bool` parents, build child lists both ways.
    for (cls, own_id) in program.classes.iter().zip(&own_ids) {
        let Some(own_id) = *own_id else { continue };
        let parent_name = cls.parent_name.as_deref().unwrap_or("Object");
        let Some(parent_id) = table.name_to_id.get(parent_name).copied() else {
            diags.emit_error(
                error_codes::UNDEFINED_PARENT,
                format!("undefined class \"{}\"", cls.name),
                cls.span.clone(),
            );
            continue;
        };
        if parent_id == STRING_ID || parent_id == INT_ID || parent_id == BOOL_ID {
            diags.emit_error(
                error_codes::ILLEGAL_PARENT,
                format!("invalid parent class \"{}\"", parent_name),
                cls.span.clone(),
            );
            continue;
        }
        table.get_mut(own_id).parent = Some(parent_id);
        table.get_mut(parent_id).children.push(own_id);
    }
    if diags.has_errors() {
        return Err(CompileError::Hierarchy(diags.error_count()));
    }

    check_acyclic(&table, diags);
    if diags.has_errors() {
        return Err(CompileError::Hierarchy(diags.error_count()));
    }

    Ok(table)
}

/// SPEC_FULL.md §9 Open Question 6: walk every class's parent chain toward
/// `Object`; a chain that does not terminate within `table.len()` steps is
/// a cycle. Bounded rather than a visited-set so a self-parenting class
/// (`class A inherits A`) and a longer cycle are both caught the same way.
fn check_acyclic(table: &ClassTable, diags: &mut DiagnosticEngine) {
    for id in table.iter_ids() {
        if id == OBJECT_ID {
            continue;
        }
        let mut cur = id;
        let mut steps = 0usize;
        loop {
            match table.get(cur).parent {
                Some(p) if p == OBJECT_ID => break,
                Some(p) => {
                    cur = p;
                    steps += 1;
                    if steps > table.len() {
                        diags.emit_error(
                            error_codes::HIERARCHY_CYCLE,
                            format!(
                                "cyclic inheritance involving class \"{}\"",
                                table.get(id).name
                            ),
                            table.get(id).span.clone(),
                        );
                        break;
                    }
                }
                None => break, // reached Object itself
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolc_ast::Class as AstClass;
    use coolc_diagnostics::Span;

    fn ast_class(name: &str, parent: Option<&str>) -> AstClass {
        AstClass {
            span: Span::unknown(),
            name: name.to_string(),
            parent_name: parent.map(str::to_string),
            features: Vec::new(),
        }
    }

    #[test]
    fn builtins_get_fixed_ids() {
        let program = Program { classes: vec![ast_class("Main", None)] };
        let mut diags = DiagnosticEngine::new();
        let table = build(&program, &mut diags).unwrap();
        assert_eq!(table.id_of("Object"), Some(OBJECT_ID));
        assert_eq!(table.id_of("String"), Some(STRING_ID));
        assert_eq!(table.id_of("Int"), Some(INT_ID));
        assert_eq!(table.id_of("Bool"), Some(BOOL_ID));
        assert_eq!(table.id_of("IO"), Some(IO_ID));
        assert_eq!(table.id_of("Main"), Some(ClassId(6)));
    }

    #[test]
    fn duplicate_class_name_is_an_error() {
        let program = Program {
            classes: vec![ast_class("Main", None), ast_class("Main", None)],
        };
        let mut diags = DiagnosticEngine::new();
        assert!(build(&program, &mut diags).is_err());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn inheriting_from_int_is_illegal() {
        let program = Program {
            classes: vec![ast_class("Main", None), ast_class("Sub", Some("Int"))],
        };
        let mut diags = DiagnosticEngine::new();
        assert!(build(&program, &mut diags).is_err());
    }

    #[test]
    fn undefined_parent_is_an_error() {
        let program = Program {
            classes: vec![ast_class("Main", Some("Nope"))],
        };
        let mut diags = DiagnosticEngine::new();
        assert!(build(&program, &mut diags).is_err());
    }

    #[test]
    fn two_class_cycle_is_detected() {
        let program = Program {
            classes: vec![
                ast_class("Main", None),
                ast_class("A", Some("B")),
                ast_class("B", Some("A")),
            ],
        };
        let mut diags = DiagnosticEngine::new();
        assert!(build(&program, &mut diags).is_err());
    }

    #[test]
    fn well_formed_tree_has_no_errors() {
        let program = Program {
            classes: vec![ast_class("Main", None), ast_class("A", None), ast_class("B", Some("A"))],
        };
        let mut diags = DiagnosticEngine::new();
        let table = build(&program, &mut diags).unwrap();
        assert!(!diags.has_errors());
        let a = table.id_of("A").unwrap();
        let b = table.id_of("B").unwrap();
        assert_eq!(table.get(b).parent, Some(a));
        assert!(table.get(a).children.contains(&b));
    }
}

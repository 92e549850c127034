//! Layout arranger: spec.md §4.3. Fixes each class's field offsets and
//! method-table slots and synthesizes `__init__`. Grounded on
//! `orig/cg.cc`'s `generate_prototypes`/`generate_methods`: fields are laid
//! out parent-first so a subclass's own fields only ever extend its
//! parent's layout, and a method keeps the slot index of the ancestor
//! definition it overrides so vtables stay call-compatible up the tree.

use coolc_ast::{Expr, ExprKind, NodeId};
use coolc_diagnostics::Span;

use crate::classtable::{ClassId, ClassTable, ReturnType, OBJECT_ID};

/// Object header layout (spec.md §4.3, `orig/cg.cc`'s prototype header):
/// size in words, GC tag (always 0, reserved and unused — SPEC_FULL.md §9
/// Open Question 7), class id, pointer to the class-name string constant,
/// pointer to the method table. Fields/payload start at word 5.
pub const HEADER_WORDS: usize = 5;

pub fn arrange(table: &mut ClassTable) {
    // Pre-order (parent before child) throughout: a subclass's layout reads
    // its parent's already-computed `ordered_fields`/`ordered_methods`, so
    // processing in declaration-id order would break on a forward reference
    // (`class B inherits A` declared ahead of `class A`).
    let order = table.topo_order();
    for &id in &order {
        arrange_fields(table, id);
    }
    // `__init__` has to exist in a class's own `methods` map *before*
    // `arrange_methods` assigns slots, or the synthesized method never gets
    // one (spec.md §4.3's "every feature name gets a slot" invariant).
    for &id in &order {
        synthesize_init(table, id);
    }
    for &id in &order {
        arrange_methods(table, id);
    }
}

/// Parent-first field order so a pointer to a `B` object can always be read
/// as its `A` prefix: `ordered_fields` is the concatenation of the parent's
/// `ordered_fields` with this class's own, in declaration order.
fn arrange_fields(table: &mut ClassTable, id: ClassId) {
    let mut ordered = match table.get(id).parent {
        Some(p) => table.get(p).ordered_fields.clone(),
        None => Vec::new(),
    };
    let base = ordered.len();
    let own = table.get(id).own_field_order.clone();
    ordered.extend(own);

    let class = table.get_mut(id);
    for (i, name) in ordered.iter().enumerate().skip(base) {
        class.field_offset.insert(name.clone(), HEADER_WORDS + i);
    }
    class.ordered_fields = ordered;
}

/// Parent-first method order, but an override reuses its ancestor's slot
/// rather than appending a new one — spec.md §4.3's "vtable slot stability"
/// invariant, needed so a call through a supertype's vtable layout still
/// lands on the right code when the receiver is actually a subtype.
fn arrange_methods(table: &mut ClassTable, id: ClassId) {
    let mut ordered = match table.get(id).parent {
        Some(p) => table.get(p).ordered_methods.clone(),
        None => Vec::new(),
    };
    let mut slot = match table.get(id).parent {
        Some(p) => table.get(p).method_slot.clone(),
        None => std::collections::HashMap::new(),
    };
    let mut owner = match table.get(id).parent {
        Some(p) => table.get(p).method_owner.clone(),
        None => std::collections::HashMap::new(),
    };

    let own_names: Vec<String> = {
        let class = table.get(id);
        let mut names: Vec<String> = class.methods.keys().cloned().collect();
        names.sort(); // deterministic order for names not already inherited
        names
    };
    for name in own_names {
        if let Some(&existing_slot) = slot.get(&name) {
            owner.insert(name.clone(), id);
            let _ = existing_slot; // slot index unchanged, only the owner moves
        } else {
            slot.insert(name.clone(), ordered.len());
            owner.insert(name.clone(), id);
            ordered.push(name);
        }
    }

    let class = table.get_mut(id);
    class.ordered_methods = ordered;
    class.method_slot = slot;
    class.method_owner = owner;
}

/// `__init__` runs every field initializer in declaration order, parent's
/// first (it calls the parent's `__init__` first, then runs its own),
/// mirroring `orig/cg.cc`'s per-class init block. `Object.__init__` is the
/// hand-written identity function in `codegen::builtins`, not this
/// synthesized body, so it's skipped here.
fn synthesize_init(table: &mut ClassTable, id: ClassId) {
    if id == OBJECT_ID {
        return;
    }
    let own_fields = table.get(id).own_field_order.clone();
    let mut stmts = Vec::with_capacity(own_fields.len() + 2);
    // (a) call the parent's __init__ first, so an inherited field's own
    // initializer expression actually runs for a subclass instance instead
    // of only the static default baked into the shared prototype. This must
    // be a *static* dispatch against the parent's own method table: a
    // dynamic (vtable) self-dispatch would read the slot off the runtime
    // object's actual class, which for any instance of `id` or a further
    // subclass is `id`'s own `__init__` again (same slot, since `__init__`
    // never gets a fresh slot on override) — an infinite loop rather than a
    // call to the parent.
    let parent_name = table
        .get(table.get(id).parent.expect("non-Object class always has a parent"))
        .name
        .clone();
    stmts.push(Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::Invoke {
            receiver: None,
            static_type: Some(parent_name),
            method: "__init__".to_string(),
            args: Vec::new(),
        },
    ));
    for name in own_fields {
        let Some(field) = table.get(id).fields.get(&name).cloned() else { continue };
        let value = field.init.unwrap_or_else(|| default_value(table, field.type_id));
        stmts.push(Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::Assign {
                name: field.name,
                value: Box::new(value),
            },
        ));
    }
    stmts.push(Expr::new(NodeId(0), Span::unknown(), ExprKind::Var("self".to_string())));

    let formals = Vec::new();
    let init = crate::classtable::MethodInfo {
        span: Span::unknown(),
        name: "__init__".to_string(),
        formals,
        return_type: ReturnType::SelfType,
        body: Some(Expr::new(NodeId(0), Span::unknown(), ExprKind::Block(stmts))),
        owner: id,
    };
    table.get_mut(id).methods.insert("__init__".to_string(), init);
}

/// spec.md §4.1/§4.3's default values for an uninitialized field: `0` for
/// `Int`, `""` for `String`, `false` for `Bool`, void for everything else
/// (including `SELF_TYPE`, which a field can never actually be declared
/// since only methods may return it).
fn default_value(table: &ClassTable, type_id: ClassId) -> Expr {
    use crate::classtable::{BOOL_ID, INT_ID, STRING_ID};
    let kind = if type_id == INT_ID {
        ExprKind::IntConst(0)
    } else if type_id == STRING_ID {
        ExprKind::StrConst(String::new())
    } else if type_id == BOOL_ID {
        ExprKind::BoolConst(false)
    } else {
        let _ = table;
        ExprKind::Void
    };
    Expr::new(NodeId(0), Span::unknown(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features, hierarchy};
    use coolc_ast::{Class as AstClass, Feature, Field, Method, Program};
    use coolc_diagnostics::DiagnosticEngine;

    fn class(name: &str, parent: Option<&str>, features: Vec<Feature>) -> AstClass {
        AstClass {
            span: Span::unknown(),
            name: name.to_string(),
            parent_name: parent.map(str::to_string),
            features,
        }
    }

    fn field(name: &str, type_name: &str) -> Feature {
        Feature::Field(Field {
            id: NodeId(0),
            span: Span::unknown(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            init: None,
        })
    }

    fn method(name: &str, ret: &str) -> Feature {
        Feature::Method(Method {
            id: NodeId(0),
            span: Span::unknown(),
            name: name.to_string(),
            formals: vec![],
            return_type: ret.to_string(),
            body: Expr::new(NodeId(0), Span::unknown(), ExprKind::IntConst(0)),
        })
    }

    fn build(program: &Program) -> ClassTable {
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(program, &mut diags).unwrap();
        features::collect(&mut table, program, &mut diags).unwrap();
        arrange(&mut table);
        table
    }

    #[test]
    fn subclass_fields_extend_parent_layout() {
        let program = Program {
            classes: vec![
                class("Main", None, vec![method("main", "Int")]),
                class("A", None, vec![field("x", "Int")]),
                class("B", Some("A"), vec![field("y", "Int")]),
            ],
        };
        let table = build(&program);
        let a = table.id_of("A").unwrap();
        let b = table.id_of("B").unwrap();
        assert_eq!(table.get(a).ordered_fields, vec!["x".to_string()]);
        assert_eq!(
            table.get(b).ordered_fields,
            vec!["x".to_string(), "y".to_string()]
        );
        assert_eq!(table.get(b).field_offset["x"], HEADER_WORDS);
        assert_eq!(table.get(b).field_offset["y"], HEADER_WORDS + 1);
    }

    #[test]
    fn overriding_method_keeps_its_slot() {
        let program = Program {
            classes: vec![
                class("Main", None, vec![method("main", "Int")]),
                class("A", None, vec![method("m", "Int")]),
                class("B", Some("A"), vec![method("m", "Int")]),
            ],
        };
        let table = build(&program);
        let a = table.id_of("A").unwrap();
        let b = table.id_of("B").unwrap();
        assert_eq!(table.get(a).method_slot["m"], table.get(b).method_slot["m"]);
        assert_eq!(table.get(b).method_owner["m"], b);
        assert_eq!(table.get(b).ordered_methods.len(), table.get(a).ordered_methods.len());
    }

    #[test]
    fn init_synthesizes_field_assignments_in_order() {
        let program = Program {
            classes: vec![
                class("Main", None, vec![method("main", "Int")]),
                class("A", None, vec![field("x", "Int"), field("y", "Bool")]),
            ],
        };
        let table = build(&program);
        let a = table.id_of("A").unwrap();
        let init = table.get(a).methods.get("__init__").unwrap();
        let Some(body) = &init.body else { panic!("missing body") };
        let ExprKind::Block(stmts) = &body.kind else { panic!("expected block") };
        assert_eq!(stmts.len(), 4); // parent __init__, x, y, trailing self
        assert!(matches!(stmts[0].kind, ExprKind::Invoke { .. }));
    }
}

//! `Class`/`ClassTable`: spec.md §3's Data Model, grounded on
//! `orig/sa.hh`'s `SemanticAnalyser` fields (`name2Class`, `classes`,
//! `builtin`). A `ClassId` is a 1-based index into `ClassTable::classes`
//! (id 0 is reserved/unused per spec.md §4.3) and doubles as the runtime
//! class id written into every object header.

use std::collections::HashMap;

use coolc_ast::Expr;
use coolc_diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// A method's return type: a concrete class, or `SELF_TYPE` (legal only as
/// a return type and in a handful of expression positions — spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    SelfType,
    Class(ClassId),
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub span: Span,
    pub name: String,
    pub type_id: ClassId,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FormalInfo {
    pub name: String,
    pub type_id: ClassId,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub span: Span,
    pub name: String,
    pub formals: Vec<FormalInfo>,
    pub return_type: ReturnType,
    /// `None` for built-in methods (their bodies are hand-written assembly
    /// in `codegen::builtins`) and filled in for the synthesized `__init__`
    /// by `layout::arrange`.
    pub body: Option<Expr>,
    /// The class that defines this method, for override resolution — the
    /// most-derived class reachable that still owns this exact name.
    pub owner: ClassId,
}

#[derive(Debug, Clone, Default)]
pub struct Class {
    pub span: Span,
    pub name: String,
    pub parent: Option<ClassId>,
    pub children: Vec<ClassId>,

    pub fields: HashMap<String, FieldInfo>,
    pub methods: HashMap<String, MethodInfo>,
    /// Declaration order of this class's own features, used to order
    /// `__init__`'s field-assignment block deterministically.
    pub own_field_order: Vec<String>,

    // Populated by `layout::arrange` (spec.md §4.3).
    pub ordered_fields: Vec<String>,
    pub field_offset: HashMap<String, usize>,
    pub ordered_methods: Vec<String>,
    pub method_slot: HashMap<String, usize>,
    pub method_owner: HashMap<String, ClassId>,
}

impl Class {
    pub fn get_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }
}

pub const OBJECT_ID: ClassId = ClassId(1);
pub const STRING_ID: ClassId = ClassId(2);
pub const INT_ID: ClassId = ClassId(3);
pub const BOOL_ID: ClassId = ClassId(4);
pub const IO_ID: ClassId = ClassId(5);

/// Poison marker for a node whose type checking already produced a
/// diagnostic (spec.md §3's Error sentinel). Reuses id 0, which
/// `ClassTable` never assigns to a real class, so it can never collide
/// with a legitimate `ClassId` and callers that forget to guard against it
/// before indexing `ClassTable::get` fail loudly (index `-1` underflows)
/// rather than silently reading class 0's fields.
pub const ERROR_ID: ClassId = ClassId(0);

/// `classes[0]` is always `Object` (id 1); `classes[id.0 as usize - 1]` is
/// the general indexing rule used throughout the compiler.
#[derive(Debug, Default)]
pub struct ClassTable {
    pub classes: Vec<Class>,
    pub name_to_id: HashMap<String, ClassId>,
}

impl ClassTable {
    pub fn get(&self, id: ClassId) -> &Class {
        &self.classes[(id.0 - 1) as usize]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[(id.0 - 1) as usize]
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ClassId> {
        (1..=self.classes.len() as u32).map(ClassId)
    }

    /// Pre-order walk of the class tree starting at `Object` (spec.md
    /// §4.3's layout traversal — distinct from `iter_ids`'s declaration-id
    /// order, which a forward reference can leave out of parent-before-child
    /// order). Every class is reached exactly once since `children` forms a
    /// tree rooted at `Object`.
    pub fn topo_order(&self) -> Vec<ClassId> {
        let mut order = Vec::with_capacity(self.classes.len());
        let mut stack = vec![OBJECT_ID];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(id).children.iter().rev());
        }
        order
    }

    /// Conformance: `right` conforms to (is assignable to) `left` iff
    /// `left` appears on `right`'s parent chain, inclusive of `right`
    /// itself (spec.md §4.2, `orig/sa.cc`'s `assignable`).
    pub fn assignable(&self, left: ClassId, right: ClassId) -> bool {
        let mut p = Some(right);
        while let Some(cur) = p {
            if cur == left {
                return true;
            }
            p = self.get(cur).parent;
        }
        false
    }

    /// Least upper bound of two classes in the inheritance tree: walk two
    /// pointers toward `Object`, restarting an arm at the other's start
    /// once it reaches `Object` (spec.md §4.4, `orig/sa.cc`'s
    /// `common_ancestor`).
    pub fn lub(&self, a: ClassId, b: ClassId) -> ClassId {
        let (mut p1, mut p2) = (a, b);
        while p1 != p2 {
            p1 = if p1 == OBJECT_ID {
                b
            } else {
                self.get(p1).parent.unwrap_or(OBJECT_ID)
            };
            p2 = if p2 == OBJECT_ID {
                a
            } else {
                self.get(p2).parent.unwrap_or(OBJECT_ID)
            };
        }
        p1
    }

    pub fn lub_all(&self, classes: &[ClassId]) -> ClassId {
        let mut res = classes[0];
        for &c in &classes[1..] {
            res = self.lub(res, c);
        }
        res
    }

    pub fn is_builtin(&self, id: ClassId) -> bool {
        id.0 <= IO_ID.0
    }

    /// Find `name` by walking the class chain from `start` upward,
    /// returning the most-derived owner and its `MethodInfo` (spec.md
    /// §4.2's Invoke rule: "walking the class chain from the dispatch type
    /// upward"). Also used by `features::check_overrides` to find the
    /// nearest ancestor definition of an overriding method.
    pub fn find_method(&self, start: ClassId, name: &str) -> Option<(ClassId, &MethodInfo)> {
        let mut cur = Some(start);
        while let Some(c) = cur {
            if let Some(m) = self.get(c).methods.get(name) {
                return Some((c, m));
            }
            cur = self.get(c).parent;
        }
        None
    }

    /// All method names reachable from `start` (own and inherited),
    /// deduplicated, for "did you mean?" suggestions on an undefined
    /// method diagnostic.
    pub fn reachable_method_names(&self, start: ClassId) -> Vec<String> {
        let mut names = Vec::new();
        let mut cur = Some(start);
        while let Some(c) = cur {
            names.extend(self.get(c).methods.keys().cloned());
            cur = self.get(c).parent;
        }
        names
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_table() -> ClassTable {
        // Object(1) <- String/Int/Bool/IO(2..5) <- A(6) <- B(7)
        let mut table = ClassTable::default();
        for i in 1..=5u32 {
            let mut c = Class::default();
            c.name = format!("builtin{i}");
            c.parent = if i == 1 { None } else { Some(OBJECT_ID) };
            table.classes.push(c);
        }
        let mut a = Class::default();
        a.name = "A".into();
        a.parent = Some(OBJECT_ID);
        table.classes.push(a);
        let mut b = Class::default();
        b.name = "B".into();
        b.parent = Some(ClassId(6));
        table.classes.push(b);
        table
    }

    #[test]
    fn lub_of_siblings_is_object() {
        let table = chain_table();
        assert_eq!(table.lub(STRING_ID, INT_ID), OBJECT_ID);
    }

    #[test]
    fn lub_is_reflexive_and_commutative() {
        let table = chain_table();
        assert_eq!(table.lub(ClassId(7), ClassId(7)), ClassId(7));
        assert_eq!(table.lub(ClassId(6), ClassId(7)), table.lub(ClassId(7), ClassId(6)));
        assert_eq!(table.lub(ClassId(6), ClassId(7)), ClassId(6));
    }

    #[test]
    fn assignable_follows_parent_chain() {
        let table = chain_table();
        assert!(table.assignable(OBJECT_ID, ClassId(7)));
        assert!(table.assignable(ClassId(6), ClassId(7)));
        assert!(!table.assignable(ClassId(7), ClassId(6)));
    }
}

//! Abstract syntax tree for COOL, produced by `coolc-parser` and consumed
//! by `coolc-compiler`. The tree is a single tagged sum (`Expr`/`ExprKind`)
//! rather than a class hierarchy with virtual dispatch: every expression
//! kind from spec.md §3 is one `ExprKind` variant, `Box`-owned by its
//! parent, carrying its own `Span` and a `NodeId` analysis can key
//! side-table annotations off (resolved types, for instance — see
//! `coolc-compiler::typecheck::Annotations`).
//!
//! The tree is immutable once built: type checking and codegen read it and
//! write their results into side tables, they never mutate a node.

use coolc_diagnostics::Span;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Stable identity for an AST node, assigned once at parse time.
/// Used as the key for analysis side tables (resolved types, rewritten
/// dispatch targets) instead of storing those directly on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Hands out increasing `NodeId`s; one lives in the parser for the
/// duration of a single file's parse.
#[derive(Debug, Default)]
pub struct NodeIdGen(Cell<u32>);

impl NodeIdGen {
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    pub fn next(&self) -> NodeId {
        let id = self.0.get();
        self.0.set(id + 1);
        NodeId(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub span: Span,
    pub name: String,
    /// `None` means the source omitted `inherits ...`, defaulting to `Object`.
    pub parent_name: Option<String>,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Feature {
    Field(Field),
    Method(Method),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub type_name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formal {
    pub span: Span,
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub formals: Vec<Formal>,
    pub return_type: String,
    pub body: Expr,
}

/// One `id:Ti => ei` arm of a `case` expression. A `Node`, not an
/// `Expression`, in the original grammar — it has no standalone type of
/// its own, only the branch body does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBranch {
    pub span: Span,
    pub name: String,
    pub type_name: String,
    pub body: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    Assign {
        name: String,
        value: Box<Expr>,
    },
    /// `expr@T.name(args)`. `receiver` is `None` when the source wrote a
    /// bare `name(args)` — analysis and codegen both treat that case as
    /// `self.name(args)` without rewriting the tree (spec.md §3 calls this
    /// "synthesize self"; we implement the synthesis at the point of use
    /// rather than by mutating the node).
    Invoke {
        receiver: Option<Box<Expr>>,
        static_type: Option<String>,
        method: String,
        args: Vec<Expr>,
    },
    If {
        predicate: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    While {
        predicate: Box<Expr>,
        body: Box<Expr>,
    },
    Block(Vec<Expr>),
    /// `let name:type_name <- init in body`. `init` is `None` when the
    /// source omitted the initializer; typing and codegen both apply
    /// spec.md §3's default-literal substitution at the point of use.
    Let {
        name: String,
        type_name: String,
        init: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },
    New {
        type_name: String,
    },
    IsVoid(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    LessThan(Box<Expr>, Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    LessOrEqual(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Var(String),
    IntConst(i64),
    StrConst(String),
    BoolConst(bool),
    /// Placeholder used where the source omitted an expression entirely
    /// (e.g. a `Let`/`Field` with no initializer parses to this before
    /// typing substitutes a default; it never survives into codegen).
    Void,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_gen_increments() {
        let gen = NodeIdGen::new();
        assert_eq!(gen.next(), NodeId(0));
        assert_eq!(gen.next(), NodeId(1));
    }
}

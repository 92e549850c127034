//! Expression type checker: spec.md §4.2. Walks every method body and
//! field initializer under a lexical scope stack, assigning each node a
//! resolved `ClassId` or the error sentinel (`classtable::ERROR_ID`).
//! Grounded on spec.md §4.2/§4.4 directly and on `orig/sa.cc`'s
//! `assignable`/`common_ancestor` for conformance and LUB (now
//! `ClassTable::assignable`/`ClassTable::lub`).

use std::collections::HashMap;

use coolc_ast::{CaseBranch, Expr, ExprKind, NodeId, Program};
use coolc_diagnostics::{error_codes, fuzzy, DiagnosticEngine, Span};

use crate::classtable::{ClassId, ClassTable, BOOL_ID, ERROR_ID, INT_ID, OBJECT_ID, STRING_ID};
use crate::scope::Scope;
use crate::CompileError;

/// Every expression node's resolved type, keyed by the `NodeId` the parser
/// stamped on it (spec.md §3: "Analysis may attach to a node: a resolved
/// type pointer"). `SELF_TYPE` results are pre-resolved to the analysis-time
/// `self` class, so codegen never needs to re-derive it.
#[derive(Debug, Default)]
pub struct Annotations {
    node_type: HashMap<NodeId, ClassId>,
}

impl Annotations {
    pub fn type_of(&self, id: NodeId) -> ClassId {
        self.node_type.get(&id).copied().unwrap_or(ERROR_ID)
    }
}

pub fn check(
    table: &ClassTable,
    program: &Program,
    diags: &mut DiagnosticEngine,
) -> Result<Annotations, CompileError> {
    let mut annotations = Annotations::default();
    for cls in &program.classes {
        let Some(class_id) = table.id_of(&cls.name) else { continue };
        let mut checker = Checker {
            table,
            diags,
            scope: Scope::new(),
            self_class: class_id,
            annotations: &mut annotations,
        };
        checker.check_class(cls);
    }
    if diags.has_errors() {
        return Err(CompileError::Typing(diags.error_count()));
    }
    Ok(annotations)
}

struct Checker<'a> {
    table: &'a ClassTable,
    diags: &'a mut DiagnosticEngine,
    scope: Scope<ClassId>,
    self_class: ClassId,
    annotations: &'a mut Annotations,
}

impl<'a> Checker<'a> {
    fn ancestor_chain(&self) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut cur = Some(self.self_class);
        while let Some(c) = cur {
            chain.push(c);
            cur = self.table.get(c).parent;
        }
        chain.reverse(); // root (Object) first, self last
        chain
    }

    fn check_class(&mut self, cls: &coolc_ast::Class) {
        self.scope.enter();
        for ancestor in self.ancestor_chain() {
            for (name, field) in &self.table.get(ancestor).fields {
                self.scope.add(name.clone(), field.type_id);
            }
        }

        for feature in &cls.features {
            match feature {
                coolc_ast::Feature::Field(f) => {
                    let Some(field) = self.table.get(self.self_class).fields.get(&f.name) else {
                        continue; // unresolved type, already diagnosed in features::collect
                    };
                    if let Some(init) = &f.init {
                        let init_type = self.check_expr(init);
                        if init_type != ERROR_ID
                            && !self.table.assignable(field.type_id, init_type)
                        {
                            self.type_mismatch(f.span.clone(), field.type_id, init_type);
                        }
                    }
                }
                coolc_ast::Feature::Method(m) => {
                    let Some(method) = self.table.get(self.self_class).methods.get(&m.name).cloned()
                    else {
                        continue;
                    };
                    self.scope.enter();
                    for formal in &method.formals {
                        self.scope.add(formal.name.clone(), formal.type_id);
                    }
                    let body_type = self.check_expr(&m.body);
                    let declared = self.resolve_return(method.return_type);
                    if body_type != ERROR_ID && !self.table.assignable(declared, body_type) {
                        self.type_mismatch(m.span.clone(), declared, body_type);
                    }
                    self.scope.exit();
                }
            }
        }
        self.scope.exit();
    }

    fn resolve_return(&self, ret: crate::classtable::ReturnType) -> ClassId {
        match ret {
            crate::classtable::ReturnType::SelfType => self.self_class,
            crate::classtable::ReturnType::Class(c) => c,
        }
    }

    fn type_mismatch(&mut self, span: Span, expected: ClassId, got: ClassId) {
        self.diags.emit_error(
            error_codes::TYPE_MISMATCH,
            format!(
                "type \"{}\" does not conform to \"{}\"",
                self.table.get(got).name,
                self.table.get(expected).name
            ),
            span,
        );
    }

    fn record(&mut self, expr: &Expr, ty: ClassId) -> ClassId {
        self.annotations.node_type.insert(expr.id, ty);
        ty
    }

    fn check_expr(&mut self, expr: &Expr) -> ClassId {
        let ty = match &expr.kind {
            ExprKind::Void => OBJECT_ID,
            ExprKind::IntConst(_) => INT_ID,
            ExprKind::StrConst(_) => STRING_ID,
            ExprKind::BoolConst(_) => BOOL_ID,

            ExprKind::Var(name) => {
                if name == "self" {
                    self.self_class
                } else if let Some(t) = self.scope.find(name) {
                    t
                } else {
                    let suggestion = fuzzy::find_similar(name, &self.scope.names(), 0.7);
                    let mut diag = coolc_diagnostics::Diagnostic::error(
                        error_codes::UNDEFINED_VARIABLE,
                        format!("undefined variable \"{name}\""),
                        expr.span.clone(),
                    );
                    if let Some(s) = suggestion {
                        diag = diag.with_help(format!("did you mean \"{s}\"?"));
                    }
                    self.diags.emit(diag);
                    ERROR_ID
                }
            }

            ExprKind::Assign { name, value } => {
                let value_type = self.check_expr(value);
                match self.scope.find(name) {
                    None => {
                        self.diags.emit_error(
                            error_codes::UNDEFINED_VARIABLE,
                            format!("undefined variable \"{name}\""),
                            expr.span.clone(),
                        );
                        ERROR_ID
                    }
                    Some(declared) => {
                        if value_type != ERROR_ID && !self.table.assignable(declared, value_type) {
                            self.type_mismatch(expr.span.clone(), declared, value_type);
                        }
                        value_type
                    }
                }
            }

            ExprKind::New { type_name } => match self.table.id_of(type_name) {
                Some(t) => t,
                None => {
                    self.unknown_type(expr.span.clone(), type_name);
                    ERROR_ID
                }
            },

            ExprKind::IsVoid(e) => {
                self.check_expr(e);
                BOOL_ID
            }

            ExprKind::Add(a, b) | ExprKind::Sub(a, b) | ExprKind::Mul(a, b) | ExprKind::Div(a, b) => {
                self.check_int_operand(a);
                self.check_int_operand(b);
                INT_ID
            }
            ExprKind::Neg(e) => {
                self.check_int_operand(e);
                INT_ID
            }

            ExprKind::LessThan(a, b) | ExprKind::LessOrEqual(a, b) | ExprKind::Equal(a, b) => {
                self.check_int_operand(a);
                self.check_int_operand(b);
                BOOL_ID
            }
            ExprKind::Not(e) => {
                let t = self.check_expr(e);
                if t != ERROR_ID && t != BOOL_ID {
                    self.type_mismatch(e.span.clone(), BOOL_ID, t);
                }
                BOOL_ID
            }

            ExprKind::If { predicate, then_branch, else_branch } => {
                let pt = self.check_expr(predicate);
                if pt != ERROR_ID && pt != BOOL_ID {
                    self.diags.emit_error(
                        error_codes::NON_BOOL_PREDICATE,
                        format!("if predicate has type \"{}\", expected Bool", self.table.get(pt).name),
                        predicate.span.clone(),
                    );
                }
                let tt = self.check_expr(then_branch);
                let te = self.check_expr(else_branch);
                match (tt == ERROR_ID, te == ERROR_ID) {
                    (true, true) => ERROR_ID,
                    (true, false) => te,
                    (false, true) => tt,
                    (false, false) => self.table.lub(tt, te),
                }
            }

            ExprKind::While { predicate, body } => {
                let pt = self.check_expr(predicate);
                if pt != ERROR_ID && pt != BOOL_ID {
                    self.diags.emit_error(
                        error_codes::NON_BOOL_PREDICATE,
                        format!("while predicate has type \"{}\", expected Bool", self.table.get(pt).name),
                        predicate.span.clone(),
                    );
                }
                self.check_expr(body);
                OBJECT_ID
            }

            ExprKind::Block(exprs) => {
                let mut last = OBJECT_ID;
                for e in exprs {
                    last = self.check_expr(e);
                }
                last
            }

            ExprKind::Let { name, type_name, init, body } => {
                let declared = match self.table.id_of(type_name) {
                    Some(t) => Some(t),
                    None => {
                        self.unknown_type(expr.span.clone(), type_name);
                        None
                    }
                };
                if let Some(init) = init {
                    let init_type = self.check_expr(init);
                    if let Some(d) = declared {
                        if init_type != ERROR_ID && !self.table.assignable(d, init_type) {
                            self.type_mismatch(init.span.clone(), d, init_type);
                        }
                    }
                }
                self.scope.enter();
                self.scope.add(name.clone(), declared.unwrap_or(ERROR_ID));
                let body_type = self.check_expr(body);
                self.scope.exit();
                body_type
            }

            ExprKind::Case { scrutinee, branches } => {
                let scrutinee_type = self.check_expr(scrutinee);
                let mut branch_types = Vec::with_capacity(branches.len());
                for branch in branches {
                    branch_types.push(self.check_case_branch(branch, scrutinee_type));
                }
                let mut valid = branch_types.into_iter().filter(|t| *t != ERROR_ID);
                match valid.next() {
                    None => ERROR_ID,
                    Some(first) => valid.fold(first, |acc, t| self.table.lub(acc, t)),
                }
            }

            ExprKind::Invoke { receiver, static_type, method, args } => {
                self.check_invoke(expr, receiver.as_deref(), static_type.as_deref(), method, args)
            }
        };
        self.record(expr, ty)
    }

    fn check_int_operand(&mut self, e: &Expr) {
        let t = self.check_expr(e);
        if t != ERROR_ID && t != INT_ID {
            self.type_mismatch(e.span.clone(), INT_ID, t);
        }
    }

    fn check_case_branch(&mut self, branch: &CaseBranch, scrutinee_type: ClassId) -> ClassId {
        let declared = match self.table.id_of(&branch.type_name) {
            Some(t) => Some(t),
            None => {
                self.unknown_type(branch.span.clone(), &branch.type_name);
                None
            }
        };
        if let Some(t) = declared {
            if scrutinee_type != ERROR_ID
                && !self.table.assignable(t, scrutinee_type)
                && !self.table.assignable(scrutinee_type, t)
            {
                self.diags.emit_error(
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "case branch type \"{}\" is unrelated to scrutinee type \"{}\"",
                        branch.type_name,
                        self.table.get(scrutinee_type).name
                    ),
                    branch.span.clone(),
                );
            }
        }
        self.scope.enter();
        self.scope.add(branch.name.clone(), declared.unwrap_or(ERROR_ID));
        let ty = self.check_expr(&branch.body);
        self.scope.exit();
        ty
    }

    fn check_invoke(
        &mut self,
        expr: &Expr,
        receiver: Option<&Expr>,
        static_type: Option<&str>,
        method: &str,
        args: &[Expr],
    ) -> ClassId {
        let receiver_type = match receiver {
            Some(r) => self.check_expr(r),
            None => self.self_class,
        };
        let arg_types: Vec<ClassId> = args.iter().map(|a| self.check_expr(a)).collect();

        if receiver_type == ERROR_ID {
            return ERROR_ID;
        }

        let dispatch_type = match static_type {
            None => receiver_type,
            Some(name) => match self.table.id_of(name) {
                None => {
                    self.unknown_type(expr.span.clone(), name);
                    return ERROR_ID;
                }
                Some(t) => {
                    if !self.table.assignable(t, receiver_type) {
                        self.diags.emit_error(
                            error_codes::STATIC_DISPATCH_TYPE,
                            format!(
                                "static dispatch type \"{}\" is not an ancestor of \"{}\"",
                                name,
                                self.table.get(receiver_type).name
                            ),
                            expr.span.clone(),
                        );
                    }
                    t
                }
            },
        };

        let Some((_, method_info)) = self.table.find_method(dispatch_type, method) else {
            let suggestion =
                fuzzy::find_similar(method, &self.table.reachable_method_names(dispatch_type), 0.7);
            let mut diag = coolc_diagnostics::Diagnostic::error(
                error_codes::UNDEFINED_METHOD,
                format!("undefined method \"{method}\""),
                expr.span.clone(),
            );
            if let Some(s) = suggestion {
                diag = diag.with_help(format!("did you mean \"{s}\"?"));
            }
            self.diags.emit(diag);
            return ERROR_ID;
        };

        if args.len() != method_info.formals.len() {
            self.diags.emit_error(
                error_codes::ARGUMENT_COUNT,
                format!(
                    "method \"{method}\" expects {} argument(s), got {}",
                    method_info.formals.len(),
                    args.len()
                ),
                expr.span.clone(),
            );
        } else {
            for (i, (arg, formal)) in arg_types.iter().zip(&method_info.formals).enumerate() {
                if *arg != ERROR_ID && !self.table.assignable(formal.type_id, *arg) {
                    self.diags.emit_error(
                        error_codes::WRONG_ARG_TYPE,
                        format!(
                            "argument {} to \"{method}\" has type \"{}\", expected \"{}\"",
                            i + 1,
                            self.table.get(*arg).name,
                            self.table.get(formal.type_id).name
                        ),
                        args[i].span.clone(),
                    );
                }
            }
        }

        self.resolve_return(method_info.return_type)
    }

    fn unknown_type(&mut self, span: Span, name: &str) {
        let suggestion = fuzzy::find_similar(name, &self.table.class_names(), 0.7);
        let mut diag = coolc_diagnostics::Diagnostic::error(
            error_codes::UNKNOWN_TYPE,
            format!("unknown type \"{name}\""),
            span,
        );
        if let Some(s) = suggestion {
            diag = diag.with_help(format!("did you mean \"{s}\"?"));
        }
        self.diags.emit(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features, hierarchy};
    use coolc_ast::{Class as AstClass, Feature, Field, Method, NodeId};

    fn class(name: &str, parent: Option<&str>, features: Vec<Feature>) -> AstClass {
        AstClass {
            span: Span::unknown(),
            name: name.to_string(),
            parent_name: parent.map(str::to_string),
            features,
        }
    }

    fn method(name: &str, ret: &str, body: ExprKind) -> Feature {
        Feature::Method(Method {
            id: NodeId(100),
            span: Span::unknown(),
            name: name.to_string(),
            formals: vec![],
            return_type: ret.to_string(),
            body: Expr::new(NodeId(101), Span::unknown(), body),
        })
    }

    fn compile_ok(program: &Program) -> (ClassTable, Annotations) {
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(program, &mut diags).unwrap();
        features::collect(&mut table, program, &mut diags).unwrap();
        let annotations = check(&table, program, &mut diags).unwrap();
        (table, annotations)
    }

    #[test]
    fn arithmetic_yields_int() {
        let program = Program {
            classes: vec![class(
                "Main",
                None,
                vec![method(
                    "main",
                    "Int",
                    ExprKind::Add(
                        Box::new(Expr::new(NodeId(1), Span::unknown(), ExprKind::IntConst(2))),
                        Box::new(Expr::new(NodeId(2), Span::unknown(), ExprKind::IntConst(3))),
                    ),
                )],
            )],
        };
        compile_ok(&program);
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let program = Program {
            classes: vec![class(
                "Main",
                None,
                vec![method("main", "Int", ExprKind::Var("nope".to_string()))],
            )],
        };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        features::collect(&mut table, &program, &mut diags).unwrap();
        assert!(check(&table, &program, &mut diags).is_err());
    }

    #[test]
    fn self_resolves_to_enclosing_class() {
        let program = Program {
            classes: vec![class(
                "Main",
                None,
                vec![method("main", "Main", ExprKind::Var("self".to_string()))],
            )],
        };
        let (table, annotations) = compile_ok(&program);
        let main_id = table.id_of("Main").unwrap();
        // the lone expression in main's body is the Var("self") at id 101
        assert_eq!(annotations.type_of(NodeId(101)), main_id);
    }

    #[test]
    fn field_initializer_must_conform() {
        let program = Program {
            classes: vec![class(
                "Main",
                None,
                vec![
                    Feature::Field(Field {
                        id: NodeId(1),
                        span: Span::unknown(),
                        name: "x".to_string(),
                        type_name: "Int".to_string(),
                        init: Some(Expr::new(
                            NodeId(2),
                            Span::unknown(),
                            ExprKind::StrConst("oops".to_string()),
                        )),
                    }),
                    method("main", "Int", ExprKind::IntConst(0)),
                ],
            )],
        };
        let mut diags = DiagnosticEngine::new();
        let mut table = hierarchy::build(&program, &mut diags).unwrap();
        features::collect(&mut table, &program, &mut diags).unwrap();
        assert!(check(&table, &program, &mut diags).is_err());
    }
}

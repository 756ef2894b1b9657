//! Pass 2: resolve identifiers.
//!
//! Re-walks the scopes built by pass 1 and binds every identifier occurrence
//! that can be resolved lexically: named types, superclass and interface
//! names, bare variable references and unqualified calls. Names reached
//! through a base expression (`obj.field`, `obj.method()`) depend on the base
//! type and are left to the type checker.
//!
//! Also checks the signature of a top-level `main`.

use decaf_ast::{
    Block, ClassDecl, Decl, Expr, ExprKind, FnDecl, Ident, InterfaceDecl, Program, Stmt,
    TypeExpr, TypeKind,
};
use decaf_core::{DiagnosticSink, LookingFor, SemanticError};

use crate::annotations::Annotations;
use crate::scope::{OwnerKind, ScopeManager};

/// Output of the resolution pass.
#[derive(Debug, Default)]
pub struct ResolveOutput {
    /// Identifier occurrences bound to a declaration.
    pub resolved: usize,
    /// Identifier occurrences that could not be resolved.
    pub unresolved: usize,
}

pub struct ResolvePass<'a, 'ast> {
    scopes: &'a mut ScopeManager<'ast>,
    annotations: &'a mut Annotations<'ast>,
    diagnostics: &'a mut dyn DiagnosticSink,
    output: ResolveOutput,
}

impl<'a, 'ast> ResolvePass<'a, 'ast> {
    pub fn new(
        scopes: &'a mut ScopeManager<'ast>,
        annotations: &'a mut Annotations<'ast>,
        diagnostics: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            scopes,
            annotations,
            diagnostics,
            output: ResolveOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> ResolveOutput {
        self.scopes.reset();
        for decl in program.decls {
            match *decl {
                Decl::Var(var) => self.type_expr(var.ty, LookingFor::Type),
                Decl::Class(class) => self.class(class),
                Decl::Interface(iface) => self.interface(iface),
                Decl::Function(func) => {
                    self.function(func);
                    if func.name.name == "main" {
                        self.check_main(func);
                    }
                }
            }
        }
        log::debug!(
            "resolve: {} bound, {} unresolved",
            self.output.resolved,
            self.output.unresolved
        );
        self.output
    }

    fn bind(&mut self, ident: Ident<'ast>, decl: Decl<'ast>) {
        self.annotations.bind(ident, decl);
        self.output.resolved += 1;
    }

    fn not_declared(&mut self, ident: Ident<'ast>, reason: LookingFor) {
        self.output.unresolved += 1;
        self.diagnostics.report(SemanticError::IdentifierNotDeclared {
            name: ident.name.to_string(),
            reason,
            span: ident.span,
        });
    }

    /// Resolve a type name. `reason` narrows what the name must denote:
    /// [`LookingFor::Class`] and [`LookingFor::Interface`] accept only that
    /// kind, anything else accepts either.
    fn type_name(&mut self, ident: Ident<'ast>, reason: LookingFor) {
        let decl = self.scopes.lookup(ident.name);
        let accepted = match (decl, reason) {
            (Some(Decl::Class(_)), LookingFor::Class) => true,
            (Some(Decl::Interface(_)), LookingFor::Interface) => true,
            (Some(Decl::Class(_) | Decl::Interface(_)), LookingFor::Class | LookingFor::Interface) => {
                false
            }
            (Some(Decl::Class(_) | Decl::Interface(_)), _) => true,
            _ => false,
        };
        match decl {
            Some(decl) if accepted => self.bind(ident, decl),
            _ => self.not_declared(ident, reason),
        }
    }

    fn type_expr(&mut self, ty: &'ast TypeExpr<'ast>, reason: LookingFor) {
        match ty.kind {
            TypeKind::Named(ident) => self.type_name(ident, reason),
            TypeKind::Array(elem) => self.type_expr(elem, LookingFor::Type),
            _ => {}
        }
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) {
        if let Some(base) = class.extends {
            self.type_name(base, LookingFor::Class);
        }
        for &iface in class.implements {
            self.type_name(iface, LookingFor::Interface);
        }
        self.scopes
            .enter_named_scope(class.id, class.name.name, OwnerKind::Class);
        for member in class.members {
            match *member {
                Decl::Var(var) => self.type_expr(var.ty, LookingFor::Type),
                Decl::Function(func) => self.function(func),
                Decl::Class(_) | Decl::Interface(_) => {}
            }
        }
        self.scopes.exit_scope();
    }

    fn interface(&mut self, iface: &'ast InterfaceDecl<'ast>) {
        self.scopes
            .enter_named_scope(iface.id, iface.name.name, OwnerKind::Interface);
        for &proto in iface.members {
            self.function(proto);
        }
        self.scopes.exit_scope();
    }

    fn function(&mut self, func: &'ast FnDecl<'ast>) {
        self.type_expr(func.return_type, LookingFor::Type);
        self.scopes
            .enter_named_scope(func.id, func.name.name, OwnerKind::Function);
        for formal in func.formals {
            self.type_expr(formal.ty, LookingFor::Type);
        }
        if let Some(body) = func.body {
            self.block(body);
        }
        self.scopes.exit_scope();
    }

    fn check_main(&mut self, func: &'ast FnDecl<'ast>) {
        if !func.return_type.is_void() {
            self.diagnostics.report(SemanticError::MainNotVoid {
                span: func.name.span,
            });
        }
        if !func.formals.is_empty() {
            self.diagnostics.report(SemanticError::NumArgsMismatch {
                name: func.name.name.to_string(),
                expected: 0,
                given: func.formals.len(),
                span: func.name.span,
            });
        }
    }

    fn block(&mut self, block: &'ast Block<'ast>) {
        self.scopes.enter_scope(block.id);
        for local in block.decls {
            self.type_expr(local.ty, LookingFor::Type);
        }
        for &stmt in block.stmts {
            self.stmt(stmt);
        }
        self.scopes.exit_scope();
    }

    fn stmt(&mut self, stmt: Stmt<'ast>) {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::If(s) => {
                self.expr(s.test);
                self.stmt(s.then_branch);
                if let Some(else_branch) = s.else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While(s) => {
                self.expr(s.test);
                self.stmt(s.body);
            }
            Stmt::For(s) => {
                if let Some(init) = s.init {
                    self.expr(init);
                }
                self.expr(s.test);
                if let Some(step) = s.step {
                    self.expr(step);
                }
                self.stmt(s.body);
            }
            Stmt::Switch(s) => {
                self.expr(s.scrutinee);
                for case in s.cases {
                    for &stmt in case.stmts {
                        self.stmt(stmt);
                    }
                }
            }
            Stmt::Return(s) => {
                if let Some(value) = s.value {
                    self.expr(value);
                }
            }
            Stmt::Print(s) => {
                for &arg in s.args {
                    self.expr(arg);
                }
            }
            Stmt::Expr(e) => self.expr(e),
            Stmt::Break(_) => {}
        }
    }

    fn expr(&mut self, expr: &'ast Expr<'ast>) {
        match expr.kind {
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::ArrayAccess { base, subscript } => {
                self.expr(base);
                self.expr(subscript);
            }
            ExprKind::FieldAccess { base: Some(base), .. } => self.expr(base),
            ExprKind::FieldAccess { base: None, field } => match self.scopes.lookup(field.name) {
                Some(decl) => self.bind(field, decl),
                None => self.not_declared(field, LookingFor::Variable),
            },
            ExprKind::Call { base, method, args } => {
                match base {
                    Some(base) => self.expr(base),
                    None => match self.scopes.lookup(method.name) {
                        Some(decl @ Decl::Function(_)) => self.bind(method, decl),
                        _ => self.not_declared(method, LookingFor::Function),
                    },
                }
                for &arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::New { class } => self.type_name(class, LookingFor::Class),
            ExprKind::NewArray { size, elem } => {
                self.expr(size);
                self.type_expr(elem, LookingFor::Type);
            }
            ExprKind::Postfix { target, .. } => self.expr(target),
            ExprKind::IntConst(_)
            | ExprKind::DoubleConst(_)
            | ExprKind::BoolConst(_)
            | ExprKind::StringConst(_)
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::ReadInteger
            | ExprKind::ReadLine => {}
        }
    }
}

//! Pass 1: build the symbol table.
//!
//! Inserts every declaration into the scope it is declared in and opens the
//! scopes later passes re-enter: a named scope per class, interface and
//! function, and a lexical scope per block. Duplicate names in one scope are
//! reported as conflicts. No types are looked at.

use decaf_ast::{Block, ClassDecl, Decl, FnDecl, InterfaceDecl, Program, Stmt};
use decaf_core::DiagnosticSink;

use crate::scope::{OwnerKind, ScopeManager};

/// Output of the symbol table pass.
#[derive(Debug, Default)]
pub struct SymbolTableOutput {
    /// Declarations inserted into some scope.
    pub declarations: usize,
    /// Declarations rejected as conflicts.
    pub conflicts: usize,
}

pub struct SymbolTablePass<'a, 'ast> {
    scopes: &'a mut ScopeManager<'ast>,
    diagnostics: &'a mut dyn DiagnosticSink,
    output: SymbolTableOutput,
}

impl<'a, 'ast> SymbolTablePass<'a, 'ast> {
    pub fn new(
        scopes: &'a mut ScopeManager<'ast>,
        diagnostics: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            scopes,
            diagnostics,
            output: SymbolTableOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> SymbolTableOutput {
        self.scopes.reset();
        for decl in program.decls {
            self.declare(*decl);
        }
        log::debug!(
            "symbol table: {} declarations, {} conflicts, {} scopes",
            self.output.declarations,
            self.output.conflicts,
            self.scopes.scope_count()
        );
        self.output
    }

    fn insert(&mut self, decl: Decl<'ast>) {
        match self.scopes.insert(decl) {
            Ok(()) => self.output.declarations += 1,
            Err(err) => {
                self.output.conflicts += 1;
                self.diagnostics.report(err);
            }
        }
    }

    fn declare(&mut self, decl: Decl<'ast>) {
        self.insert(decl);
        match decl {
            Decl::Var(_) => {}
            Decl::Class(class) => self.class(class),
            Decl::Interface(iface) => self.interface(iface),
            Decl::Function(func) => self.function(func),
        }
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) {
        self.scopes
            .enter_named_scope(class.id, class.name.name, OwnerKind::Class);
        if let Some(base) = class.extends {
            self.scopes.set_parent(base.name);
        }
        for iface in class.implements {
            self.scopes.add_interface(iface.name);
        }
        for member in class.members {
            self.declare(*member);
        }
        self.scopes.exit_scope();
    }

    fn interface(&mut self, iface: &'ast InterfaceDecl<'ast>) {
        self.scopes
            .enter_named_scope(iface.id, iface.name.name, OwnerKind::Interface);
        for &proto in iface.members {
            self.declare(Decl::Function(proto));
        }
        self.scopes.exit_scope();
    }

    fn function(&mut self, func: &'ast FnDecl<'ast>) {
        self.scopes
            .enter_named_scope(func.id, func.name.name, OwnerKind::Function);
        for &formal in func.formals {
            self.insert(Decl::Var(formal));
        }
        if let Some(body) = func.body {
            self.block(body);
        }
        self.scopes.exit_scope();
    }

    fn block(&mut self, block: &'ast Block<'ast>) {
        self.scopes.enter_scope(block.id);
        for &local in block.decls {
            self.insert(Decl::Var(local));
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
                self.stmt(s.then_branch);
                if let Some(else_branch) = s.else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While(s) => self.stmt(s.body),
            Stmt::For(s) => self.stmt(s.body),
            Stmt::Switch(s) => {
                for case in s.cases {
                    for &stmt in case.stmts {
                        self.stmt(stmt);
                    }
                }
            }
            Stmt::Break(_) | Stmt::Return(_) | Stmt::Print(_) | Stmt::Expr(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use decaf_ast::AstBuilder;
    use decaf_core::{Diagnostics, SemanticError};

    #[test]
    fn duplicate_global_reports_conflict() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.at(1, 1).var_decl("x", b.int_type()),
            b.at(2, 1).var_decl("x", b.int_type()),
        ]);

        let mut scopes = ScopeManager::new();
        let mut diags = Diagnostics::new();
        let out = SymbolTablePass::new(&mut scopes, &mut diags).run(program);

        assert_eq!(out.declarations, 1);
        assert_eq!(out.conflicts, 1);
        assert!(matches!(
            diags.as_slice(),
            [SemanticError::DeclConflict { previous_line: 1, .. }]
        ));
    }

    #[test]
    fn formals_and_locals_get_own_scopes() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let n = b.var("n", b.int_type());
        let local_n = b.var("n", b.int_type());
        let body = b.block(&[local_n], &[]);
        let program = b.program(&[b.function("f", b.void_type(), &[n], Some(body))]);

        let mut scopes = ScopeManager::new();
        let mut diags = Diagnostics::new();
        SymbolTablePass::new(&mut scopes, &mut diags).run(program);

        // A local may shadow a formal: they live in different scopes.
        assert!(diags.is_empty());
        assert!(scopes.scope_of(body.id).is_some());
        assert_ne!(scopes.declaring_scope(n.id), scopes.declaring_scope(local_n.id));
    }

    #[test]
    fn nested_blocks_in_statements() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inner = b.block(&[b.var("i", b.int_type())], &[]);
        let body = b.block(&[], &[b.while_stmt(b.bool(true), Stmt::Block(inner))]);
        let program = b.program(&[b.function("main", b.void_type(), &[], Some(body))]);

        let mut scopes = ScopeManager::new();
        let mut diags = Diagnostics::new();
        SymbolTablePass::new(&mut scopes, &mut diags).run(program);

        let scope = scopes.scope_of(inner.id).unwrap();
        assert!(scopes.scope(scope).get("i").is_some());
    }

    #[test]
    fn class_scope_records_parent_and_interfaces() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[b.class(
            "Dog",
            Some("Animal"),
            &["Pet", "Toy"],
            &[b.var_decl("legs", b.int_type())],
        )]);

        let mut scopes = ScopeManager::new();
        let mut diags = Diagnostics::new();
        SymbolTablePass::new(&mut scopes, &mut diags).run(program);

        let dog = scopes.scope(scopes.owner_scope("Dog").unwrap());
        assert_eq!(dog.parent(), Some("Animal"));
        assert_eq!(dog.interfaces(), ["Pet", "Toy"]);
        assert!(dog.get("legs").is_some());
    }
}

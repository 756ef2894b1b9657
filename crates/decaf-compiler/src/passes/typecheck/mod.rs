//! Pass 4: type check.
//!
//! Computes the static type of every expression bottom-up and validates
//! operator, assignment, call, return and print rules. Types are recorded in
//! [`Annotations`]; an expression whose type cannot be determined gets
//! [`DataType::Error`], and checks involving it are skipped so each mistake
//! is reported once.
//!
//! Member accesses through a base expression are bound here, since their
//! target depends on the base type.

mod expr;
mod stmt;

use decaf_ast::{Block, ClassDecl, Decl, FnDecl, Program};
use decaf_core::{DataType, DiagnosticSink, SemanticError};

use crate::annotations::Annotations;
use crate::compat::is_compatible;
use crate::hierarchy::ClassHierarchy;
use crate::scope::{OwnerKind, ScopeManager};

/// Output of the type checking pass.
#[derive(Debug, Default)]
pub struct TypeCheckOutput {
    /// Expressions given a type (error types included).
    pub expressions: usize,
    /// Errors reported by this pass.
    pub errors: usize,
}

pub struct TypeCheckPass<'a, 'ast> {
    scopes: &'a mut ScopeManager<'ast>,
    annotations: &'a mut Annotations<'ast>,
    hierarchy: &'a ClassHierarchy<'ast>,
    diagnostics: &'a mut dyn DiagnosticSink,
    /// Declared return type of the function being checked.
    return_type: DataType,
    /// Number of enclosing loops and switch cases.
    breakable: usize,
    output: TypeCheckOutput,
}

impl<'a, 'ast> TypeCheckPass<'a, 'ast> {
    pub fn new(
        scopes: &'a mut ScopeManager<'ast>,
        annotations: &'a mut Annotations<'ast>,
        hierarchy: &'a ClassHierarchy<'ast>,
        diagnostics: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            scopes,
            annotations,
            hierarchy,
            diagnostics,
            return_type: DataType::Void,
            breakable: 0,
            output: TypeCheckOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> TypeCheckOutput {
        self.scopes.reset();
        for decl in program.decls {
            match *decl {
                Decl::Class(class) => self.class(class),
                Decl::Function(func) => self.function(func),
                Decl::Var(_) | Decl::Interface(_) => {}
            }
        }
        log::debug!(
            "type check: {} expressions, {} errors",
            self.output.expressions,
            self.output.errors
        );
        self.output
    }

    fn error(&mut self, error: SemanticError) {
        self.output.errors += 1;
        self.diagnostics.report(error);
    }

    fn compatible(&self, expected: &DataType, given: &DataType) -> bool {
        is_compatible(self.hierarchy, expected, given)
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) {
        self.scopes
            .enter_named_scope(class.id, class.name.name, OwnerKind::Class);
        for method in class.methods() {
            self.function(method);
        }
        self.scopes.exit_scope();
    }

    fn function(&mut self, func: &'ast FnDecl<'ast>) {
        self.scopes
            .enter_named_scope(func.id, func.name.name, OwnerKind::Function);
        self.return_type = self.annotations.resolve_type(func.return_type);
        self.breakable = 0;
        if let Some(body) = func.body {
            self.block(body);
        }
        self.scopes.exit_scope();
    }

    fn block(&mut self, block: &'ast Block<'ast>) {
        self.scopes.enter_scope(block.id);
        for &stmt in block.stmts {
            self.stmt(stmt);
        }
        self.scopes.exit_scope();
    }
}

//! Arena-allocated AST for Decaf programs.
//!
//! The tree is built by an external parser (or by tests) through
//! [`AstBuilder`] and lives in a [`bumpalo::Bump`] arena for the lifetime
//! `'ast`. Nodes are immutable once built; every node that later passes need
//! to annotate carries a [`NodeId`] so results can live in side tables
//! instead of mutable slots on the node.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use decaf_ast::AstBuilder;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let body = b.block(&[], &[b.print_stmt(&[b.string("hello")])]);
//! let main = b.function("main", b.void_type(), &[], Some(body));
//! let program = b.program(&[main]);
//! assert_eq!(program.decls.len(), 1);
//! ```

pub mod builder;
pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;
pub mod types;

pub use builder::AstBuilder;
pub use decl::{ClassDecl, Decl, FnDecl, InterfaceDecl, VarDecl};
pub use expr::{Expr, ExprKind};
pub use ops::{BinaryOp, OpCategory, PostfixOp, UnaryOp};
pub use stmt::{
    Block, BreakStmt, CaseStmt, ForStmt, IfStmt, PrintStmt, ReturnStmt, Stmt, SwitchStmt,
    WhileStmt,
};
pub use types::{TypeExpr, TypeKind};

use decaf_core::Span;
use std::fmt;

/// Stable identity of an AST node, unique within one [`AstBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An identifier occurrence.
///
/// Each occurrence has its own id; the resolver maps that id to the
/// declaration the name refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    pub id: NodeId,
    pub name: &'ast str,
    pub span: Span,
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A whole program: the list of top-level declarations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'ast> {
    pub id: NodeId,
    pub decls: &'ast [Decl<'ast>],
    pub span: Span,
}

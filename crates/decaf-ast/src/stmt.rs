//! Statement nodes.
//!
//! Blocks declare their local variables up front, followed by statements.
//! Loop and conditional bodies are arbitrary statements; variable
//! declarations only occur at the top of a [`Block`].

use crate::decl::VarDecl;
use crate::expr::Expr;
use crate::NodeId;
use decaf_core::Span;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `{ decls stmts }`
    Block(&'ast Block<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Switch(&'ast SwitchStmt<'ast>),
    Break(BreakStmt),
    Return(ReturnStmt<'ast>),
    Print(PrintStmt<'ast>),
    /// Expression statement (`expr;`)
    Expr(&'ast Expr<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::Break(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Print(s) => s.span,
            Stmt::Expr(e) => e.span,
        }
    }
}

/// A block of local declarations followed by statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub id: NodeId,
    pub decls: &'ast [&'ast VarDecl<'ast>],
    pub stmts: &'ast [Stmt<'ast>],
    /// Source location
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub test: &'ast Expr<'ast>,
    pub then_branch: Stmt<'ast>,
    pub else_branch: Option<Stmt<'ast>>,
    /// Source location
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub test: &'ast Expr<'ast>,
    pub body: Stmt<'ast>,
    /// Source location
    pub span: Span,
}

/// `for (init; test; step) body`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub init: Option<&'ast Expr<'ast>>,
    pub test: &'ast Expr<'ast>,
    pub step: Option<&'ast Expr<'ast>>,
    pub body: Stmt<'ast>,
    /// Source location
    pub span: Span,
}

/// `switch (scrutinee) { case N: ... default: ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchStmt<'ast> {
    pub scrutinee: &'ast Expr<'ast>,
    pub cases: &'ast [CaseStmt<'ast>],
    /// Source location
    pub span: Span,
}

/// One arm of a switch. `value` is `None` for `default`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseStmt<'ast> {
    pub value: Option<i32>,
    pub stmts: &'ast [Stmt<'ast>],
    /// Source location
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakStmt {
    /// Source location
    pub span: Span,
}

/// `return;` or `return expr;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    /// Source location
    pub span: Span,
}

/// `Print(args...)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintStmt<'ast> {
    pub args: &'ast [&'ast Expr<'ast>],
    /// Source location
    pub span: Span,
}

//! Construction API for the arena AST.
//!
//! `AstBuilder` hands out node ids and allocates every node in the arena it
//! was created with. Nodes take the builder's current span, set with
//! [`AstBuilder::at`] or [`AstBuilder::set_span`], so a parser updates the
//! span once per production and tests can pin down the lines that matter.

use std::cell::Cell;

use bumpalo::Bump;
use decaf_core::Span;
use ordered_float::OrderedFloat;

use crate::decl::{ClassDecl, Decl, FnDecl, InterfaceDecl, VarDecl};
use crate::expr::{Expr, ExprKind};
use crate::ops::{BinaryOp, PostfixOp, UnaryOp};
use crate::stmt::{
    Block, BreakStmt, CaseStmt, ForStmt, IfStmt, PrintStmt, ReturnStmt, Stmt, SwitchStmt,
    WhileStmt,
};
use crate::types::{TypeExpr, TypeKind};
use crate::{Ident, NodeId, Program};

/// Builds AST nodes in a bump arena.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    span: Cell<Span>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
            span: Cell::new(Span::default()),
        }
    }

    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Set the span for subsequently built nodes.
    pub fn set_span(&self, span: Span) {
        self.span.set(span);
    }

    /// Set the span for subsequently built nodes to a single position.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        self.span.set(Span::point(line, col));
        self
    }

    /// Number of ids handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_id.get()
    }

    fn id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn span(&self) -> Span {
        self.span.get()
    }

    // =========================================================================
    // Identifiers and types
    // =========================================================================

    pub fn ident(&self, name: &str) -> Ident<'ast> {
        Ident {
            id: self.id(),
            name: self.arena.alloc_str(name),
            span: self.span(),
        }
    }

    fn ty(&self, kind: TypeKind<'ast>) -> &'ast TypeExpr<'ast> {
        self.arena.alloc(TypeExpr {
            id: self.id(),
            kind,
            span: self.span(),
        })
    }

    pub fn int_type(&self) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::Int)
    }

    pub fn double_type(&self) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::Double)
    }

    pub fn bool_type(&self) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::Bool)
    }

    pub fn string_type(&self) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::String)
    }

    pub fn void_type(&self) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::Void)
    }

    pub fn named_type(&self, name: &str) -> &'ast TypeExpr<'ast> {
        let ident = self.ident(name);
        self.ty(TypeKind::Named(ident))
    }

    pub fn array_type(&self, elem: &'ast TypeExpr<'ast>) -> &'ast TypeExpr<'ast> {
        self.ty(TypeKind::Array(elem))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn var(&self, name: &str, ty: &'ast TypeExpr<'ast>) -> &'ast VarDecl<'ast> {
        let name = self.ident(name);
        self.arena.alloc(VarDecl {
            id: self.id(),
            name,
            ty,
            span: self.span(),
        })
    }

    pub fn var_decl(&self, name: &str, ty: &'ast TypeExpr<'ast>) -> Decl<'ast> {
        Decl::Var(self.var(name, ty))
    }

    pub fn fn_decl(
        &self,
        name: &str,
        return_type: &'ast TypeExpr<'ast>,
        formals: &[&'ast VarDecl<'ast>],
        body: Option<&'ast Block<'ast>>,
    ) -> &'ast FnDecl<'ast> {
        let name = self.ident(name);
        self.arena.alloc(FnDecl {
            id: self.id(),
            name,
            return_type,
            formals: self.arena.alloc_slice_copy(formals),
            body,
            span: self.span(),
        })
    }

    /// A function or method declaration.
    pub fn function(
        &self,
        name: &str,
        return_type: &'ast TypeExpr<'ast>,
        formals: &[&'ast VarDecl<'ast>],
        body: Option<&'ast Block<'ast>>,
    ) -> Decl<'ast> {
        Decl::Function(self.fn_decl(name, return_type, formals, body))
    }

    /// An interface member: a function without a body.
    pub fn prototype(
        &self,
        name: &str,
        return_type: &'ast TypeExpr<'ast>,
        formals: &[&'ast VarDecl<'ast>],
    ) -> &'ast FnDecl<'ast> {
        self.fn_decl(name, return_type, formals, None)
    }

    pub fn class(
        &self,
        name: &str,
        extends: Option<&str>,
        implements: &[&str],
        members: &[Decl<'ast>],
    ) -> Decl<'ast> {
        let name = self.ident(name);
        let extends = extends.map(|base| self.ident(base));
        let implements: Vec<Ident<'ast>> = implements.iter().map(|i| self.ident(i)).collect();
        Decl::Class(self.arena.alloc(ClassDecl {
            id: self.id(),
            name,
            extends,
            implements: self.arena.alloc_slice_copy(&implements),
            members: self.arena.alloc_slice_copy(members),
            span: self.span(),
        }))
    }

    pub fn interface(&self, name: &str, members: &[&'ast FnDecl<'ast>]) -> Decl<'ast> {
        let name = self.ident(name);
        Decl::Interface(self.arena.alloc(InterfaceDecl {
            id: self.id(),
            name,
            members: self.arena.alloc_slice_copy(members),
            span: self.span(),
        }))
    }

    pub fn program(&self, decls: &[Decl<'ast>]) -> &'ast Program<'ast> {
        self.arena.alloc(Program {
            id: self.id(),
            decls: self.arena.alloc_slice_copy(decls),
            span: self.span(),
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn block(
        &self,
        decls: &[&'ast VarDecl<'ast>],
        stmts: &[Stmt<'ast>],
    ) -> &'ast Block<'ast> {
        self.arena.alloc(Block {
            id: self.id(),
            decls: self.arena.alloc_slice_copy(decls),
            stmts: self.arena.alloc_slice_copy(stmts),
            span: self.span(),
        })
    }

    /// A nested block used as a statement.
    pub fn block_stmt(&self, decls: &[&'ast VarDecl<'ast>], stmts: &[Stmt<'ast>]) -> Stmt<'ast> {
        Stmt::Block(self.block(decls, stmts))
    }

    pub fn if_stmt(
        &self,
        test: &'ast Expr<'ast>,
        then_branch: Stmt<'ast>,
        else_branch: Option<Stmt<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::If(self.arena.alloc(IfStmt {
            test,
            then_branch,
            else_branch,
            span: self.span(),
        }))
    }

    pub fn while_stmt(&self, test: &'ast Expr<'ast>, body: Stmt<'ast>) -> Stmt<'ast> {
        Stmt::While(self.arena.alloc(WhileStmt {
            test,
            body,
            span: self.span(),
        }))
    }

    pub fn for_stmt(
        &self,
        init: Option<&'ast Expr<'ast>>,
        test: &'ast Expr<'ast>,
        step: Option<&'ast Expr<'ast>>,
        body: Stmt<'ast>,
    ) -> Stmt<'ast> {
        Stmt::For(self.arena.alloc(ForStmt {
            init,
            test,
            step,
            body,
            span: self.span(),
        }))
    }

    pub fn switch_stmt(&self, scrutinee: &'ast Expr<'ast>, cases: &[CaseStmt<'ast>]) -> Stmt<'ast> {
        Stmt::Switch(self.arena.alloc(SwitchStmt {
            scrutinee,
            cases: self.arena.alloc_slice_copy(cases),
            span: self.span(),
        }))
    }

    pub fn case(&self, value: i32, stmts: &[Stmt<'ast>]) -> CaseStmt<'ast> {
        CaseStmt {
            value: Some(value),
            stmts: self.arena.alloc_slice_copy(stmts),
            span: self.span(),
        }
    }

    pub fn default_case(&self, stmts: &[Stmt<'ast>]) -> CaseStmt<'ast> {
        CaseStmt {
            value: None,
            stmts: self.arena.alloc_slice_copy(stmts),
            span: self.span(),
        }
    }

    pub fn break_stmt(&self) -> Stmt<'ast> {
        Stmt::Break(BreakStmt { span: self.span() })
    }

    pub fn return_stmt(&self, value: Option<&'ast Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value,
            span: self.span(),
        })
    }

    pub fn print_stmt(&self, args: &[&'ast Expr<'ast>]) -> Stmt<'ast> {
        Stmt::Print(PrintStmt {
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
        })
    }

    pub fn expr_stmt(&self, expr: &'ast Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(expr)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn expr(&self, kind: ExprKind<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr {
            id: self.id(),
            kind,
            span: self.span(),
        })
    }

    pub fn int(&self, value: i32) -> &'ast Expr<'ast> {
        self.expr(ExprKind::IntConst(value))
    }

    pub fn double(&self, value: f64) -> &'ast Expr<'ast> {
        self.expr(ExprKind::DoubleConst(OrderedFloat(value)))
    }

    pub fn bool(&self, value: bool) -> &'ast Expr<'ast> {
        self.expr(ExprKind::BoolConst(value))
    }

    pub fn string(&self, value: &str) -> &'ast Expr<'ast> {
        let value = self.arena.alloc_str(value);
        self.expr(ExprKind::StringConst(value))
    }

    pub fn null(&self) -> &'ast Expr<'ast> {
        self.expr(ExprKind::Null)
    }

    pub fn binary(
        &self,
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&self, op: UnaryOp, operand: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn assign(&self, target: &'ast Expr<'ast>, value: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.expr(ExprKind::Assign { target, value })
    }

    pub fn this(&self) -> &'ast Expr<'ast> {
        self.expr(ExprKind::This)
    }

    pub fn index(&self, base: &'ast Expr<'ast>, subscript: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.expr(ExprKind::ArrayAccess { base, subscript })
    }

    /// A bare name in expression position.
    pub fn var_ref(&self, name: &str) -> &'ast Expr<'ast> {
        let field = self.ident(name);
        self.expr(ExprKind::FieldAccess { base: None, field })
    }

    /// `base.name`
    pub fn field(&self, base: &'ast Expr<'ast>, name: &str) -> &'ast Expr<'ast> {
        let field = self.ident(name);
        self.expr(ExprKind::FieldAccess {
            base: Some(base),
            field,
        })
    }

    /// An unqualified call `name(args)`.
    pub fn call(&self, name: &str, args: &[&'ast Expr<'ast>]) -> &'ast Expr<'ast> {
        let method = self.ident(name);
        self.expr(ExprKind::Call {
            base: None,
            method,
            args: self.arena.alloc_slice_copy(args),
        })
    }

    /// `base.name(args)`
    pub fn method_call(
        &self,
        base: &'ast Expr<'ast>,
        name: &str,
        args: &[&'ast Expr<'ast>],
    ) -> &'ast Expr<'ast> {
        let method = self.ident(name);
        self.expr(ExprKind::Call {
            base: Some(base),
            method,
            args: self.arena.alloc_slice_copy(args),
        })
    }

    pub fn new_object(&self, class: &str) -> &'ast Expr<'ast> {
        let class = self.ident(class);
        self.expr(ExprKind::New { class })
    }

    pub fn new_array(
        &self,
        size: &'ast Expr<'ast>,
        elem: &'ast TypeExpr<'ast>,
    ) -> &'ast Expr<'ast> {
        self.expr(ExprKind::NewArray { size, elem })
    }

    pub fn read_integer(&self) -> &'ast Expr<'ast> {
        self.expr(ExprKind::ReadInteger)
    }

    pub fn read_line(&self) -> &'ast Expr<'ast> {
        self.expr(ExprKind::ReadLine)
    }

    pub fn postfix(&self, op: PostfixOp, target: &'ast Expr<'ast>) -> &'ast Expr<'ast> {
        self.expr(ExprKind::Postfix { op, target })
    }
}

//! Expression nodes.
//!
//! Every expression carries a [`NodeId`]; the type checker records the
//! computed type of each expression against it.
//!
//! A bare identifier in expression position is a [`ExprKind::FieldAccess`]
//! without a base, and an unqualified call is a [`ExprKind::Call`] without a
//! base. Whether either refers to a member of the enclosing class is decided
//! by name resolution.

use crate::ops::{BinaryOp, PostfixOp, UnaryOp};
use crate::types::TypeExpr;
use crate::{Ident, NodeId};
use decaf_core::Span;
use ordered_float::OrderedFloat;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expr<'ast> {
    pub id: NodeId,
    pub kind: ExprKind<'ast>,
    /// Source location
    pub span: Span,
}

/// The kind of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'ast> {
    IntConst(i32),
    DoubleConst(OrderedFloat<f64>),
    BoolConst(bool),
    /// String literal contents without the surrounding quotes.
    StringConst(&'ast str),
    Null,
    Binary {
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    },
    Unary {
        op: UnaryOp,
        operand: &'ast Expr<'ast>,
    },
    /// `target = value`
    Assign {
        target: &'ast Expr<'ast>,
        value: &'ast Expr<'ast>,
    },
    This,
    /// `base[subscript]`
    ArrayAccess {
        base: &'ast Expr<'ast>,
        subscript: &'ast Expr<'ast>,
    },
    /// `field` or `base.field`
    FieldAccess {
        base: Option<&'ast Expr<'ast>>,
        field: Ident<'ast>,
    },
    /// `method(args)` or `base.method(args)`
    Call {
        base: Option<&'ast Expr<'ast>>,
        method: Ident<'ast>,
        args: &'ast [&'ast Expr<'ast>],
    },
    /// `new C`
    New { class: Ident<'ast> },
    /// `NewArray(size, elem)`
    NewArray {
        size: &'ast Expr<'ast>,
        elem: &'ast TypeExpr<'ast>,
    },
    ReadInteger,
    ReadLine,
    /// `target++` / `target--`
    Postfix {
        op: PostfixOp,
        target: &'ast Expr<'ast>,
    },
}

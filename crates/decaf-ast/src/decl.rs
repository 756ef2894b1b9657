//! Declaration nodes.
//!
//! Variables, classes, interfaces and functions. Methods are [`FnDecl`]s
//! appearing in a class's member list; interface members are prototypes
//! (functions without a body).

use crate::stmt::Block;
use crate::types::TypeExpr;
use crate::{Ident, NodeId};
use decaf_core::Span;

/// A declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'ast> {
    Var(&'ast VarDecl<'ast>),
    Class(&'ast ClassDecl<'ast>),
    Interface(&'ast InterfaceDecl<'ast>),
    Function(&'ast FnDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            Decl::Var(d) => d.id,
            Decl::Class(d) => d.id,
            Decl::Interface(d) => d.id,
            Decl::Function(d) => d.id,
        }
    }

    /// The declared name.
    pub fn ident(&self) -> Ident<'ast> {
        match self {
            Decl::Var(d) => d.name,
            Decl::Class(d) => d.name,
            Decl::Interface(d) => d.name,
            Decl::Function(d) => d.name,
        }
    }

    pub fn name(&self) -> &'ast str {
        self.ident().name
    }

    /// Get the span of this declaration.
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Class(d) => d.span,
            Decl::Interface(d) => d.span,
            Decl::Function(d) => d.span,
        }
    }
}

/// A variable: global, local, formal parameter or class field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub ty: &'ast TypeExpr<'ast>,
    /// Source location
    pub span: Span,
}

/// `class Name extends Base implements I, J { members }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    /// Superclass, if any.
    pub extends: Option<Ident<'ast>>,
    /// Implemented interfaces in source order.
    pub implements: &'ast [Ident<'ast>],
    /// Fields and methods in declaration order.
    pub members: &'ast [Decl<'ast>],
    /// Source location
    pub span: Span,
}

impl<'ast> ClassDecl<'ast> {
    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'ast VarDecl<'ast>> + '_ {
        self.members.iter().filter_map(|m| match m {
            Decl::Var(v) => Some(*v),
            _ => None,
        })
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &'ast FnDecl<'ast>> + '_ {
        self.members.iter().filter_map(|m| match m {
            Decl::Function(f) => Some(*f),
            _ => None,
        })
    }
}

/// `interface Name { prototypes }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub members: &'ast [&'ast FnDecl<'ast>],
    /// Source location
    pub span: Span,
}

/// A function, method or interface prototype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FnDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub return_type: &'ast TypeExpr<'ast>,
    pub formals: &'ast [&'ast VarDecl<'ast>],
    /// `None` for interface prototypes.
    pub body: Option<&'ast Block<'ast>>,
    /// Source location
    pub span: Span,
}

//! Type expressions as written in declarations.

use crate::{Ident, NodeId};
use decaf_core::{DataType, Span};

/// A type as it appears in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'ast> {
    pub id: NodeId,
    pub kind: TypeKind<'ast>,
    /// Source location
    pub span: Span,
}

/// The shape of a type expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeKind<'ast> {
    Int,
    Double,
    Bool,
    String,
    Void,
    /// Class or interface name, resolved by the checker.
    Named(Ident<'ast>),
    /// `T[]`
    Array(&'ast TypeExpr<'ast>),
}

impl<'ast> TypeExpr<'ast> {
    /// The static type this expression denotes, assuming every name in it
    /// resolves.
    pub fn to_data_type(&self) -> DataType {
        match self.kind {
            TypeKind::Int => DataType::Int,
            TypeKind::Double => DataType::Double,
            TypeKind::Bool => DataType::Bool,
            TypeKind::String => DataType::String,
            TypeKind::Void => DataType::Void,
            TypeKind::Named(ident) => DataType::named(ident.name),
            TypeKind::Array(elem) => DataType::array_of(elem.to_data_type()),
        }
    }

    /// The innermost named type, if any (`Foo` for `Foo[][]`).
    pub fn base_name(&self) -> Option<Ident<'ast>> {
        match self.kind {
            TypeKind::Named(ident) => Some(ident),
            TypeKind::Array(elem) => elem.base_name(),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }
}

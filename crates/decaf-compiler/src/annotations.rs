//! Side tables filled in by the checker passes.
//!
//! Name resolution maps each identifier occurrence to the declaration it
//! names, and type checking records the static type of each expression.
//! Both are keyed by [`NodeId`], written by one pass and read by the passes
//! after it.

use decaf_ast::{Decl, Expr, FnDecl, Ident, NodeId, TypeExpr, TypeKind};
use decaf_core::DataType;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct Annotations<'ast> {
    resolved: FxHashMap<NodeId, Decl<'ast>>,
    types: FxHashMap<NodeId, DataType>,
}

impl<'ast> Annotations<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what an identifier occurrence refers to.
    pub fn bind(&mut self, ident: Ident<'ast>, decl: Decl<'ast>) {
        self.resolved.insert(ident.id, decl);
    }

    pub fn decl_of(&self, ident: Ident<'ast>) -> Option<Decl<'ast>> {
        self.resolved.get(&ident.id).copied()
    }

    /// The function an identifier occurrence was resolved to.
    pub fn function_of(&self, ident: Ident<'ast>) -> Option<&'ast FnDecl<'ast>> {
        match self.decl_of(ident)? {
            Decl::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn set_type(&mut self, expr: &Expr<'ast>, ty: DataType) {
        self.types.insert(expr.id, ty);
    }

    /// The type computed for an expression, or [`DataType::Error`] if it has
    /// none.
    pub fn type_of(&self, expr: &Expr<'ast>) -> DataType {
        self.types.get(&expr.id).cloned().unwrap_or(DataType::Error)
    }

    /// The static type a type expression denotes.
    ///
    /// A name that did not resolve to a class or interface makes the whole
    /// type [`DataType::Error`].
    pub fn resolve_type(&self, ty: &TypeExpr<'ast>) -> DataType {
        match ty.kind {
            TypeKind::Named(ident) => match self.decl_of(ident) {
                Some(Decl::Class(_) | Decl::Interface(_)) => DataType::named(ident.name),
                _ => DataType::Error,
            },
            TypeKind::Array(elem) => match self.resolve_type(elem) {
                DataType::Error => DataType::Error,
                elem => DataType::array_of(elem),
            },
            _ => ty.to_data_type(),
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn typed_count(&self) -> usize {
        self.types.len()
    }
}

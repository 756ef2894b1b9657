//! Pass 3: check inheritance and interface conformance.
//!
//! Compares every class member against same-named members visible through
//! the superclass chain and through the implemented interfaces, then checks
//! that each implemented interface is fully provided.

use decaf_ast::{ClassDecl, Decl, FnDecl, Ident, Program};
use decaf_core::{DataType, DiagnosticSink, SemanticError};

use crate::annotations::Annotations;
use crate::compat::signatures_match;
use crate::scope::{OwnerKind, ScopeManager};

/// Output of the inheritance pass.
#[derive(Debug, Default)]
pub struct InheritanceOutput {
    pub classes_checked: usize,
    /// Methods that validly override an inherited method.
    pub overrides: usize,
}

pub struct InheritancePass<'a, 'ast> {
    scopes: &'a mut ScopeManager<'ast>,
    annotations: &'a Annotations<'ast>,
    diagnostics: &'a mut dyn DiagnosticSink,
    output: InheritanceOutput,
}

/// A function signature with every type resolved.
struct Signature {
    ret: DataType,
    formals: Vec<DataType>,
}

impl<'a, 'ast> InheritancePass<'a, 'ast> {
    pub fn new(
        scopes: &'a mut ScopeManager<'ast>,
        annotations: &'a Annotations<'ast>,
        diagnostics: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            scopes,
            annotations,
            diagnostics,
            output: InheritanceOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> InheritanceOutput {
        self.scopes.reset();
        for decl in program.decls {
            if let Decl::Class(class) = *decl {
                self.class(class);
            }
        }
        log::debug!(
            "inheritance: {} classes, {} overrides",
            self.output.classes_checked,
            self.output.overrides
        );
        self.output
    }

    /// The signature of `func`, or `None` if any of its types failed to
    /// resolve. Unresolved signatures were already reported and are not
    /// compared.
    fn signature(&self, func: &FnDecl<'ast>) -> Option<Signature> {
        let ret = self.annotations.resolve_type(func.return_type);
        let formals: Vec<_> = func
            .formals
            .iter()
            .map(|f| self.annotations.resolve_type(f.ty))
            .collect();
        if ret.is_error() || formals.iter().any(DataType::is_error) {
            return None;
        }
        Some(Signature { ret, formals })
    }

    fn same_signature(&self, a: &FnDecl<'ast>, b: &FnDecl<'ast>) -> bool {
        match (self.signature(a), self.signature(b)) {
            (Some(a), Some(b)) => signatures_match(&a.ret, &a.formals, &b.ret, &b.formals),
            _ => true,
        }
    }

    fn conflict(&mut self, member: Ident<'ast>, previous: Decl<'ast>) {
        self.diagnostics.report(SemanticError::DeclConflict {
            name: member.name.to_string(),
            previous_line: previous.ident().span.line,
            span: member.span,
        });
    }

    fn override_mismatch(&mut self, method: &FnDecl<'ast>) {
        self.diagnostics.report(SemanticError::OverrideMismatch {
            name: method.name.name.to_string(),
            span: method.name.span,
        });
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) {
        self.output.classes_checked += 1;
        self.scopes
            .enter_named_scope(class.id, class.name.name, OwnerKind::Class);
        for member in class.members {
            match *member {
                Decl::Var(var) => self.field(var.name),
                Decl::Function(method) => self.method(method),
                Decl::Class(_) | Decl::Interface(_) => {}
            }
        }
        self.interfaces(class);
        self.scopes.exit_scope();
    }

    fn field(&mut self, name: Ident<'ast>) {
        if let Some(inherited) = self.scopes.lookup_in_parent_chain(name.name) {
            self.conflict(name, inherited);
        } else if let Some(required) = self.scopes.lookup_in_interfaces(name.name) {
            self.conflict(name, required);
        }
    }

    fn method(&mut self, method: &'ast FnDecl<'ast>) {
        match self.scopes.lookup_in_parent_chain(method.name.name) {
            Some(Decl::Function(inherited)) => {
                if self.same_signature(method, inherited) {
                    self.output.overrides += 1;
                } else {
                    self.override_mismatch(method);
                }
            }
            Some(other) => self.conflict(method.name, other),
            None => {}
        }
        if let Some(Decl::Function(required)) = self.scopes.lookup_in_interfaces(method.name.name)
            && !self.same_signature(method, required)
        {
            self.override_mismatch(method);
        }
    }

    /// Check that every implemented interface is provided by the class or an
    /// ancestor. Checking stops at the first interface that is not.
    fn interfaces(&mut self, class: &'ast ClassDecl<'ast>) {
        for &iface_name in class.implements {
            let Some(Decl::Interface(iface)) = self.annotations.decl_of(iface_name) else {
                continue;
            };
            let provided = iface.members.iter().all(|required| {
                match self.scopes.lookup_field(class.name.name, required.name.name) {
                    Some(Decl::Function(method)) => self.same_signature(method, required),
                    _ => false,
                }
            });
            if !provided {
                self.diagnostics.report(SemanticError::InterfaceNotImplemented {
                    class: class.name.name.to_string(),
                    interface: iface.name.name.to_string(),
                    span: iface_name.span,
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{resolve::ResolvePass, symbols::SymbolTablePass};
    use bumpalo::Bump;
    use decaf_ast::AstBuilder;
    use decaf_core::Diagnostics;

    fn check(program: &Program<'_>) -> Diagnostics {
        let mut scopes = ScopeManager::new();
        let mut annotations = Annotations::new();
        let mut diags = Diagnostics::new();
        SymbolTablePass::new(&mut scopes, &mut diags).run(program);
        ResolvePass::new(&mut scopes, &mut annotations, &mut diags).run(program);
        InheritancePass::new(&mut scopes, &annotations, &mut diags).run(program);
        diags
    }

    #[test]
    fn matching_override_is_accepted() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let speak = |value| {
            b.function(
                "Speak",
                b.int_type(),
                &[],
                Some(b.block(&[], &[b.return_stmt(Some(b.int(value)))])),
            )
        };
        let program = b.program(&[
            b.class("Animal", None, &[], &[b.var_decl("legs", b.int_type()), speak(0)]),
            b.class("Dog", Some("Animal"), &[], &[speak(1)]),
        ]);

        assert!(check(program).is_empty());
    }

    #[test]
    fn changed_return_type_is_override_mismatch() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.class(
                "A",
                None,
                &[],
                &[b.function("f", b.int_type(), &[], Some(b.block(&[], &[])))],
            ),
            b.class(
                "B",
                Some("A"),
                &[],
                &[b.function("f", b.bool_type(), &[], Some(b.block(&[], &[])))],
            ),
        ]);

        let diags = check(program);
        assert_eq!(
            diags.count(|e| matches!(e, SemanticError::OverrideMismatch { .. })),
            1
        );
    }

    #[test]
    fn changed_arity_is_override_mismatch() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.var("x", b.int_type());
        let program = b.program(&[
            b.class(
                "A",
                None,
                &[],
                &[b.function("f", b.void_type(), &[], Some(b.block(&[], &[])))],
            ),
            b.class(
                "B",
                Some("A"),
                &[],
                &[b.function("f", b.void_type(), &[x], Some(b.block(&[], &[])))],
            ),
        ]);

        assert!(check(program).has(|e| matches!(e, SemanticError::OverrideMismatch { .. })));
    }

    #[test]
    fn field_shadowing_inherited_member_conflicts() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.class("A", None, &[], &[b.at(2, 5).var_decl("size", b.int_type())]),
            b.class("B", Some("A"), &[], &[b.at(7, 5).var_decl("size", b.int_type())]),
        ]);

        let diags = check(program);
        assert!(matches!(
            diags.as_slice(),
            [SemanticError::DeclConflict {
                previous_line: 2,
                ..
            }]
        ));
    }

    #[test]
    fn method_replacing_inherited_field_conflicts() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.class("A", None, &[], &[b.var_decl("size", b.int_type())]),
            b.class(
                "B",
                Some("A"),
                &[],
                &[b.function("size", b.int_type(), &[], Some(b.block(&[], &[])))],
            ),
        ]);

        assert!(check(program).has(|e| matches!(e, SemanticError::DeclConflict { .. })));
    }

    #[test]
    fn missing_interface_method_reported_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.interface(
                "Shape",
                &[
                    b.prototype("Area", b.int_type(), &[]),
                    b.prototype("Sides", b.int_type(), &[]),
                ],
            ),
            b.interface("Named", &[b.prototype("Name", b.string_type(), &[])]),
            b.class("Blob", None, &["Shape", "Named"], &[]),
        ]);

        let diags = check(program);
        assert!(matches!(
            diags.as_slice(),
            [SemanticError::InterfaceNotImplemented { interface, .. }] if interface == "Shape"
        ));
    }

    #[test]
    fn interface_satisfied_through_superclass() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let area = b.function(
            "Area",
            b.int_type(),
            &[],
            Some(b.block(&[], &[b.return_stmt(Some(b.int(4)))])),
        );
        let program = b.program(&[
            b.interface("Shape", &[b.prototype("Area", b.int_type(), &[])]),
            b.class("Base", None, &[], &[area]),
            b.class("Square", Some("Base"), &["Shape"], &[]),
        ]);

        assert!(check(program).is_empty());
    }

    #[test]
    fn interface_method_with_wrong_signature() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.interface("Shape", &[b.prototype("Area", b.int_type(), &[])]),
            b.class(
                "Circle",
                None,
                &["Shape"],
                &[b.function("Area", b.double_type(), &[], Some(b.block(&[], &[])))],
            ),
        ]);

        let diags = check(program);
        assert!(diags.has(|e| matches!(e, SemanticError::OverrideMismatch { .. })));
        assert!(diags.has(|e| matches!(e, SemanticError::InterfaceNotImplemented { .. })));
    }
}

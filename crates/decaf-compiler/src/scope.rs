//! Scope management for name resolution.
//!
//! The [`ScopeManager`] owns every scope the program has: the global scope,
//! one named scope per class, interface and function, and one lexical scope
//! per block. Scopes are keyed by the [`NodeId`] of the construct that opened
//! them. The first pass creates them; later passes call the same
//! `enter_*` methods and get the scope built earlier, so the forest is built
//! once and walked again after each [`ScopeManager::reset`].
//!
//! Class and interface scopes are also indexed by owner name. A class scope
//! records the name of its superclass and of the interfaces it implements,
//! and lookups follow those names to reach inherited members regardless of
//! where in the source the superclass was declared.
//!
//! ```text
//! global (0)
//! ├── class Dog (parent: Animal, interface: Pet)
//! │   └── fn Speak
//! │       └── block
//! └── fn main
//!     └── block
//! ```

use std::fmt;

use decaf_ast::{Decl, NodeId};
use decaf_core::SemanticError;
use rustc_hash::{FxHashMap, FxHashSet};

/// Index of a scope in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// What kind of declaration a named scope was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Class,
    Interface,
    Function,
}

/// One binding environment.
#[derive(Debug, Default)]
pub struct Scope<'ast> {
    /// Declarations in insertion order.
    entries: Vec<Decl<'ast>>,
    index: FxHashMap<&'ast str, usize>,
    /// Lexically enclosing scope.
    enclosing: Option<ScopeId>,
    owner: Option<(&'ast str, OwnerKind)>,
    /// Superclass name, for class scopes.
    parent: Option<&'ast str>,
    /// Implemented interface names, for class scopes.
    interfaces: Vec<&'ast str>,
}

impl<'ast> Scope<'ast> {
    pub fn get(&self, name: &str) -> Option<Decl<'ast>> {
        self.index.get(name).map(|&i| self.entries[i])
    }

    pub fn decls(&self) -> &[Decl<'ast>] {
        &self.entries
    }

    pub fn owner(&self) -> Option<(&'ast str, OwnerKind)> {
        self.owner
    }

    pub fn parent(&self) -> Option<&'ast str> {
        self.parent
    }

    pub fn interfaces(&self) -> &[&'ast str] {
        &self.interfaces
    }

    pub fn enclosing(&self) -> Option<ScopeId> {
        self.enclosing
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.owner.is_none()
            && self.parent.is_none()
            && self.interfaces.is_empty()
    }
}

/// The scope forest plus the stack of currently active scopes.
#[derive(Debug)]
pub struct ScopeManager<'ast> {
    scopes: Vec<Scope<'ast>>,
    active: Vec<ScopeId>,
    by_node: FxHashMap<NodeId, ScopeId>,
    /// Class and interface scopes by owner name.
    owners: FxHashMap<&'ast str, ScopeId>,
    /// The scope each declaration was inserted into.
    declared_in: FxHashMap<NodeId, ScopeId>,
}

impl Default for ScopeManager<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'ast> ScopeManager<'ast> {
    /// Create a manager holding only the global scope, which is active.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            active: vec![ScopeId::GLOBAL],
            by_node: FxHashMap::default(),
            owners: FxHashMap::default(),
            declared_in: FxHashMap::default(),
        }
    }

    /// Make the global scope the only active scope again.
    ///
    /// The forest itself is kept, so the next walk re-enters the scopes built
    /// by the previous one.
    pub fn reset(&mut self) {
        log::trace!("scope reset");
        self.active.clear();
        self.active.push(ScopeId::GLOBAL);
    }

    pub fn current(&self) -> ScopeId {
        self.active.last().copied().unwrap_or(ScopeId::GLOBAL)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'ast> {
        &self.scopes[id.0]
    }

    /// Number of scopes in the forest, global scope included.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Enter the lexical scope opened by `node`, creating it on first use.
    pub fn enter_scope(&mut self, node: NodeId) -> ScopeId {
        let id = self.scope_for(node);
        self.active.push(id);
        log::trace!("enter scope {} for {node}", id.0);
        id
    }

    /// Enter the named scope opened by `node` for `owner`, creating and
    /// registering it on first use.
    ///
    /// Class and interface scopes are indexed by name; the first scope
    /// registered under a name keeps it. Function scopes are tagged with
    /// their owner but not indexed.
    pub fn enter_named_scope(
        &mut self,
        node: NodeId,
        owner: &'ast str,
        kind: OwnerKind,
    ) -> ScopeId {
        let id = self.scope_for(node);
        let scope = &mut self.scopes[id.0];
        if scope.owner.is_none() {
            scope.owner = Some((owner, kind));
            if kind != OwnerKind::Function {
                self.owners.entry(owner).or_insert(id);
            }
        }
        self.active.push(id);
        log::trace!("enter scope {} owned by {owner}", id.0);
        id
    }

    fn scope_for(&mut self, node: NodeId) -> ScopeId {
        if let Some(&id) = self.by_node.get(&node) {
            return id;
        }
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            enclosing: Some(self.current()),
            ..Scope::default()
        });
        self.by_node.insert(node, id);
        id
    }

    /// Leave the current scope. The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.active.len() > 1 {
            let id = self.active.pop();
            log::trace!("exit scope {:?}", id.map(|s| s.0));
        }
    }

    /// Insert a declaration into the current scope.
    ///
    /// A declaration with the same name already in the current scope is a
    /// conflict; the existing one is kept.
    pub fn insert(&mut self, decl: Decl<'ast>) -> Result<(), SemanticError> {
        let current = self.current();
        let scope = &mut self.scopes[current.0];
        let name = decl.name();
        if let Some(previous) = scope.get(name) {
            return Err(SemanticError::DeclConflict {
                name: name.to_string(),
                previous_line: previous.ident().span.line,
                span: decl.ident().span,
            });
        }
        log::trace!("insert {name} into scope {}", current.0);
        scope.index.insert(name, scope.entries.len());
        scope.entries.push(decl);
        self.declared_in.insert(decl.id(), current);
        Ok(())
    }

    /// Look up `name` in the current scope only.
    pub fn local_lookup(&self, name: &str) -> Option<Decl<'ast>> {
        self.scopes[self.current().0].get(name)
    }

    /// Look up `name` from the innermost active scope outward. At each level
    /// the superclass chain of that scope is searched before moving out.
    pub fn lookup(&self, name: &str) -> Option<Decl<'ast>> {
        log::trace!("lookup {name}");
        self.active.iter().rev().find_map(|&id| {
            self.scopes[id.0]
                .get(name)
                .or_else(|| self.search_parents(id, name))
        })
    }

    /// Look up `name` only in the superclass chain of the current scope.
    pub fn lookup_in_parent_chain(&self, name: &str) -> Option<Decl<'ast>> {
        self.search_parents(self.current(), name)
    }

    /// Look up `name` in the interfaces implemented by the current scope,
    /// in declaration order.
    pub fn lookup_in_interfaces(&self, name: &str) -> Option<Decl<'ast>> {
        self.scopes[self.current().0]
            .interfaces
            .iter()
            .filter_map(|iface| self.owners.get(iface))
            .find_map(|&id| self.scopes[id.0].get(name))
    }

    /// Look up member `name` of the class or interface called `owner`,
    /// including members inherited through its superclass chain.
    pub fn lookup_field(&self, owner: &str, name: &str) -> Option<Decl<'ast>> {
        let id = *self.owners.get(owner)?;
        self.scopes[id.0]
            .get(name)
            .or_else(|| self.search_parents(id, name))
    }

    /// The class declaration whose body encloses the current scope.
    pub fn lookup_enclosing_class(&self) -> Option<Decl<'ast>> {
        self.active.iter().rev().find_map(|&id| match self.scopes[id.0].owner {
            Some((owner, OwnerKind::Class)) => match self.scopes[0].get(owner) {
                Some(decl @ Decl::Class(_)) => Some(decl),
                _ => None,
            },
            _ => None,
        })
    }

    fn search_parents(&self, start: ScopeId, name: &str) -> Option<Decl<'ast>> {
        let mut seen = FxHashSet::default();
        seen.insert(start);
        let mut scope = &self.scopes[start.0];
        while let Some(parent) = scope.parent {
            let id = *self.owners.get(parent)?;
            if !seen.insert(id) {
                return None;
            }
            scope = &self.scopes[id.0];
            if let Some(decl) = scope.get(name) {
                return Some(decl);
            }
        }
        None
    }

    /// Record the superclass of the current scope.
    pub fn set_parent(&mut self, parent: &'ast str) {
        let current = self.current();
        self.scopes[current.0].parent = Some(parent);
    }

    /// Record an interface implemented by the current scope.
    pub fn add_interface(&mut self, interface: &'ast str) {
        let current = self.current();
        self.scopes[current.0].interfaces.push(interface);
    }

    /// The scope registered for a class or interface name.
    pub fn owner_scope(&self, owner: &str) -> Option<ScopeId> {
        self.owners.get(owner).copied()
    }

    /// The scope opened by `node`, if any.
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&node).copied()
    }

    /// The scope a declaration was inserted into.
    pub fn declaring_scope(&self, decl: NodeId) -> Option<ScopeId> {
        self.declared_in.get(&decl).copied()
    }
}

fn describe(decl: &Decl<'_>) -> String {
    match decl {
        Decl::Var(v) => format!("{}: {} (line {})", v.name, v.ty.to_data_type(), v.span.line),
        Decl::Class(c) => format!("class {} (line {})", c.name, c.span.line),
        Decl::Interface(i) => format!("interface {} (line {})", i.name, i.span.line),
        Decl::Function(f) => format!(
            "{}({}) -> {} (line {})",
            f.name,
            f.formals
                .iter()
                .map(|p| p.ty.to_data_type().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            f.return_type.to_data_type(),
            f.span.line
        ),
    }
}

impl fmt::Display for ScopeManager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "======== Symbol Table ========")?;
        for (i, scope) in self.scopes.iter().enumerate() {
            if scope.is_empty() {
                continue;
            }
            write!(f, "|- Scope {i}:")?;
            if let Some((owner, _)) = scope.owner {
                write!(f, " (owner: {owner})")?;
            }
            if let Some(parent) = scope.parent {
                write!(f, " (parent: {parent})")?;
            }
            if !scope.interfaces.is_empty() {
                write!(f, " (interface: {})", scope.interfaces.join(" "))?;
            }
            writeln!(f)?;
            for decl in &scope.entries {
                writeln!(f, "|  + {}", describe(decl))?;
            }
        }
        write!(f, "======== Symbol Table ========")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use decaf_ast::AstBuilder;

    #[test]
    fn duplicate_insert_keeps_first() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let first = b.at(1, 5).var_decl("x", b.int_type());
        let second = b.at(2, 5).var_decl("x", b.bool_type());

        let mut scopes = ScopeManager::new();
        scopes.insert(first).unwrap();
        let err = scopes.insert(second).unwrap_err();

        assert!(matches!(
            err,
            SemanticError::DeclConflict { previous_line: 1, .. }
        ));
        assert_eq!(scopes.local_lookup("x"), Some(first));
    }

    #[test]
    fn shadowing_across_scopes_is_legal() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let outer = b.var_decl("x", b.int_type());
        let inner = b.var_decl("x", b.bool_type());
        let block = b.block(&[], &[]);

        let mut scopes = ScopeManager::new();
        scopes.insert(outer).unwrap();
        scopes.enter_scope(block.id);
        scopes.insert(inner).unwrap();
        assert_eq!(scopes.lookup("x"), Some(inner));
        scopes.exit_scope();
        assert_eq!(scopes.lookup("x"), Some(outer));
    }

    #[test]
    fn reenter_finds_same_scope() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let block = b.block(&[], &[]);
        let local = b.var_decl("y", b.int_type());

        let mut scopes = ScopeManager::new();
        let built = scopes.enter_scope(block.id);
        scopes.insert(local).unwrap();
        scopes.exit_scope();

        scopes.reset();
        assert_eq!(scopes.lookup("y"), None);
        let entered = scopes.enter_scope(block.id);
        assert_eq!(built, entered);
        assert_eq!(scopes.lookup("y"), Some(local));
    }

    #[test]
    fn lookup_follows_superclass_chain() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let legs = b.var_decl("legs", b.int_type());
        let animal = b.class("Animal", None, &[], &[legs]);
        let dog = b.class("Dog", Some("Animal"), &[], &[]);

        let mut scopes = ScopeManager::new();
        scopes.insert(animal).unwrap();
        scopes.insert(dog).unwrap();

        // Dog is declared (and its scope built) before Animal's scope.
        scopes.enter_named_scope(dog.id(), "Dog", OwnerKind::Class);
        scopes.set_parent("Animal");
        scopes.exit_scope();
        scopes.enter_named_scope(animal.id(), "Animal", OwnerKind::Class);
        scopes.insert(legs).unwrap();
        scopes.exit_scope();

        scopes.enter_named_scope(dog.id(), "Dog", OwnerKind::Class);
        assert_eq!(scopes.lookup("legs"), Some(legs));
        assert_eq!(scopes.lookup_in_parent_chain("legs"), Some(legs));
        assert_eq!(scopes.local_lookup("legs"), None);
        assert_eq!(scopes.lookup_enclosing_class(), Some(dog));
        scopes.exit_scope();

        assert_eq!(scopes.lookup_field("Dog", "legs"), Some(legs));
        assert_eq!(scopes.lookup_field("Cat", "legs"), None);
        assert_eq!(scopes.declaring_scope(legs.id()), scopes.owner_scope("Animal"));
        assert_eq!(scopes.declaring_scope(dog.id()), Some(ScopeId::GLOBAL));
    }

    #[test]
    fn cyclic_parents_terminate() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let a = b.class("A", Some("B"), &[], &[]);
        let c = b.class("B", Some("A"), &[], &[]);

        let mut scopes = ScopeManager::new();
        scopes.enter_named_scope(a.id(), "A", OwnerKind::Class);
        scopes.set_parent("B");
        scopes.exit_scope();
        scopes.enter_named_scope(c.id(), "B", OwnerKind::Class);
        scopes.set_parent("A");

        assert_eq!(scopes.lookup_in_parent_chain("missing"), None);
        assert_eq!(scopes.lookup_field("A", "missing"), None);
    }

    #[test]
    fn interfaces_are_searched() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let proto = b.prototype("Name", b.string_type(), &[]);
        let pet = b.interface("Pet", &[proto]);
        let dog = b.class("Dog", None, &["Pet"], &[]);

        let mut scopes = ScopeManager::new();
        scopes.enter_named_scope(pet.id(), "Pet", OwnerKind::Interface);
        scopes.insert(Decl::Function(proto)).unwrap();
        scopes.exit_scope();
        scopes.enter_named_scope(dog.id(), "Dog", OwnerKind::Class);
        scopes.add_interface("Pet");

        assert_eq!(scopes.lookup_in_interfaces("Name"), Some(Decl::Function(proto)));
        assert_eq!(scopes.lookup("Name"), None);
    }

    #[test]
    fn this_outside_class() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let main = b.function("main", b.void_type(), &[], None);

        let mut scopes = ScopeManager::new();
        scopes.insert(main).unwrap();
        scopes.enter_named_scope(main.id(), "main", OwnerKind::Function);
        assert_eq!(scopes.lookup_enclosing_class(), None);
    }

    #[test]
    fn global_scope_is_never_popped() {
        let mut scopes = ScopeManager::new();
        scopes.exit_scope();
        scopes.exit_scope();
        assert_eq!(scopes.current(), ScopeId::GLOBAL);
        assert_eq!(scopes.lookup_enclosing_class(), None);
    }

    #[test]
    fn dump_lists_owners() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let dog = b.class("Dog", Some("Animal"), &["Pet"], &[]);

        let mut scopes = ScopeManager::new();
        scopes.insert(dog).unwrap();
        scopes.enter_named_scope(dog.id(), "Dog", OwnerKind::Class);
        scopes.set_parent("Animal");
        scopes.add_interface("Pet");

        let dump = scopes.to_string();
        assert!(dump.contains("(owner: Dog) (parent: Animal) (interface: Pet)"));
        assert!(dump.contains("|  + class Dog"));
    }
}

//! Class hierarchy graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: top-level classes and interfaces
//! - Edges: `Extends` from a superclass to its subclass, `Implements` from
//!   an interface to each class that lists it
//!
//! Edges point from the more general type to the more specific one, so a
//! topological sort yields bases before the classes derived from them.

use decaf_ast::{ClassDecl, Decl, InterfaceDecl, Program};
use decaf_core::CodegenError;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

/// A class or interface in the hierarchy.
#[derive(Debug, Clone, Copy)]
pub enum TypeNode<'ast> {
    Class(&'ast ClassDecl<'ast>),
    Interface(&'ast InterfaceDecl<'ast>),
}

impl<'ast> TypeNode<'ast> {
    pub fn name(&self) -> &'ast str {
        match self {
            TypeNode::Class(c) => c.name.name,
            TypeNode::Interface(i) => i.name.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Extends,
    Implements,
}

/// Inheritance and implementation relations between the program's types.
#[derive(Debug)]
pub struct ClassHierarchy<'ast> {
    graph: DiGraph<TypeNode<'ast>, Relation>,
    index: FxHashMap<&'ast str, NodeIndex>,
}

impl<'ast> ClassHierarchy<'ast> {
    /// Build the hierarchy from the program's top-level declarations.
    ///
    /// A name declared twice keeps its first declaration. Superclass and
    /// interface names that do not name a type of the right kind get no
    /// edge.
    pub fn build(program: &Program<'ast>) -> Self {
        let mut graph = DiGraph::new();
        let mut index = FxHashMap::default();

        for decl in program.decls {
            let node = match decl {
                Decl::Class(c) => TypeNode::Class(c),
                Decl::Interface(i) => TypeNode::Interface(i),
                _ => continue,
            };
            if !index.contains_key(node.name()) {
                let ix = graph.add_node(node);
                index.insert(node.name(), ix);
            }
        }

        for decl in program.decls {
            let Decl::Class(class) = decl else { continue };
            let Some(&derived) = index.get(class.name.name) else {
                continue;
            };
            if !matches!(graph[derived], TypeNode::Class(c) if std::ptr::eq(c, *class)) {
                continue;
            }
            if let Some(base) = class.extends
                && let Some(&base_ix) = index.get(base.name)
                && matches!(graph[base_ix], TypeNode::Class(_))
            {
                graph.add_edge(base_ix, derived, Relation::Extends);
            }
            for iface in class.implements {
                if let Some(&iface_ix) = index.get(iface.name)
                    && matches!(graph[iface_ix], TypeNode::Interface(_))
                {
                    graph.add_edge(iface_ix, derived, Relation::Implements);
                }
            }
        }

        Self { graph, index }
    }

    pub fn get(&self, name: &str) -> Option<TypeNode<'ast>> {
        self.index.get(name).map(|&ix| self.graph[ix])
    }

    pub fn class(&self, name: &str) -> Option<&'ast ClassDecl<'ast>> {
        match self.get(name)? {
            TypeNode::Class(c) => Some(c),
            TypeNode::Interface(_) => None,
        }
    }

    /// Direct superclass of a class.
    pub fn superclass(&self, name: &str) -> Option<&'ast str> {
        let ix = *self.index.get(name)?;
        self.graph
            .edges_directed(ix, Direction::Incoming)
            .find(|e| *e.weight() == Relation::Extends)
            .map(|e| self.graph[e.source()].name())
    }

    /// The class followed by its ancestors, nearest first.
    ///
    /// Stops early if the chain loops back on itself.
    pub fn ancestors<'n>(&'n self, name: &'n str) -> Vec<&'n str> {
        let mut chain = vec![name];
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        seen.insert(name);
        let mut current = name;
        while let Some(parent) = self.superclass(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether `derived` is `ancestor` or a transitive subclass of it.
    pub fn is_subclass_of(&self, derived: &str, ancestor: &str) -> bool {
        self.ancestors(derived).contains(&ancestor)
    }

    /// Whether `class` or one of its ancestors lists `interface`.
    pub fn implements(&self, class: &str, interface: &str) -> bool {
        let Some(&iface_ix) = self.index.get(interface) else {
            return false;
        };
        self.ancestors(class).into_iter().any(|name| {
            self.index.get(name).is_some_and(|&ix| {
                self.graph
                    .edges_directed(ix, Direction::Incoming)
                    .any(|e| *e.weight() == Relation::Implements && e.source() == iface_ix)
            })
        })
    }

    /// All classes, every base before the classes derived from it.
    pub fn classes_base_first(&self) -> Result<Vec<&'ast ClassDecl<'ast>>, CodegenError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let node = self.graph[cycle.node_id()];
            let span = match node {
                TypeNode::Class(c) => c.span,
                TypeNode::Interface(i) => i.span,
            };
            CodegenError::CyclicInheritance {
                class: node.name().to_string(),
                span,
            }
        })?;

        Ok(order
            .into_iter()
            .filter_map(|ix| match self.graph[ix] {
                TypeNode::Class(c) => Some(c),
                TypeNode::Interface(_) => None,
            })
            .collect())
    }
}

//! Class layout and vtable construction.
//!
//! Every instance starts with a pointer to its class's vtable, followed by
//! one word per field in flattened order: inherited fields first, then the
//! class's own. The vtable has one slot per method in flattened order; an
//! override takes over the slot of the method it overrides, so a call
//! through a base-typed reference reaches the derived implementation.
//!
//! Global variables are laid out here as well, one word each in the global
//! segment.

use decaf_ast::{ClassDecl, Decl, FnDecl, NodeId, Program, VarDecl};
use decaf_core::{CodegenError, WORD_SIZE};
use rustc_hash::FxHashMap;

use crate::hierarchy::ClassHierarchy;

/// One vtable entry.
#[derive(Debug, Clone, Copy)]
pub struct MethodSlot<'ast> {
    /// Class providing the implementation in this slot.
    pub class: &'ast str,
    pub method: &'ast FnDecl<'ast>,
}

impl MethodSlot<'_> {
    pub fn name(&self) -> &str {
        self.method.name.name
    }

    /// Assembly label of the implementation, `_Class.method`.
    pub fn label(&self) -> String {
        method_label(self.class, self.name())
    }
}

/// Flattened layout of one class.
#[derive(Debug, Clone)]
pub struct ClassLayout<'ast> {
    pub name: &'ast str,
    /// Fields in offset order.
    pub fields: Vec<&'ast VarDecl<'ast>>,
    /// Methods in slot order.
    pub methods: Vec<MethodSlot<'ast>>,
}

impl<'ast> ClassLayout<'ast> {
    fn new(name: &'ast str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Bytes allocated per instance, vtable pointer included.
    pub fn instance_size(&self) -> i32 {
        WORD_SIZE + WORD_SIZE * self.fields.len() as i32
    }

    pub fn vtable_size(&self) -> i32 {
        WORD_SIZE * self.methods.len() as i32
    }

    /// Byte offset of the named field within an instance.
    pub fn field_offset(&self, name: &str) -> Option<i32> {
        self.fields
            .iter()
            .position(|f| f.name.name == name)
            .map(field_offset)
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name() == name)
    }

    /// Vtable entries in slot order.
    pub fn vtable_labels(&self) -> Vec<String> {
        self.methods.iter().map(MethodSlot::label).collect()
    }

    fn add_field(&mut self, field: &'ast VarDecl<'ast>) {
        match self.fields.iter().position(|f| f.name.name == field.name.name) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
    }

    fn add_method(&mut self, slot: MethodSlot<'ast>) -> usize {
        match self.slot_of(slot.name()) {
            Some(i) => {
                self.methods[i] = slot;
                i
            }
            None => {
                self.methods.push(slot);
                self.methods.len() - 1
            }
        }
    }
}

fn field_offset(index: usize) -> i32 {
    WORD_SIZE + WORD_SIZE * index as i32
}

/// Label of a method implementation.
pub fn method_label(class: &str, method: &str) -> String {
    format!("_{class}.{method}")
}

/// Layout of every class and global in a program.
#[derive(Debug, Default)]
pub struct ProgramLayout<'ast> {
    classes: FxHashMap<&'ast str, ClassLayout<'ast>>,
    /// Class names, every base before its subclasses.
    order: Vec<&'ast str>,
    /// Field offsets keyed by the field's declaration.
    field_offsets: FxHashMap<NodeId, i32>,
    /// Vtable slots keyed by the method's declaration.
    method_slots: FxHashMap<NodeId, usize>,
    /// Global-segment offsets keyed by the variable's declaration.
    globals: FxHashMap<NodeId, i32>,
    global_size: i32,
}

impl<'ast> ProgramLayout<'ast> {
    pub fn class(&self, name: &str) -> Option<&ClassLayout<'ast>> {
        self.classes.get(name)
    }

    /// Class layouts, every base before its subclasses.
    pub fn classes(&self) -> impl Iterator<Item = &ClassLayout<'ast>> + '_ {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn field_offset(&self, field: NodeId) -> Option<i32> {
        self.field_offsets.get(&field).copied()
    }

    pub fn method_slot(&self, method: NodeId) -> Option<usize> {
        self.method_slots.get(&method).copied()
    }

    pub fn global_offset(&self, var: NodeId) -> Option<i32> {
        self.globals.get(&var).copied()
    }

    /// Bytes of global segment in use.
    pub fn global_size(&self) -> i32 {
        self.global_size
    }
}

pub struct LayoutPass<'a, 'ast> {
    hierarchy: &'a ClassHierarchy<'ast>,
    layout: ProgramLayout<'ast>,
}

impl<'a, 'ast> LayoutPass<'a, 'ast> {
    pub fn new(hierarchy: &'a ClassHierarchy<'ast>) -> Self {
        Self {
            hierarchy,
            layout: ProgramLayout::default(),
        }
    }

    /// Lay out every class and global.
    ///
    /// Fails if the inheritance graph has a cycle.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> Result<ProgramLayout<'ast>, CodegenError> {
        for class in self.hierarchy.classes_base_first()? {
            self.class(class);
        }
        for decl in program.decls {
            if let Decl::Var(var) = *decl {
                self.layout
                    .globals
                    .insert(var.id, self.layout.global_size);
                self.layout.global_size += WORD_SIZE;
            }
        }
        log::debug!(
            "layout: {} classes, {} bytes of globals",
            self.layout.order.len(),
            self.layout.global_size
        );
        Ok(self.layout)
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) {
        let name = class.name.name;
        let mut layout = self
            .hierarchy
            .superclass(name)
            .and_then(|base| self.layout.classes.get(base))
            .cloned()
            .unwrap_or_else(|| ClassLayout::new(name));
        layout.name = name;

        for field in class.fields() {
            layout.add_field(field);
        }
        for method in class.methods() {
            let slot = layout.add_method(MethodSlot {
                class: name,
                method,
            });
            self.layout.method_slots.insert(method.id, slot);
        }
        for (i, field) in layout.fields.iter().enumerate() {
            self.layout.field_offsets.insert(field.id, field_offset(i));
        }

        log::debug!(
            "class {name}: fields [{}], vtable [{}], {} bytes",
            layout
                .fields
                .iter()
                .map(|f| f.name.name)
                .collect::<Vec<_>>()
                .join(", "),
            layout.vtable_labels().join(", "),
            layout.instance_size()
        );
        self.layout.order.push(name);
        self.layout.classes.insert(name, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use decaf_ast::AstBuilder;

    fn method<'ast>(b: &AstBuilder<'ast>, name: &str) -> Decl<'ast> {
        b.function(name, b.int_type(), &[], Some(b.block(&[], &[])))
    }

    #[test]
    fn override_reuses_base_slot() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let legs = b.var("legs", b.int_type());
        let Decl::Function(base_speak) = method(&b, "Speak") else {
            unreachable!()
        };
        let Decl::Function(dog_speak) = method(&b, "Speak") else {
            unreachable!()
        };
        let program = b.program(&[
            b.class(
                "Animal",
                None,
                &[],
                &[Decl::Var(legs), Decl::Function(base_speak)],
            ),
            b.class("Dog", Some("Animal"), &[], &[Decl::Function(dog_speak)]),
        ]);
        let hierarchy = ClassHierarchy::build(program);
        let layout = LayoutPass::new(&hierarchy).run(program).unwrap();

        let dog = layout.class("Dog").unwrap();
        assert_eq!(dog.fields.len(), 1);
        assert_eq!(dog.methods.len(), 1);
        assert_eq!(dog.field_offset("legs"), Some(4));
        assert_eq!(dog.instance_size(), 8);
        assert_eq!(dog.vtable_labels(), ["_Dog.Speak"]);
        assert_eq!(layout.method_slot(base_speak.id), layout.method_slot(dog_speak.id));
        assert_eq!(layout.class("Animal").unwrap().vtable_labels(), ["_Animal.Speak"]);
    }

    #[test]
    fn mismatched_override_still_takes_base_slot() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let Decl::Function(base_speak) = method(&b, "Speak") else {
            unreachable!()
        };
        let Decl::Function(base_sit) = method(&b, "Sit") else {
            unreachable!()
        };
        let loud = b.var("loud", b.bool_type());
        let dog_speak = b.fn_decl("Speak", b.string_type(), &[loud], Some(b.block(&[], &[])));
        let program = b.program(&[
            b.class(
                "Animal",
                None,
                &[],
                &[Decl::Function(base_speak), Decl::Function(base_sit)],
            ),
            b.class("Dog", Some("Animal"), &[], &[Decl::Function(dog_speak)]),
        ]);
        let hierarchy = ClassHierarchy::build(program);
        let layout = LayoutPass::new(&hierarchy).run(program).unwrap();

        assert_eq!(layout.method_slot(base_speak.id), Some(0));
        assert_eq!(layout.method_slot(dog_speak.id), Some(0));
        let dog = layout.class("Dog").unwrap();
        assert_eq!(dog.vtable_labels(), ["_Dog.Speak", "_Animal.Sit"]);
        assert_eq!(dog.vtable_size(), 8);
    }

    #[test]
    fn fields_across_three_levels_do_not_overlap() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let a = b.var("a", b.int_type());
        let bf = b.var("b", b.bool_type());
        let c = b.var("c", b.string_type());
        let program = b.program(&[
            b.class("C", Some("B"), &[], &[Decl::Var(c), method(&b, "g")]),
            b.class("B", Some("A"), &[], &[Decl::Var(bf), method(&b, "f")]),
            b.class("A", None, &[], &[Decl::Var(a), method(&b, "f")]),
        ]);
        let hierarchy = ClassHierarchy::build(program);
        let layout = LayoutPass::new(&hierarchy).run(program).unwrap();

        let offsets = [a.id, bf.id, c.id].map(|id| layout.field_offset(id).unwrap());
        assert_eq!(offsets, [4, 8, 12]);
        let class_c = layout.class("C").unwrap();
        assert_eq!(class_c.instance_size(), 16);
        assert_eq!(class_c.vtable_labels(), ["_B.f", "_C.g"]);
        assert_eq!(class_c.vtable_size(), 8);
        let order: Vec<_> = layout.classes().map(|c| c.name).collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn globals_get_ascending_offsets() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.var("x", b.int_type());
        let y = b.var("y", b.string_type());
        let program = b.program(&[Decl::Var(x), method(&b, "main"), Decl::Var(y)]);
        let hierarchy = ClassHierarchy::build(program);
        let layout = LayoutPass::new(&hierarchy).run(program).unwrap();

        assert_eq!(layout.global_offset(x.id), Some(0));
        assert_eq!(layout.global_offset(y.id), Some(4));
        assert_eq!(layout.global_size(), 8);
    }

    #[test]
    fn inheritance_cycle_fails() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[
            b.class("A", Some("B"), &[], &[]),
            b.class("B", Some("A"), &[], &[]),
        ]);
        let hierarchy = ClassHierarchy::build(program);
        let result = LayoutPass::new(&hierarchy).run(program);

        assert!(matches!(result, Err(CodegenError::CyclicInheritance { .. })));
    }
}

//! Three-address code generation.
//!
//! The [`CodeGenerator`] walks a checked program once, depth first, and
//! emits one flat instruction list: each function and method in
//! declaration order, each class's vtable after its methods.
//!
//! Generation assumes the checker passes reported no errors. Constructs the
//! back end cannot handle (double values, calls through an interface) are
//! reported as [`CodegenError`]s.

mod expr;
mod stmt;

use decaf_ast::{Block, ClassDecl, Decl, Expr, FnDecl, NodeId, Program};
use decaf_core::{CodegenError, DataType, DecafError, SemanticError};
use rustc_hash::FxHashMap;

use crate::annotations::Annotations;
use crate::emit::TacEmitter;
use crate::passes::layout::{ProgramLayout, method_label};
use crate::tac::{Location, TacProgram};

/// Runtime error printed when an array index is out of range.
pub const SUBSCRIPT_OUT_OF_BOUNDS: &str = "Decaf runtime error: Array subscript out of bounds\\n";

/// Runtime error printed when `NewArray` is given a size below one.
pub const BAD_ARRAY_SIZE: &str = "Decaf runtime error: Array size is <= 0\\n";

/// Label of a free function.
pub fn function_label(name: &str) -> String {
    if name == "main" {
        name.to_string()
    } else {
        format!("_{name}")
    }
}

pub struct CodeGenerator<'a, 'ast> {
    annotations: &'a Annotations<'ast>,
    layout: &'a ProgramLayout<'ast>,
    emitter: TacEmitter,
    /// Storage of globals, parameters and locals, keyed by declaration.
    slots: FxHashMap<NodeId, Location>,
    /// Hidden `this` parameter of the method being generated.
    this: Option<Location>,
}

impl<'a, 'ast> CodeGenerator<'a, 'ast> {
    pub fn new(annotations: &'a Annotations<'ast>, layout: &'a ProgramLayout<'ast>) -> Self {
        Self {
            annotations,
            layout,
            emitter: TacEmitter::new(),
            slots: FxHashMap::default(),
            this: None,
        }
    }

    /// Generate code for the whole program.
    ///
    /// A program without a top-level `main` produces no code and fails with
    /// [`SemanticError::NoMainFound`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self, program: &Program<'ast>) -> Result<TacProgram, DecafError> {
        let has_main = program
            .decls
            .iter()
            .any(|d| matches!(d, Decl::Function(f) if f.name.name == "main"));
        if !has_main {
            return Err(SemanticError::NoMainFound.into());
        }

        for decl in program.decls {
            if let Decl::Var(var) = *decl {
                let offset = self.layout.global_offset(var.id).ok_or_else(|| {
                    CodegenError::internal(format!("no global slot for '{}'", var.name))
                })?;
                self.slots
                    .insert(var.id, Location::global(offset, var.name.name));
            }
        }
        for decl in program.decls {
            match *decl {
                Decl::Function(func) => self.function(func, None)?,
                Decl::Class(class) => self.class(class)?,
                Decl::Var(_) | Decl::Interface(_) => {}
            }
        }

        let program = self.emitter.finish();
        log::debug!("codegen: {} instructions", program.len());
        Ok(program)
    }

    fn class(&mut self, class: &'ast ClassDecl<'ast>) -> Result<(), CodegenError> {
        for method in class.methods() {
            self.function(method, Some(class))?;
        }
        let layout = self.layout.class(class.name.name).ok_or_else(|| {
            CodegenError::internal(format!("no layout for class '{}'", class.name))
        })?;
        self.emitter.vtable(class.name.name, layout.vtable_labels());
        Ok(())
    }

    fn function(
        &mut self,
        func: &'ast FnDecl<'ast>,
        class: Option<&'ast ClassDecl<'ast>>,
    ) -> Result<(), CodegenError> {
        let label = match class {
            Some(class) => method_label(class.name.name, func.name.name),
            None => function_label(func.name.name),
        };
        self.emitter.begin_function(label);
        self.this = class.map(|_| self.emitter.param("this"));
        for formal in func.formals {
            let slot = self.emitter.param(formal.name.name);
            self.slots.insert(formal.id, slot);
        }
        if let Some(body) = func.body {
            self.block(body)?;
        }
        self.emitter.end_function();
        self.this = None;
        Ok(())
    }

    fn block(&mut self, block: &'ast Block<'ast>) -> Result<(), CodegenError> {
        for local in block.decls {
            let slot = self.emitter.local(local.name.name);
            self.slots.insert(local.id, slot);
        }
        for &stmt in block.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn type_of(&self, expr: &Expr<'ast>) -> DataType {
        self.annotations.type_of(expr)
    }
}

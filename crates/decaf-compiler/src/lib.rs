//! Decaf Compiler
//!
//! Semantic checking and code generation for an already-parsed Decaf
//! program.
//!
//! ## Architecture
//!
//! - **Pass 1 (Symbols)**: insert every declaration into its scope
//! - **Pass 2 (Resolve)**: bind identifiers and named types
//! - **Pass 3 (Inheritance)**: check overrides and interface conformance
//! - **Pass 4 (Type check)**: compute and check every expression type
//! - **Layout**: flatten fields and methods into offsets and vtable slots
//! - **Codegen**: lower to three-address code
//! - **Target**: lower three-address code to MIPS assembly
//!
//! Checking never stops at the first error. Code is only generated for
//! programs that check cleanly.
//!
//! ## Modules
//!
//! - [`scope`]: scope forest with named class, interface and function scopes
//! - [`hierarchy`]: class and interface inheritance graph
//! - [`annotations`]: identifier bindings and expression types
//! - [`compat`]: assignment compatibility and signature matching
//! - [`passes`]: the checker passes and the layout pass
//! - [`tac`]: three-address instructions and storage locations
//! - [`emit`]: instruction emitter with temporaries, labels and frames
//! - [`codegen`]: AST to three-address code
//! - [`target`]: three-address code to assembly
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use decaf_ast::AstBuilder;
//! use decaf_compiler::{Compiler, CompilerOptions};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let body = b.block(&[], &[b.print_stmt(&[b.string("hello")])]);
//! let main = b.function("main", b.void_type(), &[], Some(body));
//! let program = b.program(&[main]);
//!
//! let result = Compiler::new(CompilerOptions::default()).compile(&program).unwrap();
//! assert!(result.is_success());
//! assert!(result.output.unwrap().contains("jal _PrintString"));
//! ```

pub mod annotations;
pub mod codegen;
pub mod compat;
pub mod emit;
pub mod hierarchy;
pub mod passes;
pub mod scope;
pub mod tac;
pub mod target;

pub use annotations::Annotations;
pub use codegen::CodeGenerator;
pub use compat::{is_compatible, signatures_match};
pub use emit::{Builtin, TacEmitter};
pub use hierarchy::ClassHierarchy;
pub use passes::{
    ClassLayout, InheritancePass, LayoutPass, MethodSlot, ProgramLayout, ResolvePass,
    SymbolTablePass, TypeCheckPass,
};
pub use scope::{OwnerKind, ScopeId, ScopeManager};
pub use tac::{Instruction, Location, Segment, TacOp, TacProgram};
pub use target::MipsEmitter;

pub use decaf_core::{DecafError, Diagnostics, SemanticError};

use decaf_ast::Program;
use decaf_core::DiagnosticSink;

/// What [`Compiler::compile`] renders for a clean program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// MIPS assembly.
    #[default]
    Assembly,
    /// The three-address instruction list as text.
    ThreeAddress,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub output: OutputFormat,
    /// Log the scope forest at `debug` once the checker has run.
    pub dump_symbols: bool,
}

impl CompilerOptions {
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn with_dump_symbols(mut self, dump: bool) -> Self {
        self.dump_symbols = dump;
        self
    }
}

/// Everything the checker learned about a program.
#[derive(Debug)]
pub struct Analysis<'ast> {
    pub scopes: ScopeManager<'ast>,
    pub annotations: Annotations<'ast>,
    pub hierarchy: ClassHierarchy<'ast>,
    pub diagnostics: Diagnostics,
}

impl Analysis<'_> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of compilation.
#[derive(Debug)]
pub struct CompilationResult {
    /// Every semantic error, in report order.
    pub diagnostics: Diagnostics,
    /// Rendered program. `None` when there were errors.
    pub output: Option<String>,
}

impl CompilationResult {
    /// Check if compilation succeeded (no errors).
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The main compiler entry point.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Run the four checker passes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze<'ast>(&self, program: &Program<'ast>) -> Analysis<'ast> {
        let mut scopes = ScopeManager::new();
        let mut annotations = Annotations::new();
        let mut diagnostics = Diagnostics::new();
        let hierarchy = ClassHierarchy::build(program);

        SymbolTablePass::new(&mut scopes, &mut diagnostics).run(program);
        ResolvePass::new(&mut scopes, &mut annotations, &mut diagnostics).run(program);
        InheritancePass::new(&mut scopes, &annotations, &mut diagnostics).run(program);
        TypeCheckPass::new(&mut scopes, &mut annotations, &hierarchy, &mut diagnostics)
            .run(program);

        log::debug!(
            "analyze: {} bindings, {} typed expressions, {} errors",
            annotations.resolved_count(),
            annotations.typed_count(),
            diagnostics.len()
        );
        if self.options.dump_symbols {
            log::debug!("symbol table:\n{scopes}");
        }
        Analysis {
            scopes,
            annotations,
            hierarchy,
            diagnostics,
        }
    }

    /// Check the program and, if it is clean, generate code.
    ///
    /// Semantic problems, a missing `main` included, come back as
    /// diagnostics. An `Err` means the back end could not handle a program
    /// that checked cleanly.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, program: &Program<'_>) -> Result<CompilationResult, DecafError> {
        let Analysis {
            annotations,
            hierarchy,
            mut diagnostics,
            ..
        } = self.analyze(program);

        if !diagnostics.is_empty() {
            log::info!("compile: {} errors, no code generated", diagnostics.len());
            return Ok(CompilationResult {
                diagnostics,
                output: None,
            });
        }

        let layout = LayoutPass::new(&hierarchy).run(program)?;
        let tac = match CodeGenerator::new(&annotations, &layout).generate(program) {
            Ok(tac) => tac,
            Err(DecafError::Semantic(error)) => {
                diagnostics.report(error);
                log::info!("compile: {} errors, no code generated", diagnostics.len());
                return Ok(CompilationResult {
                    diagnostics,
                    output: None,
                });
            }
            Err(error) => return Err(error),
        };

        let output = match self.options.output {
            OutputFormat::Assembly => MipsEmitter::new().emit(&tac),
            OutputFormat::ThreeAddress => tac.to_string(),
        };
        log::info!(
            "compile: {} instructions, {} bytes of output",
            tac.len(),
            output.len()
        );
        Ok(CompilationResult {
            diagnostics,
            output: Some(output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use decaf_ast::AstBuilder;

    #[test]
    fn errors_suppress_output() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[], &[b.break_stmt()]);
        let main = b.function("main", b.void_type(), &[], Some(body));
        let program = b.program(&[main]);

        let result = Compiler::default().compile(&program).unwrap();
        assert!(!result.is_success());
        assert!(result.output.is_none());
        assert!(
            result
                .diagnostics
                .has(|e| matches!(e, SemanticError::BreakOutsideLoop { .. }))
        );
    }

    #[test]
    fn missing_main_is_a_diagnostic() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let helper = b.function("helper", b.void_type(), &[], Some(b.block(&[], &[])));
        let program = b.program(&[helper]);

        let result = Compiler::default().compile(&program).unwrap();
        assert!(result.output.is_none());
        assert_eq!(result.diagnostics.as_slice(), &[SemanticError::NoMainFound]);
    }

    #[test]
    fn three_address_output() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[], &[b.print_stmt(&[b.int(7)])]);
        let main = b.function("main", b.void_type(), &[], Some(body));
        let program = b.program(&[main]);

        let options = CompilerOptions::default()
            .with_output(OutputFormat::ThreeAddress)
            .with_dump_symbols(true);
        let output = Compiler::new(options).compile(&program).unwrap().output.unwrap();

        assert!(output.starts_with("main:\n\tBeginFunc 4\n"));
        assert!(output.contains("\t_tmp0 = 7\n"));
        assert!(output.contains("\tLCall _PrintInt\n"));
    }

    #[test]
    fn analysis_keeps_scopes() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let global = b.var_decl("count", b.int_type());
        let main = b.function("main", b.void_type(), &[], Some(b.block(&[], &[])));
        let program = b.program(&[global, main]);

        let analysis = Compiler::default().analyze(&program);
        assert!(analysis.is_clean());
        assert!(analysis.scopes.to_string().contains("count"));
    }

    #[test]
    fn analysis_records_bindings_and_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let global = b.var_decl("count", b.int_type());
        let body = b.block(&[], &[b.print_stmt(&[b.var_ref("count")])]);
        let main = b.function("main", b.void_type(), &[], Some(body));
        let program = b.program(&[global, main]);

        let analysis = Compiler::default().analyze(&program);
        assert!(analysis.is_clean());
        assert!(analysis.annotations.resolved_count() >= 1);
        assert!(analysis.annotations.typed_count() >= 1);
    }
}

//! Decaf
//!
//! Semantic analysis and MIPS code generation for the Decaf teaching
//! language. The parser lives outside this workspace; it hands over a
//! program built with [`ast::AstBuilder`].
//!
//! # Example
//!
//! ```
//! use decaf::prelude::*;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let x = b.var("x", b.int_type());
//! let body = b.block(
//!     &[x],
//!     &[
//!         b.expr_stmt(b.assign(b.var_ref("x"), b.int(41))),
//!         b.print_stmt(&[b.binary(BinaryOp::Add, b.var_ref("x"), b.int(1))]),
//!     ],
//! );
//! let main = b.function("main", b.void_type(), &[], Some(body));
//! let program = b.program(&[main]);
//!
//! let result = Compiler::default().compile(&program)?;
//! assert!(result.is_success());
//! # Ok::<(), DecafError>(())
//! ```

pub use decaf_ast as ast;
pub use decaf_compiler as compiler;
pub use decaf_core as core;

pub mod prelude {
    pub use bumpalo::Bump;
    pub use decaf_ast::{AstBuilder, BinaryOp, PostfixOp, Program, UnaryOp};
    pub use decaf_compiler::{
        Analysis, CompilationResult, Compiler, CompilerOptions, MipsEmitter, OutputFormat,
        TacProgram,
    };
    pub use decaf_core::{
        CodegenError, DataType, DecafError, DiagnosticSink, Diagnostics, SemanticError, Span,
    };
}

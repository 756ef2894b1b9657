//! Core types shared by the Decaf front and back end.
//!
//! - [`Span`]: source ranges attached to AST nodes
//! - [`DataType`]: static types computed by the checker
//! - [`SemanticError`], [`CodegenError`], [`DecafError`]: the error taxonomy
//! - [`DiagnosticSink`], [`Diagnostics`]: how the checker reports

pub mod data_type;
pub mod diagnostics;
pub mod error;
pub mod span;

pub use data_type::{DataType, WORD_SIZE};
pub use diagnostics::{DiagnosticSink, Diagnostics};
pub use error::{CodegenError, DecafError, LookingFor, SemanticError};
pub use span::Span;

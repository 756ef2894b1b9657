//! Error types for semantic analysis and code generation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! DecafError (top-level wrapper)
//! ├── SemanticError - diagnostics reported by the checker passes
//! └── CodegenError  - fatal conditions hit by layout, codegen or the emitter
//! ```
//!
//! Semantic errors are recoverable: the checker reports them through a
//! [`DiagnosticSink`](crate::DiagnosticSink) and keeps walking. Codegen errors
//! mean the checker let something through that the back end cannot handle and
//! abort the compilation.

use std::fmt;

use thiserror::Error;

use crate::{DataType, Span};

// ============================================================================
// Semantic Errors
// ============================================================================

/// What kind of declaration an unresolved identifier was expected to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookingFor {
    Type,
    Class,
    Interface,
    Variable,
    Function,
}

impl fmt::Display for LookingFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookingFor::Type => "type",
            LookingFor::Class => "class",
            LookingFor::Interface => "interface",
            LookingFor::Variable => "variable",
            LookingFor::Function => "function",
        };
        f.write_str(s)
    }
}

/// A diagnostic produced by one of the checker passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// Two declarations with the same name in one scope, or a member
    /// colliding with an inherited member of a different kind.
    #[error("at {span}: *** Declaration of '{name}' here conflicts with declaration on line {previous_line}")]
    DeclConflict {
        name: String,
        previous_line: u32,
        span: Span,
    },

    /// A method whose signature differs from the inherited or interface one.
    #[error("at {span}: *** Method '{name}' must match inherited type signature")]
    OverrideMismatch { name: String, span: Span },

    #[error("at {span}: *** Class '{class}' does not implement entire interface '{interface}'")]
    InterfaceNotImplemented {
        class: String,
        interface: String,
        span: Span,
    },

    #[error("at {span}: *** No declaration found for {reason} '{name}'")]
    IdentifierNotDeclared {
        name: String,
        reason: LookingFor,
        span: Span,
    },

    /// Unary operator applied to an operand of the wrong type.
    #[error("at {span}: *** Incompatible operand: {op} {operand}")]
    IncompatibleOperand {
        op: String,
        operand: DataType,
        span: Span,
    },

    /// Binary operator (including `=`) applied to mismatched operands.
    #[error("at {span}: *** Incompatible operands: {left} {op} {right}")]
    IncompatibleOperands {
        op: String,
        left: DataType,
        right: DataType,
        span: Span,
    },

    #[error("at {span}: *** 'this' is only valid within class scope")]
    ThisOutsideClassScope { span: Span },

    #[error("at {span}: *** [] can only be applied to arrays")]
    BracketsOnNonArray { span: Span },

    #[error("at {span}: *** Array subscript must be an integer")]
    SubscriptNotInteger { span: Span },

    #[error("at {span}: *** Size for NewArray must be an integer")]
    NewArraySizeNotInteger { span: Span },

    #[error("at {span}: *** Function '{name}' expects {expected} argument{} but {given} given", plural(.expected))]
    NumArgsMismatch {
        name: String,
        expected: usize,
        given: usize,
        span: Span,
    },

    #[error("at {span}: *** Incompatible argument {index}: {given} given, {expected} expected")]
    ArgMismatch {
        index: usize,
        given: DataType,
        expected: DataType,
        span: Span,
    },

    #[error("at {span}: *** Incompatible argument {index}: {given} given, int/bool/string expected")]
    PrintArgMismatch {
        index: usize,
        given: DataType,
        span: Span,
    },

    #[error("at {span}: *** {base} has no such field '{field}'")]
    FieldNotFoundInBase {
        field: String,
        base: DataType,
        span: Span,
    },

    #[error("at {span}: *** {base} field '{field}' only accessible within class scope")]
    InaccessibleField {
        field: String,
        base: DataType,
        span: Span,
    },

    #[error("at {span}: *** Test expression must have boolean type")]
    TestNotBoolean { span: Span },

    #[error("at {span}: *** Incompatible return: {given} given, {expected} expected")]
    ReturnMismatch {
        given: DataType,
        expected: DataType,
        span: Span,
    },

    #[error("at {span}: *** break is only allowed inside a loop")]
    BreakOutsideLoop { span: Span },

    #[error("at {span}: *** Return value of 'main' function is expected to be void")]
    MainNotVoid { span: Span },

    #[error("*** Linker: function 'main' not defined")]
    NoMainFound,
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 { "" } else { "s" }
}

impl SemanticError {
    /// Get the span where this error occurred.
    ///
    /// [`SemanticError::NoMainFound`] concerns the whole program and returns
    /// [`Span::default`].
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DeclConflict { span, .. }
            | SemanticError::OverrideMismatch { span, .. }
            | SemanticError::InterfaceNotImplemented { span, .. }
            | SemanticError::IdentifierNotDeclared { span, .. }
            | SemanticError::IncompatibleOperand { span, .. }
            | SemanticError::IncompatibleOperands { span, .. }
            | SemanticError::ThisOutsideClassScope { span }
            | SemanticError::BracketsOnNonArray { span }
            | SemanticError::SubscriptNotInteger { span }
            | SemanticError::NewArraySizeNotInteger { span }
            | SemanticError::NumArgsMismatch { span, .. }
            | SemanticError::ArgMismatch { span, .. }
            | SemanticError::PrintArgMismatch { span, .. }
            | SemanticError::FieldNotFoundInBase { span, .. }
            | SemanticError::InaccessibleField { span, .. }
            | SemanticError::TestNotBoolean { span }
            | SemanticError::ReturnMismatch { span, .. }
            | SemanticError::BreakOutsideLoop { span }
            | SemanticError::MainNotVoid { span } => *span,
            SemanticError::NoMainFound => Span::default(),
        }
    }
}

// ============================================================================
// Codegen Errors
// ============================================================================

/// Fatal errors from layout, code generation and target emission.
///
/// These indicate a construct the back end cannot lower. Well-checked
/// programs only hit them for features the back end does not support.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("at {span}: double is not supported by the compiler back end")]
    UnsupportedDouble { span: Span },

    #[error("at {span}: calling '{method}' through interface '{interface}' is not supported by the compiler back end")]
    UnsupportedInterfaceCall {
        interface: String,
        method: String,
        span: Span,
    },

    #[error("at {span}: inheritance cycle involving class '{class}'")]
    CyclicInheritance { class: String, span: Span },

    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CodegenError {
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal {
            message: message.into(),
        }
    }

    /// Get the span where this error occurred, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::UnsupportedDouble { span }
            | CodegenError::UnsupportedInterfaceCall { span, .. }
            | CodegenError::CyclicInheritance { span, .. } => Some(*span),
            CodegenError::Internal { .. } => None,
        }
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error returned by the compilation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecafError {
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl DecafError {
    pub fn span(&self) -> Option<Span> {
        match self {
            DecafError::Semantic(e) => Some(e.span()),
            DecafError::Codegen(e) => e.span(),
        }
    }
}

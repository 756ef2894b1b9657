//! Compiler passes.
//!
//! - [`symbols`]: Pass 1 - insert declarations and build the scope forest
//! - [`resolve`]: Pass 2 - bind identifiers and named types to declarations
//! - [`inheritance`]: Pass 3 - check overrides and interface conformance
//! - [`typecheck`]: Pass 4 - compute and check expression types
//! - [`layout`]: class layouts, vtables and globals for code generation

pub mod inheritance;
pub mod layout;
pub mod resolve;
pub mod symbols;
pub mod typecheck;

pub use inheritance::{InheritanceOutput, InheritancePass};
pub use layout::{ClassLayout, LayoutPass, MethodSlot, ProgramLayout};
pub use resolve::{ResolveOutput, ResolvePass};
pub use symbols::{SymbolTableOutput, SymbolTablePass};
pub use typecheck::{TypeCheckOutput, TypeCheckPass};

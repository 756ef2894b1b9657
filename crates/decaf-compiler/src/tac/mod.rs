//! Three-address code.
//!
//! The instruction list produced by code generation and consumed by the
//! target emitter:
//!
//! - [`Location`] - An abstract storage slot
//! - [`Instruction`] and [`TacOp`] - The instruction set
//! - [`TacProgram`] - The instruction list for a whole program

mod instruction;
mod location;
mod program;

pub use instruction::{Instruction, TacOp};
pub use location::{Location, Segment};
pub use program::TacProgram;

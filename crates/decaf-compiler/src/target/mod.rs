//! Target assembly emitters.
//!
//! - [`mips`]: MIPS assembly for the SPIM simulator

pub mod mips;

pub use mips::MipsEmitter;

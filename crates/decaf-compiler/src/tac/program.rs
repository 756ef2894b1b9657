//! The instruction list for a whole program.

use std::fmt;

use super::Instruction;

/// Instructions for every function and vtable in a program, in emission
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TacProgram {
    instructions: Vec<Instruction>,
}

impl TacProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, returning its index.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Set the frame size of the `BeginFunc` at `index`. Any other
    /// instruction is left alone.
    pub fn set_frame_size(&mut self, index: usize, size: i32) {
        if let Some(Instruction::BeginFunc { frame_size }) = self.instructions.get_mut(index) {
            *frame_size = size;
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl<'a> IntoIterator for &'a TacProgram {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Renders the program as three-address text, labels flush left and every
/// other instruction indented.
impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            if instruction.is_flush() {
                writeln!(f, "{instruction}")?;
            } else {
                writeln!(f, "\t{instruction}")?;
            }
        }
        Ok(())
    }
}

//! Three-address code emitter.
//!
//! The [`TacEmitter`] appends instructions to a [`TacProgram`] and hands out
//! the storage they operate on: a fresh frame slot for every temporary and
//! local, parameter slots above the frame pointer, and fresh labels.
//! Counters belong to the emitter, so every compilation numbers its
//! temporaries and labels from zero.
//!
//! # Example
//!
//! ```
//! use decaf_compiler::emit::TacEmitter;
//! use decaf_compiler::tac::TacOp;
//!
//! let mut emitter = TacEmitter::new();
//! emitter.begin_function("main");
//! let a = emitter.load_constant(2);
//! let b = emitter.load_constant(3);
//! emitter.binary(TacOp::Add, a, b);
//! emitter.end_function();
//!
//! let program = emitter.finish();
//! assert_eq!(program.len(), 6);
//! ```

mod builtins;
mod jumps;

use decaf_core::{CodegenError, WORD_SIZE};

use crate::tac::{Instruction, Location, TacOp, TacProgram};
pub use builtins::Builtin;
use jumps::BreakTargets;

/// Offset of the first local below the frame pointer. The two words above
/// it hold the saved frame pointer and return address.
const FIRST_LOCAL_OFFSET: i32 = -8;

/// Offset of the first parameter above the frame pointer.
const FIRST_PARAM_OFFSET: i32 = 4;

/// Slot allocation for the function being emitted.
#[derive(Debug)]
struct Frame {
    next_local: i32,
    next_param: i32,
    /// Index of the function's `BeginFunc`, patched with the frame size.
    begin: Option<usize>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            next_local: FIRST_LOCAL_OFFSET,
            next_param: FIRST_PARAM_OFFSET,
            begin: None,
        }
    }
}

impl Frame {
    fn size(&self) -> i32 {
        FIRST_LOCAL_OFFSET - self.next_local
    }
}

/// Emits three-address instructions.
#[derive(Debug, Default)]
pub struct TacEmitter {
    program: TacProgram,
    frame: Frame,
    breaks: BreakTargets,
    next_temp: u32,
    next_label: u32,
}

impl TacEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished instruction list.
    pub fn finish(self) -> TacProgram {
        self.program
    }

    pub fn program(&self) -> &TacProgram {
        &self.program
    }

    fn push(&mut self, instruction: Instruction) -> usize {
        self.program.push(instruction)
    }

    // ==========================================================================
    // Storage
    // ==========================================================================

    /// Allocate the next local slot below the frame pointer.
    pub fn local(&mut self, name: impl Into<String>) -> Location {
        let location = Location::frame(self.frame.next_local, name);
        self.frame.next_local -= WORD_SIZE;
        location
    }

    /// Allocate the next parameter slot above the frame pointer.
    pub fn param(&mut self, name: impl Into<String>) -> Location {
        let location = Location::frame(self.frame.next_param, name);
        self.frame.next_param += WORD_SIZE;
        location
    }

    /// A fresh temporary. Temporaries are never reused.
    pub fn temp(&mut self) -> Location {
        let name = format!("_tmp{}", self.next_temp);
        self.next_temp += 1;
        self.local(name)
    }

    pub fn new_label(&mut self) -> String {
        let label = format!("_L{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// Bytes of locals and temporaries allocated in the current function.
    pub fn frame_size(&self) -> i32 {
        self.frame.size()
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    /// Start a function: its label and a `BeginFunc` whose frame size is
    /// filled in by [`end_function`](Self::end_function).
    pub fn begin_function(&mut self, label: impl Into<String>) {
        self.frame = Frame::default();
        self.push(Instruction::Label(label.into()));
        self.frame.begin = Some(self.push(Instruction::BeginFunc { frame_size: 0 }));
    }

    pub fn end_function(&mut self) {
        self.push(Instruction::EndFunc);
        let size = self.frame.size();
        if let Some(begin) = self.frame.begin.take() {
            self.program.set_frame_size(begin, size);
        }
    }

    pub fn ret(&mut self, value: Option<Location>) {
        self.push(Instruction::Return(value));
    }

    // ==========================================================================
    // Values
    // ==========================================================================

    pub fn load_constant(&mut self, value: i32) -> Location {
        let dst = self.temp();
        self.push(Instruction::LoadConstant {
            dst: dst.clone(),
            value,
        });
        dst
    }

    pub fn load_string(&mut self, value: &str) -> Location {
        let dst = self.temp();
        self.push(Instruction::LoadString {
            dst: dst.clone(),
            value: value.to_string(),
        });
        dst
    }

    pub fn load_label(&mut self, label: &str) -> Location {
        let dst = self.temp();
        self.push(Instruction::LoadLabel {
            dst: dst.clone(),
            label: label.to_string(),
        });
        dst
    }

    pub fn assign(&mut self, dst: Location, src: Location) {
        self.push(Instruction::Assign { dst, src });
    }

    /// Load the word `offset` bytes past the address in `src`.
    pub fn load(&mut self, src: Location, offset: i32) -> Location {
        let dst = self.temp();
        self.push(Instruction::Load {
            dst: dst.clone(),
            src,
            offset,
        });
        dst
    }

    /// Store `src` at `offset` bytes past the address in `dst`.
    pub fn store(&mut self, dst: Location, src: Location, offset: i32) {
        self.push(Instruction::Store { dst, src, offset });
    }

    pub fn binary(&mut self, op: TacOp, left: Location, right: Location) -> Location {
        let dst = self.temp();
        self.push(Instruction::BinaryOp {
            op,
            dst: dst.clone(),
            left,
            right,
        });
        dst
    }

    // ==========================================================================
    // Control Flow
    // ==========================================================================

    pub fn label(&mut self, label: &str) {
        self.push(Instruction::Label(label.to_string()));
    }

    pub fn goto(&mut self, label: &str) {
        self.push(Instruction::Goto(label.to_string()));
    }

    pub fn if_zero(&mut self, test: Location, label: &str) {
        self.push(Instruction::IfZero {
            test,
            label: label.to_string(),
        });
    }

    /// Enter a loop or switch whose `break`s jump to `end_label`.
    pub fn enter_breakable(&mut self, end_label: &str) {
        self.breaks.enter(end_label.to_string());
    }

    pub fn exit_breakable(&mut self) {
        self.breaks.exit();
    }

    /// Jump to the end of the innermost loop or switch.
    pub fn emit_break(&mut self) -> Result<(), CodegenError> {
        let target = self
            .breaks
            .current()
            .map(str::to_string)
            .ok_or_else(|| CodegenError::internal("break outside loop or switch"))?;
        self.goto(&target);
        Ok(())
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    pub fn push_param(&mut self, param: Location) {
        self.push(Instruction::PushParam(param));
    }

    /// Remove pushed parameters. Nothing is emitted for zero bytes.
    pub fn pop_params(&mut self, bytes: i32) {
        if bytes > 0 {
            self.push(Instruction::PopParams(bytes));
        }
    }

    pub fn call_label(&mut self, label: &str, has_return: bool) -> Option<Location> {
        let dst = has_return.then(|| self.temp());
        self.push(Instruction::CallByLabel {
            label: label.to_string(),
            dst: dst.clone(),
        });
        dst
    }

    pub fn call_address(&mut self, addr: Location, has_return: bool) -> Option<Location> {
        let dst = has_return.then(|| self.temp());
        self.push(Instruction::CallByAddress {
            addr,
            dst: dst.clone(),
        });
        dst
    }

    /// Call a runtime function. Arguments are pushed last to first.
    pub fn builtin(
        &mut self,
        builtin: Builtin,
        args: &[Location],
    ) -> Result<Option<Location>, CodegenError> {
        if args.len() != builtin.arg_count() {
            return Err(CodegenError::internal(format!(
                "{} takes {} arguments, {} given",
                builtin.label(),
                builtin.arg_count(),
                args.len()
            )));
        }
        let dst = builtin.has_return().then(|| self.temp());
        for arg in args.iter().rev() {
            self.push_param(arg.clone());
        }
        self.push(Instruction::CallByLabel {
            label: builtin.label().to_string(),
            dst: dst.clone(),
        });
        self.pop_params(WORD_SIZE * args.len() as i32);
        Ok(dst)
    }

    /// Print `message` and stop the program.
    pub fn runtime_error(&mut self, message: &str) -> Result<(), CodegenError> {
        let text = self.load_string(message);
        self.builtin(Builtin::PrintString, &[text])?;
        self.builtin(Builtin::Halt, &[])?;
        Ok(())
    }

    // ==========================================================================
    // Data
    // ==========================================================================

    pub fn vtable(&mut self, class: &str, methods: Vec<String>) {
        self.push(Instruction::VTableDef {
            class: class.to_string(),
            methods,
        });
    }
}

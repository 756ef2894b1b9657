//! MIPS assembly emitter.
//!
//! Lowers each three-address instruction on its own. Every operand is loaded
//! into a scratch register right before use and every result stored back
//! right after, so no value lives in a register across instructions.
//!
//! Frame layout, with the stack growing down:
//!
//! ```text
//! fp+8 ...   parameters, first at fp+4
//! fp+0       saved fp
//! fp-4       saved ra
//! fp-8 ...   locals and temporaries
//! ```

use crate::tac::{Instruction, Location, Segment, TacOp, TacProgram};

/// A machine register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    /// First source operand.
    Rs,
    /// Second source operand.
    Rt,
    /// Destination.
    Rd,
    /// Base address of an indirect location.
    Base,
}

impl Register {
    fn name(self) -> &'static str {
        match self {
            Register::Rs => "$t0",
            Register::Rt => "$t1",
            Register::Rd => "$t2",
            Register::Base => "$t3",
        }
    }
}

/// Lowers a [`TacProgram`] to MIPS assembly text.
///
/// String constants are numbered per emitter, so lowering the same program
/// twice gives identical output.
#[derive(Debug, Default)]
pub struct MipsEmitter {
    out: String,
    next_string: u32,
}

impl MipsEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower the whole program, preamble included.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit(mut self, program: &TacProgram) -> String {
        self.preamble();
        for instruction in program {
            self.instruction(instruction);
        }
        log::debug!("mips: {} lines", self.out.lines().count());
        self.out
    }

    /// Append one line. Labels are flush left, everything else is indented,
    /// and comment-only lines sit one level less deep.
    fn line(&mut self, text: &str) {
        if !text.ends_with(':') {
            self.out.push('\t');
        }
        if !text.starts_with('#') {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn preamble(&mut self) {
        self.line("# standard Decaf preamble ");
        self.line(".text");
        self.line(".align 2");
        self.line(".globl main");
    }

    // ==========================================================================
    // Fill and Spill
    // ==========================================================================

    /// Register and printed name of the register a location is addressed
    /// from, loading the base address first for indirect locations.
    fn address_of(&mut self, location: &Location) -> &'static str {
        match location.base() {
            Some(base) => {
                self.fill(base, Register::Base);
                Register::Base.name()
            }
            None => match location.segment() {
                Segment::FpRelative => "$fp",
                Segment::GpRelative => "$gp",
            },
        }
    }

    fn fill(&mut self, src: &Location, reg: Register) {
        let from = self.address_of(src);
        let offset = src.offset();
        let line = format!(
            "lw {reg}, {offset}({from})\t# fill {name} to {reg} from {from}{offset:+}",
            reg = reg.name(),
            name = src.name(),
        );
        self.line(&line);
    }

    fn spill(&mut self, dst: &Location, reg: Register) {
        let from = self.address_of(dst);
        let offset = dst.offset();
        let line = format!(
            "sw {reg}, {offset}({from})\t# spill {name} from {reg} to {from}{offset:+}",
            reg = reg.name(),
            name = dst.name(),
        );
        self.line(&line);
    }

    // ==========================================================================
    // Instructions
    // ==========================================================================

    fn instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::LoadConstant { dst, value } => {
                let rd = Register::Rd.name();
                self.line(&format!(
                    "li {rd}, {value}\t\t# load constant value {value} into {rd}"
                ));
                self.spill(dst, Register::Rd);
            }
            Instruction::LoadString { dst, value } => {
                self.next_string += 1;
                let label = format!("_string{}", self.next_string);
                self.line(".data\t\t\t# create string constant marked with label");
                self.line(&format!("{label}: .asciiz \"{value}\""));
                self.line(".text");
                self.load_label(dst, &label);
            }
            Instruction::LoadLabel { dst, label } => self.load_label(dst, label),
            Instruction::Assign { dst, src } => {
                self.fill(src, Register::Rd);
                self.spill(dst, Register::Rd);
            }
            Instruction::Load { dst, src, offset } => {
                self.fill(src, Register::Rs);
                self.line(&format!(
                    "lw {}, {offset}({}) \t# load with offset",
                    Register::Rd.name(),
                    Register::Rs.name()
                ));
                self.spill(dst, Register::Rd);
            }
            Instruction::Store { dst, src, offset } => {
                self.fill(src, Register::Rs);
                self.fill(dst, Register::Rd);
                self.line(&format!(
                    "sw {}, {offset}({}) \t# store with offset",
                    Register::Rs.name(),
                    Register::Rd.name()
                ));
            }
            Instruction::BinaryOp {
                op,
                dst,
                left,
                right,
            } => self.binary(*op, dst, left, right),
            Instruction::Label(label) => self.line(&format!("{label}:")),
            Instruction::Goto(label) => self.line(&format!("b {label}\t\t# unconditional branch")),
            Instruction::IfZero { test, label } => {
                self.fill(test, Register::Rs);
                self.line(&format!(
                    "beqz {}, {label}\t# branch if {} is zero",
                    Register::Rs.name(),
                    test.name()
                ));
            }
            Instruction::BeginFunc { frame_size } => {
                self.line("subu $sp, $sp, 8\t# decrement sp to make space to save ra, fp");
                self.line("sw $fp, 8($sp)\t# save fp");
                self.line("sw $ra, 4($sp)\t# save ra");
                self.line("addiu $fp, $sp, 8\t# set up new fp");
                if *frame_size != 0 {
                    self.line(&format!(
                        "subu $sp, $sp, {frame_size}\t# decrement sp to make space for locals/temps"
                    ));
                }
            }
            Instruction::EndFunc => {
                self.line("# (below handles reaching end of fn body with no explicit return)");
                self.ret(None);
            }
            Instruction::Return(value) => self.ret(value.as_ref()),
            Instruction::PushParam(param) => {
                self.line("subu $sp, $sp, 4\t# decrement sp to make space for param");
                self.fill(param, Register::Rs);
                self.line(&format!(
                    "sw {}, 4($sp)\t# copy param value to stack",
                    Register::Rs.name()
                ));
            }
            Instruction::PopParams(bytes) => {
                if *bytes != 0 {
                    self.line(&format!("add $sp, $sp, {bytes}\t# pop params off stack"));
                }
            }
            Instruction::CallByLabel { label, dst } => {
                self.line(&format!("jal {label:<15}\t# jump to function"));
                self.result(dst.as_ref());
            }
            Instruction::CallByAddress { addr, dst } => {
                self.fill(addr, Register::Rs);
                self.line(&format!("jalr {:<15}\t# jump to function", Register::Rs.name()));
                self.result(dst.as_ref());
            }
            Instruction::VTableDef { class, methods } => {
                self.line(".data");
                self.line(".align 2");
                self.line(&format!("{class}:\t\t# label for class {class} vtable"));
                for method in methods {
                    self.line(&format!(".word {method}"));
                }
                self.line(".text");
            }
        }
    }

    fn load_label(&mut self, dst: &Location, label: &str) {
        self.line(&format!("la {}, {label}\t# load label", Register::Rd.name()));
        self.spill(dst, Register::Rd);
    }

    fn binary(&mut self, op: TacOp, dst: &Location, left: &Location, right: &Location) {
        self.fill(left, Register::Rs);
        self.fill(right, Register::Rt);
        self.line(&format!(
            "{} {}, {}, {}\t",
            op.mips_name(),
            Register::Rd.name(),
            Register::Rs.name(),
            Register::Rt.name()
        ));
        self.spill(dst, Register::Rd);
    }

    fn result(&mut self, dst: Option<&Location>) {
        if let Some(dst) = dst {
            self.line(&format!(
                "move {}, $v0\t\t# copy function return value from $v0",
                Register::Rd.name()
            ));
            self.spill(dst, Register::Rd);
        }
    }

    fn ret(&mut self, value: Option<&Location>) {
        if let Some(value) = value {
            self.fill(value, Register::Rd);
            self.line(&format!(
                "move $v0, {}\t\t# assign return value into $v0",
                Register::Rd.name()
            ));
        }
        self.line("move $sp, $fp\t\t# pop callee frame off stack");
        self.line("lw $ra, -4($fp)\t# restore saved ra");
        self.line("lw $fp, 0($fp)\t# restore saved fp");
        self.line("jr $ra\t\t# return from function");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Builtin, TacEmitter};

    fn sample() -> TacProgram {
        let mut emitter = TacEmitter::new();
        emitter.begin_function("main");
        let greeting = emitter.load_string("hello");
        emitter.builtin(Builtin::PrintString, &[greeting]).unwrap();
        let again = emitter.load_string("again");
        emitter.builtin(Builtin::PrintString, &[again]).unwrap();
        emitter.end_function();
        emitter.finish()
    }

    #[test]
    fn preamble_and_prologue() {
        let asm = MipsEmitter::new().emit(&sample());
        let lines: Vec<_> = asm.lines().collect();

        assert_eq!(lines[0], "\t# standard Decaf preamble ");
        assert_eq!(lines[1], "\t  .text");
        assert_eq!(lines[3], "\t  .globl main");
        assert_eq!(lines[4], "  main:");
        assert!(asm.contains("\t  subu $sp, $sp, 8\t# decrement sp to make space for locals/temps\n"));
        assert!(asm.ends_with("\t  jr $ra\t\t# return from function\n"));
    }

    #[test]
    fn strings_are_numbered_per_emitter() {
        let program = sample();
        let first = MipsEmitter::new().emit(&program);
        let second = MipsEmitter::new().emit(&program);

        assert_eq!(first, second);
        assert!(first.contains("_string1: .asciiz \"hello\""));
        assert!(first.contains("_string2: .asciiz \"again\""));
    }

    #[test]
    fn fill_and_spill_format() {
        let mut program = TacProgram::new();
        program.push(Instruction::Assign {
            dst: Location::global(4, "g"),
            src: Location::frame(-8, "x"),
        });
        let asm = MipsEmitter::new().emit(&program);

        assert!(asm.contains("\t  lw $t2, -8($fp)\t# fill x to $t2 from $fp-8\n"));
        assert!(asm.contains("\t  sw $t2, 4($gp)\t# spill g from $t2 to $gp+4\n"));
    }

    #[test]
    fn based_location_goes_through_base_register() {
        let this = Location::frame(4, "this");
        let mut program = TacProgram::new();
        program.push(Instruction::Assign {
            dst: Location::based(this, 8, "count"),
            src: Location::frame(-8, "x"),
        });
        let asm = MipsEmitter::new().emit(&program);

        assert!(asm.contains("lw $t3, 4($fp)\t# fill this to $t3 from $fp+4\n"));
        assert!(asm.contains("sw $t2, 8($t3)\t# spill count from $t2 to $t3+8\n"));
    }

    #[test]
    fn binary_and_calls() {
        let mut program = TacProgram::new();
        let t0 = Location::frame(-8, "_tmp0");
        let t1 = Location::frame(-12, "_tmp1");
        program.push(Instruction::BinaryOp {
            op: TacOp::Le,
            dst: t1.clone(),
            left: t0.clone(),
            right: t0.clone(),
        });
        program.push(Instruction::CallByAddress {
            addr: t1,
            dst: None,
        });
        program.push(Instruction::PopParams(0));
        program.push(Instruction::VTableDef {
            class: "Dog".into(),
            methods: vec!["_Dog.Speak".into()],
        });
        let asm = MipsEmitter::new().emit(&program);

        assert!(asm.contains("\t  sle $t2, $t0, $t1\t\n"));
        assert!(asm.contains("\t  jalr $t0            \t# jump to function\n"));
        assert!(!asm.contains("pop params"));
        assert!(asm.contains("  Dog:\t\t# label for class Dog vtable\n\t  .word _Dog.Speak\n"));
    }
}

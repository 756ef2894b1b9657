//! The three-address instruction set.

use std::fmt;

use decaf_ast::BinaryOp;

use super::Location;

/// Binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TacOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl TacOp {
    /// Operator as printed in three-address text.
    pub fn symbol(self) -> &'static str {
        match self {
            TacOp::Add => "+",
            TacOp::Sub => "-",
            TacOp::Mul => "*",
            TacOp::Div => "/",
            TacOp::Mod => "%",
            TacOp::Eq => "==",
            TacOp::Ne => "!=",
            TacOp::Lt => "<",
            TacOp::Le => "<=",
            TacOp::Gt => ">",
            TacOp::Ge => ">=",
            TacOp::And => "&&",
            TacOp::Or => "||",
        }
    }

    /// MIPS instruction implementing the operation.
    pub fn mips_name(self) -> &'static str {
        match self {
            TacOp::Add => "add",
            TacOp::Sub => "sub",
            TacOp::Mul => "mul",
            TacOp::Div => "div",
            TacOp::Mod => "rem",
            TacOp::Eq => "seq",
            TacOp::Ne => "sne",
            TacOp::Lt => "slt",
            TacOp::Le => "sle",
            TacOp::Gt => "sgt",
            TacOp::Ge => "sge",
            TacOp::And => "and",
            TacOp::Or => "or",
        }
    }
}

impl From<BinaryOp> for TacOp {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => TacOp::Add,
            BinaryOp::Sub => TacOp::Sub,
            BinaryOp::Mul => TacOp::Mul,
            BinaryOp::Div => TacOp::Div,
            BinaryOp::Mod => TacOp::Mod,
            BinaryOp::Less => TacOp::Lt,
            BinaryOp::LessEqual => TacOp::Le,
            BinaryOp::Greater => TacOp::Gt,
            BinaryOp::GreaterEqual => TacOp::Ge,
            BinaryOp::Equal => TacOp::Eq,
            BinaryOp::NotEqual => TacOp::Ne,
            BinaryOp::And => TacOp::And,
            BinaryOp::Or => TacOp::Or,
        }
    }
}

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One three-address instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `dst = value`
    LoadConstant { dst: Location, value: i32 },
    /// `dst = "value"`
    LoadString { dst: Location, value: String },
    /// `dst = label`
    LoadLabel { dst: Location, label: String },
    /// `dst = src`
    Assign { dst: Location, src: Location },
    /// `dst = *(src + offset)`
    Load {
        dst: Location,
        src: Location,
        offset: i32,
    },
    /// `*(dst + offset) = src`
    Store {
        dst: Location,
        src: Location,
        offset: i32,
    },
    /// `dst = left op right`
    BinaryOp {
        op: TacOp,
        dst: Location,
        left: Location,
        right: Location,
    },
    Label(String),
    Goto(String),
    /// Jump to `label` if `test` is zero.
    IfZero { test: Location, label: String },
    /// Function prologue; `frame_size` bytes of locals and temporaries.
    BeginFunc { frame_size: i32 },
    EndFunc,
    Return(Option<Location>),
    PushParam(Location),
    /// Remove `bytes` bytes of parameters after a call.
    PopParams(i32),
    /// Call a function by label, optionally storing its result.
    CallByLabel {
        label: String,
        dst: Option<Location>,
    },
    /// Call the function whose address is held in `addr`.
    CallByAddress {
        addr: Location,
        dst: Option<Location>,
    },
    /// A class's vtable: method labels in slot order.
    VTableDef { class: String, methods: Vec<String> },
}

impl Instruction {
    /// Whether the instruction is printed flush left.
    pub fn is_flush(&self) -> bool {
        matches!(self, Instruction::Label(_) | Instruction::VTableDef { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConstant { dst, value } => write!(f, "{dst} = {value}"),
            Instruction::LoadString { dst, value } => write!(f, "{dst} = \"{value}\""),
            Instruction::LoadLabel { dst, label } => write!(f, "{dst} = {label}"),
            Instruction::Assign { dst, src } => write!(f, "{dst} = {src}"),
            Instruction::Load { dst, src, offset: 0 } => write!(f, "{dst} = *({src})"),
            Instruction::Load { dst, src, offset } => write!(f, "{dst} = *({src} + {offset})"),
            Instruction::Store { dst, src, offset: 0 } => write!(f, "*({dst}) = {src}"),
            Instruction::Store { dst, src, offset } => write!(f, "*({dst} + {offset}) = {src}"),
            Instruction::BinaryOp {
                op,
                dst,
                left,
                right,
            } => write!(f, "{dst} = {left} {op} {right}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Goto(label) => write!(f, "Goto {label}"),
            Instruction::IfZero { test, label } => write!(f, "IfZ {test} Goto {label}"),
            Instruction::BeginFunc { frame_size } => write!(f, "BeginFunc {frame_size}"),
            Instruction::EndFunc => f.write_str("EndFunc"),
            Instruction::Return(Some(value)) => write!(f, "Return {value}"),
            Instruction::Return(None) => f.write_str("Return"),
            Instruction::PushParam(param) => write!(f, "PushParam {param}"),
            Instruction::PopParams(bytes) => write!(f, "PopParams {bytes}"),
            Instruction::CallByLabel {
                label,
                dst: Some(dst),
            } => write!(f, "{dst} = LCall {label}"),
            Instruction::CallByLabel { label, dst: None } => write!(f, "LCall {label}"),
            Instruction::CallByAddress {
                addr,
                dst: Some(dst),
            } => write!(f, "{dst} = ACall {addr}"),
            Instruction::CallByAddress { addr, dst: None } => write!(f, "ACall {addr}"),
            Instruction::VTableDef { class, methods } => {
                writeln!(f, "VTable {class} =")?;
                for method in methods {
                    writeln!(f, "\t{method},")?;
                }
                f.write_str("; ")
            }
        }
    }
}

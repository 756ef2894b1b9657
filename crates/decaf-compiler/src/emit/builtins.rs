//! Runtime library functions called by generated code.

/// A function provided by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Allocate the given number of bytes.
    Alloc,
    ReadLine,
    ReadInteger,
    /// Compare two strings, yielding 1 if equal.
    StringEqual,
    PrintInt,
    PrintString,
    PrintBool,
    /// Stop the program.
    Halt,
}

impl Builtin {
    pub fn label(self) -> &'static str {
        match self {
            Builtin::Alloc => "_Alloc",
            Builtin::ReadLine => "_ReadLine",
            Builtin::ReadInteger => "_ReadInteger",
            Builtin::StringEqual => "_StringEqual",
            Builtin::PrintInt => "_PrintInt",
            Builtin::PrintString => "_PrintString",
            Builtin::PrintBool => "_PrintBool",
            Builtin::Halt => "_Halt",
        }
    }

    pub fn arg_count(self) -> usize {
        match self {
            Builtin::ReadLine | Builtin::ReadInteger | Builtin::Halt => 0,
            Builtin::Alloc | Builtin::PrintInt | Builtin::PrintString | Builtin::PrintBool => 1,
            Builtin::StringEqual => 2,
        }
    }

    pub fn has_return(self) -> bool {
        matches!(
            self,
            Builtin::Alloc | Builtin::ReadLine | Builtin::ReadInteger | Builtin::StringEqual
        )
    }
}

//! Break target tracking.
//!
//! Loops and switches push the label their `break` statements jump to;
//! a `break` always targets the innermost one.

/// Stack of enclosing break targets.
#[derive(Debug, Default)]
pub struct BreakTargets {
    /// End labels of enclosing loops and switches (innermost last)
    targets: Vec<String>,
}

impl BreakTargets {
    /// Enter a loop or switch whose `break`s jump to `end_label`.
    pub fn enter(&mut self, end_label: String) {
        self.targets.push(end_label);
    }

    /// Leave the innermost loop or switch, returning its end label.
    pub fn exit(&mut self) -> Option<String> {
        self.targets.pop()
    }

    /// Label a `break` at the current point jumps to.
    pub fn current(&self) -> Option<&str> {
        self.targets.last().map(String::as_str)
    }
}

//! Source location tracking for diagnostics.
//!
//! The core never reads source text, so a [`Span`] is only the line/column
//! range the external parser attached to a node.

use std::fmt;

/// A range of source code from a start position to an end position.
///
/// Lines and columns are 1-indexed. A default span (all zeros) marks
/// compiler-synthesized nodes and whole-program diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First line of the range.
    pub line: u32,
    /// First column of the range.
    pub col: u32,
    /// Last line of the range.
    pub end_line: u32,
    /// Column one past the last character of the range.
    pub end_col: u32,
}

impl Span {
    /// Create a span covering `line:col` up to `end_line:end_col`.
    #[inline]
    pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            line,
            col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Whether this span carries no location (synthesized node).
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// Unknown spans are absorbed, so joining with a synthesized node keeps
    /// the real location.
    pub fn join(self, other: Span) -> Span {
        if self.is_unknown() {
            return other;
        }
        if other.is_unknown() {
            return self;
        }
        let (line, col) = (self.line, self.col).min((other.line, other.col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span {
            line,
            col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<program>")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

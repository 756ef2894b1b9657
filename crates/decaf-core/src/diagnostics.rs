//! Diagnostic reporting.
//!
//! Checker passes report through a [`DiagnosticSink`] and never stop on the
//! first error. [`Diagnostics`] is the default sink: it keeps every report in
//! order so callers can inspect or print them after the run.

use std::fmt;

use crate::SemanticError;

/// Receiver for semantic diagnostics.
pub trait DiagnosticSink {
    /// Record a diagnostic. Must not abort the caller.
    fn report(&mut self, error: SemanticError);

    /// Number of diagnostics reported so far.
    fn error_count(&self) -> usize;

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Collects diagnostics in report order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<SemanticError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SemanticError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn as_slice(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn into_vec(self) -> Vec<SemanticError> {
        self.errors
    }

    /// Whether any diagnostic satisfies `pred`.
    pub fn has(&self, pred: impl Fn(&SemanticError) -> bool) -> bool {
        self.errors.iter().any(pred)
    }

    /// Number of diagnostics satisfying `pred`.
    pub fn count(&self, pred: impl Fn(&SemanticError) -> bool) -> usize {
        self.errors.iter().filter(|e| pred(e)).count()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a SemanticError;
    type IntoIter = std::slice::Iter<'a, SemanticError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = SemanticError;
    type IntoIter = std::vec::IntoIter<SemanticError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

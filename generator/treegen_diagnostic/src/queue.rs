//! Diagnostic queue for collecting recoverable diagnostics.
//!
//! Duplicate-declaration collisions are local and additive: the container
//! that detects one keeps going so that *all* collisions in a run are
//! reported, not just the first. The queue is where they accumulate.

use crate::Diagnostic;

/// Queue for collecting diagnostics across a synthesis run.
///
/// # Example
///
/// ```
/// use treegen_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
///
/// let mut queue = DiagnosticQueue::new();
/// queue.add(Diagnostic::error(ErrorCode::E2001).with_message("duplicate `x`"));
/// assert_eq!(queue.error_count(), 1);
/// let reported = queue.flush();
/// assert_eq!(reported.len(), 1);
/// assert!(!queue.has_errors());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiagnosticQueue {
    /// Collected diagnostics, in report order.
    diagnostics: Vec<Diagnostic>,
    /// Count of errors (not warnings/notes).
    error_count: usize,
}

impl DiagnosticQueue {
    /// Create a new, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the queue.
    pub fn add(&mut self, diag: Diagnostic) {
        if diag.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
    }

    /// Get the number of errors collected.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Check whether any errors were collected.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Iterate over collected diagnostics without clearing the queue.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drain the queue, returning the diagnostics in report order.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;

    fn dup(name: &str) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2001).with_message(format!("duplicate declaration `{name}`"))
    }

    #[test]
    fn collects_every_collision() {
        let mut queue = DiagnosticQueue::new();
        queue.add(dup("x"));
        queue.add(dup("y"));
        queue.add(dup("x"));
        assert_eq!(queue.error_count(), 3);
        assert_eq!(queue.peek().count(), 3);
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut queue = DiagnosticQueue::new();
        queue.add(Diagnostic::warning(ErrorCode::E1004).with_message("odd field"));
        assert!(!queue.has_errors());
        assert_eq!(queue.error_count(), 0);
    }

    #[test]
    fn flush_resets_state() {
        let mut queue = DiagnosticQueue::new();
        queue.add(dup("x"));
        let reported = queue.flush();
        assert_eq!(reported.len(), 1);
        assert!(!queue.has_errors());
        assert_eq!(queue.peek().count(), 0);
    }
}

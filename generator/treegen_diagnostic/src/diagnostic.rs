//! Core diagnostic types for structured error reporting.
//!
//! Defines [`Diagnostic`] and [`Severity`] — the building blocks every
//! generator phase uses to report conditions that should not abort the
//! run.

use std::fmt;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A structured diagnostic with a code, message, and optional notes.
///
/// Built with a fluent API:
///
/// ```
/// use treegen_diagnostic::{Diagnostic, ErrorCode};
///
/// let diag = Diagnostic::error(ErrorCode::E2001)
///     .with_message("duplicate declaration `x`")
///     .with_note("previous declaration kept");
/// assert!(diag.is_error());
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    /// The error code.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Primary message (what went wrong).
    pub message: String,
    /// Additional notes (context, what was kept, how to proceed).
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create an error diagnostic with the given code.
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: String::new(),
            notes: Vec::new(),
        }
    }

    /// Create a warning diagnostic with the given code.
    pub fn warning(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Warning,
            message: String::new(),
            notes: Vec::new(),
        }
    }

    /// Set the primary message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Check if this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

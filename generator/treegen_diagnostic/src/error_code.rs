//! Error codes for all generator diagnostics.
//!
//! Each code is a unique identifier (e.g. `E1001`) whose first digit
//! indicates the phase that raised it. Codes appear in rendered
//! diagnostics and make failures searchable.

use std::fmt;

/// Error codes for all generator diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E1xxx: Schema errors (fatal, abort the synthesis run)
/// - E2xxx: Declaration errors (recoverable, reported and continued)
/// - E9xxx: Internal invariant violations (fatal, defect in the schema
///   or its consumers, never attributable to compiler input)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Schema errors (E1xxx)
    /// Duplicate class name in the schema
    E1001,
    /// Parent class unknown or declared after its child
    E1002,
    /// Unrecognized predefined method name
    E1003,
    /// Malformed field (e.g. a variant with no alternatives)
    E1004,
    /// Duplicate field name within a class
    E1005,
    /// Schema input could not be parsed
    E1006,

    // Declaration errors (E2xxx)
    /// Duplicate declaration name in an indexed container
    E2001,

    // Internal errors (E9xxx)
    /// Invariant violation
    E9001,
}

impl ErrorCode {
    /// The code as it appears in rendered diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Check if this is a fatal schema error.
    pub fn is_schema_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is an internal invariant violation.
    pub fn is_internal_error(&self) -> bool {
        self.as_str().starts_with("E9")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn code_strings_match_variants() {
        assert_eq!(ErrorCode::E1002.as_str(), "E1002");
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
    }

    #[test]
    fn phase_predicates() {
        assert!(ErrorCode::E1003.is_schema_error());
        assert!(!ErrorCode::E2001.is_schema_error());
        assert!(ErrorCode::E9001.is_internal_error());
        assert!(!ErrorCode::E1001.is_internal_error());
    }
}

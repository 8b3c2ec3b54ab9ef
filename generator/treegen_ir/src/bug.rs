//! Internal invariant violations.
//!
//! An [`InvariantViolation`] signals a defect in the schema or in the code
//! consuming it — never a condition attributable to input fed through the
//! compiler being built. It propagates as an explicit error value rather
//! than unwinding, so callers decide where the process dies.

use thiserror::Error;

/// A fatal internal defect.
///
/// Distinct from user-facing diagnostics: once raised, no partial output
/// of the current run should be trusted.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("internal invariant violation [E9001]: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    /// Create a new invariant violation.
    pub fn new(message: impl Into<String>) -> Self {
        InvariantViolation {
            message: message.into(),
        }
    }
}

/// Construct an [`InvariantViolation`] with `format!` syntax.
///
/// ```
/// use treegen_ir::bug;
///
/// let violation = bug!("required child `{}` is null", "body");
/// assert!(violation.message.contains("body"));
/// ```
#[macro_export]
macro_rules! bug {
    ($($arg:tt)*) => {
        $crate::InvariantViolation::new(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code_and_message() {
        let violation = InvariantViolation::new("index entry missing");
        let rendered = violation.to_string();
        assert!(rendered.contains("E9001"));
        assert!(rendered.contains("index entry missing"));
    }

    #[test]
    fn bug_macro_formats() {
        let violation = bug!("field `{}` out of range", "weight");
        assert_eq!(violation.message, "field `weight` out of range");
    }
}

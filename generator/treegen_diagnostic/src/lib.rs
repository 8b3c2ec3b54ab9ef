//! Diagnostic system for the IR scaffolding engine.
//!
//! Two kinds of failure flow through the generator, and they are kept
//! deliberately distinct:
//!
//! - **Fatal conditions** (schema errors, internal invariant violations)
//!   are ordinary `Result` errors that abort the synthesis run. They are
//!   defined next to the code that raises them and carry an [`ErrorCode`]
//!   for classification.
//! - **Recoverable conditions** (duplicate declarations in a container)
//!   become [`Diagnostic`] values collected in a [`DiagnosticQueue`], so
//!   that every collision in a run is reported rather than just the first.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;

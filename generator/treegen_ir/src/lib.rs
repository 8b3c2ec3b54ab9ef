//! Runtime support for generated IR tree nodes.
//!
//! This crate contains the surface that generated node code targets:
//! - [`IrNode`] — the capability trait every node implements (identity-aware
//!   equality, deep equivalence, traversal, validation, keyed serialization)
//! - [`Declaration`] — name access for nodes that are named declarations
//! - [`Visitor`] — child traversal callback
//! - [`RecordWriter`] / [`RecordLoader`] — the keyed, self-describing record
//!   format nodes serialize to and load from
//! - [`IndexedVector`] — an ordered child sequence additionally indexed by
//!   declared name
//!
//! # Design Philosophy
//!
//! Single inheritance in the schema is rendered as explicit delegation:
//! a derived node stores its parent's fields in a `base` field and forwards
//! to the parent's implementation, rather than relying on implicit base
//! storage. The trait is the dynamic-dispatch seam; everything else is
//! plain structs.
//!
//! # Failure modes
//!
//! Nothing in this crate panics on user-attributable conditions. Duplicate
//! declaration names are reported as [`DuplicateDeclaration`] values and
//! processing continues; defects in the schema or its consumers surface as
//! [`InvariantViolation`].

mod bug;
mod indexed_vector;
mod node;
mod record;
mod visitor;

pub use bug::InvariantViolation;
pub use indexed_vector::{DuplicateDeclaration, IndexedVector};
pub use node::{equiv_opt, same_node, same_opt, Declaration, IrNode};
pub use record::{RecordLoader, RecordWriter};
pub use visitor::Visitor;

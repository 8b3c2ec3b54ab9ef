//! Schema-driven derivation of tree-node boilerplate.
//!
//! Given a class schema — kinds, parent links, typed fields, hand-written
//! method overrides — this crate derives the full operation surface each
//! class needs: shallow equality, deep equivalence, child traversal,
//! structural validation, keyed record serialization in both directions,
//! a factory, debug rendering, and a constructor overload per optional
//! subset. The derived bodies are Rust source text targeting the
//! `treegen_ir` trait surface; a renderer places the records.
//!
//! The moving parts:
//!
//! - `schema` — input declarations and the resolved class table.
//! - `catalog` — the static table of derivable operations and their
//!   policy flags.
//! - `ops` — one body generator per catalog entry.
//! - `driver` — the policy loop producing [`ClassOutput`] records.

mod catalog;
mod context;
mod driver;
mod ops;
mod schema;

pub use catalog::{lookup, OpFlags, Operation, ParamSpec, ReturnRule, CATALOG};
pub use context::SourceWriter;
pub use driver::{synthesize, ClassOutput, ConstructorRecord, MethodRecord, Placement};
pub use schema::{
    camel_case, snake_case, variant_enum_name, Ancestors, ClassDecl, Field, FieldDecl, FieldKind,
    MethodDecl, NodeClass, NodeKind, ParentRef, Schema, SchemaError, ValueType, ROOT_NAME,
};

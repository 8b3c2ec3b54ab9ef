//! Child traversal callback.
//!
//! Generated `visit_children` bodies hand each child-typed field to the
//! visitor, tagged with the field name. Variant fields tag with
//! `"field::AltType"` so the visitor can tell which alternative was active.

use crate::IrNode;

/// Visitor over a node's children.
///
/// Traversal order is fixed by generation: ancestor fields first, then own
/// fields in declaration order. The visitor mutates only its own state;
/// the tree stays immutable.
pub trait Visitor {
    /// Called once per visited child. `label` is the declaring field name,
    /// or `"field::AltType"` for the active alternative of a variant field.
    fn visit(&mut self, node: &dyn IrNode, label: &str);
}

/// Blanket implementation so closures work as visitors in tests and small
/// passes.
impl<F> Visitor for F
where
    F: FnMut(&dyn IrNode, &str),
{
    fn visit(&mut self, node: &dyn IrNode, label: &str) {
        self(node, label);
    }
}

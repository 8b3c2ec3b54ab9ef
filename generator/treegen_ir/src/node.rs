//! The node capability trait and identity helpers.
//!
//! [`IrNode`] is the dynamic-dispatch seam generated code targets. Each
//! concrete node type implements the full set; ancestor behavior is reached
//! by explicit delegation to an embedded `base` field, not by inheritance.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::{InvariantViolation, RecordWriter, Visitor};

/// Capability trait implemented by every tree node type.
///
/// The comparison contract is deliberately split:
/// - [`equals`](IrNode::equals) is *shallow*: value fields compare by value,
///   child-typed fields compare by object identity.
/// - [`equiv`](IrNode::equiv) is *deep*: identity-insensitive structural
///   comparison that recurses through children.
pub trait IrNode: fmt::Debug {
    /// The node's type name (its discriminator for comparisons and records).
    fn type_name(&self) -> &'static str;

    /// Shallow, identity-sensitive-for-children equality.
    fn equals(&self, other: &dyn IrNode) -> bool;

    /// Deep, identity-insensitive structural equivalence.
    fn equiv(&self, other: &dyn IrNode) -> bool;

    /// Visit this node's children, ancestor fields first, in declaration
    /// order. `label` tags where this node sits in its parent.
    fn visit_children(&self, visitor: &mut dyn Visitor, label: &str);

    /// Check structural invariants (required children present, children
    /// valid). A failure is an internal defect, not a user diagnostic.
    fn validate(&self) -> Result<(), InvariantViolation>;

    /// Serialize this node as a keyed record, ancestor fields first.
    fn to_record(&self, writer: &mut RecordWriter);

    /// Downcast support for generated equality code.
    fn as_any(&self) -> &dyn Any;

    /// Upcast to the capability trait object. Implemented as `self`;
    /// lets generic containers hand elements to dynamic consumers.
    fn as_node(&self) -> &dyn IrNode;

    /// View this node as a named declaration, if it is one.
    fn as_declaration(&self) -> Option<&dyn Declaration> {
        None
    }
}

/// Name access for nodes that are named declarations.
///
/// The indexed container's name index covers exactly the elements that
/// implement this.
pub trait Declaration {
    /// The declared name this node is indexed under.
    fn declared_name(&self) -> &str;
}

/// Pointer identity of two nodes behind trait objects.
///
/// Generated `equiv` bodies use this for the identity short-circuit, and
/// the indexed container for its index/element cross-check.
pub fn same_node(a: &dyn IrNode, b: &dyn IrNode) -> bool {
    std::ptr::eq(
        a as *const dyn IrNode as *const u8,
        b as *const dyn IrNode as *const u8,
    )
}

/// Identity comparison of two optional child references.
///
/// Both null compare equal; exactly one null compares unequal.
pub fn same_opt<T: IrNode + ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => Rc::ptr_eq(x, y),
        (None, None) => true,
        _ => false,
    }
}

/// Structural equivalence of two optional child references.
pub fn equiv_opt<T: IrNode + ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x.equiv(y.as_node()),
        (None, None) => true,
        _ => false,
    }
}

//! The predefined operation catalog.
//!
//! One static, immutable table drives everything the synthesizer can
//! derive for a class. Each entry couples a method surface (name, receiver,
//! parameters, return type) with policy flags and a body generator; the
//! driver applies one uniform policy loop over this table, so adding an
//! operation means adding a row here, never touching the driver.

use bitflags::bitflags;

use treegen_ir::InvariantViolation;

use crate::ops;
use crate::schema::{MethodDecl, NodeClass, NodeKind, Schema};

bitflags! {
    /// Policy bits controlling when and how an operation is derived.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpFlags: u16 {
        /// A user fragment is spliced into the generated skeleton instead
        /// of replacing it.
        const EXTEND = 1 << 0;
        /// The body is rendered out of line, not at the declaration site.
        const IMPL_ONLY = 1 << 1;
        /// The method overrides a dynamic-dispatch surface.
        const DISPATCH_OVERRIDE = 1 << 2;
        /// Derived only when the user wrote something for it.
        const SKIP_IF_USER_DEFINED = 1 << 3;
        /// Skipped for abstract classes.
        const CONCRETE_ONLY = 1 << 4;
        /// The receiver is `&self` (never `&mut self`).
        const IS_CONST = 1 << 5;
        /// Takes a same-class argument (`a: &Self` for nested classes,
        /// the dispatch surface's argument otherwise).
        const ADDS_SELF_PARAM = 1 << 6;
        /// Also derived for nested (non-node) classes.
        const INCL_NESTED = 1 << 7;
        /// An associated constructor: no receiver, returns `Self`.
        const IS_CONSTRUCTOR = 1 << 8;
        /// An associated factory: no receiver, returns a shared node.
        const IS_FACTORY = 1 << 9;
        /// Rendered as a foreign-trait impl rather than an inherent method.
        const IS_FRIEND = 1 << 10;
    }
}

/// One parameter of an operation's fixed signature.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: &'static str,
}

/// How an operation's return type renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRule {
    Bool,
    Unit,
    StaticStr,
    Text,
    /// `Self` by value.
    SelfValue,
    /// A shared node handle: `Rc<dyn IrNode>`, or `Rc<Self>` for nested
    /// classes that sit outside the node hierarchy.
    NodeRc,
    ValidateResult,
    FmtResult,
}

impl ReturnRule {
    /// Render for a class, `None` for unit.
    pub fn render(&self, kind: NodeKind) -> Option<&'static str> {
        match self {
            ReturnRule::Bool => Some("bool"),
            ReturnRule::Unit => None,
            ReturnRule::StaticStr => Some("&'static str"),
            ReturnRule::Text => Some("String"),
            ReturnRule::SelfValue => Some("Self"),
            ReturnRule::NodeRc => match kind {
                NodeKind::Nested => Some("Rc<Self>"),
                _ => Some("Rc<dyn IrNode>"),
            },
            ReturnRule::ValidateResult => Some("Result<(), InvariantViolation>"),
            ReturnRule::FmtResult => Some("fmt::Result"),
        }
    }
}

/// Body generator: `Ok(None)` means the operation is not needed for this
/// class (nothing would be inherited-behavior-changing about it).
pub type GenFn =
    fn(&Schema, &NodeClass, Option<&MethodDecl>) -> Result<Option<String>, InvariantViolation>;

/// One derivable operation.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    /// Catalog name; also the suppression key and the name user methods
    /// are matched against.
    pub name: &'static str,
    /// Rust-level method name (differs only where a trait dictates it).
    pub method: &'static str,
    pub ret: ReturnRule,
    pub params: &'static [ParamSpec],
    pub flags: OpFlags,
    pub gen: GenFn,
}

impl Operation {
    pub fn has(&self, flags: OpFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// Every operation the synthesizer can derive, in derivation order.
pub static CATALOG: &[Operation] = &[
    Operation {
        name: "equals",
        method: "equals",
        ret: ReturnRule::Bool,
        params: &[],
        flags: OpFlags::DISPATCH_OVERRIDE
            .union(OpFlags::IS_CONST)
            .union(OpFlags::ADDS_SELF_PARAM)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_equals,
    },
    Operation {
        name: "equiv",
        method: "equiv",
        ret: ReturnRule::Bool,
        params: &[],
        flags: OpFlags::EXTEND
            .union(OpFlags::IMPL_ONLY)
            .union(OpFlags::DISPATCH_OVERRIDE)
            .union(OpFlags::IS_CONST)
            .union(OpFlags::ADDS_SELF_PARAM),
        gen: ops::gen_equiv,
    },
    Operation {
        name: "visit_children",
        method: "visit_children",
        ret: ReturnRule::Unit,
        params: &[
            ParamSpec {
                name: "visitor",
                ty: "&mut dyn Visitor",
            },
            ParamSpec {
                name: "label",
                ty: "&str",
            },
        ],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::DISPATCH_OVERRIDE)
            .union(OpFlags::IS_CONST),
        gen: ops::gen_visit_children,
    },
    Operation {
        name: "validate",
        method: "validate",
        ret: ReturnRule::ValidateResult,
        params: &[],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::DISPATCH_OVERRIDE)
            .union(OpFlags::EXTEND)
            .union(OpFlags::IS_CONST),
        gen: ops::gen_validate,
    },
    Operation {
        name: "type_name",
        method: "type_name",
        ret: ReturnRule::StaticStr,
        params: &[],
        flags: OpFlags::DISPATCH_OVERRIDE.union(OpFlags::IS_CONST),
        gen: ops::gen_type_name,
    },
    Operation {
        name: "dump_fields",
        method: "dump_fields",
        ret: ReturnRule::Unit,
        params: &[ParamSpec {
            name: "out",
            ty: "&mut String",
        }],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::DISPATCH_OVERRIDE)
            .union(OpFlags::IS_CONST),
        gen: ops::gen_dump_fields,
    },
    Operation {
        name: "to_record",
        method: "to_record",
        ret: ReturnRule::Unit,
        params: &[ParamSpec {
            name: "writer",
            ty: "&mut RecordWriter",
        }],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::DISPATCH_OVERRIDE)
            .union(OpFlags::IS_CONST)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_to_record,
    },
    Operation {
        name: "from_record",
        method: "from_record",
        ret: ReturnRule::SelfValue,
        params: &[ParamSpec {
            name: "r",
            ty: "&RecordLoader",
        }],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::IS_CONSTRUCTOR)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_from_record,
    },
    Operation {
        name: "factory",
        method: "factory",
        ret: ReturnRule::NodeRc,
        params: &[ParamSpec {
            name: "r",
            ty: "&RecordLoader",
        }],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::IS_FACTORY)
            .union(OpFlags::CONCRETE_ONLY)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_factory,
    },
    Operation {
        name: "display",
        method: "fmt",
        ret: ReturnRule::FmtResult,
        params: &[ParamSpec {
            name: "f",
            ty: "&mut fmt::Formatter<'_>",
        }],
        flags: OpFlags::IMPL_ONLY
            .union(OpFlags::EXTEND)
            .union(OpFlags::SKIP_IF_USER_DEFINED)
            .union(OpFlags::IS_FRIEND)
            .union(OpFlags::IS_CONST)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_display,
    },
    Operation {
        name: "to_string",
        method: "to_string",
        ret: ReturnRule::Text,
        params: &[],
        flags: OpFlags::SKIP_IF_USER_DEFINED
            .union(OpFlags::IS_CONST)
            .union(OpFlags::INCL_NESTED),
        gen: ops::gen_to_string,
    },
];

/// Find a catalog entry by name.
pub fn lookup(name: &str) -> Option<&'static Operation> {
    CATALOG.iter().find(|op| op.name == name)
}

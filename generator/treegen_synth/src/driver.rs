//! The synthesis driver: one policy loop over the operation catalog, plus
//! ancestor equality redispatch and the constructor surface.
//!
//! The driver is deliberately mechanism-free: everything operation-specific
//! lives in the catalog row and its body generator, so the loop here reads
//! as the policy table's legend. Output is a list of method records per
//! class, for a renderer to place; nothing here writes files.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use treegen_ir::InvariantViolation;

use crate::catalog::{self, OpFlags, Operation};
use crate::schema::{
    snake_case, variant_enum_name, Field, FieldKind, MethodDecl, NodeClass, NodeKind, Schema,
};

/// Where a method record is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inline at the type's declaration site.
    DeclarationSite,
    /// Out of line, in the type's impl block.
    OutOfLine,
}

/// One derived (or user-kept) method.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    /// Catalog name of the operation this record came from.
    pub operation: String,
    pub signature: String,
    pub body: String,
    pub placement: Placement,
    /// Rendered as a foreign-trait impl rather than an inherent method.
    pub is_friend: bool,
}

/// One synthesized constructor overload.
#[derive(Debug, Clone)]
pub struct ConstructorRecord {
    /// Optional parameters this overload omits, in assembled order.
    pub omitted: Vec<String>,
    pub record: MethodRecord,
}

/// Everything synthesized for one class.
#[derive(Debug, Clone)]
pub struct ClassOutput {
    pub class: String,
    pub methods: Vec<MethodRecord>,
    pub constructors: Vec<ConstructorRecord>,
}

/// Derive every class in schema declaration order.
pub fn synthesize(schema: &Schema) -> Result<Vec<ClassOutput>, InvariantViolation> {
    schema
        .classes()
        .iter()
        .map(|class| synthesize_class(schema, class))
        .collect()
}

fn synthesize_class(schema: &Schema, class: &NodeClass) -> Result<ClassOutput, InvariantViolation> {
    debug!(class = %class.name, kind = ?class.kind, "synthesizing class");
    let mut methods = Vec::new();

    for op in catalog::CATALOG {
        if class.suppresses(op.name) {
            continue;
        }
        match class.kind {
            // Interfaces derive nothing; hand-written bodies survive.
            NodeKind::Interface => {
                if let Some(user) = class.user_method(op.name) {
                    methods.push(user_record(op, class, user));
                }
                continue;
            }
            NodeKind::Nested if !op.has(OpFlags::INCL_NESTED) => continue,
            NodeKind::Abstract if op.has(OpFlags::CONCRETE_ONLY) => continue,
            _ => {}
        }

        let user = class.user_method(op.name);
        let record = match user {
            Some(user) if !op.has(OpFlags::EXTEND) => {
                trace!(class = %class.name, op = op.name, "keeping user method verbatim");
                Some(user_record(op, class, user))
            }
            None if op.has(OpFlags::SKIP_IF_USER_DEFINED) => None,
            _ => (op.gen)(schema, class, user)?.map(|body| MethodRecord {
                operation: op.name.to_string(),
                signature: render_signature(op, class, None),
                body,
                placement: placement_of(op),
                is_friend: op.has(OpFlags::IS_FRIEND),
            }),
        };
        if let Some(record) = record {
            trace!(class = %class.name, op = op.name, "derived operation");
            methods.push(record);
        }
    }

    // One extra equality entry point per proper ancestor, so comparisons
    // phrased against an ancestor-typed view resolve to the most specific
    // equality.
    if !class.suppresses("equals")
        && !matches!(class.kind, NodeKind::Interface | NodeKind::Nested)
    {
        for ancestor in schema.ancestors(class) {
            trace!(class = %class.name, ancestor = %ancestor.name, "equality redispatch");
            methods.push(MethodRecord {
                operation: "equals".to_string(),
                signature: format!(
                    "pub fn equals_{}(&self, a: &{}) -> bool",
                    snake_case(&ancestor.name),
                    ancestor.name
                ),
                body: "{\n    a.equals(self)\n}".to_string(),
                placement: Placement::OutOfLine,
                is_friend: false,
            });
        }
    }

    let constructors = if class.kind == NodeKind::Interface
        || class.suppresses("constructor")
        || class.user_method("new").is_some()
    {
        Vec::new()
    } else {
        synthesize_constructors(schema, class)
    };

    Ok(ClassOutput {
        class: class.name.clone(),
        methods,
        constructors,
    })
}

fn user_record(op: &Operation, class: &NodeClass, user: &MethodDecl) -> MethodRecord {
    MethodRecord {
        operation: op.name.to_string(),
        signature: render_signature(op, class, user.return_type.as_deref()),
        body: user.body.as_deref().unwrap_or_default().to_string(),
        placement: placement_of(op),
        is_friend: op.has(OpFlags::IS_FRIEND),
    }
}

fn placement_of(op: &Operation) -> Placement {
    if op.has(OpFlags::IMPL_ONLY) {
        Placement::OutOfLine
    } else {
        Placement::DeclarationSite
    }
}

fn render_signature(op: &Operation, class: &NodeClass, ret_override: Option<&str>) -> String {
    let mut params: Vec<String> = Vec::new();
    let associated = op.has(OpFlags::IS_CONSTRUCTOR) || op.has(OpFlags::IS_FACTORY);
    if !associated {
        params.push("&self".to_string());
    }
    if op.has(OpFlags::ADDS_SELF_PARAM) {
        if class.kind == NodeKind::Nested {
            params.push("a: &Self".to_string());
        } else {
            params.push("other: &dyn IrNode".to_string());
        }
    }
    for p in op.params {
        params.push(format!("{}: {}", p.name, p.ty));
    }
    let ret = ret_override
        .or_else(|| op.ret.render(class.kind))
        .map(|r| format!(" -> {r}"))
        .unwrap_or_default();

    let inherent = !op.has(OpFlags::IS_FRIEND)
        && !(op.has(OpFlags::DISPATCH_OVERRIDE) && class.kind != NodeKind::Nested);
    let vis = if inherent { "pub " } else { "" };
    format!("{vis}fn {}({}){}", op.method, params.join(", "), ret)
}

/// One parameter of the assembled constructor surface.
struct CtorParam<'a> {
    owner: &'a NodeClass,
    field: &'a Field,
}

impl CtorParam<'_> {
    fn ty(&self) -> String {
        match &self.field.kind {
            FieldKind::Value(vt) => vt.render(),
            FieldKind::InlineChild(ty) => ty.clone(),
            FieldKind::PointerChild { ty, nullable: true } => format!("Option<Rc<{ty}>>"),
            FieldKind::PointerChild { ty, nullable: false } => format!("Rc<{ty}>"),
            FieldKind::Variant(_) => variant_enum_name(self.owner, self.field),
        }
    }
}

/// Assembled parameter list: required fields ancestor-first down to the
/// class itself, then optional fields in the same class order.
fn constructor_params<'a>(schema: &'a Schema, class: &'a NodeClass) -> Vec<CtorParam<'a>> {
    let mut chain: Vec<&NodeClass> = schema.ancestors(class).collect();
    chain.reverse();
    chain.push(class);

    let mut params = Vec::new();
    for optional in [false, true] {
        for owner in &chain {
            for field in &owner.fields {
                if field.is_optional() == optional {
                    params.push(CtorParam { owner, field });
                }
            }
        }
    }
    params
}

/// Every way of supplying a subset of the optional parameters: with k
/// optionals, 2^k overloads, one per omitted subset. Overload names carry
/// the omitted fields since there is no call-site overload resolution.
fn synthesize_constructors(schema: &Schema, class: &NodeClass) -> Vec<ConstructorRecord> {
    let params = constructor_params(schema, class);
    let optional_count = params.iter().filter(|p| p.field.is_optional()).count();

    let mut records = Vec::with_capacity(1 << optional_count);
    for mask in 0u32..(1 << optional_count) {
        let mut omitted = Vec::new();
        let mut bit = 0;
        for p in &params {
            if p.field.is_optional() {
                if mask & (1 << bit) != 0 {
                    omitted.push(p.field.name.clone());
                }
                bit += 1;
            }
        }
        let name = if omitted.is_empty() {
            "new".to_string()
        } else {
            format!("new_without_{}", omitted.join("_"))
        };
        trace!(class = %class.name, ctor = %name, "constructor overload");

        let omitted_set: FxHashSet<&str> = omitted.iter().map(String::as_str).collect();
        let record = MethodRecord {
            operation: "constructor".to_string(),
            signature: render_ctor_signature(&name, &params, &omitted_set),
            body: render_ctor_body(schema, class, &params, &omitted_set),
            placement: Placement::OutOfLine,
            is_friend: false,
        };
        records.push(ConstructorRecord { omitted, record });
    }
    records
}

fn render_ctor_signature(name: &str, params: &[CtorParam<'_>], omitted: &FxHashSet<&str>) -> String {
    let included: Vec<String> = params
        .iter()
        .filter(|p| !omitted.contains(p.field.name.as_str()))
        .map(|p| format!("{}: {}", p.field.name, p.ty()))
        .collect();
    format!("pub fn {name}({}) -> Self", included.join(", "))
}

fn render_ctor_body(
    schema: &Schema,
    class: &NodeClass,
    params: &[CtorParam<'_>],
    omitted: &FxHashSet<&str>,
) -> String {
    // An omitted parameter is synthesized from its default expression; an
    // included one is forwarded by name.
    let supplied = |field: &Field| -> String {
        if omitted.contains(field.name.as_str()) {
            field.default_expr.clone().unwrap_or_default()
        } else {
            field.name.clone()
        }
    };

    let mut out = String::from("{\n");
    out.push_str(&format!("    {} {{\n", class.name));
    if let Some(parent) = schema.parent_class(class) {
        let args: Vec<String> = params
            .iter()
            .filter(|p| !std::ptr::eq(p.owner, class))
            .map(|p| supplied(p.field))
            .collect();
        out.push_str(&format!(
            "        base: {}::new({}),\n",
            parent.name,
            args.join(", ")
        ));
    }
    for field in &class.fields {
        let value = match (&field.kind, omitted.contains(field.name.as_str())) {
            // A required pointer parameter fills an always-checked slot.
            (FieldKind::PointerChild { nullable: false, .. }, false) => {
                format!("Some({})", field.name)
            }
            _ => supplied(field),
        };
        if value == field.name {
            out.push_str(&format!("        {},\n", field.name));
        } else {
            out.push_str(&format!("        {}: {},\n", field.name, value));
        }
    }
    out.push_str("    }\n}");
    out
}

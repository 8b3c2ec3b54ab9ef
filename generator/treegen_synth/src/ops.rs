//! Body generators for the operation catalog.
//!
//! Each generator turns one class's resolved field set into Rust source
//! text targeting the node trait surface. The text leans on a small set of
//! conventions: ancestor state lives in an embedded `base` field and is
//! reached by explicit delegation; pointer children are `Option<Rc<_>>`
//! slots; variant fields are closed enums matched exhaustively.
//!
//! A generator returns `Ok(None)` when the class contributes nothing to
//! the operation and no override is worth emitting.

use treegen_ir::InvariantViolation;

use crate::context::SourceWriter;
use crate::schema::{variant_enum_name, Field, FieldKind, MethodDecl, NodeClass, NodeKind, Schema};

type GenResult = Result<Option<String>, InvariantViolation>;

/// Shallow equality: value fields by value (fixed arrays element-wise),
/// child fields by identity, ancestor fields through the base view. The
/// downcast doubles as the type-discriminator comparison; a class with no
/// fields and no parent compares as literal `false`.
pub(crate) fn gen_equals(schema: &Schema, class: &NodeClass, _user: Option<&MethodDecl>) -> GenResult {
    let mut w = SourceWriter::new();
    w.open("{");
    if class.kind != NodeKind::Nested {
        emit_downcast(&mut w, class, "false");
    }

    let mut terms: Vec<String> = Vec::new();
    if schema.parent_class(class).is_some() {
        terms.push("self.base.equals(&a.base)".to_string());
    }
    for field in &class.fields {
        let name = &field.name;
        match &field.kind {
            FieldKind::Value(vt) => match vt.array_len {
                Some(len) => {
                    for i in 0..len {
                        terms.push(format!("self.{name}[{i}] == a.{name}[{i}]"));
                    }
                }
                None => terms.push(format!("self.{name} == a.{name}")),
            },
            FieldKind::InlineChild(_) => terms.push(format!("self.{name}.equals(&a.{name})")),
            FieldKind::PointerChild { .. } => {
                terms.push(format!("treegen_ir::same_opt(&self.{name}, &a.{name})"));
            }
            FieldKind::Variant(_) => terms.push(format!("self.{name} == a.{name}")),
        }
    }

    if terms.is_empty() {
        w.line("false");
    } else {
        emit_conjunction(&mut w, &terms);
    }
    w.close("}");
    Ok(Some(w.finish()))
}

/// Deep structural equivalence: identity short-circuit, discriminator
/// check via downcast, ancestor delegation, then per-field recursion in
/// declaration order. A user fragment replaces the field recursion.
pub(crate) fn gen_equiv(schema: &Schema, class: &NodeClass, user: Option<&MethodDecl>) -> GenResult {
    let mut w = SourceWriter::new();
    w.open("{");
    w.open("if treegen_ir::same_node(self, other) {");
    w.line("return true;");
    w.close("}");
    emit_downcast(&mut w, class, "false");
    if schema.parent_class(class).is_some() {
        w.open("if !self.base.equiv(&a.base) {");
        w.line("return false;");
        w.close("}");
    }

    if let Some(fragment) = user.and_then(|m| m.body.as_deref()) {
        w.fragment(fragment);
        w.close("}");
        return Ok(Some(w.finish()));
    }

    for field in &class.fields {
        let name = &field.name;
        match &field.kind {
            FieldKind::Value(_) => {
                w.open(&format!("if self.{name} != a.{name} {{"));
                w.line("return false;");
                w.close("}");
            }
            FieldKind::InlineChild(_) => {
                w.open(&format!("if !self.{name}.equiv(&a.{name}) {{"));
                w.line("return false;");
                w.close("}");
            }
            FieldKind::PointerChild { .. } => {
                w.open(&format!(
                    "if !treegen_ir::equiv_opt(&self.{name}, &a.{name}) {{"
                ));
                w.line("return false;");
                w.close("}");
            }
            FieldKind::Variant(alternatives) => {
                let alternatives = checked_alternatives(class, field, alternatives)?;
                let enum_name = variant_enum_name(class, field);
                w.open(&format!(
                    "if std::mem::discriminant(&self.{name}) != std::mem::discriminant(&a.{name}) {{"
                ));
                w.line("return false;");
                w.close("}");
                w.open(&format!("match (&self.{name}, &a.{name}) {{"));
                for alt in alternatives {
                    w.open(&format!(
                        "({enum_name}::{alt}(x), {enum_name}::{alt}(y)) => {{"
                    ));
                    w.open("if !x.equiv(y) {");
                    w.line("return false;");
                    w.close("}");
                    w.close("}");
                }
                w.line("_ => unreachable!(\"variant alternative outside declared set\"),");
                w.close("}");
            }
        }
    }
    w.line("true");
    w.close("}");
    Ok(Some(w.finish()))
}

/// Child traversal: ancestor children first, then own child-bearing fields
/// in declaration order. Emitted only when the class itself contributes; a
/// user-written body replaces generation entirely (the driver keeps it
/// verbatim before this generator runs).
pub(crate) fn gen_visit_children(
    schema: &Schema,
    class: &NodeClass,
    _user: Option<&MethodDecl>,
) -> GenResult {
    if !class.fields.iter().any(Field::is_child_bearing) {
        return Ok(None);
    }

    let mut w = SourceWriter::new();
    w.open("{");
    if schema.parent_class(class).is_some() {
        w.line("self.base.visit_children(visitor, label);");
    }
    for field in &class.fields {
        let name = &field.name;
        match &field.kind {
            FieldKind::Value(_) => {}
            FieldKind::InlineChild(_) => {
                w.line(&format!("self.{name}.visit_children(visitor, \"{name}\");"));
            }
            FieldKind::PointerChild { .. } => {
                w.open(&format!("if let Some(child) = &self.{name} {{"));
                w.line(&format!("visitor.visit(child.as_ref(), \"{name}\");"));
                w.close("}");
            }
            FieldKind::Variant(alternatives) => {
                let alternatives = checked_alternatives(class, field, alternatives)?;
                let enum_name = variant_enum_name(class, field);
                w.open(&format!("match &self.{name} {{"));
                for alt in alternatives {
                    w.line(&format!(
                        "{enum_name}::{alt}(node) => visitor.visit(node, \"{name}::{alt}\"),"
                    ));
                }
                w.close("}");
            }
        }
    }
    w.close("}");
    Ok(Some(w.finish()))
}

/// Structural validation: ancestor first, required pointer slots checked
/// non-null, children recursed. A user fragment is appended after the
/// generated checks.
pub(crate) fn gen_validate(schema: &Schema, class: &NodeClass, user: Option<&MethodDecl>) -> GenResult {
    let fragment = user.and_then(|m| m.body.as_deref());
    if !class.fields.iter().any(Field::is_child_bearing) && fragment.is_none() {
        return Ok(None);
    }

    let mut w = SourceWriter::new();
    w.open("{");
    if schema.parent_class(class).is_some() {
        w.line("self.base.validate()?;");
    }
    for field in &class.fields {
        let name = &field.name;
        match &field.kind {
            FieldKind::Value(_) => {}
            FieldKind::InlineChild(_) => {
                w.line(&format!("self.{name}.validate()?;"));
            }
            FieldKind::PointerChild { nullable: true, .. } => {
                w.open(&format!("if let Some(node) = &self.{name} {{"));
                w.line("node.validate()?;");
                w.close("}");
            }
            FieldKind::PointerChild { nullable: false, .. } => {
                w.open(&format!("match &self.{name} {{"));
                w.line("Some(node) => node.validate()?,");
                w.line(&format!(
                    "None => return Err(treegen_ir::bug!(\"{}::{name}: required child is null\")),",
                    class.name
                ));
                w.close("}");
            }
            FieldKind::Variant(alternatives) => {
                let alternatives = checked_alternatives(class, field, alternatives)?;
                let enum_name = variant_enum_name(class, field);
                w.open(&format!("match &self.{name} {{"));
                for alt in alternatives {
                    w.line(&format!("{enum_name}::{alt}(node) => node.validate()?,"));
                }
                w.close("}");
            }
        }
    }
    if let Some(fragment) = fragment {
        w.fragment(fragment);
    }
    w.line("Ok(())");
    w.close("}");
    Ok(Some(w.finish()))
}

/// Literal type-name body.
pub(crate) fn gen_type_name(_schema: &Schema, class: &NodeClass, _user: Option<&MethodDecl>) -> GenResult {
    let mut w = SourceWriter::new();
    w.open("{");
    w.line(&format!("\"{}\"", class.name));
    w.close("}");
    Ok(Some(w.finish()))
}

/// Debug rendering of value fields, ancestor fields first. A user-written
/// body is kept verbatim by the driver and never reaches this generator.
pub(crate) fn gen_dump_fields(
    schema: &Schema,
    class: &NodeClass,
    _user: Option<&MethodDecl>,
) -> GenResult {
    let values: Vec<&Field> = class
        .fields
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Value(_)))
        .collect();
    if values.is_empty() {
        return Ok(None);
    }

    let mut w = SourceWriter::new();
    w.open("{");
    if schema.parent_class(class).is_some() {
        w.line("self.base.dump_fields(out);");
    }
    for field in values {
        let name = &field.name;
        w.line(&format!(
            "out.push_str(&format!(\" {name}={{:?}}\", self.{name}));"
        ));
    }
    w.close("}");
    Ok(Some(w.finish()))
}

/// Keyed record emission: ancestor fields first, own fields in declaration
/// order. Nullable children that are null are omitted; required children
/// always occupy their slot, null written explicitly. A user-written body
/// replaces generation entirely.
pub(crate) fn gen_to_record(schema: &Schema, class: &NodeClass, _user: Option<&MethodDecl>) -> GenResult {
    if class.fields.is_empty() {
        return Ok(None);
    }

    let mut w = SourceWriter::new();
    w.open("{");
    if schema.parent_class(class).is_some() {
        w.line("self.base.to_record(writer);");
    }
    for field in &class.fields {
        let name = &field.name;
        match &field.kind {
            FieldKind::Value(_) => {
                w.line(&format!("writer.emit(\"{name}\", &self.{name});"));
            }
            FieldKind::InlineChild(_) => {
                w.line(&format!("writer.emit_node(\"{name}\", &self.{name});"));
            }
            FieldKind::PointerChild { nullable: true, .. } => {
                w.line(&format!(
                    "writer.emit_opt_node(\"{name}\", self.{name}.as_deref());"
                ));
            }
            FieldKind::PointerChild { nullable: false, .. } => {
                w.line(&format!(
                    "writer.emit_child(\"{name}\", self.{name}.as_deref());"
                ));
            }
            FieldKind::Variant(alternatives) => {
                let alternatives = checked_alternatives(class, field, alternatives)?;
                let enum_name = variant_enum_name(class, field);
                w.open(&format!("match &self.{name} {{"));
                for alt in alternatives {
                    w.line(&format!(
                        "{enum_name}::{alt}(node) => writer.emit_variant(\"{name}\", node),"
                    ));
                }
                w.close("}");
            }
        }
    }
    w.close("}");
    Ok(Some(w.finish()))
}

/// Record loading: every declared key is attempted unconditionally; an
/// absent key leaves the field's default or null state. The asymmetry with
/// `to_record` is deliberate and lets one loader read records written
/// before an optional field existed.
pub(crate) fn gen_from_record(schema: &Schema, class: &NodeClass, _user: Option<&MethodDecl>) -> GenResult {
    let mut w = SourceWriter::new();
    w.open("{");
    w.open(&format!("{} {{", class.name));
    if let Some(parent) = schema.parent_class(class) {
        w.line(&format!("base: {}::from_record(r),", parent.name));
    }
    for field in &class.fields {
        let name = &field.name;
        let fallback = match &field.default_expr {
            Some(expr) => format!(".unwrap_or_else(|| {expr})"),
            None => ".unwrap_or_default()".to_string(),
        };
        match &field.kind {
            FieldKind::Value(_) => {
                w.line(&format!("{name}: r.load(\"{name}\"){fallback},"));
            }
            FieldKind::InlineChild(ty) => {
                w.line(&format!(
                    "{name}: r.load_record(\"{name}\").map(|rec| {ty}::from_record(&rec)){fallback},"
                ));
            }
            FieldKind::PointerChild { ty, .. } => {
                // Absent required children load as None; validate reports them.
                w.line(&format!(
                    "{name}: r.load_record(\"{name}\").map(|rec| Rc::new({ty}::from_record(&rec))),"
                ));
            }
            FieldKind::Variant(alternatives) => {
                let alternatives = checked_alternatives(class, field, alternatives)?;
                let enum_name = variant_enum_name(class, field);
                // A tag outside the declared set can reach here from a
                // stale or corrupt record; it falls back to the same
                // default state as an absent key, never a panic.
                let fallback = match &field.default_expr {
                    Some(expr) => expr.clone(),
                    None => format!("{enum_name}::default()"),
                };
                w.open(&format!("{name}: match r.load_variant(\"{name}\") {{"));
                w.open("Some((tag, rec)) => match tag.as_str() {");
                for alt in alternatives {
                    w.line(&format!(
                        "\"{alt}\" => {enum_name}::{alt}({alt}::from_record(&rec)),"
                    ));
                }
                w.line(&format!("_ => {fallback},"));
                w.close("},");
                w.line(&format!("None => {fallback},"));
                w.close("},");
            }
        }
    }
    w.close("}");
    w.close("}");
    Ok(Some(w.finish()))
}

/// Shared-handle factory over `from_record`.
pub(crate) fn gen_factory(_schema: &Schema, _class: &NodeClass, _user: Option<&MethodDecl>) -> GenResult {
    let mut w = SourceWriter::new();
    w.open("{");
    w.line("Rc::new(Self::from_record(r))");
    w.close("}");
    Ok(Some(w.finish()))
}

/// Rendering hook: exists only to wrap a user fragment.
pub(crate) fn gen_display(_schema: &Schema, _class: &NodeClass, user: Option<&MethodDecl>) -> GenResult {
    let Some(fragment) = user.and_then(|m| m.body.as_deref()) else {
        return Ok(None);
    };
    let mut w = SourceWriter::new();
    w.open("{");
    w.fragment(fragment);
    w.line("Ok(())");
    w.close("}");
    Ok(Some(w.finish()))
}

/// Never derived; a user-written `to_string` is kept verbatim by the
/// driver before this generator is consulted.
pub(crate) fn gen_to_string(
    _schema: &Schema,
    _class: &NodeClass,
    _user: Option<&MethodDecl>,
) -> GenResult {
    Ok(None)
}

/// Downcast the dispatch argument into `a`, bailing out with `fail` on a
/// type mismatch. For root children this is the discriminator comparison
/// itself; derived classes additionally delegate through `base`.
fn emit_downcast(w: &mut SourceWriter, class: &NodeClass, fail: &str) {
    w.open(&format!(
        "let Some(a) = other.as_any().downcast_ref::<{}>() else {{",
        class.name
    ));
    w.line(&format!("return {fail};"));
    w.close("};");
}

/// A variant field reaching a generator with no declared alternatives is
/// an internal defect; schema resolution rejects it up front.
fn checked_alternatives<'a>(
    class: &NodeClass,
    field: &Field,
    alternatives: &'a [String],
) -> Result<&'a [String], InvariantViolation> {
    if alternatives.is_empty() {
        return Err(treegen_ir::bug!(
            "{}::{}: variant field with no alternatives",
            class.name,
            field.name
        ));
    }
    Ok(alternatives)
}

fn emit_conjunction(w: &mut SourceWriter, terms: &[String]) {
    w.line(&terms[0]);
    for term in &terms[1..] {
        w.line(&format!("    && {term}"));
    }
}

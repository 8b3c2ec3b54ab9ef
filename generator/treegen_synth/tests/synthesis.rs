//! End-to-end synthesis over a small expression-language schema, loaded
//! from JSON the way a build script would feed it in.

use pretty_assertions::assert_eq;

use treegen_synth::{synthesize, ClassOutput, MethodRecord, Placement, Schema};

const SCHEMA: &str = r#"[
    {"name": "Expression", "kind": "abstract", "parent": "Node",
     "fields": [{"name": "ty", "fieldKind": "value", "ty": "String",
                 "default": "String::new()"}]},
    {"name": "Constant", "kind": "concrete", "parent": "Expression",
     "fields": [{"name": "value", "fieldKind": "value", "ty": "i64"}]},
    {"name": "PathRef", "kind": "concrete", "parent": "Expression",
     "fields": [{"name": "segments", "fieldKind": "value", "ty": "String"}]},
    {"name": "Assignment", "kind": "concrete", "parent": "Expression",
     "fields": [
        {"name": "target", "fieldKind": "variant",
         "variantTypes": ["Constant", "PathRef"]},
        {"name": "value", "fieldKind": "pointer", "ty": "Expression"},
        {"name": "note", "fieldKind": "pointer", "ty": "Constant",
         "nullable": true}
     ],
     "methods": [{"name": "validate",
                  "body": "if self.base.ty.is_empty() {\n    return Err(treegen_ir::bug!(\"Assignment: untyped\"));\n}"}]}
]"#;

fn outputs() -> Vec<ClassOutput> {
    let schema = Schema::from_json(SCHEMA).unwrap();
    synthesize(&schema).unwrap()
}

fn class(outputs: &[ClassOutput], name: &str) -> ClassOutput {
    outputs.iter().find(|o| o.class == name).unwrap().clone()
}

fn method<'a>(out: &'a ClassOutput, operation: &str) -> &'a MethodRecord {
    out.methods
        .iter()
        .find(|m| m.operation == operation)
        .unwrap()
}

#[test]
fn every_concrete_class_gets_the_full_surface() {
    let outputs = outputs();
    for name in ["Constant", "PathRef", "Assignment"] {
        let out = class(&outputs, name);
        for operation in ["equals", "equiv", "type_name", "to_record", "from_record", "factory"] {
            assert!(
                out.methods.iter().any(|m| m.operation == operation),
                "{name} is missing {operation}"
            );
        }
    }
}

#[test]
fn abstract_base_has_no_factory() {
    let outputs = outputs();
    let out = class(&outputs, "Expression");
    assert!(!out.methods.iter().any(|m| m.operation == "factory"));
    assert!(out.methods.iter().any(|m| m.operation == "from_record"));
}

#[test]
fn derived_equality_reaches_ancestor_state_through_base() {
    let outputs = outputs();
    let equals = method(&class(&outputs, "Constant"), "equals").clone();
    assert!(equals.body.contains("self.base.equals(&a.base)"));
    assert!(equals.body.contains("self.value == a.value"));
    assert_eq!(equals.placement, Placement::DeclarationSite);
}

#[test]
fn redispatch_overloads_cover_the_ancestor_chain() {
    let outputs = outputs();
    let out = class(&outputs, "Assignment");
    let redispatch: Vec<&MethodRecord> = out
        .methods
        .iter()
        .filter(|m| m.signature.starts_with("pub fn equals_"))
        .collect();
    assert_eq!(redispatch.len(), 1);
    assert_eq!(
        redispatch[0].signature,
        "pub fn equals_expression(&self, a: &Expression) -> bool"
    );
}

#[test]
fn variant_field_flows_through_every_operation() {
    let outputs = outputs();
    let out = class(&outputs, "Assignment");

    let equiv = method(&out, "equiv");
    assert!(equiv.body.contains("(AssignmentTarget::Constant(x), AssignmentTarget::Constant(y))"));

    let traversal = method(&out, "visit_children");
    assert!(traversal.body.contains("visitor.visit(node, \"target::PathRef\")"));

    let to_record = method(&out, "to_record");
    assert!(to_record.body.contains("writer.emit_variant(\"target\", node)"));

    let from_record = method(&out, "from_record");
    assert!(from_record.body.contains("\"PathRef\" => AssignmentTarget::PathRef(PathRef::from_record(&rec)),"));
}

#[test]
fn user_validate_fragment_lands_after_generated_checks() {
    let outputs = outputs();
    let validate = method(&class(&outputs, "Assignment"), "validate").clone();
    let generated = validate
        .body
        .find("Assignment::value: required child is null")
        .unwrap();
    let fragment = validate.body.find("Assignment: untyped").unwrap();
    assert!(generated < fragment);
    assert_eq!(validate.placement, Placement::OutOfLine);
}

#[test]
fn nullable_note_is_omitted_from_records_when_null() {
    let outputs = outputs();
    let to_record = method(&class(&outputs, "Assignment"), "to_record").clone();
    assert!(to_record.body.contains("writer.emit_opt_node(\"note\", self.note.as_deref());"));
    assert!(to_record.body.contains("writer.emit_child(\"value\", self.value.as_deref());"));
}

#[test]
fn optional_ancestor_field_doubles_the_constructor_surface() {
    let outputs = outputs();
    // Constant: required own `value`, optional inherited `ty`.
    let out = class(&outputs, "Constant");
    assert_eq!(out.constructors.len(), 2);
    assert_eq!(
        out.constructors[0].record.signature,
        "pub fn new(value: i64, ty: String) -> Self"
    );
    assert_eq!(
        out.constructors[1].record.signature,
        "pub fn new_without_ty(value: i64) -> Self"
    );
    assert!(out.constructors[1]
        .record
        .body
        .contains("base: Expression::new(String::new()),"));
}

//! End-to-end exercise of the runtime surface using hand-written nodes in
//! the exact shape the synthesis driver emits: base-field delegation for
//! ancestors, `Option<Rc<_>>` storage for pointer children, an enum per
//! variant field, and the keyed-record contract.

use std::any::Any;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use treegen_ir::{
    equiv_opt, same_node, same_opt, Declaration, InvariantViolation, IrNode, RecordLoader,
    RecordWriter, Visitor,
};

/// Leaf node: `Constant { value: Value<i64> }`, parent is the tree root.
#[derive(Debug, Clone, Default, PartialEq)]
struct Constant {
    value: i64,
}

impl Constant {
    fn from_record(r: &RecordLoader) -> Self {
        Constant {
            value: r.load("value").unwrap_or_default(),
        }
    }
}

impl IrNode for Constant {
    fn type_name(&self) -> &'static str {
        "Constant"
    }
    fn equals(&self, other: &dyn IrNode) -> bool {
        let Some(a) = other.as_any().downcast_ref::<Constant>() else {
            return false;
        };
        self.value == a.value
    }
    fn equiv(&self, other: &dyn IrNode) -> bool {
        if same_node(self, other) {
            return true;
        }
        let Some(a) = other.as_any().downcast_ref::<Constant>() else {
            return false;
        };
        self.value == a.value
    }
    fn visit_children(&self, _visitor: &mut dyn Visitor, _label: &str) {}
    fn validate(&self) -> Result<(), InvariantViolation> {
        Ok(())
    }
    fn to_record(&self, writer: &mut RecordWriter) {
        writer.emit("value", &self.value);
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_node(&self) -> &dyn IrNode {
        self
    }
}

/// Leaf node: `ParamRef { index: Value<u32> }`, parent is the tree root.
#[derive(Debug, Clone, Default, PartialEq)]
struct ParamRef {
    index: u32,
}

impl ParamRef {
    fn from_record(r: &RecordLoader) -> Self {
        ParamRef {
            index: r.load("index").unwrap_or_default(),
        }
    }
}

impl IrNode for ParamRef {
    fn type_name(&self) -> &'static str {
        "ParamRef"
    }
    fn equals(&self, other: &dyn IrNode) -> bool {
        let Some(a) = other.as_any().downcast_ref::<ParamRef>() else {
            return false;
        };
        self.index == a.index
    }
    fn equiv(&self, other: &dyn IrNode) -> bool {
        if same_node(self, other) {
            return true;
        }
        let Some(a) = other.as_any().downcast_ref::<ParamRef>() else {
            return false;
        };
        self.index == a.index
    }
    fn visit_children(&self, _visitor: &mut dyn Visitor, _label: &str) {}
    fn validate(&self) -> Result<(), InvariantViolation> {
        Ok(())
    }
    fn to_record(&self, writer: &mut RecordWriter) {
        writer.emit("index", &self.index);
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_node(&self) -> &dyn IrNode {
        self
    }
}

/// Variant field over the closed alternative set {Constant, ParamRef}.
#[derive(Debug, Clone, PartialEq)]
enum InitValue {
    Constant(Constant),
    ParamRef(ParamRef),
}

impl Default for InitValue {
    fn default() -> Self {
        InitValue::Constant(Constant::default())
    }
}

impl InitValue {
    fn active(&self) -> &dyn IrNode {
        match self {
            InitValue::Constant(node) => node,
            InitValue::ParamRef(node) => node,
        }
    }

    fn equiv(&self, other: &InitValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && match (self, other) {
                (InitValue::Constant(x), InitValue::Constant(y)) => x.equiv(y),
                (InitValue::ParamRef(x), InitValue::ParamRef(y)) => x.equiv(y),
                _ => unreachable!("variant alternative outside declared set"),
            }
    }
}

/// Node with one of every child-bearing field kind:
/// `Binding { name: Value<String>, init: Variant, body: PointerChild
/// (required), doc: PointerChild (nullable) }`, parent is the tree root.
#[derive(Debug, Clone, Default)]
struct Binding {
    name: String,
    init: InitValue,
    body: Option<Rc<Constant>>,
    doc: Option<Rc<Constant>>,
}

impl Binding {
    fn from_record(r: &RecordLoader) -> Self {
        Binding {
            name: r.load("name").unwrap_or_default(),
            init: match r.load_variant("init") {
                Some((tag, rec)) => match tag.as_str() {
                    "Constant" => InitValue::Constant(Constant::from_record(&rec)),
                    "ParamRef" => InitValue::ParamRef(ParamRef::from_record(&rec)),
                    _ => InitValue::default(),
                },
                None => InitValue::default(),
            },
            body: r
                .load_record("body")
                .map(|rec| Rc::new(Constant::from_record(&rec))),
            doc: r
                .load_record("doc")
                .map(|rec| Rc::new(Constant::from_record(&rec))),
        }
    }
}

impl Declaration for Binding {
    fn declared_name(&self) -> &str {
        &self.name
    }
}

impl IrNode for Binding {
    fn type_name(&self) -> &'static str {
        "Binding"
    }
    fn equals(&self, other: &dyn IrNode) -> bool {
        let Some(a) = other.as_any().downcast_ref::<Binding>() else {
            return false;
        };
        self.name == a.name
            && self.init == a.init
            && same_opt(&self.body, &a.body)
            && same_opt(&self.doc, &a.doc)
    }
    fn equiv(&self, other: &dyn IrNode) -> bool {
        if same_node(self, other) {
            return true;
        }
        let Some(a) = other.as_any().downcast_ref::<Binding>() else {
            return false;
        };
        self.name == a.name
            && self.init.equiv(&a.init)
            && equiv_opt(&self.body, &a.body)
            && equiv_opt(&self.doc, &a.doc)
    }
    fn visit_children(&self, visitor: &mut dyn Visitor, _label: &str) {
        match &self.init {
            InitValue::Constant(node) => visitor.visit(node, "init::Constant"),
            InitValue::ParamRef(node) => visitor.visit(node, "init::ParamRef"),
        }
        if let Some(body) = &self.body {
            visitor.visit(body.as_ref(), "body");
        }
        if let Some(doc) = &self.doc {
            visitor.visit(doc.as_ref(), "doc");
        }
    }
    fn validate(&self) -> Result<(), InvariantViolation> {
        if self.body.is_none() {
            return Err(treegen_ir::bug!("Binding::body: required child is null"));
        }
        self.init.active().validate()?;
        if let Some(body) = &self.body {
            body.validate()?;
        }
        Ok(())
    }
    fn to_record(&self, writer: &mut RecordWriter) {
        writer.emit("name", &self.name);
        writer.emit_variant("init", self.init.active());
        writer.emit_child("body", self.body.as_deref());
        writer.emit_opt_node("doc", self.doc.as_deref());
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_node(&self) -> &dyn IrNode {
        self
    }
    fn as_declaration(&self) -> Option<&dyn Declaration> {
        Some(self)
    }
}

/// Derived node: `TypedBinding : Binding { ty: Value<String> }`.
/// Ancestor fields live in `base` and every operation delegates first.
#[derive(Debug, Clone, Default)]
struct TypedBinding {
    base: Binding,
    ty: String,
}

impl IrNode for TypedBinding {
    fn type_name(&self) -> &'static str {
        "TypedBinding"
    }
    fn equals(&self, other: &dyn IrNode) -> bool {
        let Some(a) = other.as_any().downcast_ref::<TypedBinding>() else {
            return false;
        };
        self.base.equals(&a.base) && self.ty == a.ty
    }
    fn equiv(&self, other: &dyn IrNode) -> bool {
        if same_node(self, other) {
            return true;
        }
        let Some(a) = other.as_any().downcast_ref::<TypedBinding>() else {
            return false;
        };
        self.base.equiv(&a.base) && self.ty == a.ty
    }
    fn visit_children(&self, visitor: &mut dyn Visitor, label: &str) {
        self.base.visit_children(visitor, label);
    }
    fn validate(&self) -> Result<(), InvariantViolation> {
        self.base.validate()
    }
    fn to_record(&self, writer: &mut RecordWriter) {
        self.base.to_record(writer);
        writer.emit("ty", &self.ty);
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_node(&self) -> &dyn IrNode {
        self
    }
    fn as_declaration(&self) -> Option<&dyn Declaration> {
        Some(&self.base)
    }
}

fn sample_binding() -> Binding {
    Binding {
        name: "width".into(),
        init: InitValue::ParamRef(ParamRef { index: 2 }),
        body: Some(Rc::new(Constant { value: 7 })),
        doc: None,
    }
}

#[test]
fn equiv_is_reflexive() {
    let binding = sample_binding();
    assert!(binding.equiv(&binding));
}

#[test]
fn twin_trees_are_equiv_but_not_equal() {
    // Field-by-field identical, distinct child identities.
    let left = sample_binding();
    let right = sample_binding();
    assert!(left.equiv(&right));
    assert!(!left.equals(&right));

    // Sharing the child identity makes shallow equality hold too.
    let shared = Binding {
        body: left.body.clone(),
        ..right.clone()
    };
    assert!(left.equals(&shared));
}

#[test]
fn record_round_trip_is_equiv_equal() {
    let binding = sample_binding();
    let mut writer = RecordWriter::new();
    binding.to_record(&mut writer);
    let loader = RecordLoader::new(writer.finish());
    let reloaded = Binding::from_record(&loader);
    assert!(binding.equiv(&reloaded));
    assert!(!binding.equals(&reloaded));
}

#[test]
fn null_nullable_child_is_omitted_and_round_trips_to_null() {
    let binding = sample_binding();
    let mut writer = RecordWriter::new();
    binding.to_record(&mut writer);
    let record = writer.finish();

    // Conditional emit: no "doc" key at all, no null marker.
    let keys = record.as_object().expect("record");
    assert!(!keys.contains_key("doc"));
    assert!(keys.contains_key("body"));

    let reloaded = Binding::from_record(&RecordLoader::new(record));
    assert!(reloaded.doc.is_none());
}

#[test]
fn absent_required_key_leaves_default_state() {
    // Unconditional load-attempt: missing "body" is tolerated and leaves
    // the field in its default/null state; validate is what flags it.
    let loader = RecordLoader::new(serde_json::json!({ "name": "w" }));
    let reloaded = Binding::from_record(&loader);
    assert_eq!(reloaded.name, "w");
    assert!(reloaded.body.is_none());
    assert!(reloaded.validate().is_err());
}

#[test]
fn validate_checks_required_children_and_recurses() {
    let mut binding = sample_binding();
    assert!(binding.validate().is_ok());
    binding.body = None;
    let violation = binding.validate().expect_err("required child missing");
    assert!(violation.message.contains("Binding::body"));
}

#[test]
fn variant_round_trip_preserves_active_alternative() {
    let mut binding = sample_binding();
    binding.init = InitValue::Constant(Constant { value: 40 });

    let mut writer = RecordWriter::new();
    binding.to_record(&mut writer);
    let record = writer.finish();
    assert!(record["init"].as_object().expect("tagged").contains_key("Constant"));

    let reloaded = Binding::from_record(&RecordLoader::new(record));
    assert!(matches!(reloaded.init, InitValue::Constant(ref c) if c.value == 40));
}

#[test]
fn unknown_variant_tag_loads_as_default_state() {
    // A stale record can carry a tag outside the declared set; loading
    // falls back to the default alternative instead of panicking.
    let loader = RecordLoader::new(serde_json::json!({
        "name": "w",
        "init": { "Retired": { "value": 9 } },
    }));
    let reloaded = Binding::from_record(&loader);
    assert_eq!(reloaded.init, InitValue::default());
}

#[test]
fn variant_equiv_compares_discriminant_first() {
    let constant = InitValue::Constant(Constant { value: 1 });
    let param = InitValue::ParamRef(ParamRef { index: 1 });
    assert!(!constant.equiv(&param));
    assert!(constant.equiv(&InitValue::Constant(Constant { value: 1 })));
    assert!(!constant.equiv(&InitValue::Constant(Constant { value: 2 })));
}

#[test]
fn traversal_labels_follow_declaration_order() {
    let binding = Binding {
        doc: Some(Rc::new(Constant { value: 0 })),
        ..sample_binding()
    };
    let mut labels = Vec::new();
    let mut collector = |_: &dyn IrNode, label: &str| labels.push(label.to_string());
    binding.visit_children(&mut collector, "binding");
    assert_eq!(labels, vec!["init::ParamRef", "body", "doc"]);
}

#[test]
fn derived_node_delegates_to_base() {
    let derived = TypedBinding {
        base: sample_binding(),
        ty: "bit<9>".into(),
    };
    let twin = TypedBinding {
        base: sample_binding(),
        ty: "bit<9>".into(),
    };
    assert!(derived.equiv(&twin));
    assert!(!derived.equals(&twin));

    // Ancestor fields serialize into the same flat record.
    let mut writer = RecordWriter::new();
    derived.to_record(&mut writer);
    let record = writer.finish();
    let keys = record.as_object().expect("record");
    assert!(keys.contains_key("name"));
    assert!(keys.contains_key("ty"));

    // The declaration view reaches through the base.
    assert_eq!(
        derived.as_declaration().expect("decl").declared_name(),
        "width"
    );
}

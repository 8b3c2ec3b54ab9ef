//! The node class schema: input declarations, validation, and the resolved
//! class table the synthesis driver walks.
//!
//! A schema is an ordered list of class declarations. Declaration order is
//! load-bearing: a class may only name an *earlier* class (or the tree
//! root) as its parent, so resolution is a single forward pass.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use treegen_diagnostic::ErrorCode;

use crate::catalog;

/// Name reserved for the tree root in parent declarations.
pub const ROOT_NAME: &str = "Node";

/// How a class participates in the node hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Instantiable tree node.
    Concrete,
    /// Node with subclasses; never instantiated directly.
    Abstract,
    /// Capability surface only; receives no generated operations.
    Interface,
    /// Plain value type scoped inside the tree, outside the node hierarchy.
    Nested,
}

/// Resolved parent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// Direct child of the tree root.
    Root,
    /// Index of an earlier class in the schema.
    Class(usize),
}

/// A plain value type, optionally a fixed-length array of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueType {
    pub ty: String,
    pub array_len: Option<u32>,
}

impl ValueType {
    /// Render as Rust source text.
    pub fn render(&self) -> String {
        match self.array_len {
            Some(len) => format!("[{}; {}]", self.ty, len),
            None => self.ty.clone(),
        }
    }
}

/// What a field holds, which decides how every generated operation
/// treats it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain data: compared by value, never traversed.
    Value(ValueType),
    /// Node stored by value inside its parent: traversed, validated,
    /// serialized inline.
    InlineChild(String),
    /// Node stored by reference. A non-nullable slot may still be null at
    /// run time; `validate` is where that surfaces.
    PointerChild { ty: String, nullable: bool },
    /// Exactly one of a closed set of alternative node types.
    Variant(SmallVec<[String; 4]>),
}

/// One declared field of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Rust source text for the default; its presence makes the field
    /// optional in constructor synthesis.
    pub default_expr: Option<String>,
}

impl Field {
    /// Optional fields may be omitted from a constructor overload.
    pub fn is_optional(&self) -> bool {
        self.default_expr.is_some()
    }

    /// Whether the field contributes to traversal, validation, and deep
    /// equivalence.
    pub fn is_child_bearing(&self) -> bool {
        !matches!(self.kind, FieldKind::Value(_))
    }
}

/// A method the schema author wrote by hand.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    /// Body text: a complete body for a user-defined operation, or a
    /// fragment spliced into an extensible generated one.
    #[serde(default)]
    pub body: Option<String>,
    /// Explicit return type, overriding the catalog's rule for this
    /// class's rendition of the operation.
    #[serde(default)]
    pub return_type: Option<String>,
}

/// A fully resolved class.
#[derive(Debug, Clone)]
pub struct NodeClass {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<ParentRef>,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodDecl>,
    suppressions: FxHashSet<String>,
}

impl NodeClass {
    /// Whether the class opted out of a generated operation.
    pub fn suppresses(&self, operation: &str) -> bool {
        self.suppressions.contains(operation)
    }

    /// The hand-written method with this name, if any.
    pub fn user_method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Whether the class is a direct child of the tree root.
    pub fn is_root_child(&self) -> bool {
        matches!(self.parent, Some(ParentRef::Root))
    }
}

/// Schema construction and parse failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate class `{0}`")]
    DuplicateClass(String),
    #[error("class `{class}`: parent `{parent}` is unknown or declared later")]
    UnknownParent { class: String, parent: String },
    #[error("class `{class}`: method `{method}` matches no predefined operation")]
    UnrecognizedMethod { class: String, method: String },
    #[error("class `{class}`: field `{field}`: {reason}")]
    MalformedField {
        class: String,
        field: String,
        reason: String,
    },
    #[error("class `{class}`: duplicate field `{field}`")]
    DuplicateField { class: String, field: String },
    #[error("schema input: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SchemaError {
    /// The diagnostic code reported for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            SchemaError::DuplicateClass(_) => ErrorCode::E1001,
            SchemaError::UnknownParent { .. } => ErrorCode::E1002,
            SchemaError::UnrecognizedMethod { .. } => ErrorCode::E1003,
            SchemaError::MalformedField { .. } => ErrorCode::E1004,
            SchemaError::DuplicateField { .. } => ErrorCode::E1005,
            SchemaError::Parse(_) => ErrorCode::E1006,
        }
    }
}

/// Raw field declaration as it appears in schema input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    /// One of `value`, `inline`, `pointer`, `variant`.
    pub field_kind: String,
    #[serde(default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub variant_types: Vec<String>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub array_len: Option<u32>,
    #[serde(default)]
    pub default: Option<String>,
}

impl FieldDecl {
    pub fn value(name: &str, ty: &str) -> Self {
        FieldDecl {
            name: name.to_string(),
            field_kind: "value".to_string(),
            ty: Some(ty.to_string()),
            ..FieldDecl::default()
        }
    }

    pub fn inline(name: &str, ty: &str) -> Self {
        FieldDecl {
            name: name.to_string(),
            field_kind: "inline".to_string(),
            ty: Some(ty.to_string()),
            ..FieldDecl::default()
        }
    }

    pub fn pointer(name: &str, ty: &str) -> Self {
        FieldDecl {
            name: name.to_string(),
            field_kind: "pointer".to_string(),
            ty: Some(ty.to_string()),
            ..FieldDecl::default()
        }
    }

    pub fn variant(name: &str, alternatives: &[&str]) -> Self {
        FieldDecl {
            name: name.to_string(),
            field_kind: "variant".to_string(),
            variant_types: alternatives.iter().map(|s| s.to_string()).collect(),
            ..FieldDecl::default()
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn array(mut self, len: u32) -> Self {
        self.array_len = Some(len);
        self
    }

    pub fn with_default(mut self, expr: &str) -> Self {
        self.default = Some(expr.to_string());
        self
    }
}

/// Raw class declaration as it appears in schema input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassDecl {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub suppress: Vec<String>,
}

impl ClassDecl {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        ClassDecl {
            name: name.to_string(),
            kind,
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
            suppress: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, name: &str, body: Option<&str>) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            body: body.map(|s| s.to_string()),
            return_type: None,
        });
        self
    }

    pub fn suppressing(mut self, operation: &str) -> Self {
        self.suppress.push(operation.to_string());
        self
    }
}

/// The resolved class table.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    classes: Vec<NodeClass>,
    by_name: FxHashMap<String, usize>,
}

impl Schema {
    /// Resolve a list of declarations into a schema.
    ///
    /// The forward pass enforces: unique class names, parents declared
    /// earlier (or the root), unique field names per class, well-formed
    /// field kinds, and hand-written method names that match the operation
    /// catalog (or `new`).
    pub fn build(decls: Vec<ClassDecl>) -> Result<Schema, SchemaError> {
        let mut schema = Schema::default();
        for decl in decls {
            debug!(class = %decl.name, "resolving class declaration");
            if schema.by_name.contains_key(&decl.name) {
                return Err(SchemaError::DuplicateClass(decl.name));
            }
            let parent = match &decl.parent {
                None => None,
                Some(p) if p == ROOT_NAME => Some(ParentRef::Root),
                Some(p) => match schema.by_name.get(p) {
                    Some(&index) => Some(ParentRef::Class(index)),
                    None => {
                        return Err(SchemaError::UnknownParent {
                            class: decl.name,
                            parent: p.clone(),
                        });
                    }
                },
            };

            let mut fields = Vec::with_capacity(decl.fields.len());
            let mut seen = FxHashSet::default();
            for raw in decl.fields {
                if !seen.insert(raw.name.clone()) {
                    return Err(SchemaError::DuplicateField {
                        class: decl.name,
                        field: raw.name,
                    });
                }
                fields.push(resolve_field(&decl.name, raw)?);
            }

            for method in &decl.methods {
                if method.name != "new" && catalog::lookup(&method.name).is_none() {
                    return Err(SchemaError::UnrecognizedMethod {
                        class: decl.name,
                        method: method.name.clone(),
                    });
                }
            }

            let index = schema.classes.len();
            schema.by_name.insert(decl.name.clone(), index);
            schema.classes.push(NodeClass {
                name: decl.name,
                kind: decl.kind,
                parent,
                fields,
                methods: decl.methods,
                suppressions: decl.suppress.into_iter().collect(),
            });
        }
        Ok(schema)
    }

    /// Parse schema input text and resolve it.
    pub fn from_json(text: &str) -> Result<Schema, SchemaError> {
        let decls: Vec<ClassDecl> = serde_json::from_str(text)?;
        Schema::build(decls)
    }

    pub fn classes(&self) -> &[NodeClass] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&NodeClass> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    /// The parent class, when the parent is not the tree root.
    pub fn parent_class(&self, class: &NodeClass) -> Option<&NodeClass> {
        match class.parent {
            Some(ParentRef::Class(index)) => Some(&self.classes[index]),
            _ => None,
        }
    }

    /// Proper class ancestors, nearest first. The tree root is not a
    /// class and never appears.
    pub fn ancestors<'a>(&'a self, class: &'a NodeClass) -> Ancestors<'a> {
        Ancestors {
            schema: self,
            current: self.parent_class(class),
        }
    }
}

/// Iterator over proper class ancestors, nearest first.
pub struct Ancestors<'a> {
    schema: &'a Schema,
    current: Option<&'a NodeClass>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a NodeClass;

    fn next(&mut self) -> Option<&'a NodeClass> {
        let class = self.current?;
        self.current = self.schema.parent_class(class);
        Some(class)
    }
}

fn resolve_field(class: &str, raw: FieldDecl) -> Result<Field, SchemaError> {
    let malformed = |field: &FieldDecl, reason: &str| SchemaError::MalformedField {
        class: class.to_string(),
        field: field.name.clone(),
        reason: reason.to_string(),
    };

    let kind = match raw.field_kind.as_str() {
        "value" => {
            let Some(ty) = raw.ty.clone() else {
                return Err(malformed(&raw, "value field needs a type"));
            };
            FieldKind::Value(ValueType {
                ty,
                array_len: raw.array_len,
            })
        }
        "inline" => {
            let Some(ty) = raw.ty.clone() else {
                return Err(malformed(&raw, "inline child needs a node type"));
            };
            FieldKind::InlineChild(ty)
        }
        "pointer" => {
            let Some(ty) = raw.ty.clone() else {
                return Err(malformed(&raw, "pointer child needs a node type"));
            };
            FieldKind::PointerChild {
                ty,
                nullable: raw.nullable,
            }
        }
        "variant" => {
            if raw.variant_types.is_empty() {
                return Err(malformed(&raw, "variant needs at least one alternative"));
            }
            FieldKind::Variant(raw.variant_types.iter().cloned().collect())
        }
        other => {
            let reason = format!("unknown field kind `{other}`");
            return Err(SchemaError::MalformedField {
                class: class.to_string(),
                field: raw.name,
                reason,
            });
        }
    };

    if raw.nullable && !matches!(kind, FieldKind::PointerChild { .. }) {
        return Err(malformed(&raw, "only pointer children may be nullable"));
    }
    if raw.array_len.is_some() && !matches!(kind, FieldKind::Value(_)) {
        return Err(malformed(&raw, "only value fields may be arrays"));
    }
    // A nullable pointer with no written default still defaults to null.
    let default_expr = match (&kind, raw.default) {
        (FieldKind::PointerChild { nullable: true, .. }, None) => Some("None".to_string()),
        (_, default) => default,
    };

    Ok(Field {
        name: raw.name,
        kind,
        default_expr,
    })
}

/// UpperCamelCase form of a snake_case identifier.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// snake_case form of an UpperCamelCase identifier.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Name of the generated enum backing a variant field.
pub fn variant_enum_name(class: &NodeClass, field: &Field) -> String {
    format!("{}{}", class.name, camel_case(&field.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_level() -> Vec<ClassDecl> {
        vec![
            ClassDecl::new("Expression", NodeKind::Abstract).with_parent(ROOT_NAME),
            ClassDecl::new("Constant", NodeKind::Concrete)
                .with_parent("Expression")
                .with_field(FieldDecl::value("value", "i64")),
        ]
    }

    #[test]
    fn forward_resolution_links_parents() {
        let schema = Schema::build(two_level()).unwrap();
        let constant = schema.class("Constant").unwrap();
        assert_eq!(constant.parent, Some(ParentRef::Class(0)));
        assert!(schema.class("Expression").unwrap().is_root_child());

        let chain: Vec<&str> = schema
            .ancestors(constant)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(chain, vec!["Expression"]);
    }

    #[test]
    fn duplicate_class_rejected() {
        let mut decls = two_level();
        decls.push(ClassDecl::new("Constant", NodeKind::Concrete));
        let err = Schema::build(decls).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateClass(ref name) if name == "Constant"));
        assert_eq!(err.code(), treegen_diagnostic::ErrorCode::E1001);
    }

    #[test]
    fn later_declared_parent_rejected() {
        let decls = vec![
            ClassDecl::new("Constant", NodeKind::Concrete).with_parent("Expression"),
            ClassDecl::new("Expression", NodeKind::Abstract).with_parent(ROOT_NAME),
        ];
        let err = Schema::build(decls).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownParent { .. }));
    }

    #[test]
    fn duplicate_field_rejected() {
        let decls = vec![ClassDecl::new("Constant", NodeKind::Concrete)
            .with_field(FieldDecl::value("value", "i64"))
            .with_field(FieldDecl::value("value", "u32"))];
        let err = Schema::build(decls).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn empty_variant_rejected() {
        let decls =
            vec![ClassDecl::new("Binding", NodeKind::Concrete)
                .with_field(FieldDecl::variant("init", &[]))];
        let err = Schema::build(decls).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedField { .. }));
        assert_eq!(err.code(), treegen_diagnostic::ErrorCode::E1004);
    }

    #[test]
    fn unknown_method_name_rejected() {
        let decls = vec![ClassDecl::new("Constant", NodeKind::Concrete)
            .with_method("frobnicate", Some("{ }"))];
        let err = Schema::build(decls).unwrap_err();
        assert!(matches!(err, SchemaError::UnrecognizedMethod { .. }));
        assert_eq!(err.code(), treegen_diagnostic::ErrorCode::E1003);
    }

    #[test]
    fn nullable_pointer_defaults_to_null() {
        let decls = vec![ClassDecl::new("Binding", NodeKind::Concrete)
            .with_field(FieldDecl::pointer("doc", "Comment").nullable())];
        let schema = Schema::build(decls).unwrap();
        let field = &schema.class("Binding").unwrap().fields[0];
        assert!(field.is_optional());
        assert_eq!(field.default_expr.as_deref(), Some("None"));
    }

    #[test]
    fn nullable_value_rejected() {
        let decls = vec![ClassDecl::new("Binding", NodeKind::Concrete)
            .with_field(FieldDecl::value("weight", "i64").nullable())];
        assert!(Schema::build(decls).is_err());
    }

    #[test]
    fn json_input_round_trip() {
        let schema = Schema::from_json(
            r#"[
                {"name": "Expression", "kind": "abstract", "parent": "Node"},
                {"name": "Constant", "kind": "concrete", "parent": "Expression",
                 "fields": [{"name": "value", "fieldKind": "value", "ty": "i64"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(schema.classes().len(), 2);
        assert_eq!(schema.class("Constant").unwrap().fields[0].name, "value");
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = Schema::from_json("not json").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
        assert_eq!(err.code(), treegen_diagnostic::ErrorCode::E1006);
    }

    #[test]
    fn name_casing_helpers() {
        assert_eq!(camel_case("init_value"), "InitValue");
        assert_eq!(camel_case("x"), "X");
        assert_eq!(snake_case("TypedBinding"), "typed_binding");
        assert_eq!(snake_case("Constant"), "constant");
    }
}

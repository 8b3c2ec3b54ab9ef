//! Keyed, self-describing node records.
//!
//! One record per node instance; keys are field names. The format is
//! purpose-built for one consumer — a loader built from the same schema —
//! and carries a deliberate asymmetry:
//!
//! - **Conditional emit**: a nullable child that is null is *omitted* from
//!   the record, never written as a null marker.
//! - **Unconditional load-attempt**: the loader tries every declared key
//!   regardless of optionality; absence yields the field's default/null
//!   state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::IrNode;

/// Writer for one node's keyed record.
///
/// Generated `to_record` bodies emit ancestor fields first (by delegating
/// to the base implementation against the same writer), then own fields in
/// declaration order.
#[derive(Debug, Default)]
pub struct RecordWriter {
    map: Map<String, Value>,
}

impl RecordWriter {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a plain value field.
    ///
    /// A value that cannot be represented is written as null rather than
    /// aborting serialization; `validate` is where malformed nodes fail.
    pub fn emit<T: Serialize>(&mut self, key: &str, value: &T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.map.insert(key.to_string(), value);
    }

    /// Emit a child node as a nested record.
    pub fn emit_node<T: IrNode + ?Sized>(&mut self, key: &str, node: &T) {
        let mut nested = RecordWriter::new();
        node.to_record(&mut nested);
        self.map.insert(key.to_string(), nested.finish());
    }

    /// Emit a required child slot: the record when present, an explicit
    /// null when absent. An absent required child is an invalid node, but
    /// serialization never aborts — `validate` reports the defect.
    pub fn emit_child<T: IrNode>(&mut self, key: &str, node: Option<&T>) {
        match node {
            Some(node) => self.emit_node(key, node),
            None => {
                self.map.insert(key.to_string(), Value::Null);
            }
        }
    }

    /// Emit a nullable child slot: omitted entirely when null.
    pub fn emit_opt_node<T: IrNode>(&mut self, key: &str, node: Option<&T>) {
        if let Some(node) = node {
            self.emit_node(key, node);
        }
    }

    /// Emit a variant field as a single-key record `{"AltType": record}`.
    pub fn emit_variant<T: IrNode + ?Sized>(&mut self, key: &str, alternative: &T) {
        let mut nested = RecordWriter::new();
        alternative.to_record(&mut nested);
        let mut tagged = Map::new();
        tagged.insert(alternative.type_name().to_string(), nested.finish());
        self.map.insert(key.to_string(), Value::Object(tagged));
    }

    /// Finish the record.
    pub fn finish(self) -> Value {
        Value::Object(self.map)
    }
}

/// Loader for one node's keyed record.
///
/// Every load is an *attempt*: a missing or null key returns `None`, and
/// generated `from_record` bodies fall back to the field's default state.
#[derive(Debug, Clone, Default)]
pub struct RecordLoader {
    map: Map<String, Value>,
}

impl RecordLoader {
    /// Wrap a record value. Anything that is not a keyed record loads as
    /// an empty one — every key attempt then yields the default state.
    pub fn new(record: Value) -> Self {
        match record {
            Value::Object(map) => RecordLoader { map },
            _ => RecordLoader::default(),
        }
    }

    /// Check whether a key is present (and non-null).
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.map.get(key), Some(value) if !value.is_null())
    }

    /// Attempt to load a plain value field.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.map.get(key)?;
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Attempt to load a nested child record.
    pub fn load_record(&self, key: &str) -> Option<RecordLoader> {
        match self.map.get(key) {
            Some(Value::Object(map)) => Some(RecordLoader { map: map.clone() }),
            _ => None,
        }
    }

    /// Attempt to load a variant field: the alternative's type name plus
    /// its record.
    pub fn load_variant(&self, key: &str) -> Option<(String, RecordLoader)> {
        let Some(Value::Object(tagged)) = self.map.get(key) else {
            return None;
        };
        let (tag, value) = tagged.iter().next()?;
        match value {
            Value::Object(map) => Some((tag.clone(), RecordLoader { map: map.clone() })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_and_load_values() {
        let mut writer = RecordWriter::new();
        writer.emit("label", &"x");
        writer.emit("weight", &4i64);
        let loader = RecordLoader::new(writer.finish());

        assert_eq!(loader.load::<String>("label"), Some("x".to_string()));
        assert_eq!(loader.load::<i64>("weight"), Some(4));
    }

    #[test]
    fn absent_key_loads_as_none() {
        let loader = RecordLoader::new(RecordWriter::new().finish());
        assert_eq!(loader.load::<i64>("weight"), None);
        assert!(!loader.contains("weight"));
    }

    #[test]
    fn null_key_loads_as_none() {
        let mut writer = RecordWriter::new();
        writer.emit("weight", &Option::<i64>::None);
        let loader = RecordLoader::new(writer.finish());
        assert_eq!(loader.load::<i64>("weight"), None);
        assert!(!loader.contains("weight"));
    }

    #[test]
    fn non_record_input_tolerated() {
        let loader = RecordLoader::new(Value::Bool(true));
        assert_eq!(loader.load::<i64>("anything"), None);
    }
}

#![deny(missing_docs)]

//! # Schema Nodes
//!
//! The schema representation produced by the resolver and stored in the
//! component registry. Serializes to the JSON Schema subset OpenAPI 3 uses.

use crate::oas::ref_utils::schema_pointer;
use crate::type_mapping::PrimitiveKind;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A derived schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// A primitive with its optional format.
    Primitive(PrimitiveKind),
    /// An object; properties in declaration order.
    Object {
        /// Property schemas keyed by property name.
        properties: IndexMap<String, SchemaNode>,
    },
    /// An array of `items`.
    Array {
        /// The element schema.
        items: Box<SchemaNode>,
    },
    /// A string enumeration in declaration order.
    Enum {
        /// The allowed values.
        values: Vec<String>,
    },
    /// A pointer to a registered component.
    Ref {
        /// The component key.
        target: String,
    },
}

impl SchemaNode {
    /// An object without properties (the fallback for opaque types).
    pub fn empty_object() -> Self {
        SchemaNode::Object {
            properties: IndexMap::new(),
        }
    }

    /// Whether this node is a bare reference.
    pub fn is_ref(&self) -> bool {
        matches!(self, SchemaNode::Ref { .. })
    }

    /// Collects every `Ref` target reachable from this node, in document order.
    pub fn refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SchemaNode::Ref { target } => out.push(target),
            SchemaNode::Object { properties } => {
                for node in properties.values() {
                    node.collect_refs(out);
                }
            }
            SchemaNode::Array { items } => items.collect_refs(out),
            SchemaNode::Primitive(_) | SchemaNode::Enum { .. } => {}
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            SchemaNode::Primitive(kind) => {
                map.serialize_entry("type", kind.json_type())?;
                if let Some(format) = kind.format() {
                    map.serialize_entry("format", format)?;
                }
            }
            SchemaNode::Object { properties } => {
                map.serialize_entry("type", "object")?;
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
            }
            SchemaNode::Array { items } => {
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
            }
            SchemaNode::Enum { values } => {
                map.serialize_entry("type", "string")?;
                map.serialize_entry("enum", values)?;
            }
            SchemaNode::Ref { target } => {
                map.serialize_entry("$ref", &schema_pointer(target))?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_shape() {
        let mut properties = IndexMap::new();
        properties.insert("foo".to_string(), SchemaNode::Primitive(PrimitiveKind::String));
        properties.insert("count".to_string(), SchemaNode::Primitive(PrimitiveKind::Int64));
        let node = SchemaNode::Object { properties };

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "foo": {"type": "string"},
                    "count": {"type": "integer", "format": "int64"}
                }
            })
        );
    }

    #[test]
    fn test_enum_shape_keeps_order() {
        let node = SchemaNode::Enum {
            values: vec!["ONE".into(), "TWO".into()],
        };
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"type":"string","enum":["ONE","TWO"]}"#
        );
    }

    #[test]
    fn test_empty_object_omits_properties() {
        assert_eq!(
            serde_json::to_value(SchemaNode::empty_object()).unwrap(),
            json!({"type": "object"})
        );
    }

    #[test]
    fn test_refs_are_collected_recursively() {
        let mut properties = IndexMap::new();
        properties.insert(
            "owner".to_string(),
            SchemaNode::Ref {
                target: "User".into(),
            },
        );
        properties.insert(
            "tags".to_string(),
            SchemaNode::Array {
                items: Box::new(SchemaNode::Ref {
                    target: "Tag".into(),
                }),
            },
        );
        let node = SchemaNode::Object { properties };
        assert_eq!(node.refs(), vec!["User", "Tag"]);
        assert_eq!(
            serde_json::to_value(&node).unwrap()["properties"]["owner"],
            json!({"$ref": "#/components/schemas/User"})
        );
    }
}

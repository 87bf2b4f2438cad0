#![deny(missing_docs)]

//! # Schema Generator
//!
//! Turns a [`TypeDescriptor`] into a [`SchemaNode`].
//!
//! - Primitives map to fixed `type`/`format` pairs and take precedence.
//! - Enumerations keep their declaration order.
//! - Sequences become arrays of their resolved element.
//! - Objects inline their members in declaration order. Members marked
//!   `component` become references and are handed back as deferred
//!   registrations, as are types met again while still being inlined
//!   (recursive types), so resolution always terminates.
//! - Opaque types resolve to an empty object.
//!
//! Resolution never fails; whether a deferred type can actually be stored
//! under a component key is decided by the registry.

use crate::oas::schemas::SchemaNode;
use crate::type_mapping::{TypeDescriptor, TypeIdentity, TypeShape};
use indexmap::IndexMap;

/// The outcome of resolving one type.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The derived schema.
    pub schema: SchemaNode,
    /// Types referenced by `schema` that must be registered as components,
    /// in first-reference order without duplicates.
    pub deferred: Vec<TypeDescriptor>,
}

/// Maps type descriptors to schema nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaResolver;

impl SchemaResolver {
    /// Creates a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolves `ty` into a schema.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Resolution {
        let mut walk = Walk::default();
        let schema = walk.node(ty);
        Resolution {
            schema,
            deferred: walk.deferred,
        }
    }
}

#[derive(Default)]
struct Walk {
    visiting: Vec<TypeIdentity>,
    deferred: Vec<TypeDescriptor>,
}

impl Walk {
    fn node(&mut self, ty: &TypeDescriptor) -> SchemaNode {
        match ty.shape() {
            TypeShape::Primitive(kind) => SchemaNode::Primitive(*kind),
            TypeShape::Enum(values) => SchemaNode::Enum {
                values: values.clone(),
            },
            TypeShape::Sequence(element) => SchemaNode::Array {
                items: Box::new(self.node(element)),
            },
            TypeShape::Opaque => SchemaNode::empty_object(),
            TypeShape::Object(members) => {
                if self.visiting.contains(ty.identity()) {
                    return self.defer(ty.clone());
                }
                self.visiting.push(ty.identity().clone());

                let mut properties = IndexMap::new();
                for member in members {
                    let member_ty = member.ty.descriptor();
                    let schema = if member.separate {
                        self.defer(member_ty)
                    } else {
                        self.node(&member_ty)
                    };
                    properties.insert(member.name.clone(), schema);
                }

                self.visiting.pop();
                SchemaNode::Object { properties }
            }
        }
    }

    fn defer(&mut self, ty: TypeDescriptor) -> SchemaNode {
        let target = ty.canonical_key();
        if !self
            .deferred
            .iter()
            .any(|queued| queued.identity() == ty.identity())
        {
            self.deferred.push(ty);
        }
        SchemaNode::Ref { target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_mapping::{Describe, PrimitiveKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct ExampleSchema;

    impl Describe for ExampleSchema {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<String>("foo")
        }
    }

    struct Numbers;

    impl Describe for Numbers {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::enumeration::<Self, _, _>(["ONE", "TWO"])
        }
    }

    struct Address;

    impl Describe for Address {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<String>("street")
        }
    }

    struct Customer;

    impl Describe for Customer {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>()
                .field::<i64>("id")
                .field::<Address>("home")
                .component::<Address>("billing")
                .field::<Vec<Numbers>>("favourites")
        }
    }

    struct TreeNode;

    impl Describe for TreeNode {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>()
                .field::<String>("label")
                .field::<Vec<TreeNode>>("children")
        }
    }

    struct Handle;

    impl Describe for Handle {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::opaque::<Self>()
        }
    }

    fn resolve<T: Describe>() -> Resolution {
        SchemaResolver::new().resolve(&T::describe())
    }

    #[test]
    fn test_object_with_string_member() {
        let res = resolve::<ExampleSchema>();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({"type": "object", "properties": {"foo": {"type": "string"}}})
        );
        assert!(res.deferred.is_empty());
    }

    #[test]
    fn test_enum_fidelity() {
        let res = resolve::<Numbers>();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({"type": "string", "enum": ["ONE", "TWO"]})
        );
    }

    #[test]
    fn test_primitive_takes_precedence() {
        assert_eq!(
            resolve::<i64>().schema,
            SchemaNode::Primitive(PrimitiveKind::Int64)
        );
        assert_eq!(
            resolve::<Vec<bool>>().schema,
            SchemaNode::Array {
                items: Box::new(SchemaNode::Primitive(PrimitiveKind::Boolean))
            }
        );
    }

    #[test]
    fn test_nested_objects_inline_unless_marked() {
        let res = resolve::<Customer>();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "home": {"type": "object", "properties": {"street": {"type": "string"}}},
                    "billing": {"$ref": "#/components/schemas/Address"},
                    "favourites": {"type": "array", "items": {"type": "string", "enum": ["ONE", "TWO"]}}
                }
            })
        );
        let deferred: Vec<_> = res.deferred.iter().map(|d| d.canonical_key()).collect();
        assert_eq!(deferred, vec!["Address"]);
    }

    #[test]
    fn test_recursive_type_terminates_with_ref() {
        let res = resolve::<TreeNode>();
        assert_eq!(
            serde_json::to_value(&res.schema).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "label": {"type": "string"},
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/TreeNode"}}
                }
            })
        );
        assert_eq!(res.deferred.len(), 1);
        assert_eq!(res.deferred[0].identity(), TreeNode::describe().identity());
    }

    #[test]
    fn test_opaque_resolves_to_empty_object() {
        assert_eq!(resolve::<Handle>().schema, SchemaNode::empty_object());
    }
}

#![deny(missing_docs)]

//! # Document Assembly
//!
//! Walks a built [`Document`] once, depth-first, and feeds every reference
//! token it meets to a [`ComponentRegistry`]:
//!
//! 1. explicitly declared component schemas,
//! 2. paths in insertion order, methods in [`Method::ALL`] order,
//! 3. per operation: responses (codes, then media types), request body
//!    media types, then parameters in list order.
//!
//! Media type tokens are swapped for registry references. Inline parameter
//! schemas are resolved in place.

use crate::error::{AppError, AppResult};
use crate::oas::models::{Content, Document, Method, Operation};
use crate::oas::registry::{CollisionPolicy, ComponentRegistry};
use crate::oas::token::{ParameterSchema, SchemaSlot};
use tracing::debug;

/// Options for [`DocumentAssembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// How naming collisions are handled.
    pub collision_policy: CollisionPolicy,
}

impl AssemblerOptions {
    /// Sets the collision policy.
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

/// Finalizes documents: computes components and resolves every token.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    options: AssemblerOptions,
}

impl DocumentAssembler {
    /// Creates an assembler.
    pub fn new(options: AssemblerOptions) -> Self {
        Self { options }
    }

    /// Finalizes `doc`, returning it together with its component registry.
    ///
    /// A document that was already finalized keeps its registry, so calling
    /// this again registers nothing twice.
    pub fn finalize(&self, mut doc: Document) -> AppResult<(Document, ComponentRegistry)> {
        let mut registry = doc
            .registry
            .take()
            .unwrap_or_else(|| ComponentRegistry::new(self.options.collision_policy));
        let before = registry.len();

        for slot in doc.components.schemas.iter_mut() {
            finalize_slot(slot, &mut registry)?;
        }

        doc.paths
            .try_for_each_operation_mut(|path, method, operation| {
                finalize_operation(path, method, operation, &mut registry)
            })?;

        debug!(
            components = registry.len(),
            added = registry.len() - before,
            "finalized document"
        );
        doc.registry = Some(registry.clone());
        Ok((doc, registry))
    }
}

/// Finalizes `doc` with default options.
pub fn finalize(doc: Document) -> AppResult<(Document, ComponentRegistry)> {
    DocumentAssembler::default().finalize(doc)
}

fn finalize_operation(
    path: &str,
    method: Method,
    operation: &mut Operation,
    registry: &mut ComponentRegistry,
) -> AppResult<()> {
    debug!(path, method = method.as_str(), "finalizing operation");

    for response in operation.responses.values_mut() {
        finalize_content(&mut response.content, registry)?;
    }
    if let Some(body) = operation.request_body.as_mut() {
        finalize_content(&mut body.content, registry)?;
    }
    for parameter in operation.parameters.iter_mut() {
        if parameter.schema.is_some() && !parameter.content.is_empty() {
            return Err(AppError::General(format!(
                "Parameter '{}' of {} {} defines both a schema and content",
                parameter.name,
                method.as_str().to_uppercase(),
                path
            )));
        }
        finalize_content(&mut parameter.content, registry)?;
        if let Some(ParameterSchema::Token(token)) = &parameter.schema {
            let schema = registry.resolve_inline(token.descriptor())?;
            parameter.schema = Some(ParameterSchema::Inline(schema));
        }
    }
    Ok(())
}

fn finalize_content(content: &mut Content, registry: &mut ComponentRegistry) -> AppResult<()> {
    for media in content.values_mut() {
        finalize_slot(&mut media.schema, registry)?;
    }
    Ok(())
}

fn finalize_slot(slot: &mut SchemaSlot, registry: &mut ComponentRegistry) -> AppResult<()> {
    if let SchemaSlot::Token(token) = slot {
        *slot = SchemaSlot::Ref(registry.register(token)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::{Components, Info, Parameter, RequestBody, Response};
    use crate::oas::schemas::SchemaNode;
    use crate::type_mapping::{Describe, PrimitiveKind, TypeDescriptor};
    use pretty_assertions::assert_eq;

    struct ExampleSchema;

    impl Describe for ExampleSchema {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<String>("foo")
        }
    }

    struct AnotherExampleSchema;

    impl Describe for AnotherExampleSchema {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<String>("bar")
        }
    }

    struct ExampleRequestSchema;

    impl Describe for ExampleRequestSchema {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<i64>("id")
        }
    }

    mod other {
        use super::*;

        pub struct ExampleSchema;

        impl Describe for ExampleSchema {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::object::<Self>().field::<bool>("flag")
            }
        }
    }

    fn json_ok<T: Describe>() -> Operation {
        Operation::new().ok(Response::new("ok").with::<T>("application/json"))
    }

    fn doc() -> Document {
        Document::new(Info::new("test", "1.0"))
    }

    #[test]
    fn test_traversal_order_drives_component_order() {
        let doc = doc()
            .post(
                "/b",
                json_ok::<AnotherExampleSchema>().with_request_body(RequestBody::new(
                    Content::new().with::<ExampleRequestSchema>("application/json"),
                )),
            )
            .get("/b", json_ok::<ExampleSchema>())
            .get("/a", json_ok::<ExampleSchema>());

        let (_, registry) = finalize(doc).unwrap();
        let keys: Vec<_> = registry.keys().collect();
        // GET before POST within /b; responses before the request body.
        assert_eq!(
            keys,
            vec!["ExampleSchema", "AnotherExampleSchema", "ExampleRequestSchema"]
        );
    }

    #[test]
    fn test_explicit_components_come_first() {
        let doc = doc()
            .get("/foo", json_ok::<ExampleSchema>())
            .with_components(Components::new().schema::<AnotherExampleSchema>());
        let (doc, registry) = finalize(doc).unwrap();
        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(keys, vec!["AnotherExampleSchema", "ExampleSchema"]);
        assert!(doc.components.schemas[0].reference().is_some());
    }

    #[test]
    fn test_media_types_become_refs_and_parameters_stay_inline() {
        let doc = doc().get(
            "/items/{id}",
            json_ok::<ExampleSchema>()
                .with_parameter(Parameter::path("id").with_schema::<i64>())
                .with_parameter(
                    Parameter::query("filter")
                        .with_content(Content::new().with::<AnotherExampleSchema>("application/json")),
                ),
        );

        let (doc, registry) = finalize(doc).unwrap();
        let op = doc.paths.get("/items/{id}").unwrap().get.as_ref().unwrap();
        assert_eq!(
            op.parameters[0].schema,
            Some(ParameterSchema::Inline(SchemaNode::Primitive(PrimitiveKind::Int64)))
        );
        let (_, filter) = op.parameters[1].content.iter().next().unwrap();
        assert_eq!(
            filter.schema.reference().map(|r| r.key()),
            Some("AnotherExampleSchema")
        );
        assert!(!registry.contains_key("Int64"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_parameter_with_schema_and_content_is_rejected() {
        let builder = Parameter::query("filter")
            .with_schema::<String>()
            .with_content(Content::new().with::<ExampleSchema>("application/json"));
        assert!(builder.schema.is_none());
        let builder = builder.with_schema::<String>();
        assert!(builder.content.is_empty());

        let mut both = Parameter::query("filter").with_schema::<String>();
        both.content = Content::new().with::<ExampleSchema>("application/json");
        let err = finalize(doc().get("/items", json_ok::<ExampleSchema>().with_parameter(both)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "General Error: Parameter 'filter' of GET /items defines both a schema and content"
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let doc = doc()
            .get("/foo", json_ok::<ExampleSchema>())
            .get("/bar", json_ok::<AnotherExampleSchema>());

        let (once, first) = finalize(doc).unwrap();
        assert!(once.is_finalized());
        let (twice, second) = finalize(once.clone()).unwrap();
        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(once.paths, twice.paths);
    }

    #[test]
    fn test_collision_policy_is_applied() {
        let build = || {
            doc()
                .get("/a", json_ok::<ExampleSchema>())
                .get("/b", json_ok::<other::ExampleSchema>())
        };

        let err = finalize(build()).unwrap_err();
        assert!(matches!(err, AppError::NamingCollision { .. }));

        let assembler = DocumentAssembler::new(
            AssemblerOptions::default().with_collision_policy(CollisionPolicy::Overwrite),
        );
        let (_, registry) = assembler.finalize(build()).unwrap();
        assert_eq!(registry.len(), 1);
    }
}

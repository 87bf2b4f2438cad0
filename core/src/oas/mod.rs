#![deny(missing_docs)]

//! # OpenAPI Document Module
//!
//! - **models**: the document tree and its builders.
//! - **token**: reference tokens and the slots holding them.
//! - **schemas**: derived schema nodes.
//! - **registry**: the de-duplicated component store.
//! - **document**: the assembler that finalizes a document.
//! - **serializer**: wire rendering and temp-file output.
//! - **validation**: structural checks on rendered documents.

pub mod document;
pub mod models;
pub mod ref_utils;
pub mod registry;
pub mod schemas;
pub mod serializer;
pub mod token;
pub mod validation;

pub use document::{finalize, AssemblerOptions, DocumentAssembler};
pub use models::{
    ApiKeyLocation, Components, Contact, Content, Document, Example, ExternalDocs, Info, License,
    MediaType, Method, OAuthFlow, OAuthFlows, Operation, Parameter, ParameterLocation,
    ParameterStyle, PathItem, Paths, RequestBody, Response, SecurityRequirement, SecurityScheme,
    SecuritySchemeKind, Server, ServerVariable, Tag,
};
pub use registry::{CollisionPolicy, ComponentRegistry};
pub use schemas::SchemaNode;
pub use serializer::{serialize, serialize_pretty, to_value, to_yaml, write_temp_file};
pub use token::{ParameterSchema, ReferenceToken, SchemaRef, SchemaSlot, TokenSite};
pub use validation::{Diagnostic, StructuralValidator, Validator};

use crate::error::AppResult;
use tempfile::NamedTempFile;
use tracing::info;

/// A serialized document together with its validation findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Compact JSON text.
    pub json: String,
    /// Validator output; empty when valid.
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderedDocument {
    /// Whether the validator reported nothing.
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Parses the JSON text back into a value.
    pub fn as_value(&self) -> AppResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.json)?)
    }

    /// Writes the JSON text to an `openapi-*.json` temporary file.
    pub fn write_temp_file(&self) -> AppResult<NamedTempFile> {
        serializer::write_temp_file(&self.json)
    }
}

/// Finalizes, serializes and validates `doc` with default assembler options.
pub fn render(doc: Document, validator: &dyn Validator) -> AppResult<RenderedDocument> {
    render_with(&DocumentAssembler::default(), doc, validator)
}

/// Finalizes `doc` with `assembler`, then serializes and validates it.
///
/// Assembly and serialization errors abort; validator findings are data.
pub fn render_with(
    assembler: &DocumentAssembler,
    doc: Document,
    validator: &dyn Validator,
) -> AppResult<RenderedDocument> {
    let (doc, registry) = assembler.finalize(doc)?;
    let json = serialize(&doc, &registry)?;
    let diagnostics = validator.validate(&json);
    info!(
        components = registry.len(),
        diagnostics = diagnostics.len(),
        "rendered OpenAPI document"
    );
    Ok(RenderedDocument { json, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_mapping::{Describe, TypeDescriptor};

    struct Pet;

    impl Describe for Pet {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>().field::<String>("name")
        }
    }

    struct Reject;

    impl Validator for Reject {
        fn validate(&self, _text: &str) -> Vec<Diagnostic> {
            vec![Diagnostic::new("/info", "rejected")]
        }
    }

    fn pets() -> Document {
        Document::new(Info::new("Pets", "1.0")).get(
            "/pets",
            Operation::new().ok(Response::new("ok").with::<Vec<Pet>>("application/json")),
        )
    }

    #[test]
    fn test_render_valid_document() {
        let rendered = render(pets(), &StructuralValidator::new()).unwrap();
        assert!(rendered.is_valid(), "{:?}", rendered.diagnostics);
        let value = rendered.as_value().unwrap();
        assert_eq!(
            value["paths"]["/pets"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"]["$ref"],
            "#/components/schemas/PetList"
        );
        assert_eq!(
            value["components"]["schemas"]["PetList"]["items"]["type"],
            "object"
        );
    }

    #[test]
    fn test_diagnostics_are_data() {
        let rendered = render(pets(), &Reject).unwrap();
        assert!(!rendered.is_valid());
        assert_eq!(rendered.diagnostics[0].message, "rejected");
    }
}

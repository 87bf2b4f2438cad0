#![deny(missing_docs)]

//! # Serializer
//!
//! Renders a finalized document plus its registry to the wire form.
//! Reference integrity is checked first: an unresolved token or a `$ref`
//! without a registry entry aborts with [`AppError::DanglingReference`].

use crate::error::{AppError, AppResult};
use crate::oas::models::{
    Content, Document, Extensions, ExternalDocs, Info, Paths, SecurityRequirement,
    SecurityScheme, Server, Tag,
};
use crate::oas::registry::ComponentRegistry;
use crate::oas::schemas::SchemaNode;
use crate::oas::token::{ParameterSchema, SchemaSlot};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use tempfile::NamedTempFile;

fn is_empty_slice<T>(value: &&[T]) -> bool {
    value.is_empty()
}

fn is_empty_map<K, V>(value: &&IndexMap<K, V>) -> bool {
    value.is_empty()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireComponents<'a> {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    schemas: IndexMap<&'a str, &'a SchemaNode>,
    #[serde(skip_serializing_if = "is_empty_map")]
    security_schemes: &'a IndexMap<String, SecurityScheme>,
    #[serde(flatten)]
    extensions: &'a Extensions,
}

impl WireComponents<'_> {
    fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.security_schemes.is_empty() && self.extensions.is_empty()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument<'a> {
    openapi: &'a str,
    info: &'a Info,
    #[serde(skip_serializing_if = "is_empty_slice")]
    servers: &'a [Server],
    paths: &'a Paths,
    #[serde(skip_serializing_if = "WireComponents::is_empty")]
    components: WireComponents<'a>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    security: &'a [SecurityRequirement],
    #[serde(skip_serializing_if = "is_empty_slice")]
    tags: &'a [Tag],
    #[serde(skip_serializing_if = "Option::is_none")]
    external_docs: Option<&'a ExternalDocs>,
    #[serde(flatten)]
    extensions: &'a Extensions,
}

fn wire<'a>(doc: &'a Document, registry: &'a ComponentRegistry) -> AppResult<WireDocument<'a>> {
    check_references(doc, registry)?;
    Ok(WireDocument {
        openapi: &doc.openapi,
        info: &doc.info,
        servers: &doc.servers,
        paths: &doc.paths,
        components: WireComponents {
            schemas: registry.iter().collect(),
            security_schemes: &doc.components.security_schemes,
            extensions: &doc.components.extensions,
        },
        security: &doc.security,
        tags: &doc.tags,
        external_docs: doc.external_docs.as_ref(),
        extensions: &doc.extensions,
    })
}

/// Serializes to compact JSON.
pub fn serialize(doc: &Document, registry: &ComponentRegistry) -> AppResult<String> {
    Ok(serde_json::to_string(&wire(doc, registry)?)?)
}

/// Serializes to JSON indented by two spaces.
pub fn serialize_pretty(doc: &Document, registry: &ComponentRegistry) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(&wire(doc, registry)?)?)
}

/// Serializes to a JSON value.
pub fn to_value(doc: &Document, registry: &ComponentRegistry) -> AppResult<serde_json::Value> {
    Ok(serde_json::to_value(wire(doc, registry)?)?)
}

/// Serializes to YAML.
pub fn to_yaml(doc: &Document, registry: &ComponentRegistry) -> AppResult<String> {
    Ok(serde_yaml::to_string(&wire(doc, registry)?)?)
}

/// Writes `text` to a fresh `openapi-*.json` temporary file.
///
/// The file is removed when the returned handle is dropped.
pub fn write_temp_file(text: &str) -> AppResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("openapi-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Fails on the first unresolved token or reference missing from `registry`.
pub fn check_references(doc: &Document, registry: &ComponentRegistry) -> AppResult<()> {
    for slot in &doc.components.schemas {
        check_slot(slot, registry)?;
    }

    for (path, method, operation) in doc.paths.operations() {
        let at = format!("{} {}", method.as_str(), path);
        for response in operation.responses.values() {
            check_content(&response.content, registry)?;
        }
        if let Some(body) = &operation.request_body {
            check_content(&body.content, registry)?;
        }
        for parameter in &operation.parameters {
            check_content(&parameter.content, registry)?;
            match &parameter.schema {
                Some(ParameterSchema::Token(token)) => {
                    return Err(AppError::DanglingReference(format!(
                        "unresolved reference token for '{}' at {} ({})",
                        token.descriptor().name(),
                        token.site(),
                        at
                    )));
                }
                Some(ParameterSchema::Inline(node)) => check_node(node, registry)?,
                None => {}
            }
        }
    }

    for (_, node) in registry.iter() {
        check_node(node, registry)?;
    }
    Ok(())
}

fn check_content(content: &Content, registry: &ComponentRegistry) -> AppResult<()> {
    for (_, media) in content.iter() {
        check_slot(&media.schema, registry)?;
    }
    Ok(())
}

fn check_slot(slot: &SchemaSlot, registry: &ComponentRegistry) -> AppResult<()> {
    match slot {
        SchemaSlot::Token(token) => Err(AppError::DanglingReference(format!(
            "unresolved reference token for '{}' at {}",
            token.descriptor().name(),
            token.site()
        ))),
        SchemaSlot::Ref(r) => check_key(r.key(), registry),
        SchemaSlot::Inline(node) => check_node(node, registry),
    }
}

fn check_node(node: &SchemaNode, registry: &ComponentRegistry) -> AppResult<()> {
    node.refs()
        .into_iter()
        .try_for_each(|key| check_key(key, registry))
}

fn check_key(key: &str, registry: &ComponentRegistry) -> AppResult<()> {
    if registry.contains_key(key) {
        Ok(())
    } else {
        Err(AppError::DanglingReference(format!(
            "'{}' is not registered in components.schemas",
            key
        )))
    }
}

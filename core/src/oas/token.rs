//! # Reference Tokens
//!
//! Placeholders for "the schema of type T" embedded wherever a type is used
//! in a document, and the slots that hold them until the assembler swaps
//! them for registry references.

use crate::oas::ref_utils::schema_pointer;
use crate::oas::schemas::SchemaNode;
use crate::type_mapping::{Describe, TypeDescriptor, TypeIdentity};
use serde::ser::{Error as _, Serialize, Serializer};
use std::fmt;

/// Where a token was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSite {
    /// Schema of a media type in a response, request body or parameter content.
    MediaType(String),
    /// Inline schema of a parameter.
    Parameter(String),
    /// An explicit `components.schemas` declaration.
    Component,
}

impl fmt::Display for TokenSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSite::MediaType(media) => write!(f, "media type '{}'", media),
            TokenSite::Parameter(name) => write!(f, "parameter '{}'", name),
            TokenSite::Component => f.write_str("components"),
        }
    }
}

/// An unresolved "schema of type T" placeholder.
///
/// Tokens compare by type identity only: the site is informational.
#[derive(Debug, Clone)]
pub struct ReferenceToken {
    descriptor: TypeDescriptor,
    site: TokenSite,
}

impl ReferenceToken {
    /// Token for the Rust type `T`.
    pub fn of<T: Describe>(site: TokenSite) -> Self {
        Self::declared(T::describe(), site)
    }

    /// Token for an arbitrary descriptor.
    pub fn declared(descriptor: TypeDescriptor, site: TokenSite) -> Self {
        Self { descriptor, site }
    }

    /// The referenced type.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Identity of the referenced type.
    pub fn identity(&self) -> &TypeIdentity {
        self.descriptor.identity()
    }

    /// Where the token was placed.
    pub fn site(&self) -> &TokenSite {
        &self.site
    }

    pub(crate) fn set_site(&mut self, site: TokenSite) {
        self.site = site;
    }
}

impl PartialEq for ReferenceToken {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

/// A registered component, addressed by key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef(String);

impl SchemaRef {
    /// Wraps a component key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The component key.
    pub fn key(&self) -> &str {
        &self.0
    }

    /// The `$ref` pointer (`#/components/schemas/<key>`).
    pub fn pointer(&self) -> String {
        schema_pointer(&self.0)
    }
}

impl From<SchemaRef> for SchemaNode {
    fn from(value: SchemaRef) -> Self {
        SchemaNode::Ref { target: value.0 }
    }
}

/// The schema position of a media type.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSlot {
    /// Not yet finalized.
    Token(ReferenceToken),
    /// Points into the component registry.
    Ref(SchemaRef),
    /// A literal schema, emitted in place. Never touched by the assembler.
    Inline(SchemaNode),
}

impl SchemaSlot {
    /// The reference, once finalized.
    pub fn reference(&self) -> Option<&SchemaRef> {
        match self {
            SchemaSlot::Ref(r) => Some(r),
            SchemaSlot::Token(_) | SchemaSlot::Inline(_) => None,
        }
    }
}

impl Serialize for SchemaSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaSlot::Ref(r) => SchemaNode::Ref {
                target: r.key().to_string(),
            }
            .serialize(serializer),
            SchemaSlot::Inline(node) => node.serialize(serializer),
            SchemaSlot::Token(token) => Err(S::Error::custom(format!(
                "unresolved reference token for '{}' at {}",
                token.descriptor().name(),
                token.site()
            ))),
        }
    }
}

/// The schema position of a parameter: inline once finalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSchema {
    /// Not yet finalized.
    Token(ReferenceToken),
    /// Resolved in place.
    Inline(SchemaNode),
}

impl Serialize for ParameterSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParameterSchema::Inline(node) => node.serialize(serializer),
            ParameterSchema::Token(token) => Err(S::Error::custom(format!(
                "unresolved reference token for '{}' at {}",
                token.descriptor().name(),
                token.site()
            ))),
        }
    }
}

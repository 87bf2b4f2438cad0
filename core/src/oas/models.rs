#![deny(missing_docs)]

//! # Document Models
//!
//! The in-memory OpenAPI document tree and its builders.
//!
//! Every entity is a plain value with a `new(..)` constructor and chained
//! `with_*` methods. Places where a data-model type is used hold a
//! [`ReferenceToken`] until the document is finalized.
//!
//! Empty collections and unset optionals are skipped when serializing.

use crate::error::{AppError, AppResult};
use crate::oas::registry::ComponentRegistry;
use crate::oas::schemas::SchemaNode;
use crate::oas::token::{ParameterSchema, ReferenceToken, SchemaSlot, TokenSite};
use crate::type_mapping::{Describe, TypeDescriptor};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Specification extensions (`x-...`).
pub type Extensions = IndexMap<String, Value>;

fn is_false(value: &bool) -> bool {
    !*value
}

fn insert_extension(target: &mut Extensions, key: String, value: Value) -> AppResult<()> {
    if !key.starts_with("x-") {
        return Err(AppError::General(format!(
            "Extension key '{}' must start with 'x-'",
            key
        )));
    }
    target.insert(key, value);
    Ok(())
}

macro_rules! extensible {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                /// Adds a specification extension. Keys must start with `x-`.
                pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> AppResult<Self> {
                    insert_extension(&mut self.extensions, key.into(), value)?;
                    Ok(self)
                }
            }
        )+
    };
}

extensible!(
    ExternalDocs,
    ServerVariable,
    Server,
    Tag,
    OAuthFlow,
    MediaType,
    Parameter,
    RequestBody,
    Response,
    Operation,
    PathItem,
    Paths,
    Components,
    Document,
);

/// HTTP methods in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
}

impl Method {
    /// All methods, in the order operations are visited and emitted.
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Options,
        Method::Trace,
    ];

    /// Lowercase method name as used for Path Item keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Patch => "patch",
            Method::Head => "head",
            Method::Options => "options",
            Method::Trace => "trace",
        }
    }

    /// Parses a method name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name))
    }
}

/// Contact information for the exposed API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// The identifying name of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The URL for the contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The email address of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information for the exposed API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    /// The license name.
    pub name: String,
    /// URL of the license text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The Info Object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// The title of the API.
    pub title: String,
    /// The version of the API document.
    pub version: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional Terms of Service URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    /// Optional contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Optional license information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

impl Info {
    /// Creates an Info object with the required fields.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the Terms of Service URL.
    pub fn with_terms_of_service(mut self, terms: impl Into<String>) -> Self {
        self.terms_of_service = Some(terms.into());
        self
    }

    /// Sets contact metadata.
    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Sets license metadata.
    pub fn with_license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }
}

/// A link to external documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalDocs {
    /// The URL to the documentation.
    pub url: String,
    /// A short description of the target documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl ExternalDocs {
    /// Creates a link without description.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            extensions: Extensions::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A substitution variable for a templated server URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerVariable {
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Default value for substitution.
    pub default: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl ServerVariable {
    /// Creates a variable with its default value.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            enum_values: Vec::new(),
            default: default.into(),
            description: None,
            extensions: Extensions::new(),
        }
    }

    /// Adds an allowed value.
    pub fn with_enum_value(mut self, value: impl Into<String>) -> Self {
        self.enum_values.push(value.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The Server Object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    /// Server URL (may be relative or templated).
    pub url: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variables used in the URL template.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Server {
    /// Creates a server with its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a URL variable.
    pub fn with_variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }
}

/// The Tag Object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// The tag name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional external documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Tag {
    /// Creates a tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
            extensions: Extensions::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets external documentation.
    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }
}

/// A Security Requirement Object: scheme name to required scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecurityRequirement(pub IndexMap<String, Vec<String>>);

impl SecurityRequirement {
    /// Creates an empty requirement (anonymous access when used alone).
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `scheme` with the given scopes.
    pub fn with_scheme<I, S>(mut self, scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
        self
    }

    /// The scheme names this requirement refers to.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    /// Authorization URL (implicit, authorizationCode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    /// Token URL (password, clientCredentials, authorizationCode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Refresh URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Available scopes: name to description. Always emitted.
    pub scopes: IndexMap<String, String>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl OAuthFlow {
    /// Adds a scope.
    pub fn with_scope(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(name.into(), description.into());
        self
    }
}

/// Configuration of the supported OAuth2 flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    /// Implicit flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    /// Resource owner password flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    /// Client credentials flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    /// Authorization code flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

/// The type-specific part of a security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SecuritySchemeKind {
    /// `apiKey`
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Name of the header, query or cookie parameter.
        name: String,
        /// Where the key is sent.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// `http`
    #[serde(rename = "http")]
    Http {
        /// The HTTP authorization scheme (e.g. `bearer`).
        scheme: String,
        /// Hint for bearer token format.
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
    /// `oauth2`
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Supported flows.
        flows: OAuthFlows,
    },
    /// `openIdConnect`
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        /// OpenID Connect discovery URL.
        #[serde(rename = "openIdConnectUrl")]
        url: String,
    },
}

/// The Security Scheme Object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityScheme {
    /// Scheme-specific fields, including `type`.
    #[serde(flatten)]
    pub kind: SecuritySchemeKind,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityScheme {
    /// Creates a scheme.
    pub fn new(kind: SecuritySchemeKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named example value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The literal example.
    pub value: Value,
}

impl Example {
    /// Creates an example from a JSON value.
    pub fn new(value: Value) -> Self {
        Self {
            summary: None,
            description: None,
            value,
        }
    }

    /// Creates an example by serializing an application value.
    pub fn of<T: Serialize>(value: &T) -> AppResult<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The Media Type Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    /// The schema of the payload.
    pub schema: SchemaSlot,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named examples.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Example>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl MediaType {
    /// A media type whose schema is the Rust type `T`.
    pub fn of<T: Describe>() -> Self {
        Self::declared(T::describe())
    }

    /// A media type whose schema is an arbitrary descriptor.
    pub fn declared(descriptor: TypeDescriptor) -> Self {
        Self::with_slot(SchemaSlot::Token(ReferenceToken::declared(
            descriptor,
            TokenSite::MediaType(String::new()),
        )))
    }

    /// A media type with a literal schema, emitted as given.
    ///
    /// The assembler registers nothing for it: any `Ref` inside `schema`
    /// must name a component registered elsewhere in the document.
    pub fn inline(schema: SchemaNode) -> Self {
        Self::with_slot(SchemaSlot::Inline(schema))
    }

    fn with_slot(schema: SchemaSlot) -> Self {
        Self {
            schema,
            description: None,
            examples: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a named example.
    pub fn with_example(mut self, name: impl Into<String>, example: Example) -> Self {
        self.examples.insert(name.into(), example);
        self
    }
}

/// Media type name to Media Type Object, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Content(pub IndexMap<String, MediaType>);

impl Content {
    /// Creates empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` with the Rust type `T` as schema.
    pub fn with<T: Describe>(self, name: impl Into<String>) -> Self {
        self.with_media_type(name, MediaType::of::<T>())
    }

    /// Adds a media type.
    pub fn with_media_type(mut self, name: impl Into<String>, mut media: MediaType) -> Self {
        let name = name.into();
        if let SchemaSlot::Token(token) = &mut media.schema {
            token.set_site(TokenSite::MediaType(name.clone()));
        }
        self.0.insert(name, media);
        self
    }

    /// Whether no media type is defined.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Media types in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaType)> {
        self.0.iter().map(|(name, media)| (name.as_str(), media))
    }

    /// Mutable media types in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut MediaType> {
        self.0.values_mut()
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path template segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

/// Serialization style of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// `matrix`
    Matrix,
    /// `label`
    Label,
    /// `form`
    Form,
    /// `simple`
    Simple,
    /// `spaceDelimited`
    SpaceDelimited,
    /// `pipeDelimited`
    PipeDelimited,
    /// `deepObject`
    DeepObject,
}

/// The Parameter Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is mandatory. Path parameters always are.
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    /// Whether the parameter is deprecated.
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    /// Serialization style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,
    /// Inline schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
    /// Content-negotiated schema.
    #[serde(skip_serializing_if = "Content::is_empty")]
    pub content: Content,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parameter {
    /// Creates a parameter at `location`.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required: location == ParameterLocation::Path,
            deprecated: false,
            style: None,
            schema: None,
            content: Content::new(),
            extensions: Extensions::new(),
        }
    }

    /// A required path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    /// A query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    /// A header parameter.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    /// A cookie parameter.
    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Cookie)
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets whether the parameter is required. Ignored for path parameters.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == ParameterLocation::Path;
        self
    }

    /// Marks the parameter deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets the style.
    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Uses the Rust type `T` as inline schema.
    pub fn with_schema<T: Describe>(self) -> Self {
        self.with_declared_schema(T::describe())
    }

    /// Uses an arbitrary descriptor as inline schema, dropping any content.
    pub fn with_declared_schema(mut self, descriptor: TypeDescriptor) -> Self {
        let site = TokenSite::Parameter(self.name.clone());
        self.schema = Some(ParameterSchema::Token(ReferenceToken::declared(
            descriptor, site,
        )));
        self.content = Content::new();
        self
    }

    /// Uses content negotiation instead of an inline schema, dropping any schema.
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self.schema = None;
        self
    }
}

/// The Request Body Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Payload per media type.
    #[serde(skip_serializing_if = "Content::is_empty")]
    pub content: Content,
    /// Whether the body is mandatory.
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl RequestBody {
    /// Creates a request body.
    pub fn new(content: Content) -> Self {
        Self {
            description: None,
            content,
            required: false,
            extensions: Extensions::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets whether the body is mandatory.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// The Response Object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Required description.
    pub description: String,
    /// Payload per media type.
    #[serde(skip_serializing_if = "Content::is_empty")]
    pub content: Content,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Response {
    /// Creates a response without payload.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content: Content::new(),
            extensions: Extensions::new(),
        }
    }

    /// Adds `media` with the Rust type `T` as schema.
    pub fn with<T: Describe>(mut self, media: impl Into<String>) -> Self {
        self.content = self.content.with::<T>(media);
        self
    }

    /// Replaces the content.
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }
}

/// The Operation Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Unique operation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Status code (or `default`) to response, in insertion order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
    /// Whether the operation is deprecated.
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    /// Security requirements overriding the document level ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    /// Servers overriding the document level ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Operation {
    /// Creates an empty operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the operation id.
    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Sets external documentation.
    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the request body.
    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Adds a response under `code` (a status code, range or `default`).
    pub fn response(mut self, code: impl Into<String>, response: Response) -> Self {
        self.responses.insert(code.into(), response);
        self
    }

    /// Adds a `200` response.
    pub fn ok(self, response: Response) -> Self {
        self.response("200", response)
    }

    /// Adds a `201` response.
    pub fn created(self, response: Response) -> Self {
        self.response("201", response)
    }

    /// Adds a `204` response.
    pub fn no_content(self, response: Response) -> Self {
        self.response("204", response)
    }

    /// Adds a `401` response.
    pub fn unauthorized(self, response: Response) -> Self {
        self.response("401", response)
    }

    /// Adds a `403` response.
    pub fn forbidden(self, response: Response) -> Self {
        self.response("403", response)
    }

    /// Adds a `404` response.
    pub fn not_found(self, response: Response) -> Self {
        self.response("404", response)
    }

    /// Marks the operation deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Adds a security requirement.
    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    /// Adds a server.
    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }
}

/// The Path Item Object: one optional operation per method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    /// Summary shared by all operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description shared by all operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GET
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// PATCH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// HEAD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// OPTIONS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// TRACE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// Creates an empty path item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the operation for `method`, replacing any previous one.
    pub fn with_operation(mut self, method: Method, operation: Operation) -> Self {
        *self.slot_mut(method) = Some(operation);
        self
    }

    /// The operation bound to `method`.
    pub fn operation(&self, method: Method) -> Option<&Operation> {
        match method {
            Method::Get => self.get.as_ref(),
            Method::Put => self.put.as_ref(),
            Method::Post => self.post.as_ref(),
            Method::Delete => self.delete.as_ref(),
            Method::Patch => self.patch.as_ref(),
            Method::Head => self.head.as_ref(),
            Method::Options => self.options.as_ref(),
            Method::Trace => self.trace.as_ref(),
        }
    }

    /// The mutable operation bound to `method`.
    pub fn operation_mut(&mut self, method: Method) -> Option<&mut Operation> {
        self.slot_mut(method).as_mut()
    }

    fn slot_mut(&mut self, method: Method) -> &mut Option<Operation> {
        match method {
            Method::Get => &mut self.get,
            Method::Put => &mut self.put,
            Method::Post => &mut self.post,
            Method::Delete => &mut self.delete,
            Method::Patch => &mut self.patch,
            Method::Head => &mut self.head,
            Method::Options => &mut self.options,
            Method::Trace => &mut self.trace,
        }
    }
}

/// Path template to Path Item, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paths {
    /// Path Items keyed by path template.
    #[serde(flatten)]
    pub items: IndexMap<String, PathItem>,
    /// Specification extensions.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Paths {
    /// Creates empty paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `operation` to `method` on `path`, keeping other methods of the path.
    pub fn with_operation(
        mut self,
        path: impl Into<String>,
        method: Method,
        operation: Operation,
    ) -> Self {
        let item = self.items.entry(path.into()).or_default();
        *item.slot_mut(method) = Some(operation);
        self
    }

    /// The path item for `path`.
    pub fn get(&self, path: &str) -> Option<&PathItem> {
        self.items.get(path)
    }

    /// Operations in traversal order: paths as inserted, methods in [`Method::ALL`] order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, Method, &Operation)> {
        self.items.iter().flat_map(|(path, item)| {
            Method::ALL.into_iter().filter_map(move |method| {
                item.operation(method)
                    .map(|operation| (path.as_str(), method, operation))
            })
        })
    }

    /// Visits every operation mutably, in traversal order, stopping at the first error.
    pub fn try_for_each_operation_mut<F>(&mut self, mut visit: F) -> AppResult<()>
    where
        F: FnMut(&str, Method, &mut Operation) -> AppResult<()>,
    {
        for (path, item) in self.items.iter_mut() {
            for method in Method::ALL {
                if let Some(operation) = item.operation_mut(method) {
                    visit(path, method, operation)?;
                }
            }
        }
        Ok(())
    }

    /// Whether no path is defined.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// User-declared components. Component schemas are derived; entries here
/// force a type into `components.schemas` even when no operation uses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    /// Explicitly declared schemas.
    pub schemas: Vec<SchemaSlot>,
    /// Security schemes by name.
    pub security_schemes: IndexMap<String, SecurityScheme>,
    /// Specification extensions.
    pub extensions: Extensions,
}

impl Components {
    /// Creates empty components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the Rust type `T` as a component schema.
    pub fn schema<T: Describe>(self) -> Self {
        self.declared_schema(T::describe())
    }

    /// Declares an arbitrary descriptor as a component schema.
    pub fn declared_schema(mut self, descriptor: TypeDescriptor) -> Self {
        self.schemas.push(SchemaSlot::Token(ReferenceToken::declared(
            descriptor,
            TokenSite::Component,
        )));
        self
    }

    /// Adds a security scheme.
    pub fn with_security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.security_schemes.insert(name.into(), scheme);
        self
    }
}

/// The OpenAPI Object.
#[derive(Debug, Clone)]
pub struct Document {
    /// OpenAPI version string.
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Servers.
    pub servers: Vec<Server>,
    /// Paths.
    pub paths: Paths,
    /// Declared components.
    pub components: Components,
    /// Document-wide security requirements.
    pub security: Vec<SecurityRequirement>,
    /// Tags.
    pub tags: Vec<Tag>,
    /// External documentation.
    pub external_docs: Option<ExternalDocs>,
    /// Specification extensions.
    pub extensions: Extensions,
    pub(crate) registry: Option<ComponentRegistry>,
}

/// Default `openapi` version emitted.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.0";

impl Document {
    /// Creates a document with its Info object.
    pub fn new(info: Info) -> Self {
        Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info,
            servers: Vec::new(),
            paths: Paths::new(),
            components: Components::new(),
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            extensions: Extensions::new(),
            registry: None,
        }
    }

    /// Overrides the `openapi` version string.
    pub fn with_openapi(mut self, version: impl Into<String>) -> Self {
        self.openapi = version.into();
        self
    }

    /// Adds a server.
    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Adds a document-wide security requirement.
    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    /// Sets external documentation.
    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    /// Replaces the paths.
    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths = paths;
        self
    }

    /// Adds (or replaces) a whole path item.
    pub fn with_path(mut self, path: impl Into<String>, item: PathItem) -> Self {
        self.paths.items.insert(path.into(), item);
        self
    }

    /// Binds `operation` to `method` on `path`.
    pub fn with_operation(
        mut self,
        path: impl Into<String>,
        method: Method,
        operation: Operation,
    ) -> Self {
        self.paths = self.paths.with_operation(path, method, operation);
        self
    }

    /// Shorthand for a GET operation.
    pub fn get(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Get, operation)
    }

    /// Shorthand for a PUT operation.
    pub fn put(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Put, operation)
    }

    /// Shorthand for a POST operation.
    pub fn post(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Post, operation)
    }

    /// Shorthand for a DELETE operation.
    pub fn delete(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Delete, operation)
    }

    /// Shorthand for a PATCH operation.
    pub fn patch(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Patch, operation)
    }

    /// Shorthand for a HEAD operation.
    pub fn head(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Head, operation)
    }

    /// Shorthand for an OPTIONS operation.
    pub fn options(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Options, operation)
    }

    /// Shorthand for a TRACE operation.
    pub fn trace(self, path: impl Into<String>, operation: Operation) -> Self {
        self.with_operation(path, Method::Trace, operation)
    }

    /// Replaces the declared components.
    pub fn with_components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    /// The component registry, once the document has been finalized.
    pub fn registry(&self) -> Option<&ComponentRegistry> {
        self.registry.as_ref()
    }

    /// Whether the document has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.registry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_method_order_and_parse() {
        let names: Vec<_> = Method::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(
            names,
            vec!["get", "put", "post", "delete", "patch", "head", "options", "trace"]
        );
        assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
        assert_eq!(Method::parse("connect"), None);
    }

    #[test]
    fn test_paths_merge_methods_on_same_path() {
        let paths = Paths::new()
            .with_operation("/pets", Method::Post, Operation::new().with_summary("create"))
            .with_operation("/pets", Method::Get, Operation::new().with_summary("list"))
            .with_operation("/owners", Method::Get, Operation::new());

        let visited: Vec<_> = paths
            .operations()
            .map(|(path, method, _)| format!("{} {}", method.as_str(), path))
            .collect();
        assert_eq!(visited, vec!["get /pets", "post /pets", "get /owners"]);
    }

    #[test]
    fn test_every_method_has_a_document_shorthand() {
        let op = || Operation::new().ok(Response::new("ok"));
        let doc = Document::new(Info::new("All", "1"))
            .trace("/x", op())
            .options("/x", op())
            .head("/x", op())
            .patch("/x", op())
            .delete("/x", op())
            .post("/x", op())
            .put("/x", op())
            .get("/x", op());
        let methods: Vec<_> = doc.paths.operations().map(|(_, m, _)| m).collect();
        assert_eq!(methods, Method::ALL.to_vec());
    }

    #[test]
    fn test_path_item_summary_and_extensions() {
        let item = PathItem::new()
            .with_summary("Pets")
            .with_description("Pet resources")
            .with_operation(Method::Get, Operation::new())
            .with_extension("x-rate-limit", json!(10))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "summary": "Pets",
                "description": "Pet resources",
                "get": {},
                "x-rate-limit": 10
            })
        );
    }

    #[test]
    fn test_path_parameters_are_always_required() {
        let p = Parameter::path("id").required(false);
        assert!(p.required);
        let q = Parameter::query("q");
        assert!(!q.required);
        assert!(q.required(true).required);
    }

    #[test]
    fn test_extension_keys_must_be_prefixed() {
        let err = Operation::new()
            .with_extension("internal", json!(true))
            .unwrap_err();
        assert!(err.to_string().contains("must start with 'x-'"));

        let op = Operation::new()
            .with_extension("x-rate-limit", json!(10))
            .unwrap();
        assert_eq!(op.extensions["x-rate-limit"], json!(10));
    }

    #[test]
    fn test_security_scheme_shapes() {
        let api_key = SecurityScheme::new(SecuritySchemeKind::ApiKey {
            name: "X-API-Key".into(),
            location: ApiKeyLocation::Header,
        });
        assert_eq!(
            serde_json::to_value(&api_key).unwrap(),
            json!({"type": "apiKey", "name": "X-API-Key", "in": "header"})
        );

        let oidc = SecurityScheme::new(SecuritySchemeKind::OpenIdConnect {
            url: "http://localhost/auth".into(),
        })
        .with_description("login");
        assert_eq!(
            serde_json::to_value(&oidc).unwrap(),
            json!({
                "type": "openIdConnect",
                "openIdConnectUrl": "http://localhost/auth",
                "description": "login"
            })
        );

        let oauth = SecurityScheme::new(SecuritySchemeKind::OAuth2 {
            flows: OAuthFlows {
                client_credentials: Some(OAuthFlow {
                    token_url: Some("https://auth.example.com/token".into()),
                    ..OAuthFlow::default()
                }),
                ..OAuthFlows::default()
            },
        });
        assert_eq!(
            serde_json::to_value(&oauth).unwrap(),
            json!({
                "type": "oauth2",
                "flows": {"clientCredentials": {"tokenUrl": "https://auth.example.com/token", "scopes": {}}}
            })
        );
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let op = Operation::new().ok(Response::new("fine"));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"responses": {"200": {"description": "fine"}}})
        );

        let server = Server::new("https://{region}.example.com")
            .with_variable("region", ServerVariable::new("eu").with_enum_value("eu"));
        assert_eq!(
            serde_json::to_value(&server).unwrap(),
            json!({
                "url": "https://{region}.example.com",
                "variables": {"region": {"enum": ["eu"], "default": "eu"}}
            })
        );
    }

    #[test]
    fn test_content_binds_token_site() {
        struct Pet;
        impl Describe for Pet {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::object::<Self>()
            }
        }
        let content = Content::new().with::<Pet>("application/json");
        let (_, media) = content.iter().next().unwrap();
        match &media.schema {
            SchemaSlot::Token(token) => assert_eq!(
                token.site(),
                &TokenSite::MediaType("application/json".into())
            ),
            other => panic!("expected token, got {:?}", other),
        }
    }

    #[test]
    fn test_example_from_application_value() {
        #[derive(Serialize)]
        struct Sample {
            foo: &'static str,
        }
        let example = Example::of(&Sample { foo: "bar" })
            .unwrap()
            .with_summary("example schema value");
        assert_eq!(
            serde_json::to_value(&example).unwrap(),
            json!({"summary": "example schema value", "value": {"foo": "bar"}})
        );
    }
}

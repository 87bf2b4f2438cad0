#![deny(missing_docs)]

//! # API Manifest
//!
//! A YAML/JSON description of an API whose data models are declared by name
//! instead of by Rust type. Loading a manifest yields a [`Document`] built
//! through the same builder API application code uses.
//!
//! Type references in `models`, parameters and content are written as:
//! - a primitive name (`string`, `integer`, `int64`, `boolean`, `date-time`, ...),
//! - a model name declared under `models`,
//! - `[T]` for a sequence of `T`.
//!
//! A `$` prefix on a property's type (`$Address`) registers that member as
//! its own component instead of inlining it.

use crate::error::{CliError, CliResult};
use indexmap::IndexMap;
use oasdsl_core::oas::{
    ApiKeyLocation, Components, Content, ExternalDocs, MediaType, OAuthFlow, OAuthFlows,
    Operation, Parameter, ParameterLocation, RequestBody, Response, SecurityRequirement,
    SecurityScheme, SecuritySchemeKind, Server, ServerVariable, Tag,
};
use oasdsl_core::{Document, Info, MemberType, Method, PrimitiveKind, TypeDescriptor, TypeShape};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Top-level manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Overrides the emitted `openapi` version.
    #[serde(default)]
    pub openapi: Option<String>,
    /// API metadata.
    pub info: InfoDef,
    /// Servers.
    #[serde(default)]
    pub servers: Vec<ServerDef>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<TagDef>,
    /// Document-level external docs.
    #[serde(default)]
    pub external_docs: Option<DocsDef>,
    /// Document-level security requirements.
    #[serde(default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
    /// Security schemes by name.
    #[serde(default)]
    pub security_schemes: IndexMap<String, SchemeDef>,
    /// Types forced into `components.schemas`.
    #[serde(default)]
    pub components: Vec<String>,
    /// Model declarations.
    #[serde(default)]
    pub models: IndexMap<String, ModelDef>,
    /// Path template to method to operation.
    #[serde(default)]
    pub paths: IndexMap<String, IndexMap<String, OperationDef>>,
}

/// `info` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDef {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Terms of service URL.
    #[serde(default)]
    pub terms_of_service: Option<String>,
}

/// Server entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDef {
    /// URL template.
    pub url: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// URL variables.
    #[serde(default)]
    pub variables: IndexMap<String, VariableDef>,
}

/// Server variable.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableDef {
    /// Default substitution.
    pub default: String,
    /// Allowed values.
    #[serde(rename = "enum", default)]
    pub values: Vec<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Tag entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDef {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// External docs.
    #[serde(default)]
    pub external_docs: Option<DocsDef>,
}

/// External docs link.
#[derive(Debug, Clone, Deserialize)]
pub struct DocsDef {
    /// Target URL.
    pub url: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Security scheme, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SchemeDef {
    /// API key.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Key name.
        name: String,
        /// `query`, `header` or `cookie`.
        #[serde(rename = "in")]
        location: String,
        /// Description.
        #[serde(default)]
        description: Option<String>,
    },
    /// HTTP authentication.
    #[serde(rename = "http")]
    Http {
        /// Authorization scheme.
        scheme: String,
        /// Bearer token format hint.
        #[serde(rename = "bearerFormat", default)]
        bearer_format: Option<String>,
        /// Description.
        #[serde(default)]
        description: Option<String>,
    },
    /// OAuth2.
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// Flows.
        flows: FlowsDef,
        /// Description.
        #[serde(default)]
        description: Option<String>,
    },
    /// OpenID Connect discovery.
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        /// Discovery URL.
        #[serde(rename = "openIdConnectUrl")]
        url: String,
        /// Description.
        #[serde(default)]
        description: Option<String>,
    },
}

/// OAuth2 flows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowsDef {
    /// Implicit flow.
    #[serde(default)]
    pub implicit: Option<FlowDef>,
    /// Password flow.
    #[serde(default)]
    pub password: Option<FlowDef>,
    /// Client credentials flow.
    #[serde(default)]
    pub client_credentials: Option<FlowDef>,
    /// Authorization code flow.
    #[serde(default)]
    pub authorization_code: Option<FlowDef>,
}

/// One OAuth2 flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDef {
    /// Authorization URL.
    #[serde(default)]
    pub authorization_url: Option<String>,
    /// Token URL.
    #[serde(default)]
    pub token_url: Option<String>,
    /// Refresh URL.
    #[serde(default)]
    pub refresh_url: Option<String>,
    /// Scope name to description.
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// A declared model: an object, an enumeration or a primitive alias.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDef {
    /// `object` (default) or a primitive name.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Property name to type reference.
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    /// Enumeration values, in order.
    #[serde(rename = "enum", default)]
    pub values: Vec<String>,
}

/// An operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationDef {
    /// Summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Operation id.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Deprecated flag.
    #[serde(default)]
    pub deprecated: bool,
    /// Parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Request body.
    #[serde(default)]
    pub request_body: Option<BodyDef>,
    /// Status code to response.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseDef>,
    /// Security requirements.
    #[serde(default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// A parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDef {
    /// Name.
    pub name: String,
    /// `path`, `query`, `header` or `cookie`.
    #[serde(rename = "in")]
    pub location: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Required flag (forced for path parameters).
    #[serde(default)]
    pub required: bool,
    /// Deprecated flag.
    #[serde(default)]
    pub deprecated: bool,
    /// Inline schema type reference.
    #[serde(default)]
    pub schema: Option<String>,
    /// Media type to type reference.
    #[serde(default)]
    pub content: IndexMap<String, String>,
}

/// A request body.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyDef {
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Required flag.
    #[serde(default)]
    pub required: bool,
    /// Media type to type reference.
    pub content: IndexMap<String, String>,
}

/// A response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseDef {
    /// Description.
    pub description: String,
    /// Media type to type reference.
    #[serde(default)]
    pub content: IndexMap<String, String>,
}

impl Manifest {
    /// Reads a manifest; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Manifest(format!(
                "Manifest not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parses a YAML manifest.
    pub fn from_yaml(content: &str) -> CliResult<Self> {
        serde_yaml::from_str(content).map_err(|e| CliError::Manifest(e.to_string()))
    }

    /// Parses a JSON manifest.
    pub fn from_json(content: &str) -> CliResult<Self> {
        serde_json::from_str(content).map_err(|e| CliError::Manifest(e.to_string()))
    }

    /// Builds the (unfinalized) document this manifest describes.
    pub fn to_document(&self) -> CliResult<Document> {
        let catalog = Catalog::new(self.models.clone())?;

        let mut info = Info::new(&self.info.title, &self.info.version);
        if let Some(description) = &self.info.description {
            info = info.with_description(description);
        }
        if let Some(terms) = &self.info.terms_of_service {
            info = info.with_terms_of_service(terms);
        }

        let mut doc = Document::new(info);
        if let Some(version) = &self.openapi {
            doc = doc.with_openapi(version);
        }
        for server in &self.servers {
            doc = doc.with_server(server_from(server));
        }
        for tag in &self.tags {
            let mut built = Tag::new(&tag.name);
            if let Some(description) = &tag.description {
                built = built.with_description(description);
            }
            if let Some(docs) = &tag.external_docs {
                built = built.with_external_docs(docs_from(docs));
            }
            doc = doc.with_tag(built);
        }
        if let Some(docs) = &self.external_docs {
            doc = doc.with_external_docs(docs_from(docs));
        }
        for requirement in &self.security {
            doc = doc.with_security(requirement_from(requirement));
        }

        let mut components = Components::new();
        for type_ref in &self.components {
            components = components.declared_schema(catalog.descriptor(type_ref)?);
        }
        for (name, scheme) in &self.security_schemes {
            components = components.with_security_scheme(name, scheme_from(name, scheme)?);
        }
        doc = doc.with_components(components);

        for (path, methods) in &self.paths {
            for (method_name, def) in methods {
                let method = Method::parse(method_name).ok_or_else(|| {
                    CliError::Manifest(format!(
                        "Unknown method '{}' on path '{}'",
                        method_name, path
                    ))
                })?;
                doc = doc.with_operation(path, method, operation_from(def, &catalog)?);
            }
        }

        debug!(
            models = self.models.len(),
            paths = self.paths.len(),
            "loaded manifest"
        );
        Ok(doc)
    }
}

fn server_from(def: &ServerDef) -> Server {
    let mut server = Server::new(&def.url);
    if let Some(description) = &def.description {
        server = server.with_description(description);
    }
    for (name, var) in &def.variables {
        let mut variable = ServerVariable::new(&var.default);
        for value in &var.values {
            variable = variable.with_enum_value(value);
        }
        if let Some(description) = &var.description {
            variable = variable.with_description(description);
        }
        server = server.with_variable(name, variable);
    }
    server
}

fn docs_from(def: &DocsDef) -> ExternalDocs {
    let docs = ExternalDocs::new(&def.url);
    match &def.description {
        Some(description) => docs.with_description(description),
        None => docs,
    }
}

fn requirement_from(def: &IndexMap<String, Vec<String>>) -> SecurityRequirement {
    def.iter()
        .fold(SecurityRequirement::new(), |req, (scheme, scopes)| {
            req.with_scheme(scheme, scopes.iter().cloned())
        })
}

fn flow_from(def: &Option<FlowDef>) -> Option<OAuthFlow> {
    def.as_ref().map(|flow| OAuthFlow {
        authorization_url: flow.authorization_url.clone(),
        token_url: flow.token_url.clone(),
        refresh_url: flow.refresh_url.clone(),
        scopes: flow.scopes.clone(),
        ..OAuthFlow::default()
    })
}

fn scheme_from(name: &str, def: &SchemeDef) -> CliResult<SecurityScheme> {
    let (kind, description) = match def {
        SchemeDef::ApiKey {
            name: key,
            location,
            description,
        } => {
            let location = match location.as_str() {
                "query" => ApiKeyLocation::Query,
                "header" => ApiKeyLocation::Header,
                "cookie" => ApiKeyLocation::Cookie,
                other => {
                    return Err(CliError::Manifest(format!(
                        "Security scheme '{}': unknown api key location '{}'",
                        name, other
                    )))
                }
            };
            (
                SecuritySchemeKind::ApiKey {
                    name: key.clone(),
                    location,
                },
                description,
            )
        }
        SchemeDef::Http {
            scheme,
            bearer_format,
            description,
        } => (
            SecuritySchemeKind::Http {
                scheme: scheme.clone(),
                bearer_format: bearer_format.clone(),
            },
            description,
        ),
        SchemeDef::OAuth2 { flows, description } => (
            SecuritySchemeKind::OAuth2 {
                flows: OAuthFlows {
                    implicit: flow_from(&flows.implicit),
                    password: flow_from(&flows.password),
                    client_credentials: flow_from(&flows.client_credentials),
                    authorization_code: flow_from(&flows.authorization_code),
                },
            },
            description,
        ),
        SchemeDef::OpenIdConnect { url, description } => (
            SecuritySchemeKind::OpenIdConnect { url: url.clone() },
            description,
        ),
    };
    let scheme = SecurityScheme::new(kind);
    Ok(match description {
        Some(description) => scheme.with_description(description),
        None => scheme,
    })
}

fn content_from(def: &IndexMap<String, String>, catalog: &Catalog) -> CliResult<Content> {
    def.iter().try_fold(Content::new(), |content, (media, type_ref)| {
        Ok(content.with_media_type(media, MediaType::declared(catalog.descriptor(type_ref)?)))
    })
}

fn parameter_from(def: &ParameterDef, catalog: &Catalog) -> CliResult<Parameter> {
    let location = match def.location.as_str() {
        "path" => ParameterLocation::Path,
        "query" => ParameterLocation::Query,
        "header" => ParameterLocation::Header,
        "cookie" => ParameterLocation::Cookie,
        other => {
            return Err(CliError::Manifest(format!(
                "Parameter '{}': unknown location '{}'",
                def.name, other
            )))
        }
    };
    let mut parameter = Parameter::new(&def.name, location).required(def.required);
    if let Some(description) = &def.description {
        parameter = parameter.with_description(description);
    }
    if def.deprecated {
        parameter = parameter.deprecated();
    }
    if let Some(type_ref) = &def.schema {
        parameter = parameter.with_declared_schema(catalog.descriptor(type_ref)?);
    }
    if !def.content.is_empty() {
        parameter = parameter.with_content(content_from(&def.content, catalog)?);
    }
    Ok(parameter)
}

fn operation_from(def: &OperationDef, catalog: &Catalog) -> CliResult<Operation> {
    let mut op = Operation::new();
    if let Some(summary) = &def.summary {
        op = op.with_summary(summary);
    }
    if let Some(description) = &def.description {
        op = op.with_description(description);
    }
    if let Some(id) = &def.operation_id {
        op = op.with_operation_id(id);
    }
    for tag in &def.tags {
        op = op.with_tag(tag);
    }
    if def.deprecated {
        op = op.deprecated();
    }
    for parameter in &def.parameters {
        op = op.with_parameter(parameter_from(parameter, catalog)?);
    }
    if let Some(body) = &def.request_body {
        let mut request = RequestBody::new(content_from(&body.content, catalog)?).required(body.required);
        if let Some(description) = &body.description {
            request = request.with_description(description);
        }
        op = op.with_request_body(request);
    }
    for (code, response) in &def.responses {
        op = op.response(
            code,
            Response::new(&response.description)
                .with_content(content_from(&response.content, catalog)?),
        );
    }
    for requirement in &def.security {
        op = op.with_security(requirement_from(requirement));
    }
    Ok(op)
}

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Built-in primitive.
    Primitive(PrimitiveKind),
    /// A declared model.
    Model(String),
    /// Sequence of the inner type.
    Sequence(Box<TypeRef>),
}

impl TypeRef {
    /// Parses `string`, `Pet`, `[Pet]`, `[[int64]]`...
    pub fn parse(raw: &str) -> CliResult<Self> {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Ok(TypeRef::Sequence(Box::new(TypeRef::parse(inner)?)));
        }
        if let Some(kind) = PrimitiveKind::from_name(raw) {
            return Ok(TypeRef::Primitive(kind));
        }
        let is_name = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if is_name {
            Ok(TypeRef::Model(raw.to_string()))
        } else {
            Err(CliError::Manifest(format!("Invalid type reference '{}'", raw)))
        }
    }

    fn models(&self) -> Option<&str> {
        match self {
            TypeRef::Primitive(_) => None,
            TypeRef::Model(name) => Some(name),
            TypeRef::Sequence(inner) => inner.models(),
        }
    }
}

/// Display name used as component key for a primitive declared in a manifest.
fn primitive_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "String",
        PrimitiveKind::Boolean => "Boolean",
        PrimitiveKind::Int32 => "Integer",
        PrimitiveKind::Int64 => "Long",
        PrimitiveKind::Float => "Float",
        PrimitiveKind::Double => "Double",
        PrimitiveKind::Decimal => "Decimal",
        PrimitiveKind::Date => "Date",
        PrimitiveKind::DateTime => "DateTime",
        PrimitiveKind::Uuid => "Uuid",
    }
}

/// The declared models, shared by the lazily described members.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Arc<IndexMap<String, ModelDef>>,
}

impl Catalog {
    /// Checks every model and property reference, then wraps the models.
    pub fn new(models: IndexMap<String, ModelDef>) -> CliResult<Self> {
        let catalog = Self {
            models: Arc::new(models),
        };
        for (name, model) in catalog.models.iter() {
            if !model.values.is_empty() {
                if !model.properties.is_empty() {
                    return Err(CliError::Manifest(format!(
                        "Model '{}' cannot declare both 'enum' and 'properties'",
                        name
                    )));
                }
                continue;
            }
            match model.kind.as_deref() {
                None | Some("object") => {}
                Some(kind) if PrimitiveKind::from_name(kind).is_some() => {}
                Some(kind) => {
                    return Err(CliError::Manifest(format!(
                        "Model '{}' has unsupported type '{}'",
                        name, kind
                    )))
                }
            }
            for (property, type_ref) in &model.properties {
                let (parsed, _) = parse_member(type_ref)?;
                catalog.check(&parsed).map_err(|e| match e {
                    CliError::Manifest(msg) => {
                        CliError::Manifest(format!("{}.{}: {}", name, property, msg))
                    }
                    other => other,
                })?;
            }
        }
        Ok(catalog)
    }

    /// Describes a type reference.
    pub fn descriptor(&self, raw: &str) -> CliResult<TypeDescriptor> {
        let parsed = TypeRef::parse(raw)?;
        self.check(&parsed)?;
        Ok(self.describe(&parsed))
    }

    fn check(&self, type_ref: &TypeRef) -> CliResult<()> {
        match type_ref.models() {
            Some(name) if !self.models.contains_key(name) => Err(CliError::Manifest(format!(
                "Unknown model '{}'",
                name
            ))),
            _ => Ok(()),
        }
    }

    fn describe(&self, type_ref: &TypeRef) -> TypeDescriptor {
        match type_ref {
            TypeRef::Primitive(kind) => {
                TypeDescriptor::declared_primitive(primitive_name(*kind), *kind)
            }
            TypeRef::Sequence(inner) => TypeDescriptor::declared_sequence(self.describe(inner)),
            TypeRef::Model(name) => self.model(name),
        }
    }

    fn model(&self, name: &str) -> TypeDescriptor {
        let Some(model) = self.models.get(name) else {
            return TypeDescriptor::declared(name, TypeShape::Opaque);
        };
        if !model.values.is_empty() {
            return TypeDescriptor::declared_enum(name, model.values.iter().cloned());
        }
        if let Some(kind) = model.kind.as_deref().and_then(PrimitiveKind::from_name) {
            return TypeDescriptor::declared_primitive(name, kind);
        }

        let mut descriptor = TypeDescriptor::declared_object(name);
        for (property, raw) in &model.properties {
            // Checked in `Catalog::new`.
            let Ok((type_ref, separate)) = parse_member(raw) else {
                continue;
            };
            let catalog = self.clone();
            let ty = MemberType::Deferred(Arc::new(move || catalog.describe(&type_ref)));
            descriptor = descriptor.member(property, ty, separate);
        }
        descriptor
    }
}

fn parse_member(raw: &str) -> CliResult<(TypeRef, bool)> {
    match raw.trim().strip_prefix('$') {
        Some(rest) => Ok((TypeRef::parse(rest)?, true)),
        None => Ok((TypeRef::parse(raw)?, false)),
    }
}

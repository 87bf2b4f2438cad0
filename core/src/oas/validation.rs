#![deny(missing_docs)]

//! # Validation
//!
//! Structural checks run over serialized OpenAPI 3.0 documents.
//!
//! Findings are returned as [`Diagnostic`] values; an empty list means the
//! document is valid. Validation itself never fails.

use crate::oas::models::Method;
use crate::oas::ref_utils::{
    encode_pointer_segment, extract_component_name, is_valid_component_key, resolve_local_ref,
};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use url::Url;

const OPENAPI_VERSION_PATTERN: &str = r"^3\.\d+\.\d+$";
const RESPONSE_KEY_PATTERN: &str = r"^(default|[1-5][0-9]{2}|[1-5]XX)$";
const PATH_TEMPLATE_PATTERN: &str = r"\{([^{}]+)\}";
const PARAMETER_LOCATIONS: [&str; 4] = ["path", "query", "header", "cookie"];

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// JSON pointer of the offending node (empty for the root).
    pub pointer: String,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = if self.pointer.is_empty() {
            "/"
        } else {
            self.pointer.as_str()
        };
        write!(f, "{}: {}", pointer, self.message)
    }
}

/// Checks a serialized document.
pub trait Validator {
    /// Validates document text, returning zero or more diagnostics.
    fn validate(&self, text: &str) -> Vec<Diagnostic>;

    /// Validates a document stored at `path`.
    fn validate_file(&self, path: &Path) -> Vec<Diagnostic> {
        match std::fs::read_to_string(path) {
            Ok(text) => self.validate(&text),
            Err(e) => vec![Diagnostic::new(
                "",
                format!("Failed to read '{}': {}", path.display(), e),
            )],
        }
    }
}

/// The bundled validator: OpenAPI 3.0 structural and referential rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validates an already parsed document.
    pub fn validate_value(&self, root: &Value) -> Vec<Diagnostic> {
        let mut check = Checker::new(root);
        check.document();
        check.diagnostics
    }
}

impl Validator for StructuralValidator {
    fn validate(&self, text: &str) -> Vec<Diagnostic> {
        match serde_json::from_str::<Value>(text) {
            Ok(root) => self.validate_value(&root),
            Err(e) => vec![Diagnostic::new("", format!("Invalid JSON: {}", e))],
        }
    }
}

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

fn matches(cell: &'static OnceLock<Option<Regex>>, source: &str, value: &str) -> bool {
    pattern(cell, source)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn child(pointer: &str, segment: &str) -> String {
    format!("{}/{}", pointer, encode_pointer_segment(segment))
}

fn is_extension(key: &str) -> bool {
    key.starts_with("x-")
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn is_valid_uri_reference(value: &str) -> bool {
    if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if Url::parse(value).is_ok() {
        return true;
    }
    Url::parse("https://example.com")
        .ok()
        .map(|base| Url::options().base_url(Some(&base)).parse(value).is_ok())
        .unwrap_or(false)
}

fn path_template_names(path: &str) -> Vec<String> {
    static TEMPLATE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&TEMPLATE, PATH_TEMPLATE_PATTERN)
        .map(|re| {
            re.captures_iter(path)
                .map(|caps| caps[1].to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// `$ref` hops followed before a chain is treated as unresolvable.
const MAX_REF_HOPS: usize = 16;

/// Name and location identifying a parameter within a list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParameterKey {
    name: String,
    location: String,
}

impl ParameterKey {
    fn of(parameter: &Value) -> Option<Self> {
        Some(Self {
            name: parameter.get("name")?.as_str()?.to_string(),
            location: parameter.get("in")?.as_str()?.to_string(),
        })
    }

    fn is_path(&self) -> bool {
        self.location == "path"
    }
}

struct Checker<'a> {
    root: &'a Value,
    diagnostics: Vec<Diagnostic>,
    security_schemes: HashSet<String>,
    operation_ids: HashMap<String, String>,
}

impl<'a> Checker<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            diagnostics: Vec::new(),
            security_schemes: HashSet::new(),
            operation_ids: HashMap::new(),
        }
    }

    fn report(&mut self, pointer: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(pointer, message));
    }

    /// Follows `$ref` chains within the document.
    fn dereference(&self, node: &'a Value) -> Option<&'a Value> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            match current.get("$ref").and_then(Value::as_str) {
                Some(target) => current = resolve_local_ref(self.root, target)?,
                None => return Some(current),
            }
        }
        None
    }

    fn document(&mut self) {
        let doc = self.root;
        let Some(root) = doc.as_object() else {
            self.report("", "Document root must be an object");
            return;
        };

        self.openapi_version(root);
        self.info(root);
        self.components(root);

        if let Some(servers) = root.get("servers") {
            self.servers(servers, "/servers");
        }
        if let Some(security) = root.get("security") {
            self.security(security, "/security");
        }
        if let Some(tags) = root.get("tags") {
            self.tags(tags);
        }
        if let Some(docs) = root.get("externalDocs") {
            self.external_docs(docs, "/externalDocs");
        }

        match root.get("paths") {
            Some(Value::Object(paths)) => {
                for (path, item) in paths.iter().filter(|(key, _)| !is_extension(key)) {
                    self.path_item(path, item);
                }
            }
            Some(_) => self.report("/paths", "'paths' must be an object"),
            None => self.report("", "Missing required field 'paths'"),
        }

        self.references(doc, "");
    }

    fn openapi_version(&mut self, root: &Map<String, Value>) {
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        match root.get("openapi").and_then(Value::as_str) {
            Some(version) if matches(&VERSION, OPENAPI_VERSION_PATTERN, version) => {}
            Some(version) => self.report(
                "/openapi",
                format!("Unsupported OpenAPI version '{}', expected 3.x.y", version),
            ),
            None => self.report("", "Missing required field 'openapi'"),
        }
    }

    fn info(&mut self, root: &Map<String, Value>) {
        let Some(info) = root.get("info").and_then(Value::as_object) else {
            self.report("", "Missing required object 'info'");
            return;
        };
        for field in ["title", "version"] {
            if non_empty_str(info, field).is_none() {
                self.report("/info", format!("'info.{}' must be a non-empty string", field));
            }
        }
    }

    fn components(&mut self, root: &'a Map<String, Value>) {
        let Some(components) = root.get("components").and_then(Value::as_object) else {
            return;
        };
        for (section, entries) in components {
            if is_extension(section) {
                continue;
            }
            let Some(entries) = entries.as_object() else {
                continue;
            };
            let at = child("/components", section);
            for (key, entry) in entries {
                let entry_at = child(&at, key);
                if !is_valid_component_key(key) {
                    self.report(
                        &entry_at,
                        format!("Component key '{}' must match ^[a-zA-Z0-9._-]+$", key),
                    );
                }
                if entry.get("$ref").is_some() {
                    continue;
                }
                match section.as_str() {
                    "securitySchemes" => {
                        self.security_schemes.insert(key.clone());
                    }
                    "parameters" => {
                        self.parameter(entry, &entry_at);
                    }
                    "requestBodies" => self.request_body(entry, &entry_at),
                    _ => {}
                }
            }
        }
    }

    fn tags(&mut self, tags: &Value) {
        let Some(tags) = tags.as_array() else {
            self.report("/tags", "'tags' must be an array");
            return;
        };
        let mut seen = HashSet::new();
        for (idx, tag) in tags.iter().enumerate() {
            let pointer = format!("/tags/{}", idx);
            let Some(name) = tag.as_object().and_then(|t| non_empty_str(t, "name")) else {
                self.report(pointer, "Tag must have a non-empty 'name'");
                continue;
            };
            if !seen.insert(name.to_string()) {
                self.report(&pointer, format!("Duplicate tag name '{}'", name));
            }
            if let Some(docs) = tag.get("externalDocs") {
                self.external_docs(docs, &child(&pointer, "externalDocs"));
            }
        }
    }

    fn servers(&mut self, servers: &Value, pointer: &str) {
        let Some(servers) = servers.as_array() else {
            self.report(pointer, "'servers' must be an array");
            return;
        };
        for (idx, server) in servers.iter().enumerate() {
            let at = format!("{}/{}", pointer, idx);
            let Some(url) = server.get("url").and_then(Value::as_str) else {
                self.report(at, "Server must have a 'url'");
                continue;
            };
            let variables = server.get("variables").and_then(Value::as_object);
            let mut resolved = url.to_string();
            for name in path_template_names(url) {
                match variables
                    .and_then(|vars| vars.get(&name))
                    .and_then(|var| var.get("default"))
                    .and_then(Value::as_str)
                {
                    Some(default) => {
                        resolved = resolved.replace(&format!("{{{}}}", name), default);
                    }
                    None => self.report(
                        child(&at, "url"),
                        format!("Server variable '{}' has no declared default", name),
                    ),
                }
            }
            if !is_valid_uri_reference(&resolved) {
                self.report(
                    child(&at, "url"),
                    format!("Server url '{}' is not a valid URL", url),
                );
            }
        }
    }

    fn external_docs(&mut self, docs: &Value, pointer: &str) {
        match docs.get("url").and_then(Value::as_str) {
            Some(url) if is_valid_uri_reference(url) => {}
            Some(url) => self.report(
                child(pointer, "url"),
                format!("External docs url '{}' is not a valid URL", url),
            ),
            None => self.report(pointer, "External docs must have a 'url'"),
        }
    }

    fn security(&mut self, security: &Value, pointer: &str) {
        let Some(requirements) = security.as_array() else {
            self.report(pointer, "'security' must be an array");
            return;
        };
        for (idx, requirement) in requirements.iter().enumerate() {
            let Some(requirement) = requirement.as_object() else {
                self.report(format!("{}/{}", pointer, idx), "Security requirement must be an object");
                continue;
            };
            for name in requirement.keys() {
                if !self.security_schemes.contains(name) {
                    self.report(
                        child(&format!("{}/{}", pointer, idx), name),
                        format!("Security scheme '{}' is not declared in components", name),
                    );
                }
            }
        }
    }

    fn path_item(&mut self, path: &str, item: &'a Value) {
        let pointer = child("/paths", path);
        if !path.starts_with('/') {
            self.report(&pointer, format!("Path '{}' must start with '/'", path));
        }
        let Some(item) = item.as_object() else {
            self.report(pointer, "Path item must be an object");
            return;
        };

        let template = path_template_names(path);
        let shared = self.parameter_list(item.get("parameters"), &child(&pointer, "parameters"));
        for method in Method::ALL {
            if let Some(operation) = item.get(method.as_str()) {
                self.operation(
                    operation,
                    &child(&pointer, method.as_str()),
                    &template,
                    &shared,
                );
            }
        }
    }

    fn operation(
        &mut self,
        operation: &'a Value,
        pointer: &str,
        template: &[String],
        shared: &[ParameterKey],
    ) {
        let Some(operation) = operation.as_object() else {
            self.report(pointer, "Operation must be an object");
            return;
        };

        if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
            if let Some(first) = self.operation_ids.get(id) {
                let message = format!("Duplicate operationId '{}' (first used at {})", id, first);
                self.report(child(pointer, "operationId"), message);
            } else {
                self.operation_ids
                    .insert(id.to_string(), pointer.to_string());
            }
        }

        // Path item parameters apply to every operation beneath it.
        let own = self.parameter_list(operation.get("parameters"), &child(pointer, "parameters"));
        let mut path_params: Vec<&str> = Vec::new();
        for key in shared.iter().chain(own.iter()).filter(|key| key.is_path()) {
            if !path_params.contains(&key.name.as_str()) {
                path_params.push(&key.name);
            }
        }
        for name in template {
            if !path_params.contains(&name.as_str()) {
                self.report(
                    pointer,
                    format!("Path template parameter '{}' has no matching path parameter", name),
                );
            }
        }
        for name in path_params {
            if !template.iter().any(|t| t == name) {
                self.report(
                    pointer,
                    format!("Path parameter '{}' does not appear in the path template", name),
                );
            }
        }

        if let Some(body) = operation.get("requestBody") {
            self.request_body(body, &child(pointer, "requestBody"));
        }
        self.responses(operation.get("responses"), pointer);

        if let Some(security) = operation.get("security") {
            self.security(security, &child(pointer, "security"));
        }
        if let Some(servers) = operation.get("servers") {
            self.servers(servers, &child(pointer, "servers"));
        }
        if let Some(docs) = operation.get("externalDocs") {
            self.external_docs(docs, &child(pointer, "externalDocs"));
        }
    }

    /// Checks a `parameters` array and returns the keys it declares, in order.
    ///
    /// `$ref` entries are followed but not re-checked; dangling ones are
    /// reported by the reference walk.
    fn parameter_list(&mut self, parameters: Option<&'a Value>, pointer: &str) -> Vec<ParameterKey> {
        let Some(parameters) = parameters else {
            return Vec::new();
        };
        let Some(parameters) = parameters.as_array() else {
            self.report(pointer, "'parameters' must be an array");
            return Vec::new();
        };

        let mut keys: Vec<ParameterKey> = Vec::new();
        for (idx, parameter) in parameters.iter().enumerate() {
            let at = format!("{}/{}", pointer, idx);
            let key = if parameter.get("$ref").is_some() {
                self.dereference(parameter).and_then(ParameterKey::of)
            } else {
                self.parameter(parameter, &at)
            };
            let Some(key) = key else {
                continue;
            };
            if keys.contains(&key) {
                self.report(
                    at,
                    format!("Duplicate parameter '{}' in {}", key.name, key.location),
                );
            } else {
                keys.push(key);
            }
        }
        keys
    }

    fn parameter(&mut self, parameter: &Value, pointer: &str) -> Option<ParameterKey> {
        let Some(object) = parameter.as_object() else {
            self.report(pointer, "Parameter must be an object");
            return None;
        };
        if non_empty_str(object, "name").is_none() {
            self.report(pointer, "Parameter must have a non-empty 'name'");
        }

        let location = object.get("in").and_then(Value::as_str);
        match location {
            Some(loc) if PARAMETER_LOCATIONS.contains(&loc) => {}
            Some(loc) => self.report(
                child(pointer, "in"),
                format!("Parameter location '{}' must be one of path, query, header, cookie", loc),
            ),
            None => self.report(pointer, "Parameter must declare 'in'"),
        }

        match (object.contains_key("schema"), object.get("content")) {
            (true, None) => {}
            (true, Some(_)) => self.report(pointer, "Parameter must not define both 'schema' and 'content'"),
            (false, None) => self.report(pointer, "Parameter must define either 'schema' or 'content'"),
            (false, Some(content)) => {
                if content.as_object().map(Map::len) != Some(1) {
                    self.report(
                        child(pointer, "content"),
                        "Parameter 'content' must contain exactly one media type",
                    );
                }
            }
        }

        if location == Some("path") && object.get("required").and_then(Value::as_bool) != Some(true) {
            self.report(pointer, "Path parameters must be required");
        }
        ParameterKey::of(parameter).filter(|key| !key.name.trim().is_empty())
    }

    fn request_body(&mut self, body: &Value, pointer: &str) {
        if body.get("$ref").is_some() {
            return;
        }
        let has_content = body
            .get("content")
            .and_then(Value::as_object)
            .map(|content| !content.is_empty())
            .unwrap_or(false);
        if !has_content {
            self.report(pointer, "Request body must declare at least one media type in 'content'");
        }
    }

    fn responses(&mut self, responses: Option<&Value>, pointer: &str) {
        static RESPONSE_KEY: OnceLock<Option<Regex>> = OnceLock::new();
        let at = child(pointer, "responses");
        let responses = match responses.and_then(Value::as_object) {
            Some(responses) if !responses.is_empty() => responses,
            Some(_) => {
                self.report(at, "Operation must declare at least one response");
                return;
            }
            None => {
                self.report(pointer, "Missing required field 'responses'");
                return;
            }
        };
        for (code, response) in responses.iter().filter(|(key, _)| !is_extension(key)) {
            let response_at = child(&at, code);
            if !matches(&RESPONSE_KEY, RESPONSE_KEY_PATTERN, code) {
                self.report(
                    &response_at,
                    format!("Response key '{}' must be 'default', a status code or a range like 2XX", code),
                );
            }
            let described = response
                .as_object()
                .map(|r| r.contains_key("$ref") || r.get("description").map(Value::is_string) == Some(true))
                .unwrap_or(false);
            if !described {
                self.report(response_at, "Response must have a 'description'");
            }
        }
    }

    fn references(&mut self, node: &Value, pointer: &str) {
        match node {
            Value::Object(object) => {
                if let Some(target) = object.get("$ref").and_then(Value::as_str) {
                    self.reference(target, pointer);
                }
                for (key, value) in object {
                    // Example payloads are opaque data.
                    let is_example = key == "example" || key == "examples";
                    if is_example && !pointer.ends_with("/properties") {
                        continue;
                    }
                    self.references(value, &child(pointer, key));
                }
            }
            Value::Array(items) => {
                for (idx, value) in items.iter().enumerate() {
                    self.references(value, &format!("{}/{}", pointer, idx));
                }
            }
            _ => {}
        }
    }

    fn reference(&mut self, target: &str, pointer: &str) {
        let at = child(pointer, "$ref");
        if !target.starts_with('#') {
            // External documents are never fetched.
            if !is_valid_uri_reference(target) {
                self.report(at, format!("Reference '{}' is not a valid URI reference", target));
            }
            return;
        }
        if resolve_local_ref(self.root, target).is_some() {
            return;
        }
        let message = match extract_component_name(target, "schemas") {
            Some(_) => format!("Reference '{}' does not resolve to a component schema", target),
            None => format!("Reference '{}' does not resolve within the document", target),
        };
        self.report(at, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn validate(doc: Value) -> Vec<Diagnostic> {
        StructuralValidator::new().validate_value(&doc)
    }

    fn messages(doc: Value) -> Vec<String> {
        validate(doc).into_iter().map(|d| d.message).collect()
    }

    fn valid_doc() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1.0"},
            "servers": [{"url": "https://{region}.example.com/v1", "variables": {"region": {"default": "eu"}}}],
            "paths": {
                "/pets/{id}": {
                    "get": {
                        "operationId": "getPet",
                        "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}],
                        "responses": {
                            "200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}},
                            "4XX": {"description": "client error"}
                        },
                        "security": [{"bearer": []}]
                    }
                }
            },
            "components": {
                "schemas": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}},
                "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}}
            },
            "tags": [{"name": "pets"}]
        })
    }

    #[test]
    fn test_valid_document_has_no_diagnostics() {
        assert_eq!(validate(valid_doc()), vec![]);
    }

    #[test]
    fn test_invalid_json_and_root() {
        let diags = StructuralValidator::new().validate("{not json");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("Invalid JSON"));

        assert_eq!(messages(json!([])), vec!["Document root must be an object"]);
    }

    #[test]
    fn test_version_and_info() {
        let mut doc = valid_doc();
        doc["openapi"] = json!("2.0");
        doc["info"]["title"] = json!("");
        let msgs = messages(doc);
        assert!(msgs.contains(&"Unsupported OpenAPI version '2.0', expected 3.x.y".to_string()));
        assert!(msgs.contains(&"'info.title' must be a non-empty string".to_string()));
    }

    #[test]
    fn test_dangling_ref_is_reported_with_pointer() {
        let mut doc = valid_doc();
        doc["components"]["schemas"] = json!({});
        let diags = validate(doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].pointer,
            "/paths/~1pets~1{id}/get/responses/200/content/application~1json/schema/$ref"
        );
    }

    #[test]
    fn test_path_parameter_rules() {
        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["get"]["parameters"][0]["required"] = json!(false);
        doc["paths"]["/pets/{id}"]["get"]["parameters"][0]["content"] = json!({});
        let msgs = messages(doc);
        assert!(msgs.contains(&"Path parameters must be required".to_string()));
        assert!(msgs.contains(&"Parameter must not define both 'schema' and 'content'".to_string()));

        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["get"]["parameters"] = json!([]);
        assert_eq!(
            messages(doc),
            vec!["Path template parameter 'id' has no matching path parameter"]
        );
    }

    #[test]
    fn test_path_item_parameters_apply_to_operations() {
        let mut doc = valid_doc();
        let params = doc["paths"]["/pets/{id}"]["get"]["parameters"].take();
        doc["paths"]["/pets/{id}"]["get"]
            .as_object_mut()
            .unwrap()
            .remove("parameters");
        doc["paths"]["/pets/{id}"]["parameters"] = params;
        assert_eq!(validate(doc), vec![]);
    }

    #[test]
    fn test_referenced_parameters_are_followed() {
        let mut doc = valid_doc();
        doc["components"]["parameters"] = json!({
            "Id": {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}},
            "Limit": {"$ref": "#/components/parameters/PageSize"},
            "PageSize": {"name": "limit", "in": "query", "schema": {"type": "integer"}}
        });
        doc["paths"]["/pets/{id}"]["get"]["parameters"] = json!([
            {"$ref": "#/components/parameters/Id"},
            {"$ref": "#/components/parameters/Limit"}
        ]);
        assert_eq!(validate(doc), vec![]);

        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["get"]["parameters"] =
            json!([{"$ref": "#/components/parameters/Missing"}]);
        assert_eq!(
            messages(doc),
            vec![
                "Path template parameter 'id' has no matching path parameter",
                "Reference '#/components/parameters/Missing' does not resolve within the document",
            ]
        );
    }

    #[test]
    fn test_refs_into_any_component_section() {
        let mut doc = valid_doc();
        doc["components"]["responses"] = json!({"NotFound": {"description": "missing"}});
        doc["components"]["requestBodies"] = json!({
            "NewPet": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}
        });
        doc["paths"]["/pets/{id}"]["get"]["responses"]["404"] =
            json!({"$ref": "#/components/responses/NotFound"});
        doc["paths"]["/pets/{id}"]["put"] = json!({
            "requestBody": {"$ref": "#/components/requestBodies/NewPet"},
            "responses": {"204": {"description": "stored"}}
        });
        doc["paths"]["/pets/{id}"]["parameters"] =
            doc["paths"]["/pets/{id}"]["get"]["parameters"].clone();
        doc["paths"]["/pets/{id}"]["get"]["parameters"] = json!([]);
        doc["paths"]["/pets/{id}"]["get"]["responses"]["500"] =
            json!({"$ref": "errors.yaml#/components/responses/ServerError"});
        assert_eq!(validate(doc), vec![]);
    }

    #[test]
    fn test_parameter_and_request_body_content_rules() {
        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["parameters"] =
            doc["paths"]["/pets/{id}"]["get"]["parameters"].clone();
        doc["paths"]["/pets/{id}"]["get"]["parameters"] = json!([{
            "name": "filter",
            "in": "query",
            "content": {"application/json": {}, "text/plain": {}}
        }]);
        doc["paths"]["/pets/{id}"]["post"] = json!({
            "requestBody": {"content": {}},
            "responses": {"201": {"description": "created"}}
        });
        let diags = validate(doc);
        assert_eq!(
            diags,
            vec![
                Diagnostic::new(
                    "/paths/~1pets~1{id}/get/parameters/0/content",
                    "Parameter 'content' must contain exactly one media type"
                ),
                Diagnostic::new(
                    "/paths/~1pets~1{id}/post/requestBody",
                    "Request body must declare at least one media type in 'content'"
                ),
            ]
        );
    }

    #[test]
    fn test_duplicate_parameters_are_reported() {
        let mut doc = valid_doc();
        let params = doc["paths"]["/pets/{id}"]["get"]["parameters"]
            .as_array_mut()
            .unwrap();
        let id = params[0].clone();
        params.push(id);
        assert_eq!(messages(doc), vec!["Duplicate parameter 'id' in path"]);
    }

    #[test]
    fn test_path_parameter_diagnostics_follow_declaration_order() {
        let mut doc = valid_doc();
        doc["paths"] = json!({
            "/a/{x}/{y}/{z}": {
                "get": {
                    "parameters": [
                        {"name": "c", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "a", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "b", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        });
        for _ in 0..5 {
            assert_eq!(
                messages(doc.clone()),
                vec![
                    "Path template parameter 'x' has no matching path parameter",
                    "Path template parameter 'y' has no matching path parameter",
                    "Path template parameter 'z' has no matching path parameter",
                    "Path parameter 'c' does not appear in the path template",
                    "Path parameter 'a' does not appear in the path template",
                    "Path parameter 'b' does not appear in the path template",
                ]
            );
        }
    }

    #[test]
    fn test_extension_keys_are_not_paths_or_responses() {
        let mut doc = valid_doc();
        doc["paths"]["x-owner"] = json!("pets-team");
        doc["paths"]["/pets/{id}"]["get"]["responses"]["x-cache"] = json!(true);
        doc["components"]["x-generated"] = json!(true);
        assert_eq!(validate(doc), vec![]);
    }

    #[test]
    fn test_response_rules() {
        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["get"]["responses"]["2000"] = json!({});
        let msgs = messages(doc);
        assert!(msgs.iter().any(|m| m.starts_with("Response key '2000'")));
        assert!(msgs.contains(&"Response must have a 'description'".to_string()));

        let mut doc = valid_doc();
        doc["paths"]["/pets/{id}"]["get"]["responses"] = json!({});
        assert_eq!(messages(doc), vec!["Operation must declare at least one response"]);
    }

    #[test]
    fn test_uniqueness_rules() {
        let mut doc = valid_doc();
        doc["tags"] = json!([{"name": "pets"}, {"name": "pets"}]);
        let op = doc["paths"]["/pets/{id}"]["get"].clone();
        doc["paths"]["/pets/{id}"]["put"] = op;
        let msgs = messages(doc);
        assert!(msgs.contains(&"Duplicate tag name 'pets'".to_string()));
        assert!(msgs.iter().any(|m| m.starts_with("Duplicate operationId 'getPet'")));
    }

    #[test]
    fn test_security_and_urls() {
        let mut doc = valid_doc();
        doc["security"] = json!([{"apiKey": []}]);
        doc["externalDocs"] = json!({"url": "not a url"});
        doc["servers"][0]["url"] = json!("https://{tenant}.example.com");
        let msgs = messages(doc);
        assert!(msgs.contains(&"Security scheme 'apiKey' is not declared in components".to_string()));
        assert!(msgs.contains(&"External docs url 'not a url' is not a valid URL".to_string()));
        assert!(msgs.contains(&"Server variable 'tenant' has no declared default".to_string()));
    }

    #[test]
    fn test_relative_server_url_is_accepted() {
        let mut doc = valid_doc();
        doc["servers"] = json!([{"url": "/api"}]);
        assert_eq!(validate(doc), vec![]);
    }

    #[test]
    fn test_validate_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", valid_doc()).unwrap();
        assert_eq!(StructuralValidator::new().validate_file(file.path()), vec![]);

        let missing = StructuralValidator::new().validate_file(Path::new("/nonexistent/openapi.json"));
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.starts_with("Failed to read"));
    }

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(Diagnostic::new("", "bad").to_string(), "/: bad");
        assert_eq!(Diagnostic::new("/info", "bad").to_string(), "/info: bad");
    }
}

#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Shared helpers for building and reading `$ref` pointers into
//! `#/components/schemas`.
//!
//! These utilities never fetch external documents: a reference either points
//! into the current document's components or it is treated as foreign.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Prefix of every schema component pointer.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

const COMPONENT_KEY_PATTERN: &str = r"^[a-zA-Z0-9._-]+$";

/// Builds the `$ref` pointer for a schema component key.
pub fn schema_pointer(key: &str) -> String {
    format!("{}{}", SCHEMA_REF_PREFIX, encode_pointer_segment(key))
}

/// Returns true when `key` is a legal component key (`^[a-zA-Z0-9._-]+$`).
pub fn is_valid_component_key(key: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(COMPONENT_KEY_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(key))
        .unwrap_or(false)
}

/// Extracts a component name from a `$ref` if it points to `#/components/{section}/{name}`.
///
/// Returns `None` for external references or other sections.
pub fn extract_component_name(ref_str: &str, section: &str) -> Option<String> {
    let pointer = ref_str.strip_prefix("#/")?;
    let segments: Vec<&str> = pointer.split('/').collect();

    if segments.len() != 3 {
        return None;
    }
    if segments[0] != "components" || segments[1] != section {
        return None;
    }

    let name = decode_pointer_segment(segments[2]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Resolves a same-document reference (`#/a/b`) against `root`.
///
/// Returns `None` for external references and for pointers that lead nowhere.
pub fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    pointer
        .strip_prefix('/')?
        .split('/')
        .try_fold(root, |node, segment| {
            let key = decode_pointer_segment(segment);
            match node {
                Value::Object(map) => map.get(&key),
                Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
                _ => None,
            }
        })
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Encodes a JSON Pointer segment (`~` to `~0`, `/` to `~1`).
pub(crate) fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

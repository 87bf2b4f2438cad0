#![deny(missing_docs)]

//! # Component Registry
//!
//! Accumulates one schema per distinct type, keyed by the type's simple name,
//! and produces the `components.schemas` map in first-registration order.
//!
//! Registration is idempotent by type identity: the resolver runs at most once
//! per type. Two distinct types sharing a key are a naming collision, handled
//! according to the registry's [`CollisionPolicy`].

use crate::error::{AppError, AppResult};
use crate::oas::ref_utils::is_valid_component_key;
use crate::oas::schemas::SchemaNode;
use crate::oas::token::{ReferenceToken, SchemaRef};
use crate::schema_generator::SchemaResolver;
use crate::type_mapping::{TypeDescriptor, TypeIdentity};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// What to do when two distinct types map to the same component key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail with [`AppError::NamingCollision`].
    #[default]
    Reject,
    /// Replace the earlier entry, keeping its position.
    Overwrite,
}

#[derive(Debug, Clone)]
struct Entry {
    identity: TypeIdentity,
    type_name: String,
    schema: SchemaNode,
}

/// The de-duplicated store of component schemas for one document.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    policy: CollisionPolicy,
    resolver: SchemaResolver,
    entries: IndexMap<String, Entry>,
    resolved: HashMap<TypeIdentity, String>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The collision policy in force.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Registers the token's type and returns its reference.
    pub fn register(&mut self, token: &ReferenceToken) -> AppResult<SchemaRef> {
        self.register_descriptor(token.descriptor())
    }

    /// Registers a type and returns its reference.
    ///
    /// Types the schema defers (separately registered members, recursive
    /// back-edges) are registered right after it.
    pub fn register_descriptor(&mut self, ty: &TypeDescriptor) -> AppResult<SchemaRef> {
        if let Some(key) = self.resolved.get(ty.identity()) {
            return Ok(SchemaRef::new(key.clone()));
        }

        let key = canonical_key(ty)?;
        self.check_collision(&key, ty)?;

        // Marked before resolving deferred types so self-references stop here.
        self.resolved.insert(ty.identity().clone(), key.clone());

        let resolution = self.resolver.resolve(ty);
        debug!(key = %key, type_name = ty.name(), "registered component schema");
        self.entries.insert(
            key.clone(),
            Entry {
                identity: ty.identity().clone(),
                type_name: ty.name().to_string(),
                schema: resolution.schema,
            },
        );

        for deferred in &resolution.deferred {
            self.register_descriptor(deferred)?;
        }

        Ok(SchemaRef::new(key))
    }

    /// Resolves a type in place, registering only the types its schema defers.
    pub fn resolve_inline(&mut self, ty: &TypeDescriptor) -> AppResult<SchemaNode> {
        let resolution = self.resolver.resolve(ty);
        for deferred in &resolution.deferred {
            self.register_descriptor(deferred)?;
        }
        Ok(resolution.schema)
    }

    fn check_collision(&mut self, key: &str, ty: &TypeDescriptor) -> AppResult<()> {
        let Some(existing) = self.entries.get(key) else {
            return Ok(());
        };
        if existing.identity == *ty.identity() {
            return Ok(());
        }

        match self.policy {
            CollisionPolicy::Reject => Err(AppError::NamingCollision {
                key: key.to_string(),
                existing: existing.type_name.clone(),
                incoming: ty.name().to_string(),
            }),
            CollisionPolicy::Overwrite => {
                warn!(
                    key,
                    existing = %existing.type_name,
                    incoming = ty.name(),
                    "component key collision, overwriting earlier schema"
                );
                Ok(())
            }
        }
    }

    /// The schema stored under `key`.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.entries.get(key).map(|entry| &entry.schema)
    }

    /// Whether `key` is registered.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the type has been registered.
    pub fn contains_type(&self, identity: &TypeIdentity) -> bool {
        self.resolved.contains_key(identity)
    }

    /// Number of component entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no component has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Component keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.schema))
    }

    /// The `components.schemas` map in registration order.
    pub fn snapshot(&self) -> IndexMap<String, SchemaNode> {
        self.iter()
            .map(|(key, schema)| (key.to_string(), schema.clone()))
            .collect()
    }
}

fn canonical_key(ty: &TypeDescriptor) -> AppResult<String> {
    let key = ty.canonical_key();
    if is_valid_component_key(&key) {
        Ok(key)
    } else {
        Err(AppError::UnresolvableType {
            type_name: ty.name().to_string(),
            reason: format!(
                "'{}' is not a valid component key (expected ^[a-zA-Z0-9._-]+$)",
                key
            ),
        })
    }
}

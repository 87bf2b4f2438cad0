#![deny(missing_docs)]

//! # OAS DSL Core
//!
//! Builds OpenAPI 3 documents from Rust data-model types: derives one
//! schema per referenced type, collects them into `components.schemas`,
//! rewrites every usage into a `$ref`, then serializes and validates the
//! result.

/// Shared error types.
pub mod error;

/// Type descriptors (Rust -> schema shape).
pub mod type_mapping;

/// Schema derivation from type descriptors.
pub mod schema_generator;

/// OpenAPI document model, assembly, serialization and validation.
pub mod oas;

pub use error::{AppError, AppResult};
pub use oas::{
    finalize, render, render_with, serialize, serialize_pretty, to_value, to_yaml,
    write_temp_file, AssemblerOptions, CollisionPolicy, ComponentRegistry, Components, Content,
    Diagnostic, Document, DocumentAssembler, Info, MediaType, Method, Operation, Parameter,
    RenderedDocument, RequestBody, Response, SchemaNode, StructuralValidator, Validator,
};
pub use schema_generator::{Resolution, SchemaResolver};
pub use type_mapping::{Describe, MemberType, PrimitiveKind, TypeDescriptor, TypeIdentity, TypeShape};

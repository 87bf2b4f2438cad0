//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Only `Io`, `Json`, `Yaml` and `General` take part in `From` conversions;
/// the assembly failures are always built explicitly so the offending type
/// names travel with them.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML (de)serialization errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// A type cannot be turned into a component schema at all.
    #[from(ignore)]
    #[display("Unresolvable type '{type_name}': {reason}")]
    UnresolvableType {
        /// Qualified name of the type.
        type_name: String,
        /// Why no component could be derived.
        reason: String,
    },

    /// Two distinct types map to the same component key.
    #[from(ignore)]
    #[display("Naming collision on component '{key}': '{existing}' is already registered, cannot add '{incoming}'")]
    NamingCollision {
        /// The shared component key.
        key: String,
        /// Qualified name of the type registered first.
        existing: String,
        /// Qualified name of the type being registered.
        incoming: String,
    },

    /// A reference without a matching registry entry at serialization time.
    #[from(ignore)]
    #[display("Dangling reference: {_0}")]
    DanglingReference(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

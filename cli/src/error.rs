#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use oasdsl_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Assembly, serialization or output failure from the core.
    #[display("{}", _0)]
    Core(AppError),

    /// The manifest could not be read or is inconsistent.
    #[from(ignore)]
    #[display("Invalid manifest: {}", _0)]
    Manifest(String),

    /// The document was produced but the validator reported findings.
    #[from(ignore)]
    #[display("Document has {} validation finding(s)", _0)]
    Invalid(usize),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
///
/// `derive(Error)` is not used because the `String` variants would need a
/// `source()` they cannot provide.
impl std::error::Error for CliError {}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Core(AppError::Json(value))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(value: serde_yaml::Error) -> Self {
        CliError::Core(AppError::Yaml(value))
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;

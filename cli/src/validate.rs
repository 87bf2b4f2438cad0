#![deny(missing_docs)]

//! # Validate Command
//!
//! Runs the structural validator over an existing OpenAPI document.

use crate::error::{CliError, CliResult};
use oasdsl_core::{Diagnostic, StructuralValidator, Validator};
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the validate command.
#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    /// The document to check (.json, .yaml or .yml).
    pub file: PathBuf,
}

/// Validates the file, reading YAML documents through `serde_yaml`.
pub fn check(path: &Path) -> CliResult<Vec<Diagnostic>> {
    if !path.exists() {
        return Err(CliError::General(format!(
            "Document not found: {}",
            path.display()
        )));
    }
    let validator = StructuralValidator::new();
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if !is_yaml {
        return Ok(validator.validate_file(path));
    }
    let value: serde_json::Value = serde_yaml::from_str(&fs::read_to_string(path)?)?;
    Ok(validator.validate_value(&value))
}

/// Executes the validate command.
pub fn execute(args: &ValidateArgs) -> CliResult<()> {
    let diagnostics = check(&args.file)?;
    if diagnostics.is_empty() {
        println!("{}: valid", args.file.display());
        return Ok(());
    }
    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }
    Err(CliError::Invalid(diagnostics.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("api.json");
        fs::write(
            &json,
            r#"{"openapi":"3.0.3","info":{"title":"T","version":"1"},"paths":{}}"#,
        )
        .unwrap();
        assert!(check(&json).unwrap().is_empty());

        let yaml = dir.path().join("api.yaml");
        fs::write(&yaml, "openapi: 3.0.3\ninfo: {title: T, version: '1'}\n").unwrap();
        let diagnostics = check(&yaml).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Missing required field 'paths'");
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            file: PathBuf::from("/nonexistent/api.json"),
        };
        assert!(matches!(execute(&args), Err(CliError::General(_))));
    }
}

#![deny(missing_docs)]

//! # Assemble Command
//!
//! Manifest -> Document -> finalized, validated OpenAPI JSON or YAML.

use crate::error::{CliError, CliResult};
use crate::manifest::Manifest;
use oasdsl_core::{
    render_with, AssemblerOptions, CollisionPolicy, Diagnostic, DocumentAssembler,
    StructuralValidator,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output encodings.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// Picks the format from an explicit flag, then the output extension.
    fn resolve(explicit: Option<Self>, output: Option<&Path>) -> Self {
        if let Some(format) = explicit {
            return format;
        }
        match output.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Json,
        }
    }
}

/// Arguments for the assemble command.
#[derive(clap::Args, Debug, Clone)]
pub struct AssembleArgs {
    /// Path to the API manifest (.yaml, .yml or .json).
    #[clap(long, env = "OASDSL_MANIFEST")]
    pub manifest: PathBuf,

    /// Output path. Prints to stdout when omitted.
    #[clap(long, env = "OASDSL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format. Defaults to the output extension, then JSON.
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Let a later type replace an earlier one on a component key clash.
    #[clap(long)]
    pub allow_overwrite: bool,
}

/// The rendered text and what the validator said about it.
#[derive(Debug, Clone)]
pub struct Assembled {
    /// Document text in the requested format.
    pub text: String,
    /// Validator findings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders a manifest without touching the filesystem.
pub fn assemble(
    manifest: &Manifest,
    policy: CollisionPolicy,
    format: OutputFormat,
) -> CliResult<Assembled> {
    let doc = manifest.to_document()?;
    let assembler =
        DocumentAssembler::new(AssemblerOptions::default().with_collision_policy(policy));
    let rendered = render_with(&assembler, doc, &StructuralValidator::new())?;

    let value = rendered.as_value()?;
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&value)?,
    };
    Ok(Assembled {
        text,
        diagnostics: rendered.diagnostics,
    })
}

/// Executes the assemble command.
///
/// The document is written even when the validator reports findings; the
/// command then fails with [`CliError::Invalid`].
pub fn execute(args: &AssembleArgs) -> CliResult<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let policy = if args.allow_overwrite {
        CollisionPolicy::Overwrite
    } else {
        CollisionPolicy::Reject
    };
    let format = OutputFormat::resolve(args.format, args.output.as_deref());
    let assembled = assemble(&manifest, policy, format)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &assembled.text)?;
            info!(output = %path.display(), "wrote OpenAPI document");
        }
        None => println!("{}", assembled.text),
    }

    if assembled.diagnostics.is_empty() {
        return Ok(());
    }
    for diagnostic in &assembled.diagnostics {
        warn!(pointer = %diagnostic.pointer, "{}", diagnostic.message);
        eprintln!("{}", diagnostic);
    }
    Err(CliError::Invalid(assembled.diagnostics.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
info:
  title: Notes
  version: "0.3"
models:
  Note:
    properties:
      id: uuid
      body: string
      created: date-time
paths:
  /notes:
    get:
      responses:
        "200":
          description: Notes
          content:
            application/json: "[Note]"
"#;

    #[test]
    fn test_format_resolution() {
        assert_eq!(OutputFormat::resolve(None, None), OutputFormat::Json);
        assert_eq!(
            OutputFormat::resolve(None, Some(Path::new("out/api.yml"))),
            OutputFormat::Yaml
        );
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Json), Some(Path::new("api.yaml"))),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_assemble_yaml() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let assembled = assemble(&manifest, CollisionPolicy::Reject, OutputFormat::Yaml).unwrap();
        assert!(assembled.diagnostics.is_empty(), "{:?}", assembled.diagnostics);
        let value: serde_json::Value = serde_yaml::from_str(&assembled.text).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(
            value["paths"]["/notes"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"]["$ref"],
            "#/components/schemas/NoteList"
        );
    }

    #[test]
    fn test_execute_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("notes.yaml");
        std::fs::write(&manifest, MANIFEST).unwrap();
        let output = dir.path().join("build").join("openapi.json");

        let args = AssembleArgs {
            manifest,
            output: Some(output.clone()),
            format: None,
            allow_overwrite: false,
        };
        execute(&args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            written["components"]["schemas"]["NoteList"]["items"]["properties"]["id"],
            serde_json::json!({"type": "string", "format": "uuid"})
        );
    }

    #[test]
    fn test_execute_fails_on_findings() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("broken.yaml");
        std::fs::write(
            &manifest,
            "info: {title: Broken, version: '1'}\npaths:\n  /items/{id}:\n    get:\n      responses: {'200': {description: ok}}\n",
        )
        .unwrap();
        let args = AssembleArgs {
            manifest,
            output: Some(dir.path().join("out.json")),
            format: None,
            allow_overwrite: false,
        };
        let err = execute(&args).unwrap_err();
        assert!(matches!(err, CliError::Invalid(1)));
    }
}

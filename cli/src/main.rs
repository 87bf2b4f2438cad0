#![deny(missing_docs)]

//! # OAS DSL CLI
//!
//! Command Line Interface for assembling OpenAPI documents.
//!
//! Supported Commands:
//! - `assemble`: Manifest -> finalized, validated OpenAPI document.
//! - `validate`: Structural checks on an existing OpenAPI document.

use crate::error::CliResult;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod assemble;
mod error;
mod manifest;
mod validate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI document assembler")]
struct Cli {
    /// Log assembly steps (overridden by RUST_LOG).
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds an OpenAPI document from an API manifest.
    Assemble(assemble::AssembleArgs),
    /// Validates an existing OpenAPI document.
    Validate(validate::ValidateArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Assemble(args) => assemble::execute(args)?,
        Commands::Validate(args) => validate::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_assemble_flags() {
        let cli = Cli::try_parse_from([
            "oasdsl",
            "assemble",
            "--manifest",
            "api.yaml",
            "--format",
            "yaml",
            "--allow-overwrite",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Assemble(args) => {
                assert_eq!(args.manifest, std::path::PathBuf::from("api.yaml"));
                assert_eq!(args.format, Some(assemble::OutputFormat::Yaml));
                assert!(args.allow_overwrite);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

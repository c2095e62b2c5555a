//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{ast, diff, init, select, validate};
use crate::storage::Config;
use crate::validation::Severity;

#[derive(Parser)]
#[command(name = "shape")]
#[command(author, version, about = "Build, validate and query shape models")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new shape project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Assemble and validate a model
    Validate {
        /// Model files or directories (defaults to the configured sources)
        files: Vec<PathBuf>,

        /// Minimum severity to report (note, warning, danger, error)
        #[arg(long, short)]
        severity: Option<Severity>,
    },

    /// Print the shapes matched by a selector
    Select {
        /// Selector expression, e.g. `structure > member [trait|required]`
        expression: String,

        /// Model files or directories (defaults to the configured sources)
        files: Vec<PathBuf>,
    },

    /// Print the assembled model as a JSON AST
    Ast {
        /// Model files or directories (defaults to the configured sources)
        files: Vec<PathBuf>,
    },

    /// Compare two versions of a model
    Diff {
        /// Old model file or directory
        old: PathBuf,

        /// New model file or directory
        new: PathBuf,
    },
}

/// Installs a stderr subscriber; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_format(flag: Option<OutputFormat>) -> OutputFormat {
    flag.unwrap_or_else(|| match Config::load() {
        Ok(config) => config.global.default_format.into(),
        Err(e) => {
            tracing::warn!("ignoring unreadable configuration: {:#}", e);
            OutputFormat::default()
        }
    })
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(resolve_format(cli.format));

    tracing::debug!("shape starting");

    match cli.command {
        Commands::Init { path } => init::run(&output, &path)?,
        Commands::Validate { files, severity } => validate::run(&output, &files, severity)?,
        Commands::Select { expression, files } => select::run(&output, &expression, &files)?,
        Commands::Ast { files } => ast::run(&output, &files)?,
        Commands::Diff { old, new } => diff::run(&output, &old, &new)?,
    }

    tracing::debug!("command completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["shape", "validate", "a.json", "--format", "json", "-v"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.verbose);
        match cli.command {
            Commands::Validate { files, severity } => {
                assert_eq!(files, vec![PathBuf::from("a.json")]);
                assert_eq!(severity, None);
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn parses_severity() {
        let cli = Cli::try_parse_from(["shape", "validate", "--severity", "danger"]).unwrap();
        match cli.command {
            Commands::Validate { severity, .. } => assert_eq!(severity, Some(Severity::Danger)),
            _ => panic!("expected validate"),
        }
        assert!(Cli::try_parse_from(["shape", "validate", "--severity", "loud"]).is_err());
    }
}

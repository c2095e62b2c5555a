//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | create `.shape/config.toml` and an example model |
//! | `validate [FILES]` | assemble and validate, exit non-zero on ERROR events |
//! | `select <EXPR> [FILES]` | list the shapes a selector matches |
//! | `ast [FILES]` | print the assembled model as a JSON AST |
//! | `diff <OLD> <NEW>` | report differences between two model versions |
//!
//! Without `FILES`, commands load the `sources` listed in the project
//! configuration.
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) raises the log level to debug. `RUST_LOG`
//! overrides it:
//! ```bash
//! shape --verbose validate model/
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod ast;
mod diff;
mod init;
mod output;
mod select;
mod sources;
mod validate;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat, Summary};

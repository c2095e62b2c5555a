//! # Storage Layer
//!
//! On-disk project layout and configuration.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project config | TOML | `.shape/config.toml` |
//! | Global config | TOML | platform config dir, `config.toml` |
//! | Models | JSON AST | `model/` by default, see `sources` |
//!
//! ```text
//! .shape/
//! └── config.toml           # Project configuration
//! model/
//! └── example.json          # Model sources
//! ```

mod config;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, ValidatorsConfig};
pub use project::{Project, ProjectError};

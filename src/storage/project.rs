//! Project management
//!
//! Handles project initialization and model assembly from configured
//! sources.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::Config;
use crate::domain::Model;
use crate::loader::{ModelAssembler, ValidatedResult};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a shape project. Run 'shape init' first.")]
    NotInProject,

    #[error("No model sources found. Pass files or set `sources` in .shape/config.toml")]
    NoSources,
}

const DEFAULT_CONFIG: &str = r#"# shape configuration

# Model files or directories to load when none are given on the command line
sources = ["model"]

# Report unknown traits as warnings instead of errors
allow_unknown_traits = false

# Minimum severity to report: note, warning, danger or error
severity = "warning"

[validators]
# Validators that never run
disabled = []

# Enable the opt-in linters
lint = false

# Extra patterns for the timestamp linter
timestamp_patterns = []
"#;

const EXAMPLE_MODEL: &str = r#"{
    "smithy": "1.0",
    "shapes": {
        "example#Greeting": {
            "type": "structure",
            "members": {
                "message": {
                    "target": "String",
                    "traits": { "required": true }
                }
            },
            "traits": { "documentation": "A friendly greeting" }
        }
    }
}
"#;

/// A shape project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(".shape").is_dir() {
            return Err(ProjectError::NotInProject.into());
        }
        let config = Config::for_project(&root)?;
        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;
        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let shape_dir = root.join(".shape");

        fs::create_dir_all(&shape_dir).with_context(|| {
            format!("Failed to create .shape directory: {}", shape_dir.display())
        })?;

        let config_path = shape_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let model_dir = root.join("model");
        if !model_dir.exists() {
            fs::create_dir_all(&model_dir).with_context(|| {
                format!("Failed to create model directory: {}", model_dir.display())
            })?;
            let example = model_dir.join("example.json");
            fs::write(&example, EXAMPLE_MODEL)
                .with_context(|| format!("Failed to write model: {}", example.display()))?;
        }

        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shape_dir(&self) -> PathBuf {
        self.root.join(".shape")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// An assembler configured from the project settings
    pub fn assembler(&self) -> Result<ModelAssembler> {
        let validator = self
            .config
            .project
            .model_validator()
            .context("Invalid [validators] configuration")?;
        Ok(ModelAssembler::new()
            .allow_unknown_traits(self.config.project.allow_unknown_traits)
            .validator(validator))
    }

    /// Assembles the configured model sources
    pub fn assemble(&self) -> Result<ValidatedResult<Model>> {
        let sources: Vec<PathBuf> = self
            .config
            .sources()
            .into_iter()
            .filter(|source| source.exists())
            .collect();
        if sources.is_empty() {
            return Err(ProjectError::NoSources.into());
        }
        let assembler = sources
            .into_iter()
            .fold(self.assembler()?, |assembler, source| assembler.add_import(source));
        assembler.assemble().context("Failed to load model")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.shape_dir().join("config.toml").is_file());
        assert!(dir.path().join("model").join("example.json").is_file());
        assert_eq!(project.config().project.min_severity().unwrap(), Severity::Warning);
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        fs::write(dir.path().join(".shape/config.toml"), "severity = \"error\"\n").unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.config().project.severity, "error");
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn assembles_the_example_model() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let result = project.assemble().unwrap();
        assert!(result.events().is_empty(), "{:#?}", result.events());
        assert!(result
            .result()
            .contains(&crate::domain::ShapeId::parse("example#Greeting$message").unwrap()));
    }

    #[test]
    fn missing_sources_are_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".shape")).unwrap();
        let project = Project::open(dir.path()).unwrap();
        let err = project.assemble().err().unwrap();
        assert!(err.to_string().contains("No model sources found"));
    }
}

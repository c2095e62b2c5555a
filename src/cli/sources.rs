//! Model loading shared by the commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::Model;
use crate::loader::{ModelAssembler, ValidatedResult};
use crate::storage::{Config, Project};
use crate::validation::Severity;

/// An assembled model and the minimum severity to report for it
pub struct Loaded {
    pub result: ValidatedResult<Model>,
    pub min_severity: Severity,
}

/// Assembles `files`, or the project's configured sources when empty
///
/// Inside a project the project's validator settings apply to explicit
/// files as well.
pub fn load(files: &[PathBuf]) -> Result<Loaded> {
    let project = match Config::find_project_root() {
        Some(root) => Some(Project::open(root)?),
        None => None,
    };
    let min_severity = match &project {
        Some(project) => project.config().project.min_severity()?,
        None => Severity::Warning,
    };

    let result = if files.is_empty() {
        let project = project.context("No model files given and not in a shape project")?;
        tracing::debug!(root = %project.root().display(), "loading configured sources");
        project.assemble()?
    } else {
        let assembler = match &project {
            Some(project) => project.assembler()?,
            None => ModelAssembler::new(),
        };
        files
            .iter()
            .fold(assembler, |assembler, file| assembler.add_import(file))
            .assemble()
            .context("Failed to load model")?
    };

    tracing::debug!(
        shapes = result.result().len(),
        events = result.events().len(),
        "model loaded"
    );
    Ok(Loaded {
        result,
        min_severity,
    })
}

/// Assembles a single file or directory with default settings
pub fn load_path(path: &Path) -> Result<ValidatedResult<Model>> {
    ModelAssembler::new()
        .add_import(path)
        .assemble()
        .with_context(|| format!("Failed to load model: {}", path.display()))
}

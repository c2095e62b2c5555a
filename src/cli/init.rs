//! `shape init`

use anyhow::Result;

use super::output::Output;
use crate::storage::Project;

pub fn run(output: &Output, path: &str) -> Result<()> {
    tracing::debug!(path, "initializing project");
    let project = Project::init(path)?;
    tracing::debug!(dir = %project.shape_dir().display(), "created .shape directory");
    output.success(&format!(
        "Initialized shape project at {}",
        project.root().display()
    ));
    Ok(())
}

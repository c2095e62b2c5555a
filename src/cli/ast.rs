//! `shape ast`: prints the assembled model as a JSON AST

use std::path::PathBuf;

use anyhow::Result;

use super::output::Output;
use super::sources;
use crate::loader::serializer;

pub fn run(output: &Output, files: &[PathBuf]) -> Result<()> {
    let loaded = sources::load(files)?;
    let model = loaded.result.into_result()?;
    output.data(&serializer::serialize(&model));
    Ok(())
}

//! `shape validate`

use std::path::PathBuf;

use anyhow::Result;

use super::output::{Output, Summary};
use super::sources;
use crate::validation::Severity;

pub fn run(output: &Output, files: &[PathBuf], severity: Option<Severity>) -> Result<()> {
    let loaded = sources::load(files)?;
    let min_severity = severity.unwrap_or(loaded.min_severity);
    let result = &loaded.result;

    let shown: Vec<_> = result.events_at_least(min_severity).collect();
    let summary = Summary::count(result.events());

    if output.is_json() {
        output.data(&serde_json::json!({
            "valid": !result.is_broken(),
            "shapes": result.result().len(),
            "summary": summary,
            "events": shown,
        }));
    } else {
        output.events(&shown);
        if !shown.is_empty() {
            println!();
        }
        println!(
            "Validated {} shape(s): {}",
            result.result().len(),
            summary
        );
    }

    if result.is_broken() {
        anyhow::bail!("Model validation failed with {} error(s)", summary.errors);
    }
    Ok(())
}

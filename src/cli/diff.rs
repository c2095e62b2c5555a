//! `shape diff`

use std::path::Path;

use anyhow::{Context, Result};

use super::output::{Output, Summary};
use super::sources;
use crate::diff;

pub fn run(output: &Output, old: &Path, new: &Path) -> Result<()> {
    let old_model = sources::load_path(old)?
        .into_result()
        .with_context(|| format!("Old model is invalid: {}", old.display()))?;
    let new_model = sources::load_path(new)?
        .into_result()
        .with_context(|| format!("New model is invalid: {}", new.display()))?;

    let events = diff::compare(&old_model, &new_model);
    let summary = Summary::count(&events);
    let shown: Vec<_> = events.iter().collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "summary": summary,
            "events": shown,
        }));
    } else if events.is_empty() {
        println!("No differences found.");
    } else {
        output.events(&shown);
        println!();
        println!("{} difference(s): {}", events.len(), summary);
    }

    if summary.errors > 0 {
        anyhow::bail!("Found {} breaking change(s)", summary.errors);
    }
    Ok(())
}

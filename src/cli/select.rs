//! `shape select`

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::output::Output;
use super::sources;
use crate::selector::Selector;
use crate::validation::Severity;

pub fn run(output: &Output, expression: &str, files: &[PathBuf]) -> Result<()> {
    let selector = Selector::parse(expression).context("Failed to parse selector")?;
    let loaded = sources::load(files)?;
    let model = loaded.result.result();

    for event in loaded.result.events_at_least(Severity::Error) {
        tracing::warn!("{}", event);
    }

    let shapes = selector.select(model);
    tracing::debug!(expression = selector.expression(), matched = shapes.len(), "selector evaluated");

    if output.is_json() {
        let items: Vec<_> = shapes
            .iter()
            .map(|shape| {
                serde_json::json!({
                    "id": shape.id(),
                    "type": shape.shape_type().as_str(),
                    "source": shape.source().to_string(),
                })
            })
            .collect();
        output.data(&items);
    } else {
        for shape in shapes {
            println!("{}", shape.id());
        }
    }
    Ok(())
}

//! Output formatting for CLI commands

use serde::Serialize;

use crate::storage;
use crate::validation::{Severity, ValidationEvent};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        let rendered = match self.format {
            OutputFormat::Text => serde_json::to_string_pretty(data),
            OutputFormat::Json => serde_json::to_string(data),
        };
        if let Ok(json) = rendered {
            println!("{}", json);
        }
    }

    /// Prints events one per line (text) or as an array (JSON)
    pub fn events(&self, events: &[&ValidationEvent]) {
        match self.format {
            OutputFormat::Text => {
                for event in events {
                    println!("{}", event);
                }
            }
            OutputFormat::Json => self.data(&events),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Event counts per severity, as printed after validation
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub errors: usize,
    pub dangers: usize,
    pub warnings: usize,
    pub notes: usize,
    pub suppressed: usize,
}

impl Summary {
    pub fn count<'a>(events: impl IntoIterator<Item = &'a ValidationEvent>) -> Self {
        let mut summary = Self::default();
        for event in events {
            match event.severity() {
                Severity::Error => summary.errors += 1,
                Severity::Danger => summary.dangers += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Note => summary.notes += 1,
                Severity::Suppressed => summary.suppressed += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} error(s), {} danger(s), {} warning(s), {} note(s), {} suppressed",
            self.errors, self.dangers, self.warnings, self.notes, self.suppressed
        )
    }
}

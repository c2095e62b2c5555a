//! # Model loading
//!
//! Turns model sources into a validated [`Model`](crate::domain::Model).
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ModelAssembler`] | collects sources, shapes and settings, then assembles |
//! | [`LoaderVisitor`] | two-phase (open, end) accumulator that resolves references |
//! | [`ast`] | JSON AST front-end feeding the visitor |
//! | [`serializer`] | writes a model back out as a JSON AST |
//!
//! Recoverable problems (duplicate definitions, unknown traits, dangling
//! references) become [`ValidationEvent`]s in a [`ValidatedResult`]. Only
//! malformed input and incompatible model versions are [`LoadError`]s.

pub mod ast;
mod assembler;
pub mod serializer;
mod visitor;

pub use assembler::ModelAssembler;
pub use visitor::{LoaderVisitor, PendingShape, ShapeReference};

use crate::domain::ShapeIdError;
use crate::validation::{Severity, ValidationEvent};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The model version this loader reads and writes
pub const MODEL_VERSION: &str = "1.0";

/// Event ID used for problems found while loading
pub const MODEL_ERROR: &str = "Model";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "Invalid model version provided: `{found}`. Expected a version compatible with `{supported}`"
    )]
    IncompatibleVersion { found: String, supported: &'static str },

    #[error("Cannot set model version to `{found}` because it was previously set to the incompatible version `{previous}`")]
    ConflictingVersion { found: String, previous: String },

    #[error("Invalid model version number: `{0}`")]
    InvalidVersion(String),

    #[error("A namespace must be set before shapes or traits can be defined")]
    MissingNamespace,

    #[error("Invalid namespace `{0}`")]
    InvalidNamespace(String),

    #[error("Name `{name}` conflicts with imported shape `{existing}`")]
    AliasConflict { name: String, existing: String },

    #[error("Invalid shape ID in {file}: {source}")]
    InvalidShapeId {
        file: String,
        #[source]
        source: ShapeIdError,
    },

    #[error("Invalid JSON model in {file}: {message}")]
    InvalidAst { file: String, message: String },

    #[error("Failed to parse JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A result that carries validation events alongside a possibly broken
/// value
#[derive(Debug, Clone)]
pub struct ValidatedResult<T> {
    result: T,
    events: Vec<ValidationEvent>,
}

impl<T> ValidatedResult<T> {
    pub fn new(result: T, events: Vec<ValidationEvent>) -> Self {
        Self { result, events }
    }

    pub fn result(&self) -> &T {
        &self.result
    }

    pub fn events(&self) -> &[ValidationEvent] {
        &self.events
    }

    /// Events at or above `severity`
    pub fn events_at_least(&self, severity: Severity) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter().filter(move |e| e.severity() >= severity)
    }

    /// True when any event is an ERROR
    pub fn is_broken(&self) -> bool {
        self.events.iter().any(|e| e.severity() == Severity::Error)
    }

    pub fn into_parts(self) -> (T, Vec<ValidationEvent>) {
        (self.result, self.events)
    }

    /// Returns the value, or the ERROR and DANGER events when the result is
    /// broken
    pub fn into_result(self) -> Result<T, BrokenModel> {
        if self.is_broken() {
            let events = self
                .events
                .into_iter()
                .filter(|e| e.severity() >= Severity::Danger)
                .collect();
            Err(BrokenModel { events })
        } else {
            Ok(self.result)
        }
    }
}

/// A model with ERROR events
#[derive(Debug, Clone, Error)]
pub struct BrokenModel {
    pub events: Vec<ValidationEvent>,
}

impl fmt::Display for BrokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Result contains ERROR or DANGER events:")?;
        for event in &self.events {
            write!(f, "\n{}", event)?;
        }
        Ok(())
    }
}

/// Returns true if `version` can be loaded by a loader that supports
/// `supported`
///
/// Major versions must match. Minor versions must also match for major
/// version 0; otherwise the version must not be newer than supported.
pub fn is_version_supported(version: &str, supported: &str) -> Result<bool, LoadError> {
    let found = version_parts(version)?;
    let known = version_parts(supported)?;
    if found[0] != known[0] {
        return Ok(false);
    }
    if found[0] == 0 {
        return Ok(found[1] == known[1]);
    }
    Ok(found[1] <= known[1])
}

/// `major.minor` or `major.minor.patch`
fn version_parts(version: &str) -> Result<Vec<u64>, LoadError> {
    let parts: Vec<&str> = version.split('.').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(LoadError::InvalidVersion(version.to_string()));
    }
    parts
        .iter()
        .map(|p| {
            if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
                return Err(LoadError::InvalidVersion(version.to_string()));
            }
            p.parse::<u64>()
                .map_err(|_| LoadError::InvalidVersion(version.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_compatibility() {
        assert!(is_version_supported("1.0", "1.0").unwrap());
        assert!(is_version_supported("1.0.0", "1.0").unwrap());
        assert!(!is_version_supported("1.1", "1.0").unwrap());
        assert!(!is_version_supported("2.0", "1.0").unwrap());
        assert!(is_version_supported("0.4", "0.4").unwrap());
        assert!(!is_version_supported("0.5", "0.4").unwrap());
        assert!(matches!(
            is_version_supported("1", "1.0"),
            Err(LoadError::InvalidVersion(_))
        ));
        assert!(matches!(
            is_version_supported("1.x", "1.0"),
            Err(LoadError::InvalidVersion(_))
        ));
    }

    #[test]
    fn broken_results_keep_error_and_danger_events() {
        let events = vec![
            ValidationEvent::new("A", Severity::Error, "bad"),
            ValidationEvent::new("B", Severity::Danger, "risky"),
            ValidationEvent::new("C", Severity::Warning, "meh"),
        ];
        let result = ValidatedResult::new(1, events);
        assert!(result.is_broken());
        assert_eq!(result.events_at_least(Severity::Danger).count(), 2);
        let err = result.into_result().unwrap_err();
        assert_eq!(err.events.len(), 2);
        assert!(err.to_string().starts_with("Result contains ERROR or DANGER events:"));

        let fine = ValidatedResult::new(2, vec![ValidationEvent::new("B", Severity::Danger, "x")]);
        assert!(!fine.is_broken());
        assert_eq!(fine.into_result().unwrap(), 2);
    }
}

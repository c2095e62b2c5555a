//! Validation events

use crate::domain::{Node, Shape, ShapeId, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("Validation event is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("A suppression reason can only be set on SUPPRESSED events (event `{0}`)")]
    ReasonWithoutSuppression(String),

    #[error("Invalid validation event node: {0}")]
    InvalidNode(String),
}

/// Severity of a validation event, from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Suppressed,
    Note,
    Warning,
    Danger,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Suppressed => "SUPPRESSED",
            Severity::Note => "NOTE",
            Severity::Warning => "WARNING",
            Severity::Danger => "DANGER",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUPPRESSED" => Ok(Severity::Suppressed),
            "NOTE" => Ok(Severity::Note),
            "WARNING" => Ok(Severity::Warning),
            "DANGER" => Ok(Severity::Danger),
            "ERROR" => Ok(Severity::Error),
            _ => Err(format!(
                "Invalid severity: '{}'. Expected one of: NOTE, WARNING, DANGER, ERROR, SUPPRESSED",
                s
            )),
        }
    }
}

/// A finding produced while loading, validating or diffing a model
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEvent {
    event_id: String,
    severity: Severity,
    message: String,
    shape_id: Option<ShapeId>,
    source: SourceLocation,
    suppression_reason: Option<String>,
}

/// Serialized form of an event
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    id: String,
    severity: Severity,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape_id: Option<ShapeId>,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suppression_reason: Option<String>,
}

impl ValidationEvent {
    /// Creates an event with every required field set
    pub fn new(event_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            severity,
            message: message.into(),
            shape_id: None,
            source: SourceLocation::none(),
            suppression_reason: None,
        }
    }

    pub fn builder() -> ValidationEventBuilder {
        ValidationEventBuilder::default()
    }

    /// Attaches the event to a shape, taking its ID and source location
    pub fn with_shape(mut self, shape: &Shape) -> Self {
        self.shape_id = Some(shape.id().clone());
        self.source = shape.source().clone();
        self
    }

    pub fn with_shape_id(mut self, id: ShapeId) -> Self {
        self.shape_id = Some(id);
        self
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Demotes the event to SUPPRESSED, recording why
    pub fn suppress(mut self, reason: Option<String>) -> Self {
        self.severity = Severity::Suppressed;
        self.suppression_reason = reason;
        self
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn shape_id(&self) -> Option<&ShapeId> {
        self.shape_id.as_ref()
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    pub fn suppression_reason(&self) -> Option<&str> {
        self.suppression_reason.as_deref()
    }

    fn to_record(&self) -> EventRecord {
        EventRecord {
            id: self.event_id.clone(),
            severity: self.severity,
            message: self.message.clone(),
            shape_id: self.shape_id.clone(),
            filename: self.source.filename.clone(),
            line: self.source.line,
            column: self.source.column,
            suppression_reason: self.suppression_reason.clone(),
        }
    }

    pub fn to_node(&self) -> Node {
        serde_json::to_value(self.to_record()).unwrap_or(Node::Null)
    }

    pub fn from_node(node: &Node) -> Result<Self, EventError> {
        let record: EventRecord = serde_json::from_value(node.clone())
            .map_err(|e| EventError::InvalidNode(e.to_string()))?;
        let mut builder = Self::builder()
            .id(record.id)
            .severity(record.severity)
            .message(record.message)
            .source(SourceLocation::new(record.filename, record.line, record.column));
        if let Some(shape_id) = record.shape_id {
            builder = builder.shape_id(shape_id);
        }
        if let Some(reason) = record.suppression_reason {
            builder = builder.suppression_reason(reason);
        }
        builder.build()
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self
            .shape_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "[{}] {}: {} | {} {}",
            self.severity, shape, self.message, self.event_id, self.source
        )?;
        if let Some(reason) = &self.suppression_reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

impl Serialize for ValidationEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

/// Builds events from optional parts, checking required fields
#[derive(Debug, Default)]
pub struct ValidationEventBuilder {
    event_id: Option<String>,
    severity: Option<Severity>,
    message: Option<String>,
    shape_id: Option<ShapeId>,
    source: SourceLocation,
    suppression_reason: Option<String>,
}

impl ValidationEventBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn shape_id(mut self, id: ShapeId) -> Self {
        self.shape_id = Some(id);
        self
    }

    pub fn shape(mut self, shape: &Shape) -> Self {
        self.shape_id = Some(shape.id().clone());
        self.source = shape.source().clone();
        self
    }

    pub fn source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn suppression_reason(mut self, reason: impl Into<String>) -> Self {
        self.suppression_reason = Some(reason.into());
        self
    }

    pub fn build(self) -> Result<ValidationEvent, EventError> {
        let event_id = self.event_id.ok_or(EventError::MissingField("id"))?;
        let severity = self.severity.ok_or(EventError::MissingField("severity"))?;
        let message = self.message.ok_or(EventError::MissingField("message"))?;
        if self.suppression_reason.is_some() && severity != Severity::Suppressed {
            return Err(EventError::ReasonWithoutSuppression(event_id));
        }
        Ok(ValidationEvent {
            event_id,
            severity,
            message,
            shape_id: self.shape_id,
            source: self.source,
            suppression_reason: self.suppression_reason,
        })
    }
}

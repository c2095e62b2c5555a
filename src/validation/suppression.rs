//! Metadata suppressions
//!
//! ```json
//! "suppressions": [
//!     { "id": "ShouldHaveUsedTimestamp", "namespace": "*", "reason": "legacy API" },
//!     { "id": "HttpQueryParamsTrait", "shape": "example.weather#ListCities" }
//! ]
//! ```

use super::event::ValidationEvent;
use crate::domain::{Node, ShapeId, ShapeIdError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SuppressionError {
    #[error("Suppression must be an object, found {0}")]
    NotAnObject(String),

    #[error("Suppression is missing a string `id`")]
    MissingId,

    #[error("Suppression `{0}` must define exactly one of `namespace` or `shape`")]
    InvalidScope(String),

    #[error("Suppression `{id}` has an invalid shape: {source}")]
    InvalidShape {
        id: String,
        #[source]
        source: ShapeIdError,
    },
}

/// What a suppression applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionScope {
    /// `namespace: "*"`
    Model,
    Namespace(String),
    /// A shape and its members
    Shape(ShapeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    pub event_id: String,
    pub scope: SuppressionScope,
    pub reason: Option<String>,
}

impl Suppression {
    pub fn from_node(node: &Node) -> Result<Self, SuppressionError> {
        let object = node
            .as_object()
            .ok_or_else(|| SuppressionError::NotAnObject(node.to_string()))?;
        let event_id = object
            .get("id")
            .and_then(Node::as_str)
            .ok_or(SuppressionError::MissingId)?
            .to_string();

        let namespace = object.get("namespace").and_then(Node::as_str);
        let shape = object.get("shape").and_then(Node::as_str);
        let scope = match (namespace, shape) {
            (Some("*"), None) => SuppressionScope::Model,
            (Some(namespace), None) => SuppressionScope::Namespace(namespace.to_string()),
            (None, Some(shape)) => match ShapeId::parse(shape) {
                Ok(id) => SuppressionScope::Shape(id),
                Err(source) => return Err(SuppressionError::InvalidShape { id: event_id, source }),
            },
            _ => return Err(SuppressionError::InvalidScope(event_id)),
        };

        let reason = object
            .get("reason")
            .and_then(Node::as_str)
            .map(str::to_string);

        Ok(Self {
            event_id,
            scope,
            reason,
        })
    }

    pub fn matches(&self, event: &ValidationEvent) -> bool {
        if event.event_id() != self.event_id {
            return false;
        }
        match (&self.scope, event.shape_id()) {
            (SuppressionScope::Model, _) => true,
            (SuppressionScope::Namespace(namespace), Some(id)) => id.namespace() == namespace,
            (SuppressionScope::Shape(shape), Some(id)) => id.without_member() == *shape || id == shape,
            (_, None) => false,
        }
    }
}

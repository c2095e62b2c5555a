//! Node values and source locations
//!
//! Trait values and metadata are untyped JSON-like trees. Object keys keep
//! their insertion order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Untyped value tree used for trait values and metadata
pub type Node = serde_json::Value;

/// The kind of a [`Node`] value, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl NodeType {
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Null => NodeType::Null,
            Node::Bool(_) => NodeType::Boolean,
            Node::Number(_) => NodeType::Number,
            Node::String(_) => NodeType::String,
            Node::Array(_) => NodeType::Array,
            Node::Object(_) => NodeType::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Null => "null",
            NodeType::Boolean => "boolean",
            NodeType::Number => "number",
            NodeType::String => "string",
            NodeType::Array => "array",
            NodeType::Object => "object",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a shape, trait or metadata entry was defined
///
/// An empty filename means the location is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }

    /// The unknown location
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.filename.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "N/A")
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

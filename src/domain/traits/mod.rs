//! Traits: metadata applied to shapes
//!
//! A [`Trait`] is an ID plus a [`Node`] value. Traits with a registered
//! [`TypedTrait`] have their values checked by the [`TraitFactory`] when
//! they are created; every other defined trait is carried as-is.

mod factory;
mod typed;
mod uri;

pub use factory::{coerce_trait_value, merge_trait_values, TraitFactory, TraitMerge};
pub use typed::{
    DeprecatedTrait, DocumentationTrait, ErrorTrait, HttpErrorTrait, HttpHeaderTrait,
    HttpQueryTrait, HttpTrait, LengthTrait, PatternTrait, RangeTrait, StructurallyExclusive,
    SuppressTrait, TagsTrait, TraitDefinition,
};
pub use uri::{Segment, UriLabel, UriPattern, UriPatternError};

use super::id::ShapeId;
use super::node::{Node, NodeType, SourceLocation};
use thiserror::Error;

/// Well-known prelude trait names
pub mod names {
    pub const TRAIT: &str = "trait";
    pub const DOCUMENTATION: &str = "documentation";
    pub const TAGS: &str = "tags";
    pub const REQUIRED: &str = "required";
    pub const BOX: &str = "box";
    pub const SENSITIVE: &str = "sensitive";
    pub const DEPRECATED: &str = "deprecated";
    pub const ERROR: &str = "error";
    pub const HTTP: &str = "http";
    pub const HTTP_LABEL: &str = "httpLabel";
    pub const HTTP_QUERY: &str = "httpQuery";
    pub const HTTP_QUERY_PARAMS: &str = "httpQueryParams";
    pub const HTTP_HEADER: &str = "httpHeader";
    pub const HTTP_ERROR: &str = "httpError";
    pub const HTTP_PAYLOAD: &str = "httpPayload";
    pub const STREAMING: &str = "streaming";
    pub const LENGTH: &str = "length";
    pub const RANGE: &str = "range";
    pub const PATTERN: &str = "pattern";
    pub const PRIVATE: &str = "private";
    pub const READONLY: &str = "readonly";
    pub const IDEMPOTENT: &str = "idempotent";
    pub const SUPPRESS: &str = "suppress";
}

/// Returns the ID of a prelude trait by name
pub fn prelude_trait(name: &str) -> ShapeId {
    ShapeId::prelude(name)
}

#[derive(Debug, Error, PartialEq)]
pub enum TraitError {
    #[error("Expected {expected} value for trait `{trait_id}`, found {found}")]
    UnexpectedType {
        trait_id: ShapeId,
        expected: &'static str,
        found: NodeType,
    },

    #[error("Invalid value for trait `{trait_id}`: {message}")]
    InvalidValue { trait_id: ShapeId, message: String },
}

impl TraitError {
    pub fn trait_id(&self) -> &ShapeId {
        match self {
            TraitError::UnexpectedType { trait_id, .. } => trait_id,
            TraitError::InvalidValue { trait_id, .. } => trait_id,
        }
    }
}

/// A trait application: the trait's shape ID and its value
#[derive(Debug, Clone)]
pub struct Trait {
    id: ShapeId,
    value: Node,
    source: SourceLocation,
}

impl Trait {
    pub fn new(id: ShapeId, value: Node) -> Self {
        Self {
            id,
            value,
            source: SourceLocation::none(),
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    /// Returns true if this is an annotation trait set to `true`
    pub fn is_annotation(&self) -> bool {
        self.value == Node::Bool(true)
    }
}

// Source locations do not participate in equality.
impl PartialEq for Trait {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value == other.value
    }
}

/// A trait with a typed Rust representation
pub trait TypedTrait: Sized {
    /// Name of the trait in the prelude namespace
    const NAME: &'static str;

    fn from_node(node: &Node) -> Result<Self, TraitError>;

    fn id() -> ShapeId {
        ShapeId::prelude(Self::NAME)
    }
}

// Helpers shared by the typed trait constructors.

pub(crate) fn expect_string<'a>(id: &ShapeId, node: &'a Node) -> Result<&'a str, TraitError> {
    node.as_str().ok_or_else(|| TraitError::UnexpectedType {
        trait_id: id.clone(),
        expected: "string",
        found: NodeType::of(node),
    })
}

pub(crate) fn expect_object<'a>(
    id: &ShapeId,
    node: &'a Node,
) -> Result<&'a serde_json::Map<String, Node>, TraitError> {
    node.as_object().ok_or_else(|| TraitError::UnexpectedType {
        trait_id: id.clone(),
        expected: "object",
        found: NodeType::of(node),
    })
}

pub(crate) fn expect_array<'a>(id: &ShapeId, node: &'a Node) -> Result<&'a Vec<Node>, TraitError> {
    node.as_array().ok_or_else(|| TraitError::UnexpectedType {
        trait_id: id.clone(),
        expected: "array",
        found: NodeType::of(node),
    })
}

pub(crate) fn expect_string_list(id: &ShapeId, node: &Node) -> Result<Vec<String>, TraitError> {
    expect_array(id, node)?
        .iter()
        .map(|item| expect_string(id, item).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trait_equality_ignores_source() {
        let a = Trait::new(prelude_trait("tags"), json!(["a"]))
            .with_source(SourceLocation::new("a.json", 1, 1));
        let b = Trait::new(prelude_trait("tags"), json!(["a"]));
        assert_eq!(a, b);
        assert_ne!(a, Trait::new(prelude_trait("tags"), json!(["b"])));
    }

    #[test]
    fn annotation_traits() {
        assert!(Trait::new(prelude_trait("required"), json!(true)).is_annotation());
        assert!(!Trait::new(prelude_trait("documentation"), json!("x")).is_annotation());
    }

    #[test]
    fn string_list_helper_reports_type() {
        let id = prelude_trait("tags");
        assert_eq!(
            expect_string_list(&id, &json!(["a", "b"])).unwrap(),
            vec!["a", "b"]
        );
        let err = expect_string_list(&id, &json!(["a", 1])).unwrap_err();
        assert!(err.to_string().contains("Expected string"));
        assert_eq!(err.trait_id(), &id);
    }
}

//! Typed representations of prelude traits

use super::{expect_object, expect_string, expect_string_list, TraitError, TypedTrait, UriPattern};
use crate::domain::id::ShapeId;
use crate::domain::node::{Node, NodeType};
use crate::selector::Selector;
use regex::Regex;
use std::fmt;

fn invalid(id: ShapeId, message: impl fmt::Display) -> TraitError {
    TraitError::InvalidValue {
        trait_id: id,
        message: message.to_string(),
    }
}

fn optional_u64(id: &ShapeId, node: Option<&Node>, field: &str) -> Result<Option<u64>, TraitError> {
    match node {
        None | Some(Node::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(id.clone(), format!("`{field}` must be a non-negative integer"))),
    }
}

fn optional_f64(id: &ShapeId, node: Option<&Node>, field: &str) -> Result<Option<f64>, TraitError> {
    match node {
        None | Some(Node::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(id.clone(), format!("`{field}` must be a number"))),
    }
}

fn optional_string(
    id: &ShapeId,
    object: &serde_json::Map<String, Node>,
    field: &str,
) -> Result<Option<String>, TraitError> {
    object
        .get(field)
        .map(|v| expect_string(id, v).map(str::to_string))
        .transpose()
}

/// Which part of a structure a structurally exclusive trait is unique over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructurallyExclusive {
    /// Only one member of a structure may have the trait
    Member,
    /// Only one member of a structure may target a shape with the trait
    Target,
}

/// The `trait` trait: marks a shape as a trait definition
#[derive(Debug, Clone)]
pub struct TraitDefinition {
    pub selector: Selector,
    pub structurally_exclusive: Option<StructurallyExclusive>,
    pub conflicts: Vec<ShapeId>,
    pub tags: Vec<String>,
}

impl Default for TraitDefinition {
    fn default() -> Self {
        Self {
            selector: Selector::any(),
            structurally_exclusive: None,
            conflicts: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl TypedTrait for TraitDefinition {
    const NAME: &'static str = super::names::TRAIT;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        if node.is_boolean() {
            return Ok(Self::default());
        }
        let object = expect_object(&id, node)?;

        let selector = match object.get("selector") {
            Some(value) => Selector::parse(expect_string(&id, value)?)
                .map_err(|e| invalid(id.clone(), e))?,
            None => Selector::any(),
        };

        let structurally_exclusive = match object.get("structurallyExclusive") {
            None => None,
            Some(value) => match expect_string(&id, value)? {
                "member" => Some(StructurallyExclusive::Member),
                "target" => Some(StructurallyExclusive::Target),
                other => {
                    return Err(invalid(
                        id,
                        format!("`structurallyExclusive` must be 'member' or 'target', found '{other}'"),
                    ))
                }
            },
        };

        let conflicts = match object.get("conflicts") {
            None => Vec::new(),
            Some(value) => expect_string_list(&id, value)?
                .iter()
                .map(|name| {
                    ShapeId::from_optional_namespace(crate::domain::PRELUDE_NAMESPACE, name)
                        .map_err(|e| invalid(id.clone(), e))
                })
                .collect::<Result<_, _>>()?,
        };

        let tags = match object.get("tags") {
            None => Vec::new(),
            Some(value) => expect_string_list(&id, value)?,
        };

        Ok(Self {
            selector,
            structurally_exclusive,
            conflicts,
            tags,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentationTrait(pub String);

impl TypedTrait for DocumentationTrait {
    const NAME: &'static str = super::names::DOCUMENTATION;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        Ok(Self(expect_string(&Self::id(), node)?.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagsTrait(pub Vec<String>);

impl TypedTrait for TagsTrait {
    const NAME: &'static str = super::names::TAGS;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        Ok(Self(expect_string_list(&Self::id(), node)?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuppressTrait(pub Vec<String>);

impl TypedTrait for SuppressTrait {
    const NAME: &'static str = super::names::SUPPRESS;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        Ok(Self(expect_string_list(&Self::id(), node)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeprecatedTrait {
    pub message: Option<String>,
    pub since: Option<String>,
}

impl TypedTrait for DeprecatedTrait {
    const NAME: &'static str = super::names::DEPRECATED;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let object = expect_object(&id, node)?;
        Ok(Self {
            message: optional_string(&id, object, "message")?,
            since: optional_string(&id, object, "since")?,
        })
    }
}

/// The `error` trait: who is at fault for an error structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTrait {
    Client,
    Server,
}

impl ErrorTrait {
    /// Default HTTP status code for the error when no `httpError` is present
    pub fn default_http_status(&self) -> u16 {
        match self {
            ErrorTrait::Client => 400,
            ErrorTrait::Server => 500,
        }
    }
}

impl TypedTrait for ErrorTrait {
    const NAME: &'static str = super::names::ERROR;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        match expect_string(&id, node)? {
            "client" => Ok(ErrorTrait::Client),
            "server" => Ok(ErrorTrait::Server),
            other => Err(invalid(
                id,
                format!("expected 'client' or 'server', found '{other}'"),
            )),
        }
    }
}

/// The `http` trait: HTTP binding of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct HttpTrait {
    pub method: String,
    pub uri: UriPattern,
    pub code: u16,
}

impl TypedTrait for HttpTrait {
    const NAME: &'static str = super::names::HTTP;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let object = expect_object(&id, node)?;

        let method = object
            .get("method")
            .ok_or_else(|| invalid(id.clone(), "missing required property `method`"))
            .and_then(|v| expect_string(&id, v))?
            .to_string();
        if method.is_empty() {
            return Err(invalid(id, "`method` must not be empty"));
        }

        let uri = object
            .get("uri")
            .ok_or_else(|| invalid(id.clone(), "missing required property `uri`"))
            .and_then(|v| expect_string(&id, v))?;
        let uri = UriPattern::parse(uri).map_err(|e| invalid(id.clone(), e))?;

        let code = match object.get("code") {
            None => 200,
            Some(value) => value
                .as_u64()
                .and_then(|c| u16::try_from(c).ok())
                .filter(|c| (100..=999).contains(c))
                .ok_or_else(|| invalid(id.clone(), "`code` must be an HTTP status code"))?,
        };

        Ok(Self { method, uri, code })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpErrorTrait(pub u16);

impl TypedTrait for HttpErrorTrait {
    const NAME: &'static str = super::names::HTTP_ERROR;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        node.as_u64()
            .and_then(|c| u16::try_from(c).ok())
            .filter(|c| (200..=599).contains(c))
            .map(Self)
            .ok_or_else(|| match node {
                Node::Number(_) => invalid(id.clone(), "status code must be between 200 and 599"),
                _ => TraitError::UnexpectedType {
                    trait_id: id.clone(),
                    expected: "number",
                    found: NodeType::of(node),
                },
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpQueryTrait(pub String);

impl TypedTrait for HttpQueryTrait {
    const NAME: &'static str = super::names::HTTP_QUERY;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let name = expect_string(&id, node)?;
        if name.is_empty() {
            return Err(invalid(id, "query parameter name must not be empty"));
        }
        Ok(Self(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpHeaderTrait(pub String);

impl TypedTrait for HttpHeaderTrait {
    const NAME: &'static str = super::names::HTTP_HEADER;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let name = expect_string(&id, node)?;
        if name.is_empty() {
            return Err(invalid(id, "header name must not be empty"));
        }
        Ok(Self(name.to_string()))
    }
}

/// The `length` trait: bounds on the length of strings, blobs, lists and maps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthTrait {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl TypedTrait for LengthTrait {
    const NAME: &'static str = super::names::LENGTH;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let object = expect_object(&id, node)?;
        let min = optional_u64(&id, object.get("min"), "min")?;
        let max = optional_u64(&id, object.get("max"), "max")?;
        if min.is_none() && max.is_none() {
            return Err(invalid(id, "one of `min` or `max` is required"));
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(invalid(id, format!("`min` ({min}) is greater than `max` ({max})")));
            }
        }
        Ok(Self { min, max })
    }
}

/// The `range` trait: bounds on numeric values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeTrait {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TypedTrait for RangeTrait {
    const NAME: &'static str = super::names::RANGE;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let object = expect_object(&id, node)?;
        let min = optional_f64(&id, object.get("min"), "min")?;
        let max = optional_f64(&id, object.get("max"), "max")?;
        if min.is_none() && max.is_none() {
            return Err(invalid(id, "one of `min` or `max` is required"));
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(invalid(id, format!("`min` ({min}) is greater than `max` ({max})")));
            }
        }
        Ok(Self { min, max })
    }
}

/// The `pattern` trait: a regular expression string values must match
#[derive(Debug, Clone)]
pub struct PatternTrait(pub Regex);

impl PatternTrait {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for PatternTrait {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl TypedTrait for PatternTrait {
    const NAME: &'static str = super::names::PATTERN;

    fn from_node(node: &Node) -> Result<Self, TraitError> {
        let id = Self::id();
        let pattern = expect_string(&id, node)?;
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| invalid(id, format!("invalid regular expression: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trait_definition_defaults_to_any_selector() {
        let def = TraitDefinition::from_node(&json!({})).unwrap();
        assert_eq!(def.selector.expression(), "*");
        assert!(def.structurally_exclusive.is_none());
        assert!(def.conflicts.is_empty());
    }

    #[test]
    fn trait_definition_properties() {
        let def = TraitDefinition::from_node(&json!({
            "selector": "structure > member",
            "structurallyExclusive": "member",
            "conflicts": ["required", "ns#other"],
            "tags": ["diff.error.remove"]
        }))
        .unwrap();
        assert_eq!(def.selector.expression(), "structure > member");
        assert_eq!(def.structurally_exclusive, Some(StructurallyExclusive::Member));
        assert_eq!(
            def.conflicts,
            vec![
                ShapeId::parse("smithy.api#required").unwrap(),
                ShapeId::parse("ns#other").unwrap()
            ]
        );
        assert_eq!(def.tags, vec!["diff.error.remove"]);
    }

    #[test]
    fn trait_definition_rejects_bad_selector() {
        let err = TraitDefinition::from_node(&json!({"selector": "structure [id"})).unwrap_err();
        assert!(matches!(err, TraitError::InvalidValue { .. }));
    }

    #[test]
    fn http_trait() {
        let http = HttpTrait::from_node(&json!({"method": "GET", "uri": "/things/{id}"})).unwrap();
        assert_eq!(http.method, "GET");
        assert_eq!(http.code, 200);
        assert!(http.uri.label("id").is_some());

        assert!(HttpTrait::from_node(&json!({"method": "GET"})).is_err());
        assert!(HttpTrait::from_node(&json!({"method": "GET", "uri": "nope"})).is_err());
        assert!(HttpTrait::from_node(&json!({"method": "GET", "uri": "/", "code": 42})).is_err());
    }

    #[test]
    fn http_error_trait_range() {
        assert_eq!(HttpErrorTrait::from_node(&json!(404)).unwrap(), HttpErrorTrait(404));
        assert!(HttpErrorTrait::from_node(&json!(700)).is_err());
        assert!(matches!(
            HttpErrorTrait::from_node(&json!("404")),
            Err(TraitError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn error_trait_values() {
        assert_eq!(ErrorTrait::from_node(&json!("client")).unwrap(), ErrorTrait::Client);
        assert_eq!(ErrorTrait::Server.default_http_status(), 500);
        assert!(ErrorTrait::from_node(&json!("user")).is_err());
    }

    #[test]
    fn length_and_range_bounds() {
        assert_eq!(
            LengthTrait::from_node(&json!({"min": 1})).unwrap(),
            LengthTrait { min: Some(1), max: None }
        );
        assert!(LengthTrait::from_node(&json!({})).is_err());
        assert!(LengthTrait::from_node(&json!({"min": 5, "max": 1})).is_err());
        assert!(LengthTrait::from_node(&json!({"min": -1})).is_err());

        let range = RangeTrait::from_node(&json!({"min": 0.5, "max": 10})).unwrap();
        assert_eq!(range.min, Some(0.5));
        assert_eq!(range.max, Some(10.0));
    }

    #[test]
    fn pattern_trait_compiles_regex() {
        let pattern = PatternTrait::from_node(&json!("^[a-z]+$")).unwrap();
        assert!(pattern.0.is_match("abc"));
        assert!(PatternTrait::from_node(&json!("(")).is_err());
    }

    #[test]
    fn deprecated_and_tags() {
        let deprecated = DeprecatedTrait::from_node(&json!({"message": "use Bar"})).unwrap();
        assert_eq!(deprecated.message.as_deref(), Some("use Bar"));
        assert_eq!(deprecated.since, None);
        assert_eq!(
            TagsTrait::from_node(&json!(["a"])).unwrap(),
            TagsTrait(vec!["a".to_string()])
        );
    }
}

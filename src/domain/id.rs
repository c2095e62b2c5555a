//! Shape identifiers
//!
//! ID Format:
//! - Top-level shapes: `{namespace}#{name}` (e.g., `smithy.example#Foo`)
//! - Members: `{namespace}#{name}${member}` (e.g., `smithy.example#Foo$bar`)
//!
//! Namespaces are one or more identifiers joined by `.`. Names and member
//! names are single identifiers (`[A-Za-z_][A-Za-z0-9_]*`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace of the built-in prelude shapes and traits
pub const PRELUDE_NAMESPACE: &str = "smithy.api";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShapeIdError {
    #[error("Invalid shape ID: expected 'namespace#name' or 'namespace#name$member', got '{0}'")]
    InvalidShapeId(String),

    #[error("Invalid namespace: '{0}'")]
    InvalidNamespace(String),

    #[error("Invalid shape name: '{0}'")]
    InvalidName(String),

    #[error("Invalid member name: '{0}'")]
    InvalidMember(String),
}

/// Returns true if `s` is a valid identifier
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns true if `s` is a valid namespace (`identifier(.identifier)*`)
pub fn is_valid_namespace(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_valid_identifier)
}

/// Globally unique identifier of a shape
///
/// Equality and ordering are structural: namespace, then name, then member
/// (a top-level ID sorts before any of its members).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeId {
    namespace: String,
    name: String,
    member: Option<String>,
}

impl ShapeId {
    /// Creates a top-level shape ID from a namespace and a name
    pub fn from_parts(namespace: &str, name: &str) -> Result<Self, ShapeIdError> {
        if !is_valid_namespace(namespace) {
            return Err(ShapeIdError::InvalidNamespace(namespace.to_string()));
        }
        if !is_valid_identifier(name) {
            return Err(ShapeIdError::InvalidName(name.to_string()));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            member: None,
        })
    }

    /// Parses an absolute shape ID (`namespace#name` or `namespace#name$member`)
    pub fn parse(s: &str) -> Result<Self, ShapeIdError> {
        s.parse()
    }

    /// Creates a shape ID from a relative reference (`name` or `name$member`)
    /// resolved against `namespace`.
    pub fn from_relative(namespace: &str, relative: &str) -> Result<Self, ShapeIdError> {
        if relative.contains('#') {
            return Err(ShapeIdError::InvalidName(relative.to_string()));
        }
        Self::parse(&format!("{}#{}", namespace, relative))
    }

    /// Parses `text` as an absolute ID when it contains `#`, or as a relative
    /// reference to `namespace` otherwise
    pub fn from_optional_namespace(namespace: &str, text: &str) -> Result<Self, ShapeIdError> {
        if text.contains('#') {
            Self::parse(text)
        } else {
            Self::from_relative(namespace, text)
        }
    }

    /// Creates an ID in the prelude namespace
    ///
    /// Only used with known-valid literal names.
    pub(crate) fn prelude(name: &str) -> Self {
        debug_assert!(is_valid_identifier(name), "invalid prelude name {name}");
        Self {
            namespace: PRELUDE_NAMESPACE.to_string(),
            name: name.to_string(),
            member: None,
        }
    }

    /// Returns the namespace portion of the ID
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the shape name portion of the ID
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member name, if this is a member ID
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Returns true if this ID refers to a member
    pub fn is_member(&self) -> bool {
        self.member.is_some()
    }

    /// Returns true if this ID is in the prelude namespace
    pub fn is_prelude(&self) -> bool {
        self.namespace == PRELUDE_NAMESPACE
    }

    /// Creates a member ID under this shape
    ///
    /// Any existing member part is replaced.
    pub fn with_member(&self, member: &str) -> Result<ShapeId, ShapeIdError> {
        if !is_valid_identifier(member) {
            return Err(ShapeIdError::InvalidMember(member.to_string()));
        }
        Ok(ShapeId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: Some(member.to_string()),
        })
    }

    /// Returns the containing shape ID (this ID without its member part)
    pub fn without_member(&self) -> ShapeId {
        ShapeId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: None,
        }
    }

    /// Returns the ID relative to its namespace (`name` or `name$member`)
    pub fn relative_reference(&self) -> String {
        match &self.member {
            Some(member) => format!("{}${}", self.name, member),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)?;
        if let Some(member) = &self.member {
            write!(f, "${}", member)?;
        }
        Ok(())
    }
}

impl FromStr for ShapeId {
    type Err = ShapeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace, rest) = s
            .split_once('#')
            .ok_or_else(|| ShapeIdError::InvalidShapeId(s.to_string()))?;

        if !is_valid_namespace(namespace) {
            return Err(ShapeIdError::InvalidNamespace(namespace.to_string()));
        }

        let (name, member) = match rest.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (rest, None),
        };

        if !is_valid_identifier(name) {
            return Err(ShapeIdError::InvalidName(name.to_string()));
        }

        if let Some(member) = member {
            if !is_valid_identifier(member) {
                return Err(ShapeIdError::InvalidMember(member.to_string()));
            }
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            member: member.map(str::to_string),
        })
    }
}

impl TryFrom<String> for ShapeId {
    type Error = ShapeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for ShapeId {
    type Error = ShapeIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.to_string()
    }
}

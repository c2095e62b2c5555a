//! Shapes: the nodes of the model graph
//!
//! Every shape has an ID, a set of traits, a source location and a
//! [`ShapeKind`] carrying its type-specific data. Members are shapes too:
//! they live inside their container and are also registered in the model
//! under their member ID.
//!
//! Shapes are immutable once built. Use [`ShapeBuilder`] (or
//! [`Shape::to_builder`]) to create and modify them.

use super::id::{ShapeId, ShapeIdError};
use super::node::SourceLocation;
use super::traits::{Trait, TypedTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShapeError {
    #[error("Shape builder for a {0} shape is missing an ID")]
    MissingId(ShapeType),

    #[error("An ID must be set on the {shape_type} builder before adding member `{member}`")]
    MemberBeforeId { shape_type: ShapeType, member: String },

    #[error("Member shape `{0}` is missing a target")]
    MissingTarget(ShapeId),

    #[error("Member shapes require an ID with a member name, found `{0}`")]
    MemberIdRequired(ShapeId),

    #[error("Only member shapes may have member IDs, found {shape_type} `{id}`")]
    UnexpectedMemberId { shape_type: ShapeType, id: ShapeId },

    #[error("{shape_type} shape `{id}` is missing required member `{member}`")]
    MissingMember {
        shape_type: ShapeType,
        id: ShapeId,
        member: &'static str,
    },

    #[error("Expected member `{member}` of `{container}` to be `{container}${member}`, found `{found}`")]
    MemberIdMismatch {
        container: ShapeId,
        member: String,
        found: ShapeId,
    },

    #[error("{shape_type} shape `{id}` does not support member `{member}`")]
    UnsupportedMember {
        shape_type: ShapeType,
        id: ShapeId,
        member: String,
    },

    #[error("`{0}` is not a member shape")]
    NotAMember(ShapeId),

    #[error(transparent)]
    InvalidId(#[from] ShapeIdError),
}

/// The type of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeType {
    Blob,
    Boolean,
    String,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Timestamp,
    Document,
    List,
    Set,
    Map,
    Structure,
    Union,
    Member,
    Operation,
    Resource,
    Service,
}

impl ShapeType {
    pub const ALL: [ShapeType; 22] = [
        ShapeType::Blob,
        ShapeType::Boolean,
        ShapeType::String,
        ShapeType::Byte,
        ShapeType::Short,
        ShapeType::Integer,
        ShapeType::Long,
        ShapeType::Float,
        ShapeType::Double,
        ShapeType::BigInteger,
        ShapeType::BigDecimal,
        ShapeType::Timestamp,
        ShapeType::Document,
        ShapeType::List,
        ShapeType::Set,
        ShapeType::Map,
        ShapeType::Structure,
        ShapeType::Union,
        ShapeType::Member,
        ShapeType::Operation,
        ShapeType::Resource,
        ShapeType::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Blob => "blob",
            ShapeType::Boolean => "boolean",
            ShapeType::String => "string",
            ShapeType::Byte => "byte",
            ShapeType::Short => "short",
            ShapeType::Integer => "integer",
            ShapeType::Long => "long",
            ShapeType::Float => "float",
            ShapeType::Double => "double",
            ShapeType::BigInteger => "bigInteger",
            ShapeType::BigDecimal => "bigDecimal",
            ShapeType::Timestamp => "timestamp",
            ShapeType::Document => "document",
            ShapeType::List => "list",
            ShapeType::Set => "set",
            ShapeType::Map => "map",
            ShapeType::Structure => "structure",
            ShapeType::Union => "union",
            ShapeType::Member => "member",
            ShapeType::Operation => "operation",
            ShapeType::Resource => "resource",
            ShapeType::Service => "service",
        }
    }

    /// Position of the type in [`ShapeType::ALL`]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            ShapeType::Byte
                | ShapeType::Short
                | ShapeType::Integer
                | ShapeType::Long
                | ShapeType::Float
                | ShapeType::Double
                | ShapeType::BigInteger
                | ShapeType::BigDecimal
        )
    }

    pub fn is_simple(&self) -> bool {
        self.index() <= ShapeType::Document.index()
    }

    /// Lists and sets
    pub fn is_collection(&self) -> bool {
        matches!(self, ShapeType::List | ShapeType::Set)
    }

    /// Shapes that contain members
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            ShapeType::List | ShapeType::Set | ShapeType::Map | ShapeType::Structure | ShapeType::Union
        )
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown shape type: '{}'", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationShape {
    pub input: Option<ShapeId>,
    pub output: Option<ShapeId>,
    pub errors: Vec<ShapeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceShape {
    pub identifiers: BTreeMap<String, ShapeId>,
    pub create: Option<ShapeId>,
    pub read: Option<ShapeId>,
    pub update: Option<ShapeId>,
    pub delete: Option<ShapeId>,
    pub list: Option<ShapeId>,
    pub operations: Vec<ShapeId>,
    pub resources: Vec<ShapeId>,
}

impl ResourceShape {
    /// Lifecycle operations paired with their names
    pub fn lifecycle(&self) -> [(&'static str, Option<&ShapeId>); 5] {
        [
            ("create", self.create.as_ref()),
            ("read", self.read.as_ref()),
            ("update", self.update.as_ref()),
            ("delete", self.delete.as_ref()),
            ("list", self.list.as_ref()),
        ]
    }

    /// Every operation bound to the resource, lifecycle operations included
    pub fn all_operations(&self) -> Vec<&ShapeId> {
        let mut all: Vec<&ShapeId> = self.operations.iter().collect();
        for (_, id) in self.lifecycle() {
            if let Some(id) = id {
                if !all.contains(&id) {
                    all.push(id);
                }
            }
        }
        all
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceShape {
    pub version: String,
    pub operations: Vec<ShapeId>,
    pub resources: Vec<ShapeId>,
}

/// Type-specific shape data
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Blob,
    Boolean,
    String,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Timestamp,
    Document,
    List { member: Box<Shape> },
    Set { member: Box<Shape> },
    Map { key: Box<Shape>, value: Box<Shape> },
    Structure { members: Vec<Shape> },
    Union { members: Vec<Shape> },
    Member { target: ShapeId },
    Operation(OperationShape),
    Resource(ResourceShape),
    Service(ServiceShape),
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Blob => ShapeType::Blob,
            ShapeKind::Boolean => ShapeType::Boolean,
            ShapeKind::String => ShapeType::String,
            ShapeKind::Byte => ShapeType::Byte,
            ShapeKind::Short => ShapeType::Short,
            ShapeKind::Integer => ShapeType::Integer,
            ShapeKind::Long => ShapeType::Long,
            ShapeKind::Float => ShapeType::Float,
            ShapeKind::Double => ShapeType::Double,
            ShapeKind::BigInteger => ShapeType::BigInteger,
            ShapeKind::BigDecimal => ShapeType::BigDecimal,
            ShapeKind::Timestamp => ShapeType::Timestamp,
            ShapeKind::Document => ShapeType::Document,
            ShapeKind::List { .. } => ShapeType::List,
            ShapeKind::Set { .. } => ShapeType::Set,
            ShapeKind::Map { .. } => ShapeType::Map,
            ShapeKind::Structure { .. } => ShapeType::Structure,
            ShapeKind::Union { .. } => ShapeType::Union,
            ShapeKind::Member { .. } => ShapeType::Member,
            ShapeKind::Operation(_) => ShapeType::Operation,
            ShapeKind::Resource(_) => ShapeType::Resource,
            ShapeKind::Service(_) => ShapeType::Service,
        }
    }
}

/// A node in the shape graph
#[derive(Debug, Clone)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    traits: BTreeMap<ShapeId, Trait>,
    source: SourceLocation,
}

// Equality covers ID, type data and traits. Source locations are ignored.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.traits == other.traits
    }
}

impl Shape {
    pub fn builder(shape_type: ShapeType) -> ShapeBuilder {
        ShapeBuilder::new(shape_type)
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    pub fn traits(&self) -> &BTreeMap<ShapeId, Trait> {
        &self.traits
    }

    pub fn get_trait(&self, id: &ShapeId) -> Option<&Trait> {
        self.traits.get(id)
    }

    pub fn has_trait(&self, id: &ShapeId) -> bool {
        self.traits.contains_key(id)
    }

    /// Looks up a prelude trait by name and converts it to its typed form
    ///
    /// Returns `None` if the trait is absent or its value does not convert.
    pub fn get_typed<T: TypedTrait>(&self) -> Option<T> {
        self.traits
            .get(&T::id())
            .and_then(|t| T::from_node(t.value()).ok())
    }

    /// Returns true if the shape has the named prelude trait
    pub fn has_prelude_trait(&self, name: &str) -> bool {
        self.traits.contains_key(&ShapeId::prelude(name))
    }

    /// Members of an aggregate shape in declaration order
    ///
    /// Lists and sets yield `member`; maps yield `key` then `value`.
    pub fn members(&self) -> Vec<&Shape> {
        match &self.kind {
            ShapeKind::List { member } | ShapeKind::Set { member } => vec![member.as_ref()],
            ShapeKind::Map { key, value } => vec![key.as_ref(), value.as_ref()],
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                members.iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&Shape> {
        self.members()
            .into_iter()
            .find(|m| m.id.member() == Some(name))
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, ShapeKind::Member { .. })
    }

    /// Name of a member shape
    pub fn member_name(&self) -> Option<&str> {
        self.id.member()
    }

    /// Target of a member shape
    pub fn target(&self) -> Option<&ShapeId> {
        match &self.kind {
            ShapeKind::Member { target } => Some(target),
            _ => None,
        }
    }

    /// ID of the shape containing this member
    pub fn container(&self) -> Option<ShapeId> {
        self.is_member().then(|| self.id.without_member())
    }

    pub fn as_operation(&self) -> Option<&OperationShape> {
        match &self.kind {
            ShapeKind::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceShape> {
        match &self.kind {
            ShapeKind::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceShape> {
        match &self.kind {
            ShapeKind::Service(service) => Some(service),
            _ => None,
        }
    }

    /// Returns a builder initialized with this shape's data
    pub fn to_builder(&self) -> ShapeBuilder {
        let mut builder = ShapeBuilder::new(self.shape_type())
            .id(self.id.clone())
            .source(self.source.clone());
        builder.traits = self.traits.clone();
        builder.members = self.members().into_iter().cloned().collect();
        match &self.kind {
            ShapeKind::Member { target } => builder.target = Some(target.clone()),
            ShapeKind::Operation(op) => builder.operation = op.clone(),
            ShapeKind::Resource(resource) => builder.resource = resource.clone(),
            ShapeKind::Service(service) => builder.service = service.clone(),
            _ => {}
        }
        builder
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}: `{}`)", self.shape_type(), self.id)
    }
}

/// Builds [`Shape`]s
///
/// All setters are available for every shape type; only the data relevant
/// to the builder's type ends up in the built shape. Contract violations
/// that happen while building (such as adding a member before the ID is
/// set) are reported by [`ShapeBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBuilder {
    shape_type: ShapeType,
    id: Option<ShapeId>,
    source: SourceLocation,
    traits: BTreeMap<ShapeId, Trait>,
    members: Vec<Shape>,
    target: Option<ShapeId>,
    operation: OperationShape,
    resource: ResourceShape,
    service: ServiceShape,
    error: Option<ShapeError>,
}

impl ShapeBuilder {
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            id: None,
            source: SourceLocation::none(),
            traits: BTreeMap::new(),
            members: Vec::new(),
            target: None,
            operation: OperationShape::default(),
            resource: ResourceShape::default(),
            service: ServiceShape::default(),
            error: None,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn get_id(&self) -> Option<&ShapeId> {
        self.id.as_ref()
    }

    pub fn get_source(&self) -> &SourceLocation {
        &self.source
    }

    pub fn get_traits(&self) -> &BTreeMap<ShapeId, Trait> {
        &self.traits
    }

    pub fn id(mut self, id: ShapeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn add_trait(mut self, t: Trait) -> Self {
        self.set_trait(t);
        self
    }

    /// Adds or replaces a trait
    pub fn set_trait(&mut self, t: Trait) {
        self.traits.insert(t.id().clone(), t);
    }

    pub fn remove_trait(mut self, id: &ShapeId) -> Self {
        self.traits.remove(id);
        self
    }

    /// Adds a built member shape, replacing any member with the same name
    pub fn add_member(mut self, member: Shape) -> Self {
        self.push_member(member);
        self
    }

    pub fn push_member(&mut self, member: Shape) {
        if let Some(existing) = self.members.iter_mut().find(|m| m.id == member.id) {
            *existing = member;
        } else {
            self.members.push(member);
        }
    }

    /// Adds a member named `name` targeting `target`
    ///
    /// The builder's ID must already be set.
    pub fn member(self, name: &str, target: ShapeId) -> Self {
        self.member_with(name, target, |m| m)
    }

    /// Adds a member and lets `configure` customize it (traits, source)
    pub fn member_with(
        mut self,
        name: &str,
        target: ShapeId,
        configure: impl FnOnce(ShapeBuilder) -> ShapeBuilder,
    ) -> Self {
        let Some(id) = &self.id else {
            self.error.get_or_insert(ShapeError::MemberBeforeId {
                shape_type: self.shape_type,
                member: name.to_string(),
            });
            return self;
        };
        let member_id = match id.with_member(name) {
            Ok(member_id) => member_id,
            Err(e) => {
                self.error.get_or_insert(e.into());
                return self;
            }
        };
        let built = configure(
            ShapeBuilder::new(ShapeType::Member)
                .id(member_id)
                .target(target)
                .source(self.source.clone()),
        )
        .build();
        match built {
            Ok(member) => self.push_member(member),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn remove_member(mut self, name: &str) -> Self {
        self.members.retain(|m| m.id.member() != Some(name));
        self
    }

    pub fn target(mut self, target: ShapeId) -> Self {
        self.set_target(target);
        self
    }

    pub fn set_target(&mut self, target: ShapeId) {
        self.target = Some(target);
    }

    pub fn input(mut self, input: ShapeId) -> Self {
        self.operation.input = Some(input);
        self
    }

    pub fn output(mut self, output: ShapeId) -> Self {
        self.operation.output = Some(output);
        self
    }

    pub fn add_error(mut self, error: ShapeId) -> Self {
        self.operation.errors.push(error);
        self
    }

    /// Mutable access to operation data (used while resolving references)
    pub fn operation_mut(&mut self) -> &mut OperationShape {
        &mut self.operation
    }

    pub fn resource_mut(&mut self) -> &mut ResourceShape {
        &mut self.resource
    }

    pub fn service_mut(&mut self) -> &mut ServiceShape {
        &mut self.service
    }

    pub fn version(mut self, version: &str) -> Self {
        self.service.version = version.to_string();
        self
    }

    /// Binds an operation to a service or resource
    pub fn add_operation(mut self, operation: ShapeId) -> Self {
        match self.shape_type {
            ShapeType::Resource => self.resource.operations.push(operation),
            _ => self.service.operations.push(operation),
        }
        self
    }

    /// Binds a resource to a service or resource
    pub fn add_resource(mut self, resource: ShapeId) -> Self {
        match self.shape_type {
            ShapeType::Resource => self.resource.resources.push(resource),
            _ => self.service.resources.push(resource),
        }
        self
    }

    pub fn identifier(mut self, name: &str, target: ShapeId) -> Self {
        self.resource.identifiers.insert(name.to_string(), target);
        self
    }

    pub fn create(mut self, operation: ShapeId) -> Self {
        self.resource.create = Some(operation);
        self
    }

    pub fn read(mut self, operation: ShapeId) -> Self {
        self.resource.read = Some(operation);
        self
    }

    pub fn update(mut self, operation: ShapeId) -> Self {
        self.resource.update = Some(operation);
        self
    }

    pub fn delete(mut self, operation: ShapeId) -> Self {
        self.resource.delete = Some(operation);
        self
    }

    pub fn list(mut self, operation: ShapeId) -> Self {
        self.resource.list = Some(operation);
        self
    }

    fn take_member(
        members: &mut Vec<Shape>,
        shape_type: ShapeType,
        id: &ShapeId,
        name: &'static str,
    ) -> Result<Box<Shape>, ShapeError> {
        let position = members
            .iter()
            .position(|m| m.id.member() == Some(name))
            .ok_or_else(|| ShapeError::MissingMember {
                shape_type,
                id: id.clone(),
                member: name,
            })?;
        Ok(Box::new(members.remove(position)))
    }

    pub fn build(self) -> Result<Shape, ShapeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let id = self.id.ok_or(ShapeError::MissingId(self.shape_type))?;

        if self.shape_type == ShapeType::Member {
            if !id.is_member() {
                return Err(ShapeError::MemberIdRequired(id));
            }
        } else if id.is_member() {
            return Err(ShapeError::UnexpectedMemberId {
                shape_type: self.shape_type,
                id,
            });
        }

        let mut members = self.members;
        for member in &members {
            if !member.is_member() {
                return Err(ShapeError::NotAMember(member.id.clone()));
            }
            let name = member.id.member().unwrap_or_default();
            if member.id.without_member() != id {
                return Err(ShapeError::MemberIdMismatch {
                    container: id.clone(),
                    member: name.to_string(),
                    found: member.id.clone(),
                });
            }
            let allowed = match self.shape_type {
                ShapeType::List | ShapeType::Set => name == "member",
                ShapeType::Map => name == "key" || name == "value",
                ShapeType::Structure | ShapeType::Union => true,
                _ => false,
            };
            if !allowed {
                return Err(ShapeError::UnsupportedMember {
                    shape_type: self.shape_type,
                    id: id.clone(),
                    member: name.to_string(),
                });
            }
        }

        let shape_type = self.shape_type;
        let kind = match shape_type {
            ShapeType::Blob => ShapeKind::Blob,
            ShapeType::Boolean => ShapeKind::Boolean,
            ShapeType::String => ShapeKind::String,
            ShapeType::Byte => ShapeKind::Byte,
            ShapeType::Short => ShapeKind::Short,
            ShapeType::Integer => ShapeKind::Integer,
            ShapeType::Long => ShapeKind::Long,
            ShapeType::Float => ShapeKind::Float,
            ShapeType::Double => ShapeKind::Double,
            ShapeType::BigInteger => ShapeKind::BigInteger,
            ShapeType::BigDecimal => ShapeKind::BigDecimal,
            ShapeType::Timestamp => ShapeKind::Timestamp,
            ShapeType::Document => ShapeKind::Document,
            ShapeType::List => ShapeKind::List {
                member: Self::take_member(&mut members, shape_type, &id, "member")?,
            },
            ShapeType::Set => ShapeKind::Set {
                member: Self::take_member(&mut members, shape_type, &id, "member")?,
            },
            ShapeType::Map => {
                let key = Self::take_member(&mut members, shape_type, &id, "key")?;
                let value = Self::take_member(&mut members, shape_type, &id, "value")?;
                ShapeKind::Map { key, value }
            }
            ShapeType::Structure => ShapeKind::Structure { members },
            ShapeType::Union => ShapeKind::Union { members },
            ShapeType::Member => ShapeKind::Member {
                target: self.target.ok_or_else(|| ShapeError::MissingTarget(id.clone()))?,
            },
            ShapeType::Operation => ShapeKind::Operation(self.operation),
            ShapeType::Resource => ShapeKind::Resource(self.resource),
            ShapeType::Service => ShapeKind::Service(self.service),
        };

        Ok(Shape {
            id,
            kind,
            traits: self.traits,
            source: self.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::prelude_trait;
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    #[test]
    fn shape_type_names_roundtrip() {
        for t in ShapeType::ALL {
            assert_eq!(t.as_str().parse::<ShapeType>().unwrap(), t);
            assert_eq!(ShapeType::ALL[t.index()], t);
        }
        assert!("widget".parse::<ShapeType>().is_err());
    }

    #[test]
    fn shape_type_categories() {
        assert!(ShapeType::BigDecimal.is_number());
        assert!(!ShapeType::Timestamp.is_number());
        assert!(ShapeType::Document.is_simple());
        assert!(!ShapeType::List.is_simple());
        assert!(ShapeType::Set.is_collection());
        assert!(ShapeType::Map.is_aggregate());
    }

    #[test]
    fn builds_structure_with_ordered_members() {
        let shape = Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("zeta", id("smithy.api#String"))
            .member("alpha", id("smithy.api#Integer"))
            .build()
            .unwrap();

        let names: Vec<&str> = shape
            .members()
            .iter()
            .filter_map(|m| m.member_name())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        let alpha = shape.member("alpha").unwrap();
        assert_eq!(alpha.id(), &id("ns#Foo$alpha"));
        assert_eq!(alpha.target(), Some(&id("smithy.api#Integer")));
        assert_eq!(alpha.container(), Some(id("ns#Foo")));
    }

    #[test]
    fn member_before_id_is_an_error() {
        let err = Shape::builder(ShapeType::Structure)
            .member("a", id("smithy.api#String"))
            .id(id("ns#Foo"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::MemberBeforeId { .. }));
    }

    #[test]
    fn map_requires_key_and_value() {
        let err = Shape::builder(ShapeType::Map)
            .id(id("ns#M"))
            .member("key", id("smithy.api#String"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::MissingMember { member: "value", .. }));

        let map = Shape::builder(ShapeType::Map)
            .id(id("ns#M"))
            .member("key", id("smithy.api#String"))
            .member("value", id("smithy.api#Integer"))
            .build()
            .unwrap();
        assert_eq!(map.members().len(), 2);
    }

    #[test]
    fn map_rejects_other_members() {
        let err = Shape::builder(ShapeType::Map)
            .id(id("ns#M"))
            .member("key", id("smithy.api#String"))
            .member("value", id("smithy.api#String"))
            .member("extra", id("smithy.api#String"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::UnsupportedMember { .. }));
    }

    #[test]
    fn member_ids_must_match_container() {
        let stray = Shape::builder(ShapeType::Member)
            .id(id("ns#Other$member"))
            .target(id("smithy.api#String"))
            .build()
            .unwrap();
        let err = Shape::builder(ShapeType::List)
            .id(id("ns#L"))
            .add_member(stray)
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::MemberIdMismatch { .. }));
    }

    #[test]
    fn member_requires_target_and_member_id() {
        let err = Shape::builder(ShapeType::Member)
            .id(id("ns#A$b"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::MissingTarget(_)));

        let err = Shape::builder(ShapeType::Member)
            .id(id("ns#A"))
            .target(id("ns#B"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::MemberIdRequired(_)));

        let err = Shape::builder(ShapeType::String)
            .id(id("ns#A$b"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ShapeError::UnexpectedMemberId { .. }));
    }

    #[test]
    fn equality_ignores_source_location() {
        let a = Shape::builder(ShapeType::String)
            .id(id("ns#S"))
            .source(SourceLocation::new("a.json", 1, 1))
            .build()
            .unwrap();
        let b = Shape::builder(ShapeType::String)
            .id(id("ns#S"))
            .build()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn to_builder_roundtrip() {
        let op = Shape::builder(ShapeType::Operation)
            .id(id("ns#GetFoo"))
            .input(id("ns#GetFooInput"))
            .add_error(id("ns#NotFound"))
            .add_trait(Trait::new(prelude_trait("readonly"), json!(true)))
            .build()
            .unwrap();
        let rebuilt = op.to_builder().build().unwrap();
        assert_eq!(rebuilt, op);
        assert!(rebuilt.has_prelude_trait("readonly"));
        assert_eq!(rebuilt.as_operation().unwrap().errors.len(), 1);
    }

    #[test]
    fn resource_all_operations_include_lifecycle() {
        let resource = Shape::builder(ShapeType::Resource)
            .id(id("ns#R"))
            .read(id("ns#GetR"))
            .add_operation(id("ns#Touch"))
            .add_operation(id("ns#GetR"))
            .build()
            .unwrap();
        let ops: Vec<String> = resource
            .as_resource()
            .unwrap()
            .all_operations()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ops, vec!["ns#Touch", "ns#GetR"]);
    }

    #[test]
    fn typed_trait_lookup() {
        let shape = Shape::builder(ShapeType::String)
            .id(id("ns#S"))
            .add_trait(Trait::new(prelude_trait("documentation"), json!("Docs")))
            .build()
            .unwrap();
        let docs: crate::domain::traits::DocumentationTrait = shape.get_typed().unwrap();
        assert_eq!(docs.0, "Docs");
        assert!(shape.get_typed::<crate::domain::traits::TagsTrait>().is_none());
    }
}

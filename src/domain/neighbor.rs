//! Typed relationships between shapes
//!
//! [`NeighborProvider`] enumerates the relationships found by visiting a
//! shape. [`NeighborIndex`] precomputes them for a whole model so both
//! directions can be walked.

use super::id::ShapeId;
use super::model::Model;
use super::shape::{Shape, ShapeKind};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    Identifier,
    Resource,
    Operation,
    Bound,
    Create,
    Read,
    Update,
    Delete,
    List,
    Input,
    Output,
    Error,
    MemberContainer,
    MemberTarget,
    ListMember,
    SetMember,
    MapKey,
    MapValue,
    StructureMember,
    UnionMember,
    Trait,
}

/// Whether a relationship is followed by plain selector traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipDirection {
    Directed,
    Inverted,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 21] = [
        RelationshipType::Identifier,
        RelationshipType::Resource,
        RelationshipType::Operation,
        RelationshipType::Bound,
        RelationshipType::Create,
        RelationshipType::Read,
        RelationshipType::Update,
        RelationshipType::Delete,
        RelationshipType::List,
        RelationshipType::Input,
        RelationshipType::Output,
        RelationshipType::Error,
        RelationshipType::MemberContainer,
        RelationshipType::MemberTarget,
        RelationshipType::ListMember,
        RelationshipType::SetMember,
        RelationshipType::MapKey,
        RelationshipType::MapValue,
        RelationshipType::StructureMember,
        RelationshipType::UnionMember,
        RelationshipType::Trait,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Identifier => "IDENTIFIER",
            RelationshipType::Resource => "RESOURCE",
            RelationshipType::Operation => "OPERATION",
            RelationshipType::Bound => "BOUND",
            RelationshipType::Create => "CREATE",
            RelationshipType::Read => "READ",
            RelationshipType::Update => "UPDATE",
            RelationshipType::Delete => "DELETE",
            RelationshipType::List => "LIST",
            RelationshipType::Input => "INPUT",
            RelationshipType::Output => "OUTPUT",
            RelationshipType::Error => "ERROR",
            RelationshipType::MemberContainer => "MEMBER_CONTAINER",
            RelationshipType::MemberTarget => "MEMBER_TARGET",
            RelationshipType::ListMember => "LIST_MEMBER",
            RelationshipType::SetMember => "SET_MEMBER",
            RelationshipType::MapKey => "MAP_KEY",
            RelationshipType::MapValue => "MAP_VALUE",
            RelationshipType::StructureMember => "STRUCTURE_MEMBER",
            RelationshipType::UnionMember => "UNION_MEMBER",
            RelationshipType::Trait => "TRAIT",
        }
    }

    /// Name used to filter the relationship in selector expressions
    ///
    /// Every member relationship shares the `member` label.
    /// `MEMBER_CONTAINER` and `MEMBER_TARGET` cannot be filtered by name.
    pub fn selector_label(&self) -> Option<&'static str> {
        match self {
            RelationshipType::Identifier => Some("identifier"),
            RelationshipType::Resource => Some("resource"),
            RelationshipType::Operation => Some("operation"),
            RelationshipType::Bound => Some("bound"),
            RelationshipType::Create => Some("create"),
            RelationshipType::Read => Some("read"),
            RelationshipType::Update => Some("update"),
            RelationshipType::Delete => Some("delete"),
            RelationshipType::List => Some("list"),
            RelationshipType::Input => Some("input"),
            RelationshipType::Output => Some("output"),
            RelationshipType::Error => Some("error"),
            RelationshipType::MemberContainer | RelationshipType::MemberTarget => None,
            RelationshipType::ListMember
            | RelationshipType::SetMember
            | RelationshipType::MapKey
            | RelationshipType::MapValue
            | RelationshipType::StructureMember
            | RelationshipType::UnionMember => Some("member"),
            RelationshipType::Trait => Some("trait"),
        }
    }

    pub fn direction(&self) -> RelationshipDirection {
        match self {
            RelationshipType::Bound | RelationshipType::MemberContainer => {
                RelationshipDirection::Inverted
            }
            _ => RelationshipDirection::Directed,
        }
    }

    /// Returns true if `label` is the selector label of some relationship
    pub fn is_selector_label(label: &str) -> bool {
        Self::ALL.iter().any(|r| r.selector_label() == Some(label))
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown relationship type: '{}'", s))
    }
}

/// A directed edge from `shape` to `neighbor_id`
///
/// `neighbor` is `None` when the target ID is not in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship<'m> {
    pub shape: &'m Shape,
    pub relationship_type: RelationshipType,
    pub neighbor_id: ShapeId,
    pub neighbor: Option<&'m Shape>,
}

impl Relationship<'_> {
    pub fn is_resolved(&self) -> bool {
        self.neighbor.is_some()
    }
}

impl fmt::Display for Relationship<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.shape.id(),
            self.relationship_type,
            self.neighbor_id
        )
    }
}

/// Computes the outgoing relationships of shapes in a model
#[derive(Debug, Clone, Copy)]
pub struct NeighborProvider<'m> {
    model: &'m Model,
    include_traits: bool,
}

impl<'m> NeighborProvider<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            include_traits: false,
        }
    }

    /// A provider that also yields a `TRAIT` relationship per applied trait
    pub fn with_trait_relationships(model: &'m Model) -> Self {
        Self {
            model,
            include_traits: true,
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    fn push(
        &self,
        out: &mut Vec<Relationship<'m>>,
        shape: &'m Shape,
        relationship_type: RelationshipType,
        neighbor_id: &ShapeId,
    ) {
        out.push(Relationship {
            shape,
            relationship_type,
            neighbor_id: neighbor_id.clone(),
            neighbor: self.model.get_shape(neighbor_id),
        });
    }

    fn push_member(
        out: &mut Vec<Relationship<'m>>,
        shape: &'m Shape,
        relationship_type: RelationshipType,
        member: &'m Shape,
    ) {
        out.push(Relationship {
            shape,
            relationship_type,
            neighbor_id: member.id().clone(),
            neighbor: Some(member),
        });
    }

    /// Every relationship whose source is `shape`, plus `BOUND` edges from
    /// shapes bound to a service or resource
    pub fn neighbors(&self, shape: &'m Shape) -> Vec<Relationship<'m>> {
        let mut out = Vec::new();
        match shape.kind() {
            ShapeKind::Member { target } => {
                self.push(&mut out, shape, RelationshipType::MemberContainer, &shape.id().without_member());
                self.push(&mut out, shape, RelationshipType::MemberTarget, target);
            }
            ShapeKind::List { member } => {
                Self::push_member(&mut out, shape, RelationshipType::ListMember, member);
            }
            ShapeKind::Set { member } => {
                Self::push_member(&mut out, shape, RelationshipType::SetMember, member);
            }
            ShapeKind::Map { key, value } => {
                Self::push_member(&mut out, shape, RelationshipType::MapKey, key);
                Self::push_member(&mut out, shape, RelationshipType::MapValue, value);
            }
            ShapeKind::Structure { members } => {
                for member in members {
                    Self::push_member(&mut out, shape, RelationshipType::StructureMember, member);
                }
            }
            ShapeKind::Union { members } => {
                for member in members {
                    Self::push_member(&mut out, shape, RelationshipType::UnionMember, member);
                }
            }
            ShapeKind::Operation(op) => {
                if let Some(input) = &op.input {
                    self.push(&mut out, shape, RelationshipType::Input, input);
                }
                if let Some(output) = &op.output {
                    self.push(&mut out, shape, RelationshipType::Output, output);
                }
                for error in &op.errors {
                    self.push(&mut out, shape, RelationshipType::Error, error);
                }
            }
            ShapeKind::Resource(resource) => {
                for target in resource.identifiers.values() {
                    self.push(&mut out, shape, RelationshipType::Identifier, target);
                }
                let lifecycle = [
                    (RelationshipType::Create, &resource.create),
                    (RelationshipType::Read, &resource.read),
                    (RelationshipType::Update, &resource.update),
                    (RelationshipType::Delete, &resource.delete),
                    (RelationshipType::List, &resource.list),
                ];
                for (relationship_type, id) in lifecycle {
                    if let Some(id) = id {
                        self.push(&mut out, shape, relationship_type, id);
                    }
                }
                for operation in resource.all_operations() {
                    self.push(&mut out, shape, RelationshipType::Operation, operation);
                }
                for child in &resource.resources {
                    self.push(&mut out, shape, RelationshipType::Resource, child);
                }
                let operations: Vec<ShapeId> =
                    resource.all_operations().into_iter().cloned().collect();
                self.push_bound(&mut out, shape, &operations, &resource.resources);
                // Parents binding this resource
                for parent in self.binders_of(shape.id()) {
                    out.push(Relationship {
                        shape: parent,
                        relationship_type: RelationshipType::Resource,
                        neighbor_id: shape.id().clone(),
                        neighbor: Some(shape),
                    });
                }
            }
            ShapeKind::Service(service) => {
                for operation in &service.operations {
                    self.push(&mut out, shape, RelationshipType::Operation, operation);
                }
                for resource in &service.resources {
                    self.push(&mut out, shape, RelationshipType::Resource, resource);
                }
                self.push_bound(&mut out, shape, &service.operations, &service.resources);
            }
            _ => {}
        }

        if self.include_traits {
            for trait_id in shape.traits().keys() {
                self.push(&mut out, shape, RelationshipType::Trait, trait_id);
            }
        }

        out
    }

    /// `BOUND` relationships: the bound shape is the source and the binder
    /// is the neighbor
    fn push_bound(
        &self,
        out: &mut Vec<Relationship<'m>>,
        binder: &'m Shape,
        operations: &[ShapeId],
        resources: &[ShapeId],
    ) {
        for id in operations.iter().chain(resources) {
            if let Some(bound) = self.model.get_shape(id) {
                out.push(Relationship {
                    shape: bound,
                    relationship_type: RelationshipType::Bound,
                    neighbor_id: binder.id().clone(),
                    neighbor: Some(binder),
                });
            }
        }
    }

    fn binders_of(&self, id: &ShapeId) -> Vec<&'m Shape> {
        let model = self.model;
        model
            .shapes_of_type(super::shape::ShapeType::Service)
            .filter(|s| s.as_service().is_some_and(|svc| svc.resources.contains(id)))
            .chain(
                model
                    .shapes_of_type(super::shape::ShapeType::Resource)
                    .filter(|s| s.as_resource().is_some_and(|r| r.resources.contains(id))),
            )
            .collect()
    }
}

/// Precomputed relationships of a whole model, indexed by source shape and
/// by target shape
///
/// `BOUND` edges found while visiting a service or resource are indexed
/// under the bound shape, so they are reachable from it.
#[derive(Debug, Clone, Default)]
pub struct NeighborIndex<'m> {
    outgoing: HashMap<&'m ShapeId, Vec<Relationship<'m>>>,
    incoming: HashMap<&'m ShapeId, Vec<Relationship<'m>>>,
}

impl<'m> NeighborIndex<'m> {
    pub fn new(provider: &NeighborProvider<'m>) -> Self {
        let mut seen: HashSet<(&'m ShapeId, RelationshipType, ShapeId)> = HashSet::new();
        let mut index = Self::default();
        for shape in provider.model().shapes() {
            for relationship in provider.neighbors(shape) {
                let key = (
                    relationship.shape.id(),
                    relationship.relationship_type,
                    relationship.neighbor_id.clone(),
                );
                if !seen.insert(key) {
                    continue;
                }
                if let Some(neighbor) = relationship.neighbor {
                    index
                        .incoming
                        .entry(neighbor.id())
                        .or_default()
                        .push(relationship.clone());
                }
                index
                    .outgoing
                    .entry(relationship.shape.id())
                    .or_default()
                    .push(relationship);
            }
        }
        index
    }

    /// Relationships whose source is `id`
    pub fn outgoing(&self, id: &ShapeId) -> &[Relationship<'m>] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolved relationships that point at `id`
    pub fn incoming(&self, id: &ShapeId) -> &[Relationship<'m>] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}

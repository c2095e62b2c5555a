//! Parsed selector expressions

use crate::domain::{RelationshipType, ShapeType};

/// One step of a selector; steps are applied left to right
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Type(TypeFilter),
    Attribute(AttributeFilter),
    ScopedAttribute(ScopedAttributeFilter),
    Neighbor(NeighborStep),
    /// `~>`: every shape reachable through directed relationships
    Recursive,
    /// `:is(...)` / `:each(...)`: union of each alternative
    Is(Vec<Vec<Step>>),
    /// `:not(...)`: input shapes not matched by the inner selector
    Not(Vec<Step>),
    /// `:test(...)`: input shapes for which some alternative yields a result
    Test(Vec<Vec<Step>>),
    /// `:topdown(qualifier[, disqualifier])`
    TopDown {
        qualifier: Vec<Step>,
        disqualifier: Option<Vec<Step>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeFilter {
    Any,
    Type(ShapeType),
    Number,
    SimpleType,
    Collection,
}

impl TypeFilter {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "*" => Some(TypeFilter::Any),
            "number" => Some(TypeFilter::Number),
            "simpleType" => Some(TypeFilter::SimpleType),
            "collection" => Some(TypeFilter::Collection),
            other => other.parse().ok().map(TypeFilter::Type),
        }
    }

    pub(crate) fn matches(&self, shape_type: ShapeType) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Type(t) => *t == shape_type,
            TypeFilter::Number => shape_type.is_number(),
            TypeFilter::SimpleType => shape_type.is_simple(),
            TypeFilter::Collection => shape_type.is_collection(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NeighborStep {
    pub direction: Direction,
    /// Relationship labels to follow; empty means every directed relationship
    pub labels: Vec<String>,
}

impl NeighborStep {
    pub(crate) fn accepts(&self, relationship_type: RelationshipType) -> bool {
        if self.labels.is_empty() {
            return relationship_type.direction() == crate::domain::RelationshipDirection::Directed
                && relationship_type != RelationshipType::Trait;
        }
        relationship_type
            .selector_label()
            .is_some_and(|label| self.labels.iter().any(|l| l == label))
    }

    pub(crate) fn uses_traits(&self) -> bool {
        self.labels.iter().any(|l| l == "trait")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparator {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Contains,
    Exists,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// `[path]` or `[path <comparator> values]`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttributeFilter {
    pub path: Vec<String>,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Comparison {
    pub comparator: Comparator,
    pub values: Vec<String>,
    pub case_insensitive: bool,
}

/// `[@scope: assertion && assertion ...]`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScopedAttributeFilter {
    /// Attribute path the assertions are evaluated against; empty means
    /// the shape itself
    pub scope: Vec<String>,
    pub assertions: Vec<ScopedAssertion>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScopedAssertion {
    pub lhs: ScopedValue,
    pub comparator: Comparator,
    pub rhs: Vec<ScopedValue>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScopedValue {
    Literal(String),
    /// `@{path}`: a path relative to the current scope value
    Context(Vec<String>),
}

/// Returns true if any step (recursively) follows trait relationships
pub(crate) fn uses_trait_relationships(steps: &[Step]) -> bool {
    steps.iter().any(|step| match step {
        Step::Neighbor(n) => n.uses_traits(),
        Step::Is(alternatives) | Step::Test(alternatives) => {
            alternatives.iter().any(|a| uses_trait_relationships(a))
        }
        Step::Not(inner) => uses_trait_relationships(inner),
        Step::TopDown {
            qualifier,
            disqualifier,
        } => {
            uses_trait_relationships(qualifier)
                || disqualifier.as_deref().is_some_and(uses_trait_relationships)
        }
        _ => false,
    })
}

//! Domain models for the shape graph
//!
//! Contains the core model logic without any I/O concerns.

mod graph;
mod id;
mod model;
mod neighbor;
mod node;
pub mod prelude;
mod shape;
pub mod traits;

pub use graph::ShapeGraph;
pub use id::{is_valid_identifier, is_valid_namespace, ShapeId, ShapeIdError, PRELUDE_NAMESPACE};
pub use model::{Model, ModelBuilder, ModelError};
pub use neighbor::{
    NeighborIndex, NeighborProvider, Relationship, RelationshipDirection, RelationshipType,
};
pub use node::{Node, NodeType, SourceLocation};
pub use shape::{
    OperationShape, ResourceShape, ServiceShape, Shape, ShapeBuilder, ShapeError, ShapeKind,
    ShapeType,
};
pub use traits::{prelude_trait, Trait, TraitError, TraitFactory, TypedTrait};

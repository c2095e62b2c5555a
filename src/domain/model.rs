//! The semantic model: an immutable shape index plus metadata
//!
//! Members are indexed under their member IDs alongside top-level shapes.
//! Type and trait indexes are computed lazily on first use and are safe to
//! build from several threads at once.

use super::id::ShapeId;
use super::node::Node;
use super::shape::{Shape, ShapeType};
use super::traits::{TraitDefinition, TypedTrait};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),

    #[error("Expected `{id}` to be a {expected} shape, found {found}")]
    WrongShapeType {
        id: ShapeId,
        expected: ShapeType,
        found: ShapeType,
    },
}

#[derive(Debug, Default)]
pub struct Model {
    shapes: BTreeMap<ShapeId, Shape>,
    metadata: BTreeMap<String, Node>,
    type_index: [OnceLock<Vec<ShapeId>>; ShapeType::ALL.len()],
    trait_index: OnceLock<BTreeMap<ShapeId, Vec<ShapeId>>>,
    trait_definitions: OnceLock<BTreeMap<ShapeId, TraitDefinition>>,
}

impl Clone for Model {
    fn clone(&self) -> Self {
        Self {
            shapes: self.shapes.clone(),
            metadata: self.metadata.clone(),
            ..Default::default()
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.shapes == other.shapes && self.metadata == other.metadata
    }
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn to_builder(&self) -> ModelBuilder {
        ModelBuilder {
            shapes: self.shapes.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn expect_shape(&self, id: &ShapeId) -> Result<&Shape, ModelError> {
        self.shapes
            .get(id)
            .ok_or_else(|| ModelError::ShapeNotFound(id.clone()))
    }

    pub fn expect_shape_of_type(
        &self,
        id: &ShapeId,
        expected: ShapeType,
    ) -> Result<&Shape, ModelError> {
        let shape = self.expect_shape(id)?;
        if shape.shape_type() != expected {
            return Err(ModelError::WrongShapeType {
                id: id.clone(),
                expected,
                found: shape.shape_type(),
            });
        }
        Ok(shape)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// All shapes, members included, in ID order
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.shapes.keys()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes of a single type, in ID order
    pub fn shapes_of_type(&self, shape_type: ShapeType) -> impl Iterator<Item = &Shape> {
        let ids = self.type_index[shape_type.index()].get_or_init(|| {
            self.shapes
                .values()
                .filter(|s| s.shape_type() == shape_type)
                .map(|s| s.id().clone())
                .collect()
        });
        ids.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Shapes that have the given trait applied, in ID order
    pub fn shapes_with_trait(&self, trait_id: &ShapeId) -> impl Iterator<Item = &Shape> {
        self.trait_index()
            .get(trait_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.shapes.get(id))
    }

    /// IDs of every trait applied somewhere in the model
    pub fn applied_traits(&self) -> impl Iterator<Item = &ShapeId> {
        self.trait_index().keys()
    }

    fn trait_index(&self) -> &BTreeMap<ShapeId, Vec<ShapeId>> {
        self.trait_index.get_or_init(|| {
            let mut index: BTreeMap<ShapeId, Vec<ShapeId>> = BTreeMap::new();
            for shape in self.shapes.values() {
                for trait_id in shape.traits().keys() {
                    index
                        .entry(trait_id.clone())
                        .or_default()
                        .push(shape.id().clone());
                }
            }
            index
        })
    }

    /// Shapes marked with the `trait` trait, keyed by ID
    pub fn trait_definitions(&self) -> &BTreeMap<ShapeId, TraitDefinition> {
        self.trait_definitions.get_or_init(|| {
            self.shapes_with_trait(&TraitDefinition::id())
                .filter_map(|shape| {
                    let value = shape.get_trait(&TraitDefinition::id())?.value();
                    let definition = TraitDefinition::from_node(value).ok()?;
                    Some((shape.id().clone(), definition))
                })
                .collect()
        })
    }

    pub fn trait_definition(&self, id: &ShapeId) -> Option<&TraitDefinition> {
        self.trait_definitions().get(id)
    }

    pub fn metadata(&self) -> &BTreeMap<String, Node> {
        &self.metadata
    }

    pub fn metadata_property(&self, key: &str) -> Option<&Node> {
        self.metadata.get(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    shapes: BTreeMap<ShapeId, Shape>,
    metadata: BTreeMap<String, Node>,
}

impl ModelBuilder {
    /// Adds a shape, replacing any shape with the same ID
    ///
    /// Members of aggregate shapes are registered as well.
    pub fn add_shape(mut self, shape: Shape) -> Self {
        self.insert_shape(shape);
        self
    }

    pub fn add_shapes(mut self, shapes: impl IntoIterator<Item = Shape>) -> Self {
        for shape in shapes {
            self.insert_shape(shape);
        }
        self
    }

    /// Adds every shape and metadata entry of another model
    pub fn add_model(mut self, model: &Model) -> Self {
        for shape in model.shapes() {
            self.shapes.insert(shape.id().clone(), shape.clone());
        }
        for (key, value) in model.metadata() {
            self.metadata.insert(key.clone(), value.clone());
        }
        self
    }

    fn insert_shape(&mut self, shape: Shape) {
        if let Some(previous) = self.shapes.get(shape.id()) {
            let stale: Vec<ShapeId> = previous.members().iter().map(|m| m.id().clone()).collect();
            for id in stale {
                self.shapes.remove(&id);
            }
        }
        for member in shape.members() {
            self.shapes.insert(member.id().clone(), member.clone());
        }
        self.shapes.insert(shape.id().clone(), shape);
    }

    /// Removes a shape and, for aggregates, all of its members
    pub fn remove_shape(mut self, id: &ShapeId) -> Self {
        if let Some(shape) = self.shapes.remove(id) {
            for member in shape.members() {
                self.shapes.remove(member.id());
            }
        }
        self
    }

    pub fn put_metadata(mut self, key: impl Into<String>, value: Node) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Model {
        Model {
            shapes: self.shapes,
            metadata: self.metadata,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{prelude_trait, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn structure() -> Shape {
        Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("a", id("smithy.api#String"))
            .member("b", id("smithy.api#Integer"))
            .add_trait(Trait::new(prelude_trait("sensitive"), json!(true)))
            .build()
            .unwrap()
    }

    #[test]
    fn adding_aggregate_registers_members() {
        let model = Model::builder().add_shape(structure()).build();
        assert_eq!(model.len(), 3);
        assert!(model.contains(&id("ns#Foo$a")));
        assert_eq!(
            model.get_shape(&id("ns#Foo$b")).unwrap().target(),
            Some(&id("smithy.api#Integer"))
        );
    }

    #[test]
    fn removing_aggregate_removes_members() {
        let model = Model::builder()
            .add_shape(structure())
            .remove_shape(&id("ns#Foo"))
            .build();
        assert!(model.is_empty());
    }

    #[test]
    fn replacing_aggregate_drops_stale_members() {
        let smaller = Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("a", id("smithy.api#String"))
            .build()
            .unwrap();
        let model = Model::builder().add_shape(structure()).add_shape(smaller).build();
        assert!(!model.contains(&id("ns#Foo$b")));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn expect_shape_errors() {
        let model = Model::builder().add_shape(structure()).build();
        assert_eq!(
            model.expect_shape(&id("ns#Missing")).unwrap_err(),
            ModelError::ShapeNotFound(id("ns#Missing"))
        );
        assert!(matches!(
            model.expect_shape_of_type(&id("ns#Foo"), ShapeType::Union),
            Err(ModelError::WrongShapeType { .. })
        ));
        assert!(model
            .expect_shape_of_type(&id("ns#Foo"), ShapeType::Structure)
            .is_ok());
    }

    #[test]
    fn type_and_trait_indexes() {
        let model = Model::builder().add_shape(structure()).build();
        assert_eq!(model.shapes_of_type(ShapeType::Member).count(), 2);
        assert_eq!(model.shapes_of_type(ShapeType::Structure).count(), 1);
        assert_eq!(model.shapes_of_type(ShapeType::Service).count(), 0);

        let sensitive: Vec<&ShapeId> = model
            .shapes_with_trait(&prelude_trait("sensitive"))
            .map(Shape::id)
            .collect();
        assert_eq!(sensitive, vec![&id("ns#Foo")]);
        assert_eq!(model.applied_traits().count(), 1);
    }

    #[test]
    fn trait_definitions_are_indexed() {
        let definition = Shape::builder(ShapeType::Structure)
            .id(id("ns#myTrait"))
            .add_trait(Trait::new(prelude_trait("trait"), json!({"selector": "string"})))
            .build()
            .unwrap();
        let model = Model::builder().add_shape(definition).build();
        let def = model.trait_definition(&id("ns#myTrait")).unwrap();
        assert_eq!(def.selector.expression(), "string");
    }

    #[test]
    fn equality_ignores_caches_and_clones_reset_them() {
        let a = Model::builder()
            .add_shape(structure())
            .put_metadata("k", json!([1]))
            .build();
        let _ = a.shapes_of_type(ShapeType::Member).count();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.metadata_property("k"), Some(&json!([1])));
    }

    #[test]
    fn indexes_can_be_built_concurrently() {
        let model = Model::builder().add_shape(structure()).build();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(model.shapes_of_type(ShapeType::Member).count(), 2);
                    assert_eq!(model.shapes_with_trait(&prelude_trait("sensitive")).count(), 1);
                });
            }
        });
    }
}

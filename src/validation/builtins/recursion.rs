use super::{ticked, SHAPE_RECURSION};
use crate::domain::traits::names;
use crate::domain::{Model, RelationshipType, ShapeGraph, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};

/// Rejects structures that recursively require themselves
///
/// Only required structure members count: an optional member, a collection
/// or a union breaks the cycle because a value can terminate there.
pub struct ShapeRecursion;

impl Validator for ShapeRecursion {
    fn name(&self) -> &str {
        SHAPE_RECURSION
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let graph = ShapeGraph::from_model(model, |rel| {
            rel.relationship_type == RelationshipType::StructureMember
                && rel.shape.shape_type() == ShapeType::Structure
                && rel
                    .neighbor
                    .is_some_and(|member| member.has_prelude_trait(names::REQUIRED))
        });

        graph
            .cycles()
            .into_iter()
            .filter_map(|cycle| {
                let first = cycle.first()?;
                let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
                let event = ValidationEvent::new(
                    SHAPE_RECURSION,
                    Severity::Error,
                    format!(
                        "Found a recursive reference through required structure members that \
                         can never be satisfied between the following shapes: {}",
                        ticked(ids.iter().map(String::as_str))
                    ),
                );
                Some(match model.get_shape(first) {
                    Some(shape) => event.with_shape(shape),
                    None => event.with_shape_id(first.clone()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, Shape, ShapeId, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn structure(name: &str, target: &str, required: bool) -> Shape {
        Shape::builder(ShapeType::Structure)
            .id(id(name))
            .member_with("next", id(target), |m| {
                if required {
                    m.add_trait(Trait::new(prelude_trait("required"), json!(true)))
                } else {
                    m
                }
            })
            .build()
            .unwrap()
    }

    #[test]
    fn required_cycles_are_errors() {
        let model = Model::builder()
            .add_shapes([
                structure("ns#A", "ns#B", true),
                structure("ns#B", "ns#A", true),
            ])
            .build();
        let events = ShapeRecursion.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shape_id(), Some(&id("ns#A")));
        assert!(events[0].message().ends_with("`ns#A`, `ns#B`"));
    }

    #[test]
    fn optional_members_break_cycles() {
        let model = Model::builder()
            .add_shapes([
                structure("ns#A", "ns#B", true),
                structure("ns#B", "ns#A", false),
                structure("ns#Self", "ns#Self", false),
            ])
            .build();
        assert!(ShapeRecursion.validate(&model).is_empty());
    }
}

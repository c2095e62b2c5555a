use super::{user_shapes, TARGET};
use crate::domain::traits::names;
use crate::domain::{Model, NeighborProvider, RelationshipType, Shape, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};

/// Checks that every relationship resolves to a shape of an allowed type
pub struct Target;

impl Validator for Target {
    fn name(&self) -> &str {
        TARGET
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let provider = NeighborProvider::new(model);
        let mut events = Vec::new();
        for shape in user_shapes(model) {
            for relationship in provider.neighbors(shape) {
                // BOUND and parent edges are checked from their own source
                if relationship.shape.id() != shape.id() {
                    continue;
                }
                let message = match relationship.neighbor {
                    None => Some(format!(
                        "{} shape has a `{}` relationship to an unresolved shape `{}`",
                        shape.shape_type(),
                        relationship.relationship_type.as_str().to_lowercase(),
                        relationship.neighbor_id
                    )),
                    Some(target) => invalid_target(model, shape, relationship.relationship_type, target),
                };
                if let Some(message) = message {
                    events.push(ValidationEvent::new(TARGET, Severity::Error, message).with_shape(shape));
                }
            }
        }
        events
    }
}

fn invalid_target(
    model: &Model,
    shape: &Shape,
    relationship_type: RelationshipType,
    target: &Shape,
) -> Option<String> {
    let found = target.shape_type();
    let mismatch = |expected: &str| {
        Some(format!(
            "`{}` relationships from {} shapes must target {}, but `{}` is a {} shape",
            relationship_type.as_str().to_lowercase(),
            shape.shape_type(),
            expected,
            target.id(),
            found
        ))
    };

    match relationship_type {
        RelationshipType::MemberTarget => {
            if matches!(
                found,
                ShapeType::Member | ShapeType::Operation | ShapeType::Resource | ShapeType::Service
            ) {
                return Some(format!("Members cannot target {} shapes, found `{}`", found, target.id()));
            }
            let is_map_key = shape.member_name() == Some("key")
                && shape
                    .container()
                    .and_then(|id| model.get_shape(&id))
                    .is_some_and(|c| c.shape_type() == ShapeType::Map);
            if is_map_key && found != ShapeType::String {
                return Some(format!("Map keys must target a string shape, found {} `{}`", found, target.id()));
            }
            None
        }
        RelationshipType::Input | RelationshipType::Output if found != ShapeType::Structure => {
            mismatch("a structure")
        }
        RelationshipType::Error
            if found != ShapeType::Structure || !target.has_prelude_trait(names::ERROR) =>
        {
            mismatch("a structure with the `error` trait")
        }
        RelationshipType::Identifier if found != ShapeType::String => mismatch("a string"),
        RelationshipType::Resource if found != ShapeType::Resource => mismatch("a resource"),
        RelationshipType::Operation
        | RelationshipType::Create
        | RelationshipType::Read
        | RelationshipType::Update
        | RelationshipType::Delete
        | RelationshipType::List
            if found != ShapeType::Operation =>
        {
            mismatch("an operation")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShapeId, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    #[test]
    fn reports_unresolved_and_mistyped_targets() {
        let op = Shape::builder(ShapeType::Operation)
            .id(id("ns#Op"))
            .input(id("ns#Str"))
            .add_error(id("ns#Oops"))
            .add_error(id("ns#Plain"))
            .build()
            .unwrap();
        let structure = Shape::builder(ShapeType::Structure)
            .id(id("ns#S"))
            .member("a", id("ns#Missing"))
            .member("b", id("ns#Op"))
            .build()
            .unwrap();
        let map = Shape::builder(ShapeType::Map)
            .id(id("ns#M"))
            .member("key", id("ns#Int"))
            .member("value", id("ns#Str"))
            .build()
            .unwrap();
        let oops = Shape::builder(ShapeType::Structure)
            .id(id("ns#Oops"))
            .add_trait(Trait::new(id("smithy.api#error"), json!("client")))
            .build()
            .unwrap();
        let model = Model::builder()
            .add_shapes([
                op,
                structure,
                map,
                oops,
                Shape::builder(ShapeType::Structure).id(id("ns#Plain")).build().unwrap(),
                Shape::builder(ShapeType::String).id(id("ns#Str")).build().unwrap(),
                Shape::builder(ShapeType::Integer).id(id("ns#Int")).build().unwrap(),
            ])
            .build();

        let events = Target.validate(&model);
        let shapes: Vec<String> = events
            .iter()
            .map(|e| e.shape_id().unwrap().to_string())
            .collect();
        assert_eq!(
            shapes,
            vec!["ns#M$key", "ns#Op", "ns#Op", "ns#S$a", "ns#S$b"],
            "{:#?}",
            events
        );
        assert!(events.iter().all(|e| e.severity() == Severity::Error));
        assert!(events[3].message().contains("unresolved shape `ns#Missing`"));
    }
}

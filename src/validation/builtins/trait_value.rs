use super::{user_shapes, TRAIT_VALUE};
use crate::domain::traits::TraitDefinition;
use crate::domain::{Model, Shape, Trait, TraitFactory, TypedTrait};
use crate::validation::{NodeValidator, Severity, ValidationEvent, Validator};

/// Validates every applied trait value against its definition shape
///
/// Values that pass node validation are also checked by the typed trait
/// factory, which knows constraints the shapes cannot express (URI
/// patterns, regular expressions).
pub struct TraitValue;

impl TraitValue {
    fn event(shape: &Shape, t: &Trait, message: String) -> ValidationEvent {
        let event = ValidationEvent::new(TRAIT_VALUE, Severity::Error, message).with_shape(shape);
        if t.source().is_none() {
            event
        } else {
            event.with_source(t.source().clone())
        }
    }
}

impl Validator for TraitValue {
    fn name(&self) -> &str {
        TRAIT_VALUE
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let validator = NodeValidator::new(model);
        let factory = TraitFactory::builtin();
        let mut events = Vec::new();

        for shape in user_shapes(model) {
            for (trait_id, applied) in shape.traits() {
                let Some(definition) = model.get_shape(trait_id) else {
                    continue;
                };
                if !definition.has_trait(&TraitDefinition::id()) {
                    events.push(Self::event(
                        shape,
                        applied,
                        format!("`{}` is applied as a trait but is not a trait definition", trait_id),
                    ));
                    continue;
                }

                let violations = validator.validate(applied.value(), trait_id);
                if violations.is_empty() {
                    if let Err(e) = factory.create_trait(
                        trait_id.clone(),
                        applied.value().clone(),
                        applied.source().clone(),
                    ) {
                        events.push(Self::event(shape, applied, e.to_string()));
                    }
                }
                for violation in violations {
                    events.push(Self::event(
                        shape,
                        applied,
                        format!("Error validating trait `{}`: {}", trait_id, violation),
                    ));
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude, prelude_trait, ShapeId, ShapeType, SourceLocation};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn model(shape: Shape) -> Model {
        Model::builder()
            .add_model(prelude::prelude())
            .add_shape(shape)
            .build()
    }

    fn operation(http: serde_json::Value) -> Shape {
        Shape::builder(ShapeType::Operation)
            .id(id("ns#Op"))
            .add_trait(
                Trait::new(prelude_trait("http"), http)
                    .with_source(SourceLocation::new("model.json", 3, 7)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn valid_values_pass() {
        let events = TraitValue.validate(&model(operation(json!({"method": "GET", "uri": "/a/{b}"}))));
        assert!(events.is_empty(), "{:#?}", events);
    }

    #[test]
    fn node_violations_are_reported_at_the_trait() {
        let events = TraitValue.validate(&model(operation(json!({"method": "GET", "code": "x"}))));
        let messages: Vec<&str> = events.iter().map(|e| e.message()).collect();
        assert_eq!(events.len(), 2, "{:?}", messages);
        assert!(messages[0].contains("Missing required structure member `uri`"));
        assert!(messages[1].contains("code: Expected integer value"));
        assert_eq!(events[0].source(), &SourceLocation::new("model.json", 3, 7));
    }

    #[test]
    fn typed_checks_run_after_node_validation() {
        let events = TraitValue.validate(&model(operation(json!({"method": "GET", "uri": "nope"}))));
        assert_eq!(events.len(), 1, "{:#?}", events);
        assert_eq!(events[0].severity(), Severity::Error);
    }

    #[test]
    fn non_definitions_cannot_be_traits() {
        let shape = Shape::builder(ShapeType::String)
            .id(id("ns#S"))
            .add_trait(Trait::new(id("smithy.api#String"), json!("x")))
            .build()
            .unwrap();
        let events = TraitValue.validate(&model(shape));
        assert_eq!(events.len(), 1);
        assert!(events[0].message().contains("not a trait definition"));
    }
}

use super::TRAIT_TARGET;
use crate::domain::Model;
use crate::validation::{Severity, ValidationEvent, Validator};
use std::collections::BTreeSet;

/// Checks that traits are only applied to shapes matched by the selector
/// of their definition
pub struct TraitTarget;

impl Validator for TraitTarget {
    fn name(&self) -> &str {
        TRAIT_TARGET
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for (trait_id, definition) in model.trait_definitions() {
            if model.shapes_with_trait(trait_id).all(|s| s.id().is_prelude()) {
                continue;
            }
            let matching: BTreeSet<_> = definition.selector.select_ids(model);
            for shape in model.shapes_with_trait(trait_id) {
                if shape.id().is_prelude() || matching.contains(shape.id()) {
                    continue;
                }
                events.push(
                    ValidationEvent::new(
                        TRAIT_TARGET,
                        Severity::Error,
                        format!(
                            "Trait `{}` cannot be applied to `{}`. This trait may only be applied \
                             to shapes that match the following selector: {}",
                            trait_id,
                            shape.id(),
                            definition.selector
                        ),
                    )
                    .with_shape(shape),
                );
            }
        }
        events.sort_by(|a, b| a.shape_id().cmp(&b.shape_id()));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude, prelude_trait, Shape, ShapeId, ShapeType, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    #[test]
    fn reports_traits_outside_their_selector() {
        let structure = Shape::builder(ShapeType::Structure)
            .id(id("ns#S"))
            .member_with("a", id("smithy.api#String"), |m| {
                m.add_trait(Trait::new(prelude_trait("required"), json!(true)))
            })
            .add_trait(Trait::new(prelude_trait("required"), json!(true)))
            .build()
            .unwrap();
        let model = Model::builder()
            .add_model(prelude::prelude())
            .add_shape(structure)
            .build();
        let events = TraitTarget.validate(&model);
        assert_eq!(events.len(), 1, "{:#?}", events);
        assert_eq!(events[0].shape_id(), Some(&id("ns#S")));
        assert!(events[0].message().contains("structure > member"));
    }
}

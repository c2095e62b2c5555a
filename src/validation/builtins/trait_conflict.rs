use super::{ticked, user_shapes, TRAIT_CONFLICT};
use crate::domain::{Model, ShapeId};
use crate::validation::{Severity, ValidationEvent, Validator};
use std::collections::BTreeSet;

/// Reports shapes that carry traits whose definitions conflict
pub struct TraitConflict;

impl Validator for TraitConflict {
    fn name(&self) -> &str {
        TRAIT_CONFLICT
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for shape in user_shapes(model) {
            // Conflicts may be declared on either side; report each pair once
            let mut pairs: BTreeSet<(&ShapeId, &ShapeId)> = BTreeSet::new();
            for trait_id in shape.traits().keys() {
                let Some(definition) = model.trait_definition(trait_id) else {
                    continue;
                };
                for other in &definition.conflicts {
                    if shape.traits().contains_key(other) {
                        let pair = if trait_id < other {
                            (trait_id, other)
                        } else {
                            (other, trait_id)
                        };
                        pairs.insert(pair);
                    }
                }
            }
            for (a, b) in pairs {
                let (a_name, b_name) = (a.name(), b.name());
                events.push(
                    ValidationEvent::new(
                        TRAIT_CONFLICT,
                        Severity::Error,
                        format!(
                            "Found conflicting traits on {} shape: {}",
                            shape.shape_type(),
                            ticked([a_name, b_name])
                        ),
                    )
                    .with_shape(shape),
                );
            }
        }
        events
    }
}

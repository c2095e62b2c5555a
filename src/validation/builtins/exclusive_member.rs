use super::{ticked, user_shapes, EXCLUSIVE_STRUCTURE_MEMBER_TRAIT};
use crate::domain::traits::StructurallyExclusive;
use crate::domain::{Model, Shape, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};

/// Enforces `structurallyExclusive` trait definitions
///
/// A `member` exclusive trait may be applied to one member of a structure.
/// A `target` exclusive trait may be applied to shapes targeted by at most
/// one member of a structure.
pub struct ExclusiveStructureMemberTrait;

impl ExclusiveStructureMemberTrait {
    fn check(model: &Model, structure: &Shape, events: &mut Vec<ValidationEvent>) {
        let members = structure.members();
        for (trait_id, definition) in model.trait_definitions() {
            let Some(exclusive) = definition.structurally_exclusive else {
                continue;
            };
            let offending: Vec<&str> = members
                .iter()
                .filter(|member| match exclusive {
                    StructurallyExclusive::Member => member.has_trait(trait_id),
                    StructurallyExclusive::Target => member
                        .target()
                        .and_then(|t| model.get_shape(t))
                        .is_some_and(|target| target.has_trait(trait_id)),
                })
                .filter_map(|member| member.member_name())
                .collect();
            if offending.len() < 2 {
                continue;
            }

            let message = match exclusive {
                StructurallyExclusive::Member => format!(
                    "The `{}` trait can be applied to only a single member of a structure, \
                     but it was found on the following members: {}",
                    trait_id.name(),
                    ticked(offending)
                ),
                StructurallyExclusive::Target => format!(
                    "Only a single member of a structure can target a shape marked with the \
                     `{}` trait, but it was found on the following members: {}",
                    trait_id.name(),
                    ticked(offending)
                ),
            };
            events.push(
                ValidationEvent::new(EXCLUSIVE_STRUCTURE_MEMBER_TRAIT, Severity::Error, message)
                    .with_shape(structure),
            );
        }
    }
}

impl Validator for ExclusiveStructureMemberTrait {
    fn name(&self) -> &str {
        EXCLUSIVE_STRUCTURE_MEMBER_TRAIT
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for structure in user_shapes(model).filter(|s| s.shape_type() == ShapeType::Structure) {
            Self::check(model, structure, &mut events);
        }
        events
    }
}

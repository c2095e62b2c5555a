//! Shape-level comparison of two versions of a model
//!
//! Compares shapes by ID and reports what changed as validation events.
//! Trait changes are graded by the trait definition's `diff.error.*` tags:
//!
//! - `diff.error.add`: adding the trait is an ERROR
//! - `diff.error.remove`: removing the trait is an ERROR
//! - `diff.error.update`: changing the trait's value is an ERROR
//! - `diff.error.const`: any change to the trait is an ERROR
//!
//! Without a tag, additions are NOTEs and removals or updates WARNINGs.
//! Prelude shapes are never reported.

use crate::domain::{Model, Shape, ShapeId, Trait};
use crate::validation::{Severity, ValidationEvent};

pub const ADDED_SHAPE: &str = "AddedShape";
pub const REMOVED_SHAPE: &str = "RemovedShape";
pub const CHANGED_SHAPE_TYPE: &str = "ChangedShapeType";
pub const ADDED_TRAIT: &str = "AddedTrait";
pub const REMOVED_TRAIT: &str = "RemovedTrait";
pub const MODIFIED_TRAIT: &str = "ModifiedTrait";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraitChange {
    Add,
    Remove,
    Update,
}

impl TraitChange {
    fn tag(&self) -> &'static str {
        match self {
            TraitChange::Add => "diff.error.add",
            TraitChange::Remove => "diff.error.remove",
            TraitChange::Update => "diff.error.update",
        }
    }

    fn default_severity(&self) -> Severity {
        match self {
            TraitChange::Add => Severity::Note,
            TraitChange::Remove | TraitChange::Update => Severity::Warning,
        }
    }
}

/// Compares two models and returns one event per difference, ordered by
/// shape ID
pub fn compare(old: &Model, new: &Model) -> Vec<ValidationEvent> {
    let mut events = Vec::new();

    for old_shape in old.shapes().filter(|s| !s.id().is_prelude()) {
        match new.get_shape(old_shape.id()) {
            None => {
                // Members are reported through their container
                if !old_shape.is_member() || new.contains(&old_shape.id().without_member()) {
                    events.push(
                        ValidationEvent::new(
                            REMOVED_SHAPE,
                            Severity::Error,
                            format!("Removed {} `{}`", old_shape.shape_type(), old_shape.id()),
                        )
                        .with_shape_id(old_shape.id().clone())
                        .with_source(old_shape.source().clone()),
                    );
                }
            }
            Some(new_shape) if new_shape.shape_type() != old_shape.shape_type() => {
                events.push(
                    ValidationEvent::new(
                        CHANGED_SHAPE_TYPE,
                        Severity::Error,
                        format!(
                            "Shape `{}` type changed from {} to {}",
                            old_shape.id(),
                            old_shape.shape_type(),
                            new_shape.shape_type()
                        ),
                    )
                    .with_shape(new_shape),
                );
            }
            Some(new_shape) => compare_traits(new, old_shape, new_shape, &mut events),
        }
    }

    for new_shape in new.shapes().filter(|s| !s.id().is_prelude()) {
        if old.contains(new_shape.id()) {
            continue;
        }
        // A member of a new container is part of the container's addition
        if new_shape.is_member() && !old.contains(&new_shape.id().without_member()) {
            continue;
        }
        events.push(
            ValidationEvent::new(
                ADDED_SHAPE,
                Severity::Note,
                format!("Added {} `{}`", new_shape.shape_type(), new_shape.id()),
            )
            .with_shape(new_shape),
        );
    }

    events.sort_by(|a, b| a.shape_id().cmp(&b.shape_id()));
    events
}

fn severity_for(model: &Model, trait_id: &ShapeId, change: TraitChange) -> Severity {
    let tags = model
        .trait_definition(trait_id)
        .map(|def| def.tags.as_slice())
        .unwrap_or_default();
    if tags
        .iter()
        .any(|t| t == change.tag() || t == "diff.error.const")
    {
        Severity::Error
    } else {
        change.default_severity()
    }
}

fn compare_traits(model: &Model, old: &Shape, new: &Shape, events: &mut Vec<ValidationEvent>) {
    for (trait_id, old_trait) in old.traits() {
        match new.get_trait(trait_id) {
            None => events.push(trait_event(
                model,
                new,
                old_trait,
                TraitChange::Remove,
                format!("Removed trait `{}` from `{}`", trait_id, new.id()),
            )),
            Some(new_trait) if new_trait.value() != old_trait.value() => events.push(trait_event(
                model,
                new,
                new_trait,
                TraitChange::Update,
                format!(
                    "Changed trait `{}` on `{}` from `{}` to `{}`",
                    trait_id,
                    new.id(),
                    old_trait.value(),
                    new_trait.value()
                ),
            )),
            Some(_) => {}
        }
    }

    for (trait_id, new_trait) in new.traits() {
        if !old.has_trait(trait_id) {
            events.push(trait_event(
                model,
                new,
                new_trait,
                TraitChange::Add,
                format!("Added trait `{}` to `{}`", trait_id, new.id()),
            ));
        }
    }
}

fn trait_event(
    model: &Model,
    shape: &Shape,
    t: &Trait,
    change: TraitChange,
    message: String,
) -> ValidationEvent {
    let event_id = match change {
        TraitChange::Add => ADDED_TRAIT,
        TraitChange::Remove => REMOVED_TRAIT,
        TraitChange::Update => MODIFIED_TRAIT,
    };
    ValidationEvent::new(event_id, severity_for(model, t.id(), change), message).with_shape(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, ShapeType};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn foo(traits: &[(&str, serde_json::Value)]) -> Shape {
        let mut builder = Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("a", id("smithy.api#String"));
        for (name, value) in traits {
            builder = builder.add_trait(Trait::new(id(name), value.clone()));
        }
        builder.build().unwrap()
    }

    fn definition(name: &str, tags: &[&str]) -> Shape {
        Shape::builder(ShapeType::Structure)
            .id(id(name))
            .add_trait(Trait::new(prelude_trait("trait"), json!({ "tags": tags })))
            .build()
            .unwrap()
    }

    #[test]
    fn identical_models_have_no_differences() {
        let model = Model::builder().add_shape(foo(&[])).build();
        assert!(compare(&model, &model.clone()).is_empty());
    }

    #[test]
    fn reports_added_trait() {
        let old = Model::builder()
            .add_shape(definition("ns#c", &[]))
            .add_shape(foo(&[]))
            .build();
        let new = Model::builder()
            .add_shape(definition("ns#c", &[]))
            .add_shape(foo(&[("ns#c", json!({}))]))
            .build();
        let events = compare(&old, &new);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id(), ADDED_TRAIT);
        assert_eq!(events[0].severity(), Severity::Note);
        assert_eq!(events[0].shape_id(), Some(&id("ns#Foo")));
        assert!(events[0].message().contains("ns#c"));
    }

    #[test]
    fn tags_escalate_trait_changes() {
        let old = Model::builder()
            .add_shape(definition("ns#c", &["diff.error.remove"]))
            .add_shape(definition("ns#k", &["diff.error.const"]))
            .add_shape(foo(&[("ns#c", json!({})), ("ns#k", json!("a"))]))
            .build();
        let new = Model::builder()
            .add_shape(definition("ns#c", &["diff.error.remove"]))
            .add_shape(definition("ns#k", &["diff.error.const"]))
            .add_shape(foo(&[("ns#k", json!("b"))]))
            .build();
        let events = compare(&old, &new);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity() == Severity::Error));
        assert!(events.iter().any(|e| e.event_id() == REMOVED_TRAIT));
        assert!(events.iter().any(|e| e.event_id() == MODIFIED_TRAIT));
    }

    #[test]
    fn shape_additions_removals_and_type_changes() {
        let old = Model::builder()
            .add_shape(foo(&[]))
            .add_shape(Shape::builder(ShapeType::String).id(id("ns#S")).build().unwrap())
            .build();
        let new = Model::builder()
            .add_shape(Shape::builder(ShapeType::Integer).id(id("ns#S")).build().unwrap())
            .add_shape(Shape::builder(ShapeType::Blob).id(id("ns#B")).build().unwrap())
            .build();
        let events = compare(&old, &new);
        let ids: Vec<(&str, String)> = events
            .iter()
            .map(|e| (e.event_id(), e.shape_id().unwrap().to_string()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (ADDED_SHAPE, "ns#B".to_string()),
                (REMOVED_SHAPE, "ns#Foo".to_string()),
                (CHANGED_SHAPE_TYPE, "ns#S".to_string()),
            ]
        );
    }

    #[test]
    fn member_changes_are_reported_on_existing_containers() {
        let old = Model::builder().add_shape(foo(&[])).build();
        let bigger = Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("a", id("smithy.api#String"))
            .member("b", id("smithy.api#String"))
            .build()
            .unwrap();
        let new = Model::builder().add_shape(bigger).build();
        let events = compare(&old, &new);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shape_id(), Some(&id("ns#Foo$b")));
        assert_eq!(events[0].event_id(), ADDED_SHAPE);
    }
}

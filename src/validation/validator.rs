//! Validator registration and the model validation pipeline

use super::builtins;
use super::event::{Severity, ValidationEvent};
use super::suppression::Suppression;
use crate::domain::traits::SuppressTrait;
use crate::domain::{Model, Node};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Event ID for a `validators` metadata entry naming an unknown validator
pub const UNKNOWN_VALIDATOR: &str = "UnknownValidator";
/// Event ID for a malformed `validators` or `suppressions` metadata entry
pub const INVALID_METADATA: &str = "ValidationMetadata";

/// A read-only check over a whole model
///
/// Validators must not assume any other validator has run.
pub trait Validator: Send + Sync {
    /// Name of the validator, also used as the ID of its events
    fn name(&self) -> &str;

    fn validate(&self, model: &Model) -> Vec<ValidationEvent>;
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidatorError {
    #[error("Unknown validator `{0}`")]
    UnknownValidator(String),

    #[error("Invalid configuration for validator `{name}`: {message}")]
    InvalidConfiguration { name: String, message: String },
}

/// Creates a configurable validator from its `configuration` node
pub type ValidatorFactory = fn(&Node) -> Result<Box<dyn Validator>, String>;

/// The validators that always run, plus factories for opt-in validators
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn Validator>>,
    factories: BTreeMap<String, ValidatorFactory>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
            factories: BTreeMap::new(),
        }
    }

    /// The built-in validators and linters
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for validator in builtins::validators() {
            registry.register(validator);
        }
        registry.register_factory(
            builtins::SHOULD_HAVE_USED_TIMESTAMP,
            builtins::ShouldHaveUsedTimestamp::from_configuration,
        );
        registry
    }

    pub fn register(&mut self, validator: Box<dyn Validator>) -> &mut Self {
        self.validators.push(validator);
        self
    }

    pub fn register_factory(&mut self, name: &str, factory: ValidatorFactory) -> &mut Self {
        self.factories.insert(name.to_string(), factory);
        self
    }

    pub fn validators(&self) -> &[Box<dyn Validator>] {
        &self.validators
    }

    pub fn factory_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Creates an opt-in validator by name
    pub fn create(&self, name: &str, configuration: &Node) -> Result<Box<dyn Validator>, ValidatorError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ValidatorError::UnknownValidator(name.to_string()))?;
        factory(configuration).map_err(|message| ValidatorError::InvalidConfiguration {
            name: name.to_string(),
            message,
        })
    }
}

/// Runs registered validators over a model and applies suppressions
///
/// Opt-in validators come from the model's `validators` metadata and from
/// [`ModelValidator::add_validator`].
#[derive(Default)]
pub struct ModelValidator {
    registry: ValidatorRegistry,
    disabled: BTreeSet<String>,
    extra: Vec<Box<dyn Validator>>,
}

impl ModelValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: ValidatorRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Skips the validator with the given name
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    pub fn add_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.extra.push(validator);
        self
    }

    /// Enables an opt-in validator from the registry
    pub fn enable(self, name: &str, configuration: &Node) -> Result<Self, ValidatorError> {
        let validator = self.registry.create(name, configuration)?;
        Ok(self.add_validator(validator))
    }

    pub fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        let configured = self.metadata_validators(model, &mut events);
        let validators = self
            .registry
            .validators()
            .iter()
            .chain(&self.extra)
            .chain(&configured)
            .filter(|v| !self.disabled.contains(v.name()));
        for validator in validators {
            let found = validator.validate(model);
            tracing::debug!(validator = validator.name(), events = found.len(), "validator finished");
            events.extend(found);
        }

        let suppressions = metadata_suppressions(model, &mut events);
        events
            .into_iter()
            .map(|event| apply_suppressions(model, &suppressions, event))
            .collect()
    }

    /// Instantiates validators listed in the `validators` metadata entry
    fn metadata_validators(
        &self,
        model: &Model,
        events: &mut Vec<ValidationEvent>,
    ) -> Vec<Box<dyn Validator>> {
        let Some(entries) = model.metadata_property("validators") else {
            return Vec::new();
        };
        let Some(entries) = entries.as_array() else {
            events.push(ValidationEvent::new(
                INVALID_METADATA,
                Severity::Error,
                "The `validators` metadata property must be an array",
            ));
            return Vec::new();
        };

        let mut validators = Vec::new();
        for entry in entries {
            let Some(name) = entry.get("name").and_then(Node::as_str) else {
                events.push(ValidationEvent::new(
                    INVALID_METADATA,
                    Severity::Error,
                    format!("Validator definition is missing a `name`: {}", entry),
                ));
                continue;
            };
            let configuration = entry.get("configuration").cloned().unwrap_or(Node::Null);
            match self.registry.create(name, &configuration) {
                Ok(validator) => validators.push(validator),
                Err(e @ ValidatorError::UnknownValidator(_)) => {
                    events.push(ValidationEvent::new(UNKNOWN_VALIDATOR, Severity::Error, e.to_string()))
                }
                Err(e) => {
                    events.push(ValidationEvent::new(INVALID_METADATA, Severity::Error, e.to_string()))
                }
            }
        }
        validators
    }
}

fn metadata_suppressions(model: &Model, events: &mut Vec<ValidationEvent>) -> Vec<Suppression> {
    let Some(entries) = model.metadata_property("suppressions") else {
        return Vec::new();
    };
    let Some(entries) = entries.as_array() else {
        events.push(ValidationEvent::new(
            INVALID_METADATA,
            Severity::Error,
            "The `suppressions` metadata property must be an array",
        ));
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match Suppression::from_node(entry) {
            Ok(suppression) => Some(suppression),
            Err(e) => {
                events.push(ValidationEvent::new(INVALID_METADATA, Severity::Error, e.to_string()));
                None
            }
        })
        .collect()
}

/// Demotes an event to SUPPRESSED if a metadata suppression or a `suppress`
/// trait on its shape (or the shape's container) covers it
fn apply_suppressions(
    model: &Model,
    suppressions: &[Suppression],
    event: ValidationEvent,
) -> ValidationEvent {
    if event.severity() == Severity::Suppressed {
        return event;
    }
    if let Some(suppression) = suppressions.iter().find(|s| s.matches(&event)) {
        let reason = suppression.reason.clone();
        return event.suppress(reason);
    }

    let suppressed_by_trait = event.shape_id().is_some_and(|id| {
        [Some(id.clone()), id.is_member().then(|| id.without_member())]
            .into_iter()
            .flatten()
            .filter_map(|id| model.get_shape(&id))
            .filter_map(|shape| shape.get_typed::<SuppressTrait>())
            .any(|SuppressTrait(ids)| ids.iter().any(|i| i == event.event_id()))
    });
    if suppressed_by_trait {
        event.suppress(None)
    } else {
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, Shape, ShapeId, ShapeType, Trait};
    use serde_json::json;

    struct EveryShape;

    impl Validator for EveryShape {
        fn name(&self) -> &str {
            "EveryShape"
        }

        fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
            model
                .shapes()
                .map(|s| ValidationEvent::new(self.name(), Severity::Warning, "seen").with_shape(s))
                .collect()
        }
    }

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn model(metadata: &[(&str, Node)]) -> Model {
        let mut builder = Model::builder()
            .add_shape(Shape::builder(ShapeType::String).id(id("a.b#One")).build().unwrap())
            .add_shape(
                Shape::builder(ShapeType::String)
                    .id(id("c.d#Two"))
                    .add_trait(Trait::new(prelude_trait("suppress"), json!(["EveryShape"])))
                    .build()
                    .unwrap(),
            );
        for (key, value) in metadata {
            builder = builder.put_metadata(*key, value.clone());
        }
        builder.build()
    }

    fn validator() -> ModelValidator {
        ModelValidator::with_registry(ValidatorRegistry::empty()).add_validator(Box::new(EveryShape))
    }

    #[test]
    fn suppress_trait_demotes_events() {
        let events = validator().validate(&model(&[]));
        let severities: Vec<(String, Severity)> = events
            .iter()
            .map(|e| (e.shape_id().unwrap().to_string(), e.severity()))
            .collect();
        assert_eq!(
            severities,
            vec![
                ("a.b#One".to_string(), Severity::Warning),
                ("c.d#Two".to_string(), Severity::Suppressed),
            ]
        );
    }

    #[test]
    fn metadata_suppressions_keep_reason() {
        let model = model(&[(
            "suppressions",
            json!([{"id": "EveryShape", "namespace": "a.b", "reason": "legacy"}]),
        )]);
        let events = validator().validate(&model);
        assert!(events.iter().all(|e| e.severity() == Severity::Suppressed));
        assert_eq!(events[0].suppression_reason(), Some("legacy"));
    }

    #[test]
    fn disabled_validators_do_not_run() {
        let events = validator().disable("EveryShape").validate(&model(&[]));
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_metadata_validator_is_an_error() {
        let model = model(&[("validators", json!([{"name": "NoSuchThing"}]))]);
        let events = ModelValidator::with_registry(ValidatorRegistry::empty()).validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id(), UNKNOWN_VALIDATOR);
        assert_eq!(events[0].severity(), Severity::Error);
    }

    #[test]
    fn registry_creates_configured_linters() {
        let registry = ValidatorRegistry::builtin();
        assert!(registry
            .factory_names()
            .any(|n| n == builtins::SHOULD_HAVE_USED_TIMESTAMP));
        assert!(registry.create("ShouldHaveUsedTimestamp", &Node::Null).is_ok());
        assert!(matches!(
            registry.create("ShouldHaveUsedTimestamp", &json!({"additionalPatterns": ["("]})),
            Err(ValidatorError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            registry.create("Nope", &Node::Null),
            Err(ValidatorError::UnknownValidator(_))
        ));
    }
}

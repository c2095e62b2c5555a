use super::{user_shapes, SHOULD_HAVE_USED_TIMESTAMP};
use crate::domain::{Model, Node, Shape, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};
use regex::Regex;

const DEFAULT_PATTERNS: [&str; 7] = [
    "^.*[Tt]imestamp.*$",
    "^[Tt]ime([_A-Z].*)?$",
    "^[Dd]ate([_A-Z].*)?$",
    "^.*([a-z]T|_[Tt])ime$",
    "^.*([a-z]D|_[Dd])ate$",
    "^.*([a-z]A|_[Aa])t$",
    "^.*([a-z]O|_[Oo])n$",
];

/// Flags shapes and members named like timestamps that are not timestamps
///
/// This is a linter: it runs only when enabled through configuration or
/// model metadata. `additionalPatterns` adds regular expressions to the
/// defaults.
pub struct ShouldHaveUsedTimestamp {
    patterns: Vec<Regex>,
}

impl ShouldHaveUsedTimestamp {
    pub fn new(additional: &[String]) -> Result<Self, regex::Error> {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .copied()
            .chain(additional.iter().map(String::as_str))
            .map(Regex::new)
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn from_configuration(config: &Node) -> Result<Box<dyn Validator>, String> {
        let additional = match config.get("additionalPatterns") {
            None | Some(Node::Null) => Vec::new(),
            Some(Node::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| "`additionalPatterns` must contain only strings".to_string())
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err("`additionalPatterns` must be a list of strings".to_string()),
        };
        let linter = Self::new(&additional).map_err(|e| e.to_string())?;
        Ok(Box::new(linter))
    }

    fn is_timestamp_name(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }

    fn check_members(&self, model: &Model, shape: &Shape, events: &mut Vec<ValidationEvent>) {
        for member in shape.members() {
            let name = member.member_name().unwrap_or_default();
            let Some(target) = member.target().and_then(|t| model.get_shape(t)) else {
                continue;
            };
            let target_type = target.shape_type();
            if target_type == ShapeType::Timestamp
                || matches!(target_type, ShapeType::Structure | ShapeType::Union)
                || !self.is_timestamp_name(name)
            {
                continue;
            }
            events.push(
                ValidationEvent::new(
                    SHOULD_HAVE_USED_TIMESTAMP,
                    Severity::Danger,
                    format!(
                        "Member `{}` is named like a timestamp but references a `{}` shape",
                        name, target_type
                    ),
                )
                .with_shape(member),
            );
        }
    }
}

impl Validator for ShouldHaveUsedTimestamp {
    fn name(&self) -> &str {
        SHOULD_HAVE_USED_TIMESTAMP
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for shape in user_shapes(model) {
            match shape.shape_type() {
                ShapeType::String
                | ShapeType::Short
                | ShapeType::Integer
                | ShapeType::Long
                | ShapeType::Float => {
                    if self.is_timestamp_name(shape.id().name()) {
                        events.push(
                            ValidationEvent::new(
                                SHOULD_HAVE_USED_TIMESTAMP,
                                Severity::Danger,
                                format!(
                                    "Shape `{}` is named like a timestamp but is a `{}` shape.",
                                    shape.id().name(),
                                    shape.shape_type()
                                ),
                            )
                            .with_shape(shape),
                        );
                    }
                }
                ShapeType::Structure | ShapeType::Union => {
                    self.check_members(model, shape, &mut events)
                }
                _ => {}
            }
        }
        events
    }
}

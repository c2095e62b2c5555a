//! Checks node values (trait values, metadata) against the shapes that
//! describe them

use crate::domain::traits::{names, LengthTrait, PatternTrait, RangeTrait};
use crate::domain::{Model, Node, NodeType, Shape, ShapeId, ShapeKind, ShapeType};
use chrono::DateTime;
use std::collections::HashSet;
use std::fmt;

/// A problem with a node value, located by a path such as `uri` or `tags[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeViolation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for NodeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

pub struct NodeValidator<'m> {
    model: &'m Model,
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn integer_bounds(shape_type: ShapeType) -> Option<(i64, i64)> {
    match shape_type {
        ShapeType::Byte => Some((i8::MIN.into(), i8::MAX.into())),
        ShapeType::Short => Some((i16::MIN.into(), i16::MAX.into())),
        ShapeType::Integer => Some((i32::MIN.into(), i32::MAX.into())),
        ShapeType::Long => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

impl<'m> NodeValidator<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// Validates `value` against the shape `shape_id`, returning every problem
    pub fn validate(&self, value: &Node, shape_id: &ShapeId) -> Vec<NodeViolation> {
        let mut violations = Vec::new();
        self.visit(value, shape_id, "", &mut violations);
        violations
    }

    fn visit(&self, value: &Node, shape_id: &ShapeId, path: &str, out: &mut Vec<NodeViolation>) {
        let mut report = |message: String| {
            out.push(NodeViolation {
                path: path.to_string(),
                message,
            })
        };

        let Some(shape) = self.model.get_shape(shape_id) else {
            report(format!("Unable to resolve shape `{}`", shape_id));
            return;
        };

        let type_error = |expected: &str| {
            format!(
                "Expected {} value for {} shape `{}`, found {}",
                expected,
                shape.shape_type(),
                shape.id(),
                NodeType::of(value)
            )
        };

        match shape.kind() {
            ShapeKind::Member { target } => {
                self.check_constraints(shape, value, path, out);
                self.visit(value, target, path, out);
                return;
            }
            ShapeKind::Blob | ShapeKind::String => {
                if !value.is_string() {
                    report(type_error("string"));
                }
            }
            ShapeKind::Boolean => {
                if !value.is_boolean() {
                    report(type_error("boolean"));
                }
            }
            ShapeKind::Byte
            | ShapeKind::Short
            | ShapeKind::Integer
            | ShapeKind::Long
            | ShapeKind::BigInteger => match value.as_number() {
                Some(n) if n.is_i64() || n.is_u64() => {
                    if let Some((min, max)) = integer_bounds(shape.shape_type()) {
                        let fits = n.as_i64().is_some_and(|v| v >= min && v <= max);
                        if !fits {
                            report(format!(
                                "{} value {} is out of range for shape `{}`",
                                shape.shape_type(),
                                n,
                                shape.id()
                            ));
                        }
                    }
                }
                _ => report(type_error("integer")),
            },
            ShapeKind::Float | ShapeKind::Double | ShapeKind::BigDecimal => {
                if !value.is_number() {
                    report(type_error("number"));
                }
            }
            ShapeKind::Timestamp => match value {
                Node::Number(_) => {}
                Node::String(s) => {
                    if DateTime::parse_from_rfc3339(s).is_err() {
                        report(format!(
                            "Invalid timestamp `{}` for shape `{}`: expected an RFC 3339 date-time",
                            s,
                            shape.id()
                        ));
                    }
                }
                _ => report(type_error("timestamp")),
            },
            ShapeKind::Document => {}
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                let Some(items) = value.as_array() else {
                    report(type_error("array"));
                    return;
                };
                if shape.shape_type() == ShapeType::Set {
                    let mut seen = HashSet::new();
                    if !items.iter().all(|item| seen.insert(item.to_string())) {
                        report(format!("Set values of `{}` must be unique", shape.id()));
                    }
                }
                for (i, item) in items.iter().enumerate() {
                    self.visit(item, member.id(), &format!("{}[{}]", path, i), out);
                }
            }
            ShapeKind::Map { key, value: map_value } => {
                let Some(entries) = value.as_object() else {
                    report(type_error("object"));
                    return;
                };
                for (k, v) in entries {
                    let entry_path = join(path, k);
                    self.visit(&Node::String(k.clone()), key.id(), &entry_path, out);
                    self.visit(v, map_value.id(), &entry_path, out);
                }
            }
            ShapeKind::Structure { members } => {
                let Some(entries) = value.as_object() else {
                    report(type_error("object"));
                    return;
                };
                for member in members {
                    let name = member.member_name().unwrap_or_default();
                    if member.has_prelude_trait(names::REQUIRED) && !entries.contains_key(name) {
                        out.push(NodeViolation {
                            path: path.to_string(),
                            message: format!(
                                "Missing required structure member `{}` for `{}`",
                                name,
                                shape.id()
                            ),
                        });
                    }
                }
                self.visit_members(shape, entries, path, out);
            }
            ShapeKind::Union { .. } => {
                let Some(entries) = value.as_object() else {
                    report(type_error("object"));
                    return;
                };
                if entries.len() != 1 {
                    report(format!(
                        "Union value for `{}` must contain exactly one member, found {}",
                        shape.id(),
                        entries.len()
                    ));
                }
                self.visit_members(shape, entries, path, out);
            }
            ShapeKind::Operation(_) | ShapeKind::Resource(_) | ShapeKind::Service(_) => {
                report(format!(
                    "{} shape `{}` cannot be used to describe a node value",
                    shape.shape_type(),
                    shape.id()
                ));
                return;
            }
        }

        self.check_constraints(shape, value, path, out);
    }

    fn visit_members(
        &self,
        shape: &Shape,
        entries: &serde_json::Map<String, Node>,
        path: &str,
        out: &mut Vec<NodeViolation>,
    ) {
        for (name, member_value) in entries {
            match shape.member(name) {
                Some(member) => self.visit(member_value, member.id(), &join(path, name), out),
                None => {
                    let valid: Vec<String> = shape
                        .members()
                        .iter()
                        .filter_map(|m| m.member_name())
                        .map(|m| format!("`{}`", m))
                        .collect();
                    out.push(NodeViolation {
                        path: path.to_string(),
                        message: format!(
                            "Invalid member `{}` for `{}`; valid members are [{}]",
                            name,
                            shape.id(),
                            valid.join(", ")
                        ),
                    });
                }
            }
        }
    }

    /// `length`, `range` and `pattern` checks; values of the wrong type are
    /// left to the type checks
    fn check_constraints(&self, shape: &Shape, value: &Node, path: &str, out: &mut Vec<NodeViolation>) {
        let mut report = |message: String| {
            out.push(NodeViolation {
                path: path.to_string(),
                message,
            })
        };

        if let Some(LengthTrait { min, max }) = shape.get_typed::<LengthTrait>() {
            let length = match value {
                Node::String(s) => Some(s.chars().count() as u64),
                Node::Array(items) => Some(items.len() as u64),
                Node::Object(entries) => Some(entries.len() as u64),
                _ => None,
            };
            if let Some(length) = length {
                if let Some(min) = min.filter(|min| length < *min) {
                    report(format!(
                        "Value with length {} is shorter than the minimum length of {}",
                        length, min
                    ));
                }
                if let Some(max) = max.filter(|max| length > *max) {
                    report(format!(
                        "Value with length {} is longer than the maximum length of {}",
                        length, max
                    ));
                }
            }
        }

        if let Some(RangeTrait { min, max }) = shape.get_typed::<RangeTrait>() {
            if let Some(number) = value.as_f64() {
                if let Some(min) = min.filter(|min| number < *min) {
                    report(format!("Value {} is less than the minimum of {}", number, min));
                }
                if let Some(max) = max.filter(|max| number > *max) {
                    report(format!("Value {} is greater than the maximum of {}", number, max));
                }
            }
        }

        if let Some(pattern) = shape.get_typed::<PatternTrait>() {
            if let Some(s) = value.as_str() {
                if !pattern.0.is_match(s) {
                    report(format!(
                        "String value `{}` does not match the required pattern `{}`",
                        s,
                        pattern.as_str()
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn model() -> Model {
        let config = Shape::builder(ShapeType::Structure)
            .id(id("ns#Config"))
            .member_with("name", id("ns#Name"), |m| {
                m.add_trait(Trait::new(prelude_trait("required"), json!(true)))
            })
            .member_with("retries", id("ns#Small"), |m| {
                m.add_trait(Trait::new(prelude_trait("range"), json!({"min": 0, "max": 5})))
            })
            .member("tags", id("ns#Tags"))
            .member("at", id("ns#When"))
            .member("choice", id("ns#Choice"))
            .build()
            .unwrap();
        let name = Shape::builder(ShapeType::String)
            .id(id("ns#Name"))
            .add_trait(Trait::new(prelude_trait("pattern"), json!("^[a-z]+$")))
            .build()
            .unwrap();
        let small = Shape::builder(ShapeType::Byte).id(id("ns#Small")).build().unwrap();
        let tags = Shape::builder(ShapeType::Set)
            .id(id("ns#Tags"))
            .member("member", id("ns#Name"))
            .add_trait(Trait::new(prelude_trait("length"), json!({"max": 2})))
            .build()
            .unwrap();
        let when = Shape::builder(ShapeType::Timestamp).id(id("ns#When")).build().unwrap();
        let choice = Shape::builder(ShapeType::Union)
            .id(id("ns#Choice"))
            .member("a", id("ns#Name"))
            .member("b", id("ns#Small"))
            .build()
            .unwrap();
        Model::builder()
            .add_shapes([config, name, small, tags, when, choice])
            .build()
    }

    fn check(value: Node) -> Vec<String> {
        let model = model();
        NodeValidator::new(&model)
            .validate(&value, &id("ns#Config"))
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn valid_value() {
        let violations = check(json!({
            "name": "abc",
            "retries": 3,
            "tags": ["a", "b"],
            "at": "2020-01-01T00:00:00Z",
            "choice": {"b": 1}
        }));
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn required_and_unknown_members() {
        let violations = check(json!({"nope": 1}));
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("Missing required structure member `name`"));
        assert!(violations[1].contains("Invalid member `nope`"));
    }

    #[test]
    fn type_and_constraint_errors_carry_paths() {
        let violations = check(json!({
            "name": "ABC",
            "retries": 9,
            "tags": ["a", "a", "c"],
            "at": "yesterday",
            "choice": {"a": "x", "b": 1}
        }));
        assert!(violations.iter().any(|v| v.starts_with("name: String value `ABC`")));
        assert!(violations.iter().any(|v| v.starts_with("retries: Value 9 is greater")));
        assert!(violations.iter().any(|v| v.contains("must be unique")));
        assert!(violations.iter().any(|v| v.starts_with("tags: Value with length 3")));
        assert!(violations.iter().any(|v| v.starts_with("at: Invalid timestamp")));
        assert!(violations.iter().any(|v| v.starts_with("choice: Union value")));
        assert_eq!(violations.len(), 6, "{:?}", violations);
    }

    #[test]
    fn integer_bounds_and_types() {
        let violations = check(json!({"name": "a", "retries": 300}));
        // out of range for byte, and above the member's range
        assert_eq!(violations.len(), 2, "{:?}", violations);

        let violations = check(json!({"name": 5, "tags": "a"}));
        assert!(violations[0].starts_with("name: Expected string value"));
        assert!(violations[1].starts_with("tags: Expected array value"));
    }
}

//! Attribute resolution and comparison for `[...]` selector filters

use super::ast::{AttributeFilter, Comparator, ScopedAttributeFilter, ScopedValue};
use crate::domain::{Node, Shape, ShapeId, PRELUDE_NAMESPACE};

/// Value of an attribute path on a shape
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttributeValue<'m> {
    Missing,
    Text(String),
    Node(&'m Node),
    /// Result of `(keys)` or `(values)`; comparisons match if any element does
    Projection(Vec<AttributeValue<'m>>),
}

impl<'m> AttributeValue<'m> {
    fn is_present(&self) -> bool {
        match self {
            AttributeValue::Missing => false,
            AttributeValue::Node(node) => !node.is_null(),
            AttributeValue::Projection(items) => !items.is_empty(),
            AttributeValue::Text(_) => true,
        }
    }

    /// Scalar string forms used for comparisons
    fn strings(&self) -> Vec<String> {
        match self {
            AttributeValue::Missing => Vec::new(),
            AttributeValue::Text(text) => vec![text.clone()],
            AttributeValue::Node(node) => match node {
                Node::String(s) => vec![s.clone()],
                Node::Number(n) => vec![n.to_string()],
                Node::Bool(b) => vec![b.to_string()],
                _ => Vec::new(),
            },
            AttributeValue::Projection(items) => items.iter().flat_map(|i| i.strings()).collect(),
        }
    }

    /// Applies one path segment
    fn project(self, segment: &str) -> AttributeValue<'m> {
        match self {
            AttributeValue::Missing => AttributeValue::Missing,
            AttributeValue::Text(text) => match segment {
                "(length)" => AttributeValue::Text(text.chars().count().to_string()),
                _ => AttributeValue::Missing,
            },
            AttributeValue::Node(node) => project_node(node, segment),
            AttributeValue::Projection(items) => {
                let mut out = Vec::new();
                for item in items {
                    match item.project(segment) {
                        AttributeValue::Missing => {}
                        AttributeValue::Projection(nested) => out.extend(nested),
                        value => out.push(value),
                    }
                }
                AttributeValue::Projection(out)
            }
        }
    }

    fn project_path(self, path: &[String]) -> AttributeValue<'m> {
        path.iter().fold(self, |value, segment| value.project(segment))
    }
}

fn project_node<'m>(node: &'m Node, segment: &str) -> AttributeValue<'m> {
    match (segment, node) {
        ("(keys)", Node::Object(map)) => AttributeValue::Projection(
            map.keys().map(|k| AttributeValue::Text(k.clone())).collect(),
        ),
        ("(values)", Node::Object(map)) => {
            AttributeValue::Projection(map.values().map(AttributeValue::Node).collect())
        }
        ("(values)", Node::Array(items)) => {
            AttributeValue::Projection(items.iter().map(AttributeValue::Node).collect())
        }
        ("(length)", Node::Object(map)) => AttributeValue::Text(map.len().to_string()),
        ("(length)", Node::Array(items)) => AttributeValue::Text(items.len().to_string()),
        ("(length)", Node::String(s)) => AttributeValue::Text(s.chars().count().to_string()),
        (key, Node::Object(map)) => map
            .get(key)
            .map(AttributeValue::Node)
            .unwrap_or(AttributeValue::Missing),
        (index, Node::Array(items)) => index
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(AttributeValue::Node)
            .unwrap_or(AttributeValue::Missing),
        _ => AttributeValue::Missing,
    }
}

/// Resolves a trait name in a selector: relative names refer to the prelude
pub(crate) fn resolve_trait_name(name: &str) -> Option<ShapeId> {
    ShapeId::from_optional_namespace(PRELUDE_NAMESPACE, name).ok()
}

/// Resolves an attribute path (`id|name`, `trait|http|uri`, ...) on a shape
pub(crate) fn resolve<'m>(shape: &'m Shape, path: &[String]) -> AttributeValue<'m> {
    let Some((root, rest)) = path.split_first() else {
        return AttributeValue::Missing;
    };
    let id = shape.id();
    match root.as_str() {
        "id" => match rest.first().map(String::as_str) {
            None => AttributeValue::Text(id.to_string()),
            Some("namespace") => AttributeValue::Text(id.namespace().to_string()),
            Some("name") => AttributeValue::Text(id.name().to_string()),
            Some("member") => id
                .member()
                .map(|m| AttributeValue::Text(m.to_string()))
                .unwrap_or(AttributeValue::Missing),
            Some(_) => AttributeValue::Missing,
        },
        "service" => match (shape.as_service(), rest.first().map(String::as_str)) {
            (Some(_), None) => AttributeValue::Text(id.to_string()),
            (Some(service), Some("version")) => AttributeValue::Text(service.version.clone()),
            _ => AttributeValue::Missing,
        },
        "trait" => resolve_trait(shape, rest),
        _ => AttributeValue::Missing,
    }
}

fn resolve_trait<'m>(shape: &'m Shape, path: &[String]) -> AttributeValue<'m> {
    let Some((name, rest)) = path.split_first() else {
        return AttributeValue::Projection(
            shape
                .traits()
                .keys()
                .map(|id| AttributeValue::Text(id.to_string()))
                .collect(),
        );
    };
    let value = match name.as_str() {
        "(keys)" => AttributeValue::Projection(
            shape
                .traits()
                .keys()
                .map(|id| AttributeValue::Text(id.to_string()))
                .collect(),
        ),
        "(values)" => AttributeValue::Projection(
            shape
                .traits()
                .values()
                .map(|t| AttributeValue::Node(t.value()))
                .collect(),
        ),
        "(length)" => AttributeValue::Text(shape.traits().len().to_string()),
        name => match resolve_trait_name(name).and_then(|id| shape.get_trait(&id)) {
            Some(t) => AttributeValue::Node(t.value()),
            None => AttributeValue::Missing,
        },
    };
    value.project_path(rest)
}

fn compare_strings(comparator: Comparator, lhs: &str, rhs: &str, case_insensitive: bool) -> bool {
    let (lhs, rhs) = if case_insensitive {
        (lhs.to_lowercase(), rhs.to_lowercase())
    } else {
        (lhs.to_string(), rhs.to_string())
    };
    let numbers = || Some((lhs.parse::<f64>().ok()?, rhs.parse::<f64>().ok()?));
    match comparator {
        Comparator::Equals => lhs == rhs,
        Comparator::NotEquals => lhs != rhs,
        Comparator::StartsWith => lhs.starts_with(&rhs),
        Comparator::EndsWith => lhs.ends_with(&rhs),
        Comparator::Contains => lhs.contains(&rhs),
        Comparator::GreaterThan => numbers().is_some_and(|(l, r)| l > r),
        Comparator::GreaterThanOrEqual => numbers().is_some_and(|(l, r)| l >= r),
        Comparator::LessThan => numbers().is_some_and(|(l, r)| l < r),
        Comparator::LessThanOrEqual => numbers().is_some_and(|(l, r)| l <= r),
        Comparator::Exists => false,
    }
}

/// Compares a resolved value against candidate strings; any match wins
pub(crate) fn compare(
    value: &AttributeValue<'_>,
    comparator: Comparator,
    candidates: &[String],
    case_insensitive: bool,
) -> bool {
    if comparator == Comparator::Exists {
        let present = value.is_present();
        return candidates
            .iter()
            .any(|c| matches!((c.as_str(), present), ("true", true) | ("false", false)));
    }
    // Every comparator other than `?=` requires the value to be present
    let strings = value.strings();
    strings.iter().any(|lhs| {
        candidates
            .iter()
            .any(|rhs| compare_strings(comparator, lhs, rhs, case_insensitive))
    })
}

pub(crate) fn matches_attribute(shape: &Shape, filter: &AttributeFilter) -> bool {
    let value = resolve(shape, &filter.path);
    match &filter.comparison {
        None => value.is_present(),
        Some(comparison) => compare(
            &value,
            comparison.comparator,
            &comparison.values,
            comparison.case_insensitive,
        ),
    }
}

pub(crate) fn matches_scoped(shape: &Shape, filter: &ScopedAttributeFilter) -> bool {
    // Without a scope, context values are attribute paths on the shape itself
    if filter.scope.is_empty() {
        let lookup = |path: &[String]| resolve(shape, path);
        return scope_matches(&lookup, filter);
    }

    let scopes = match resolve(shape, &filter.scope) {
        AttributeValue::Missing => return false,
        AttributeValue::Projection(items) => items,
        value => vec![value],
    };
    scopes.into_iter().any(|scope| {
        let lookup = |path: &[String]| scope.clone().project_path(path);
        scope_matches(&lookup, filter)
    })
}

fn scope_matches<'m>(
    lookup: &dyn Fn(&[String]) -> AttributeValue<'m>,
    filter: &ScopedAttributeFilter,
) -> bool {
    let evaluate = |value: &ScopedValue| match value {
        ScopedValue::Literal(text) => AttributeValue::Text(text.clone()),
        ScopedValue::Context(path) => lookup(path),
    };
    filter.assertions.iter().all(|assertion| {
        let lhs = evaluate(&assertion.lhs);
        let candidates: Vec<String> = assertion
            .rhs
            .iter()
            .flat_map(|v| evaluate(v).strings())
            .collect();
        compare(&lhs, assertion.comparator, &candidates, assertion.case_insensitive)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, ShapeType, Trait};
    use serde_json::json;

    fn path(p: &str) -> Vec<String> {
        p.split('|').map(str::to_string).collect()
    }

    fn shape() -> Shape {
        Shape::builder(ShapeType::Structure)
            .id(ShapeId::parse("ns.foo#Widget").unwrap())
            .add_trait(Trait::new(prelude_trait("documentation"), json!("Hello")))
            .add_trait(Trait::new(prelude_trait("tags"), json!(["a", "b"])))
            .add_trait(Trait::new(prelude_trait("range"), json!({"min": 1, "max": 10})))
            .build()
            .unwrap()
    }

    #[test]
    fn id_attributes() {
        let shape = shape();
        assert_eq!(resolve(&shape, &path("id")), AttributeValue::Text("ns.foo#Widget".into()));
        assert_eq!(resolve(&shape, &path("id|namespace")), AttributeValue::Text("ns.foo".into()));
        assert_eq!(resolve(&shape, &path("id|member")), AttributeValue::Missing);
        assert_eq!(resolve(&shape, &path("service|version")), AttributeValue::Missing);
    }

    #[test]
    fn trait_paths_and_projections() {
        let shape = shape();
        let value = resolve(&shape, &path("trait|documentation"));
        assert!(compare(&value, Comparator::Equals, &["hello".into()], true));
        assert!(!compare(&value, Comparator::Equals, &["hello".into()], false));

        let max = resolve(&shape, &path("trait|smithy.api#range|max"));
        assert!(compare(&max, Comparator::GreaterThan, &["9.5".into()], false));
        assert!(!compare(&max, Comparator::LessThan, &["abc".into()], false));

        let tags = resolve(&shape, &path("trait|tags|(values)"));
        assert!(compare(&tags, Comparator::Equals, &["b".into()], false));
        let length = resolve(&shape, &path("trait|tags|(length)"));
        assert!(compare(&length, Comparator::Equals, &["2".into()], false));

        let keys = resolve(&shape, &path("trait|(keys)"));
        assert!(compare(&keys, Comparator::Equals, &["smithy.api#tags".into()], false));
    }

    #[test]
    fn existence_and_inequality() {
        let shape = shape();
        let missing = resolve(&shape, &path("trait|sensitive"));
        assert!(compare(&missing, Comparator::Exists, &["false".into()], false));
        assert!(!compare(&missing, Comparator::Exists, &["true".into()], false));
        // `!=` never matches a missing value
        assert!(!compare(&missing, Comparator::NotEquals, &["x".into()], false));
    }
}

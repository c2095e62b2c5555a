//! Trait creation, value coercion and merging

use super::typed::*;
use super::{Trait, TraitError, TypedTrait};
use crate::domain::id::ShapeId;
use crate::domain::node::{Node, SourceLocation};
use crate::domain::shape::ShapeType;
use std::collections::HashMap;

type Constructor = fn(&Node) -> Result<(), TraitError>;

fn check<T: TypedTrait>(node: &Node) -> Result<(), TraitError> {
    T::from_node(node).map(|_| ())
}

/// Creates [`Trait`] values, checking registered traits against their
/// typed representation
///
/// Registration is explicit: [`TraitFactory::builtin`] knows the typed
/// prelude traits and callers can [`register`](TraitFactory::register) more.
#[derive(Debug, Clone)]
pub struct TraitFactory {
    constructors: HashMap<ShapeId, Constructor>,
}

impl Default for TraitFactory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TraitFactory {
    /// A factory with no typed traits: every value is accepted as-is
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A factory that knows every typed prelude trait
    pub fn builtin() -> Self {
        let mut factory = Self::empty();
        factory
            .register::<TraitDefinition>()
            .register::<DocumentationTrait>()
            .register::<TagsTrait>()
            .register::<SuppressTrait>()
            .register::<DeprecatedTrait>()
            .register::<ErrorTrait>()
            .register::<HttpTrait>()
            .register::<HttpErrorTrait>()
            .register::<HttpQueryTrait>()
            .register::<HttpHeaderTrait>()
            .register::<LengthTrait>()
            .register::<RangeTrait>()
            .register::<PatternTrait>();
        factory
    }

    pub fn register<T: TypedTrait>(&mut self) -> &mut Self {
        self.constructors.insert(T::id(), check::<T>);
        self
    }

    /// Returns true if values of the trait are checked on creation
    pub fn is_typed(&self, id: &ShapeId) -> bool {
        self.constructors.contains_key(id)
    }

    /// Creates a trait, failing if a registered typed trait rejects the value
    pub fn create_trait(
        &self,
        id: ShapeId,
        value: Node,
        source: SourceLocation,
    ) -> Result<Trait, TraitError> {
        if let Some(constructor) = self.constructors.get(&id) {
            constructor(&value)?;
        }
        Ok(Trait::new(id, value).with_source(source))
    }
}

/// Normalizes shorthand trait values based on the type of the trait's
/// definition shape
///
/// `null` becomes `true` for boolean (annotation) traits, `{}` for
/// structures and maps, and `[]` for lists and sets. `true` applied to a
/// structure-typed trait becomes `{}`.
pub fn coerce_trait_value(value: Node, definition_type: Option<ShapeType>) -> Node {
    match (&value, definition_type) {
        (Node::Null, Some(ShapeType::Boolean)) => Node::Bool(true),
        (Node::Null, Some(ShapeType::Structure | ShapeType::Map)) => Node::Object(Default::default()),
        (Node::Null, Some(ShapeType::List | ShapeType::Set)) => Node::Array(Vec::new()),
        (Node::Bool(true), Some(ShapeType::Structure)) => Node::Object(Default::default()),
        _ => value,
    }
}

/// Outcome of applying a trait value to a shape that already has one
#[derive(Debug, Clone, PartialEq)]
pub enum TraitMerge {
    /// Both values were arrays and have been concatenated
    Merged(Node),
    /// The values are equal; the new one adds nothing
    Duplicate,
    /// The values differ and cannot be combined
    Conflict,
}

pub fn merge_trait_values(previous: &Node, next: &Node) -> TraitMerge {
    match (previous, next) {
        (Node::Array(a), Node::Array(b)) => {
            let mut merged = a.clone();
            merged.extend(b.iter().cloned());
            TraitMerge::Merged(Node::Array(merged))
        }
        _ if previous == next => TraitMerge::Duplicate,
        _ => TraitMerge::Conflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::prelude_trait;
    use serde_json::json;

    #[test]
    fn builtin_factory_checks_typed_traits() {
        let factory = TraitFactory::builtin();
        assert!(factory.is_typed(&prelude_trait("http")));
        assert!(!factory.is_typed(&prelude_trait("required")));

        let ok = factory
            .create_trait(prelude_trait("documentation"), json!("docs"), SourceLocation::none())
            .unwrap();
        assert_eq!(ok.value(), &json!("docs"));

        let err = factory
            .create_trait(prelude_trait("documentation"), json!(10), SourceLocation::none())
            .unwrap_err();
        assert!(matches!(err, TraitError::UnexpectedType { .. }));
    }

    #[test]
    fn untyped_traits_pass_through() {
        let factory = TraitFactory::empty();
        let id = ShapeId::parse("ns#custom").unwrap();
        let t = factory
            .create_trait(id.clone(), json!({"any": [1, 2]}), SourceLocation::none())
            .unwrap();
        assert_eq!(t.id(), &id);
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce_trait_value(json!(null), Some(ShapeType::Boolean)), json!(true));
        assert_eq!(coerce_trait_value(json!(null), Some(ShapeType::Structure)), json!({}));
        assert_eq!(coerce_trait_value(json!(null), Some(ShapeType::Map)), json!({}));
        assert_eq!(coerce_trait_value(json!(null), Some(ShapeType::List)), json!([]));
        assert_eq!(coerce_trait_value(json!(true), Some(ShapeType::Structure)), json!({}));
        assert_eq!(coerce_trait_value(json!(true), Some(ShapeType::Boolean)), json!(true));
        assert_eq!(coerce_trait_value(json!(null), None), json!(null));
        assert_eq!(coerce_trait_value(json!("x"), Some(ShapeType::String)), json!("x"));
    }

    #[test]
    fn merge_rules() {
        assert_eq!(
            merge_trait_values(&json!(["a"]), &json!(["b"])),
            TraitMerge::Merged(json!(["a", "b"]))
        );
        assert_eq!(merge_trait_values(&json!("x"), &json!("x")), TraitMerge::Duplicate);
        assert_eq!(merge_trait_values(&json!("x"), &json!("y")), TraitMerge::Conflict);
        assert_eq!(merge_trait_values(&json!(["a"]), &json!("a")), TraitMerge::Conflict);
    }
}

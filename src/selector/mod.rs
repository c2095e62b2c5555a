//! Selector expressions: a small query language over the shape graph
//!
//! A selector is a pipeline of steps separated by whitespace. Each step
//! receives the set of shapes produced by the previous one:
//!
//! ```text
//! structure > member [trait|required] > string
//! operation -[input]-> ~> [trait|sensitive]
//! :topdown([trait|auth], [trait|noAuth])
//! ```
//!
//! Evaluation is read-only and deterministic: the same selector applied to
//! the same model always yields the same set, returned in shape ID order.

mod ast;
mod attribute;
mod eval;
mod parser;

use crate::domain::{Model, Shape, ShapeId};
use ast::{Step, TypeFilter};
use eval::Evaluator;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A selector expression that failed to parse
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid selector `{expression}` at position {position}: {message}")]
pub struct SelectorSyntaxError {
    expression: String,
    position: usize,
    message: String,
}

impl SelectorSyntaxError {
    pub(crate) fn new(expression: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            position,
            message: message.into(),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Byte offset into the expression where parsing failed
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A parsed selector
#[derive(Debug, Clone)]
pub struct Selector {
    expression: String,
    steps: Vec<Step>,
    trait_relationships: bool,
}

impl Selector {
    pub fn parse(expression: &str) -> Result<Self, SelectorSyntaxError> {
        let steps = parser::parse_selector(expression)?;
        let trait_relationships = ast::uses_trait_relationships(&steps);
        Ok(Self {
            expression: expression.trim().to_string(),
            steps,
            trait_relationships,
        })
    }

    /// The `*` selector, matching every shape
    pub fn any() -> Self {
        Self {
            expression: "*".to_string(),
            steps: vec![Step::Type(TypeFilter::Any)],
            trait_relationships: false,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Shapes of `model` matched by the selector, in ID order
    pub fn select<'m>(&self, model: &'m Model) -> Vec<&'m Shape> {
        self.evaluate(model)
            .into_iter()
            .filter_map(|id| model.get_shape(id))
            .collect()
    }

    pub fn select_ids(&self, model: &Model) -> BTreeSet<ShapeId> {
        self.evaluate(model).into_iter().cloned().collect()
    }

    fn evaluate<'m>(&self, model: &'m Model) -> BTreeSet<&'m ShapeId> {
        let evaluator = Evaluator::new(model, self.trait_relationships);
        let shapes = evaluator.all_shapes();
        evaluator.eval(&self.steps, shapes)
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl FromStr for Selector {
    type Err = SelectorSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{prelude_trait, ShapeType, Trait};
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn select(expression: &str, model: &Model) -> Vec<String> {
        Selector::parse(expression)
            .unwrap()
            .select(model)
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }

    fn simple(shape_type: ShapeType, name: &str) -> Shape {
        Shape::builder(shape_type).id(id(name)).build().unwrap()
    }

    fn foo_model() -> Model {
        let foo = Shape::builder(ShapeType::Structure)
            .id(id("ns#Foo"))
            .member("bar", id("ns#String"))
            .build()
            .unwrap();
        Model::builder()
            .add_shape(foo)
            .add_shape(simple(ShapeType::String, "ns#String"))
            .build()
    }

    fn service_model() -> Model {
        let service = Shape::builder(ShapeType::Service)
            .id(id("ns#Svc"))
            .version("2021-01-01")
            .add_operation(id("ns#Ping"))
            .add_resource(id("ns#Thing"))
            .add_trait(Trait::new(id("ns#auth"), json!({})))
            .build()
            .unwrap();
        let thing = Shape::builder(ShapeType::Resource)
            .id(id("ns#Thing"))
            .read(id("ns#GetThing"))
            .add_trait(Trait::new(id("ns#noAuth"), json!({})))
            .build()
            .unwrap();
        let ping = Shape::builder(ShapeType::Operation)
            .id(id("ns#Ping"))
            .input(id("ns#PingInput"))
            .build()
            .unwrap();
        let input = Shape::builder(ShapeType::Structure)
            .id(id("ns#PingInput"))
            .member_with("secret", id("ns#String"), |m| {
                m.add_trait(Trait::new(prelude_trait("sensitive"), json!(true)))
            })
            .build()
            .unwrap();
        let auth = Shape::builder(ShapeType::Structure)
            .id(id("ns#auth"))
            .add_trait(Trait::new(prelude_trait("trait"), json!({})))
            .build()
            .unwrap();
        Model::builder()
            .add_shapes([
                service,
                thing,
                ping,
                input,
                auth,
                simple(ShapeType::Operation, "ns#GetThing"),
                simple(ShapeType::String, "ns#String"),
            ])
            .build()
    }

    #[test]
    fn member_traversal() {
        let model = foo_model();
        assert_eq!(select("structure > member", &model), vec!["ns#Foo$bar"]);
        assert_eq!(select("structure > member > string", &model), vec!["ns#String"]);
        assert_eq!(select("string", &model), vec!["ns#String"]);
        assert_eq!(select("string < member", &model), vec!["ns#Foo$bar"]);
        assert_eq!(select("member < *", &model), vec!["ns#Foo"]);
    }

    #[test]
    fn recursive_closure_terminates_on_cycles() {
        let a = Shape::builder(ShapeType::Structure)
            .id(id("ns#A"))
            .member("b", id("ns#B"))
            .build()
            .unwrap();
        let b = Shape::builder(ShapeType::Structure)
            .id(id("ns#B"))
            .member("a", id("ns#A"))
            .build()
            .unwrap();
        let model = Model::builder().add_shapes([a, b]).build();
        assert_eq!(
            select("[id = ns#A] ~> structure", &model),
            vec!["ns#A", "ns#B"]
        );
    }

    #[test]
    fn selection_is_deterministic() {
        let model = service_model();
        let selector = Selector::parse("service ~> *").unwrap();
        assert_eq!(selector.select_ids(&model), selector.select_ids(&model));
    }

    #[test]
    fn relationship_filters() {
        let model = service_model();
        assert_eq!(select("operation -[input]-> structure", &model), vec!["ns#PingInput"]);
        assert_eq!(select("structure <-[input]- *", &model), vec!["ns#Ping"]);
        assert_eq!(
            select("operation -[bound]-> *", &model),
            vec!["ns#Svc", "ns#Thing"]
        );
        assert_eq!(
            select("operation [id = ns#GetThing] -[bound]-> resource", &model),
            vec!["ns#Thing"]
        );
        // plain traversal never follows bound edges
        assert!(select("operation > service", &model).is_empty());
        assert_eq!(
            select("service -[trait]-> *", &model),
            vec!["ns#auth"]
        );
    }

    #[test]
    fn closure_finds_nested_sensitive_members() {
        let model = service_model();
        assert_eq!(
            select("service ~> member [trait|sensitive]", &model),
            vec!["ns#PingInput$secret"]
        );
    }

    #[test]
    fn functions() {
        let model = foo_model();
        assert_eq!(
            select(":is(string, structure)", &model),
            vec!["ns#Foo", "ns#String"]
        );
        assert_eq!(select(":not(member)", &model), vec!["ns#Foo", "ns#String"]);
        assert_eq!(select("* :test(> member)", &model), vec!["ns#Foo"]);
        assert_eq!(select("* :not(> member)", &model), vec!["ns#Foo$bar", "ns#String"]);
    }

    #[test]
    fn top_down_qualification() {
        let model = service_model();
        assert_eq!(
            select(":topdown([trait|ns#auth], [trait|ns#noAuth])", &model),
            vec!["ns#Ping", "ns#Svc"]
        );
        assert_eq!(
            select(":topdown([trait|ns#auth])", &model),
            vec!["ns#GetThing", "ns#Ping", "ns#Svc", "ns#Thing"]
        );
    }

    #[test]
    fn top_down_starts_only_from_bindings() {
        let op = Shape::builder(ShapeType::Operation)
            .id(id("ns#Op"))
            .add_trait(Trait::new(id("ns#auth"), json!({})))
            .build()
            .unwrap();
        let data = Shape::builder(ShapeType::Structure)
            .id(id("ns#Data"))
            .add_trait(Trait::new(id("ns#auth"), json!({})))
            .build()
            .unwrap();
        let model = Model::builder().add_shapes([op, data]).build();
        assert_eq!(select(":topdown([trait|ns#auth])", &model), vec!["ns#Op"]);
    }

    #[test]
    fn attribute_filters() {
        let model = service_model();
        assert_eq!(select("[service|version ^= 2021]", &model), vec!["ns#Svc"]);
        assert_eq!(select("operation [id|name = ping i]", &model), vec!["ns#Ping"]);
        assert_eq!(
            select("[id|member]", &model),
            vec!["ns#PingInput$secret"]
        );
        assert_eq!(select("[@: @{id|name} = Ping, Svc]", &model), vec!["ns#Ping", "ns#Svc"]);
    }

    #[test]
    fn parse_errors_and_display() {
        let err = Selector::parse("structure [").unwrap_err();
        assert_eq!(err.expression(), "structure [");
        assert!(err.to_string().starts_with("Invalid selector `structure [`"));

        let selector: Selector = " string ".parse().unwrap();
        assert_eq!(selector.to_string(), "string");
        assert_eq!(Selector::any(), Selector::parse("*").unwrap());
    }
}

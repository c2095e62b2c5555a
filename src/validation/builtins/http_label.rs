use super::HTTP_LABEL_TRAIT;
use crate::domain::traits::{names, HttpTrait};
use crate::domain::{Model, Shape, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};

/// Checks that the `httpLabel` members of an operation's input line up with
/// the labels of its `http` URI pattern
pub struct HttpLabelTrait;

impl HttpLabelTrait {
    fn check(model: &Model, operation: &Shape, http: &HttpTrait) -> Vec<ValidationEvent> {
        let error = |shape: &Shape, message: String| {
            ValidationEvent::new(HTTP_LABEL_TRAIT, Severity::Error, message).with_shape(shape)
        };
        let input = operation
            .as_operation()
            .and_then(|op| op.input.as_ref())
            .and_then(|id| model.get_shape(id));

        let mut events = Vec::new();
        if let Some(input) = input {
            for member in input.members() {
                let name = member.member_name().unwrap_or_default();
                if member.has_prelude_trait(names::HTTP_LABEL) && http.uri.label(name).is_none() {
                    events.push(error(
                        member,
                        format!(
                            "This `{}` structure member is marked with the `httpLabel` trait, but no \
                             corresponding `http` URI label could be found when used as the input of \
                             the `{}` operation.",
                            name,
                            operation.id()
                        ),
                    ));
                }
            }
        }

        for label in http.uri.labels() {
            let member = input.and_then(|i| i.member(&label.name));
            match member {
                Some(member) if member.has_prelude_trait(names::HTTP_LABEL) => {
                    if !member.has_prelude_trait(names::REQUIRED) {
                        events.push(error(
                            member,
                            format!(
                                "This `{}` structure member is bound to the `{}` URI label of the \
                                 `{}` operation and must be marked with the `required` trait.",
                                label.name,
                                label.name,
                                operation.id()
                            ),
                        ));
                    }
                    let target_type = member
                        .target()
                        .and_then(|t| model.get_shape(t))
                        .map(Shape::shape_type);
                    if label.greedy && target_type.is_some_and(|t| t != ShapeType::String) {
                        events.push(error(
                            member,
                            format!(
                                "The `{}` structure member corresponds to a greedy label in the \
                                 `{}` operation, so it must target a string shape.",
                                label.name,
                                operation.id()
                            ),
                        ));
                    }
                }
                _ => events.push(error(
                    operation,
                    format!(
                        "The `{}` URI label of the `{}` operation has no input structure member \
                         marked with the `httpLabel` trait.",
                        label.name,
                        operation.id()
                    ),
                )),
            }
        }
        events
    }
}

impl Validator for HttpLabelTrait {
    fn name(&self) -> &str {
        HTTP_LABEL_TRAIT
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        model
            .shapes_of_type(ShapeType::Operation)
            .filter_map(|op| op.get_typed::<HttpTrait>().map(|http| (op, http)))
            .flat_map(|(op, http)| Self::check(model, op, &http))
            .collect()
    }
}

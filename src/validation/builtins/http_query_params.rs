use super::{ticked, HTTP_QUERY_PARAMS_TRAIT};
use crate::domain::traits::names;
use crate::domain::{Model, Shape, ShapeType};
use crate::validation::{Severity, ValidationEvent, Validator};

/// Notes operation inputs that mix `httpQueryParams` with `httpQuery`
pub struct HttpQueryParamsTrait;

fn check(input: &Shape) -> Option<ValidationEvent> {
    let members = input.members();
    let params = members
        .iter()
        .find(|m| m.has_prelude_trait(names::HTTP_QUERY_PARAMS))?;
    let query: Vec<&str> = members
        .iter()
        .filter(|m| m.has_prelude_trait(names::HTTP_QUERY))
        .filter_map(|m| m.member_name())
        .collect();
    if query.is_empty() {
        return None;
    }
    Some(
        ValidationEvent::new(
            HTTP_QUERY_PARAMS_TRAIT,
            Severity::Note,
            format!(
                "Operation input `{}` has an `httpQueryParams` trait applied to the `{}` member \
                 and `httpQuery` traits applied to the following members: {}. This can cause \
                 confusion when keys from the `httpQueryParams` trait conflict with those \
                 defined directly by `httpQuery` traits",
                input.id(),
                params.member_name().unwrap_or_default(),
                ticked(query)
            ),
        )
        .with_shape(input),
    )
}

impl Validator for HttpQueryParamsTrait {
    fn name(&self) -> &str {
        HTTP_QUERY_PARAMS_TRAIT
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut inputs: Vec<&Shape> = model
            .shapes_of_type(ShapeType::Operation)
            .filter_map(|op| op.as_operation()?.input.as_ref())
            .filter_map(|id| model.get_shape(id))
            .collect();
        inputs.sort_by(|a, b| a.id().cmp(b.id()));
        inputs.dedup_by(|a, b| a.id() == b.id());
        inputs.into_iter().filter_map(check).collect()
    }
}

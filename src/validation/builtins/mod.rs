//! Built-in validators
//!
//! | Name | Checks |
//! |------|--------|
//! | `Target` | references resolve to shapes of an allowed type |
//! | `TraitTarget` | traits are applied where their selector allows |
//! | `TraitValue` | trait values match their definitions |
//! | `TraitConflict` | conflicting traits are not applied together |
//! | `ExclusiveStructureMemberTrait` | structurally exclusive traits |
//! | `HttpLabelTrait` | `httpLabel` members match `http` URI labels |
//! | `HttpQueryParamsTrait` | `httpQueryParams` mixed with `httpQuery` |
//! | `ShapeRecursion` | recursion through required structure members |
//!
//! `ShouldHaveUsedTimestamp` is a linter: it only runs when enabled.

mod exclusive_member;
mod http_label;
mod http_query_params;
mod recursion;
mod target;
mod timestamp;
mod trait_conflict;
mod trait_target;
mod trait_value;

pub use exclusive_member::ExclusiveStructureMemberTrait;
pub use http_label::HttpLabelTrait;
pub use http_query_params::HttpQueryParamsTrait;
pub use recursion::ShapeRecursion;
pub use target::Target;
pub use timestamp::ShouldHaveUsedTimestamp;
pub use trait_conflict::TraitConflict;
pub use trait_target::TraitTarget;
pub use trait_value::TraitValue;

use super::Validator;
use crate::domain::Shape;

pub const TARGET: &str = "Target";
pub const TRAIT_TARGET: &str = "TraitTarget";
pub const TRAIT_VALUE: &str = "TraitValue";
pub const TRAIT_CONFLICT: &str = "TraitConflict";
pub const EXCLUSIVE_STRUCTURE_MEMBER_TRAIT: &str = "ExclusiveStructureMemberTrait";
pub const HTTP_LABEL_TRAIT: &str = "HttpLabelTrait";
pub const HTTP_QUERY_PARAMS_TRAIT: &str = "HttpQueryParamsTrait";
pub const SHAPE_RECURSION: &str = "ShapeRecursion";
pub const SHOULD_HAVE_USED_TIMESTAMP: &str = "ShouldHaveUsedTimestamp";

/// Validators that run on every model
pub fn validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(Target),
        Box::new(TraitTarget),
        Box::new(TraitValue),
        Box::new(TraitConflict),
        Box::new(ExclusiveStructureMemberTrait),
        Box::new(HttpLabelTrait),
        Box::new(HttpQueryParamsTrait),
        Box::new(ShapeRecursion),
    ]
}

/// `a`, `b`, `c`
fn ticked<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(|n| format!("`{}`", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shapes a validator reports on; prelude shapes are trusted
fn user_shapes(model: &crate::domain::Model) -> impl Iterator<Item = &Shape> {
    model.shapes().filter(|s| !s.id().is_prelude())
}

//! Model validation
//!
//! Validators inspect a finished [`Model`](crate::domain::Model) and report
//! [`ValidationEvent`]s. The [`ModelValidator`] runs the built-in
//! validators, any opt-in validators configured in model metadata, and then
//! applies suppressions.

pub mod builtins;
mod event;
mod node_validator;
mod suppression;
mod validator;

pub use event::{EventError, Severity, ValidationEvent, ValidationEventBuilder};
pub use node_validator::{NodeValidator, NodeViolation};
pub use suppression::{Suppression, SuppressionError, SuppressionScope};
pub use validator::{
    ModelValidator, Validator, ValidatorError, ValidatorFactory, ValidatorRegistry,
    INVALID_METADATA, UNKNOWN_VALIDATOR,
};

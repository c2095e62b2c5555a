//! shape-model - a semantic modeling toolkit
//!
//! Models are graphs of shapes identified by [`ShapeId`]s and annotated
//! with traits. The crate assembles models from JSON AST documents,
//! validates them, queries them with selector expressions and compares
//! versions of them.
//!
//! ```no_run
//! use shape_model::loader::ModelAssembler;
//! use shape_model::selector::Selector;
//!
//! let model = ModelAssembler::new()
//!     .add_import("model/")
//!     .assemble()?
//!     .into_result()?;
//! let required = Selector::parse("structure > member [trait|required]")?;
//! for shape in required.select(&model) {
//!     println!("{}", shape.id());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod diff;
pub mod domain;
pub mod loader;
pub mod selector;
pub mod storage;
pub mod validation;

pub use domain::{Model, Node, Shape, ShapeId, ShapeType, SourceLocation, Trait};
pub use loader::{ModelAssembler, ValidatedResult};
pub use selector::Selector;
pub use validation::{Severity, ValidationEvent};

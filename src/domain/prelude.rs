//! The `smithy.api` prelude
//!
//! Shapes and trait definitions that every model can reference without
//! defining them. Shapes marked `private` cannot be referenced from other
//! namespaces by relative name.

use super::id::ShapeId;
use super::model::Model;
use super::shape::{Shape, ShapeError, ShapeType};
use super::traits::{names, prelude_trait, Trait};
use serde_json::{json, Value};
use std::sync::LazyLock;

const SIMPLE_SHAPES: [(&str, ShapeType); 13] = [
    ("Blob", ShapeType::Blob),
    ("Boolean", ShapeType::Boolean),
    ("String", ShapeType::String),
    ("Byte", ShapeType::Byte),
    ("Short", ShapeType::Short),
    ("Integer", ShapeType::Integer),
    ("Long", ShapeType::Long),
    ("Float", ShapeType::Float),
    ("Double", ShapeType::Double),
    ("BigInteger", ShapeType::BigInteger),
    ("BigDecimal", ShapeType::BigDecimal),
    ("Timestamp", ShapeType::Timestamp),
    ("Document", ShapeType::Document),
];

static PRELUDE: LazyLock<Model> = LazyLock::new(|| match build_prelude() {
    Ok(model) => model,
    Err(e) => {
        tracing::error!(error = %e, "failed to build prelude");
        Model::default()
    }
});

/// The prelude model
pub fn prelude() -> &'static Model {
    &PRELUDE
}

/// Returns true if the shape is defined in the prelude
pub fn is_prelude_shape(id: &ShapeId) -> bool {
    PRELUDE.contains(id)
}

/// Returns true if the shape is in the prelude and not marked `private`
pub fn is_public_prelude_shape(id: &ShapeId) -> bool {
    PRELUDE
        .get_shape(id)
        .is_some_and(|s| !s.has_prelude_trait(names::PRIVATE))
}

fn annotation(name: &str) -> Trait {
    Trait::new(prelude_trait(name), Value::Bool(true))
}

fn definition(shape_type: ShapeType, name: &str, trait_value: Value) -> Result<Shape, ShapeError> {
    Shape::builder(shape_type)
        .id(ShapeId::prelude(name))
        .add_trait(Trait::new(prelude_trait(names::TRAIT), trait_value))
        .build()
}

fn build_prelude() -> Result<Model, ShapeError> {
    let string = ShapeId::prelude("String");
    let long = ShapeId::prelude("Long");
    let big_decimal = ShapeId::prelude("BigDecimal");
    let integer = ShapeId::prelude("Integer");
    let string_list = ShapeId::prelude("StringList");

    let mut builder = Model::builder();

    for (name, shape_type) in SIMPLE_SHAPES {
        builder = builder.add_shape(Shape::builder(shape_type).id(ShapeId::prelude(name)).build()?);
    }

    builder = builder.add_shape(
        Shape::builder(ShapeType::List)
            .id(string_list.clone())
            .member("member", string.clone())
            .add_trait(annotation(names::PRIVATE))
            .build()?,
    );

    // Trait definitions with structure values
    builder = builder
        .add_shape(
            Shape::builder(ShapeType::Structure)
                .id(ShapeId::prelude(names::TRAIT))
                .member("selector", string.clone())
                .member("structurallyExclusive", string.clone())
                .member("conflicts", string_list.clone())
                .member("tags", string_list.clone())
                .add_trait(Trait::new(
                    prelude_trait(names::TRAIT),
                    json!({"selector": ":is(simpleType, collection, map, structure, union)"}),
                ))
                .build()?,
        )
        .add_shape(
            Shape::builder(ShapeType::Structure)
                .id(ShapeId::prelude(names::DEPRECATED))
                .member("message", string.clone())
                .member("since", string.clone())
                .add_trait(Trait::new(prelude_trait(names::TRAIT), json!({})))
                .build()?,
        )
        .add_shape(
            Shape::builder(ShapeType::Structure)
                .id(ShapeId::prelude(names::HTTP))
                .member_with("method", string.clone(), |m| m.add_trait(annotation(names::REQUIRED)))
                .member_with("uri", string.clone(), |m| m.add_trait(annotation(names::REQUIRED)))
                .member("code", integer.clone())
                .add_trait(Trait::new(
                    prelude_trait(names::TRAIT),
                    json!({"selector": "operation"}),
                ))
                .build()?,
        )
        .add_shape(
            Shape::builder(ShapeType::Structure)
                .id(ShapeId::prelude(names::LENGTH))
                .member("min", long.clone())
                .member("max", long)
                .add_trait(Trait::new(
                    prelude_trait(names::TRAIT),
                    json!({"selector": ":is(string, blob, collection, map, member)"}),
                ))
                .build()?,
        )
        .add_shape(
            Shape::builder(ShapeType::Structure)
                .id(ShapeId::prelude(names::RANGE))
                .member("min", big_decimal.clone())
                .member("max", big_decimal)
                .add_trait(Trait::new(
                    prelude_trait(names::TRAIT),
                    json!({"selector": ":is(number, member)"}),
                ))
                .build()?,
        );

    // List-valued trait definitions
    for name in [names::TAGS, names::SUPPRESS] {
        builder = builder.add_shape(
            Shape::builder(ShapeType::List)
                .id(ShapeId::prelude(name))
                .member("member", string.clone())
                .add_trait(Trait::new(prelude_trait(names::TRAIT), json!({})))
                .build()?,
        );
    }

    let member_selector = "structure > member";
    let string_traits = [
        (names::DOCUMENTATION, json!({})),
        (names::ERROR, json!({"selector": "structure"})),
        (
            names::HTTP_QUERY,
            json!({"selector": member_selector, "conflicts": ["httpLabel", "httpHeader", "httpQueryParams"]}),
        ),
        (
            names::HTTP_HEADER,
            json!({"selector": member_selector, "conflicts": ["httpLabel", "httpQuery", "httpQueryParams"]}),
        ),
        (names::PATTERN, json!({"selector": ":is(string, member)"})),
    ];
    for (name, value) in string_traits {
        builder = builder.add_shape(definition(ShapeType::String, name, value)?);
    }

    builder = builder.add_shape(definition(
        ShapeType::Integer,
        names::HTTP_ERROR,
        json!({"selector": "structure"}),
    )?);

    let annotation_traits = [
        (names::REQUIRED, json!({"selector": member_selector})),
        (names::BOX, json!({"selector": ":is(boolean, number, member)"})),
        (
            names::SENSITIVE,
            json!({"selector": ":is(simpleType, collection, map, structure, union, member)"}),
        ),
        (
            names::HTTP_LABEL,
            json!({"selector": member_selector, "conflicts": ["httpHeader", "httpQuery", "httpQueryParams"]}),
        ),
        (
            names::HTTP_QUERY_PARAMS,
            json!({"selector": member_selector, "structurallyExclusive": "member"}),
        ),
        (
            names::HTTP_PAYLOAD,
            json!({
                "selector": member_selector,
                "structurallyExclusive": "member",
                "conflicts": ["httpLabel", "httpQuery", "httpHeader", "httpQueryParams"]
            }),
        ),
        (
            names::STREAMING,
            json!({"selector": "blob", "structurallyExclusive": "target"}),
        ),
        (names::PRIVATE, json!({})),
        (names::READONLY, json!({"selector": "operation"})),
        (
            names::IDEMPOTENT,
            json!({"selector": "operation", "conflicts": ["readonly"]}),
        ),
    ];
    for (name, value) in annotation_traits {
        builder = builder.add_shape(definition(ShapeType::Boolean, name, value)?);
    }

    Ok(builder.build())
}

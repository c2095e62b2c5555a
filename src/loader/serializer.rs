//! Writes a [`Model`] as a JSON AST document
//!
//! Prelude shapes are omitted. Every reference and trait name is written
//! as an absolute shape ID, so the output loads without `use` statements.

use super::MODEL_VERSION;
use crate::domain::{prelude, Model, Node, Shape, ShapeId, ShapeKind};
use serde_json::{json, Map};

/// Serializes a model, including its metadata
pub fn serialize(model: &Model) -> Node {
    let mut root = Map::new();
    root.insert("smithy".to_string(), Node::String(MODEL_VERSION.to_string()));

    if !model.metadata().is_empty() {
        let metadata = model
            .metadata()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        root.insert("metadata".to_string(), Node::Object(metadata));
    }

    let shapes: Map<String, Node> = model
        .shapes()
        .filter(|s| !s.is_member() && !prelude::is_prelude_shape(s.id()))
        .map(|s| (s.id().to_string(), serialize_shape(s)))
        .collect();
    root.insert("shapes".to_string(), Node::Object(shapes));
    Node::Object(root)
}

/// Serializes a model to pretty-printed JSON text
pub fn to_string_pretty(model: &Model) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serialize(model))
}

fn target(id: &ShapeId) -> Node {
    json!({ "target": id.to_string() })
}

fn targets(ids: &[ShapeId]) -> Node {
    Node::Array(ids.iter().map(target).collect())
}

fn traits(shape: &Shape) -> Option<Node> {
    if shape.traits().is_empty() {
        return None;
    }
    let map = shape
        .traits()
        .values()
        .map(|t| (t.id().to_string(), t.value().clone()))
        .collect();
    Some(Node::Object(map))
}

fn member(shape: &Shape) -> Node {
    let mut map = Map::new();
    if let Some(t) = shape.target() {
        map.insert("target".to_string(), Node::String(t.to_string()));
    }
    if let Some(traits) = traits(shape) {
        map.insert("traits".to_string(), traits);
    }
    Node::Object(map)
}

fn serialize_shape(shape: &Shape) -> Node {
    let mut map = Map::new();
    map.insert(
        "type".to_string(),
        Node::String(shape.shape_type().to_string()),
    );

    match shape.kind() {
        ShapeKind::List { member: m } | ShapeKind::Set { member: m } => {
            map.insert("member".to_string(), member(m));
        }
        ShapeKind::Map { key, value } => {
            map.insert("key".to_string(), member(key));
            map.insert("value".to_string(), member(value));
        }
        ShapeKind::Structure { members } | ShapeKind::Union { members } => {
            let members: Map<String, Node> = members
                .iter()
                .filter_map(|m| Some((m.member_name()?.to_string(), member(m))))
                .collect();
            map.insert("members".to_string(), Node::Object(members));
        }
        ShapeKind::Operation(op) => {
            if let Some(input) = &op.input {
                map.insert("input".to_string(), target(input));
            }
            if let Some(output) = &op.output {
                map.insert("output".to_string(), target(output));
            }
            if !op.errors.is_empty() {
                map.insert("errors".to_string(), targets(&op.errors));
            }
        }
        ShapeKind::Resource(resource) => {
            if !resource.identifiers.is_empty() {
                let identifiers = resource
                    .identifiers
                    .iter()
                    .map(|(name, id)| (name.clone(), target(id)))
                    .collect();
                map.insert("identifiers".to_string(), Node::Object(identifiers));
            }
            for (name, operation) in resource.lifecycle() {
                if let Some(operation) = operation {
                    map.insert(name.to_string(), target(operation));
                }
            }
            if !resource.operations.is_empty() {
                map.insert("operations".to_string(), targets(&resource.operations));
            }
            if !resource.resources.is_empty() {
                map.insert("resources".to_string(), targets(&resource.resources));
            }
        }
        ShapeKind::Service(service) => {
            if !service.version.is_empty() {
                map.insert("version".to_string(), Node::String(service.version.clone()));
            }
            if !service.operations.is_empty() {
                map.insert("operations".to_string(), targets(&service.operations));
            }
            if !service.resources.is_empty() {
                map.insert("resources".to_string(), targets(&service.resources));
            }
        }
        _ => {}
    }

    if let Some(traits) = traits(shape) {
        map.insert("traits".to_string(), traits);
    }
    Node::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ast, LoaderVisitor};

    const MODEL: &str = r#"{
    "smithy": "1.0",
    "metadata": {"suppressions": []},
    "shapes": {
        "ns#Api": {"type": "service", "version": "1", "operations": [{"target": "GetThing"}]},
        "ns#GetThing": {
            "type": "operation",
            "input": {"target": "GetThingInput"},
            "traits": {"readonly": true, "http": {"method": "GET", "uri": "/things/{id}"}}
        },
        "ns#GetThingInput": {
            "type": "structure",
            "members": {
                "id": {"target": "String", "traits": {"required": true, "httpLabel": true}},
                "tags": {"target": "Tags"}
            }
        },
        "ns#Tags": {"type": "map", "key": {"target": "String"}, "value": {"target": "String"}}
    }
}"#;

    fn load(text: &str) -> Model {
        let mut visitor = LoaderVisitor::new();
        ast::load(&mut visitor, "model.json", text).unwrap();
        let (model, events) = visitor.on_end().into_parts();
        assert!(events.is_empty(), "{:#?}", events);
        model
    }

    #[test]
    fn written_models_load_back_unchanged() {
        let model = load(MODEL);
        let text = to_string_pretty(&model).unwrap();
        assert_eq!(load(&text), model);
    }

    #[test]
    fn writes_absolute_ids_and_skips_the_prelude() {
        let node = serialize(&load(MODEL));
        let shapes = node["shapes"].as_object().unwrap();
        assert_eq!(shapes.len(), 4);
        assert!(shapes.keys().all(|k| k.starts_with("ns#")));
        assert_eq!(
            node["shapes"]["ns#GetThingInput"]["members"]["id"]["target"],
            "smithy.api#String"
        );
        assert_eq!(
            node["shapes"]["ns#GetThingInput"]["members"]["id"]["traits"]["smithy.api#required"],
            true
        );
        assert_eq!(node["shapes"]["ns#Api"]["operations"][0]["target"], "ns#GetThing");
        assert_eq!(node["metadata"]["suppressions"], serde_json::json!([]));
    }
}

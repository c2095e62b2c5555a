//! JSON AST front-end
//!
//! ```json
//! {
//!     "smithy": "1.0",
//!     "metadata": { "key": "value" },
//!     "use": ["other.ns#Thing"],
//!     "shapes": {
//!         "ns#Foo": {
//!             "type": "structure",
//!             "members": { "bar": { "target": "String", "traits": { "required": true } } },
//!             "traits": { "documentation": "A foo" }
//!         }
//!     }
//! }
//! ```
//!
//! Shape keys are absolute. Targets and trait names may be relative to the
//! namespace of the shape being defined; they are resolved when loading
//! ends. A shape of type `apply` only contributes traits to an existing
//! shape.

use super::visitor::{LoaderVisitor, PendingShape, ShapeReference};
use super::{LoadError, MODEL_VERSION};
use crate::domain::{Node, Shape, ShapeBuilder, ShapeId, ShapeType, SourceLocation};
use serde_json::Map;

/// Maps byte offsets of JSON keys to line and column numbers
struct Locator<'a> {
    filename: &'a str,
    text: &'a str,
}

impl<'a> Locator<'a> {
    fn new(filename: &'a str, text: &'a str) -> Self {
        Self { filename, text }
    }

    /// Finds `"key":` at or after `from`
    fn key(&self, key: &str, from: usize) -> (SourceLocation, usize) {
        let needle = format!("\"{}\"", key);
        let mut start = from.min(self.text.len());
        while let Some(found) = self.text[start..].find(&needle) {
            let offset = start + found;
            let rest = self.text[offset + needle.len()..].trim_start();
            if rest.starts_with(':') {
                return (self.location(offset), offset);
            }
            start = offset + needle.len();
        }
        (SourceLocation::new(self.filename, 0, 0), from)
    }

    fn location(&self, offset: usize) -> SourceLocation {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        SourceLocation::new(self.filename, line as u32, column as u32)
    }
}

fn invalid(visitor: &LoaderVisitor, message: impl Into<String>) -> LoadError {
    LoadError::InvalidAst {
        file: visitor.file().to_string(),
        message: message.into(),
    }
}

fn parse_id(visitor: &LoaderVisitor, text: &str) -> Result<ShapeId, LoadError> {
    ShapeId::parse(text).map_err(|source| LoadError::InvalidShapeId {
        file: visitor.file().to_string(),
        source,
    })
}

fn expect_object<'n>(
    visitor: &LoaderVisitor,
    node: &'n Node,
    what: &str,
) -> Result<&'n Map<String, Node>, LoadError> {
    node.as_object()
        .ok_or_else(|| invalid(visitor, format!("{} must be an object", what)))
}

fn expect_array<'n>(visitor: &LoaderVisitor, node: &'n Node, what: &str) -> Result<&'n Vec<Node>, LoadError> {
    node.as_array()
        .ok_or_else(|| invalid(visitor, format!("{} must be an array", what)))
}

/// Loads one JSON AST document into the visitor
pub fn load(visitor: &mut LoaderVisitor, filename: &str, contents: &str) -> Result<(), LoadError> {
    let root: Node = serde_json::from_str(contents).map_err(|source| LoadError::Json {
        file: filename.to_string(),
        source,
    })?;
    visitor.open_file(filename);
    let root = expect_object(visitor, &root, "The model")?;
    let locator = Locator::new(filename, contents);

    match root.get("smithy") {
        Some(Node::String(version)) => visitor.on_version(version)?,
        Some(_) => return Err(invalid(visitor, "`smithy` must be a string")),
        None => {
            tracing::warn!(file = filename, "no model version specified, assuming {}", MODEL_VERSION);
            visitor.on_version(MODEL_VERSION)?;
        }
    }

    if let Some(uses) = root.get("use") {
        for item in expect_array(visitor, uses, "`use`")? {
            let text = item
                .as_str()
                .ok_or_else(|| invalid(visitor, "`use` entries must be shape ID strings"))?;
            let id = parse_id(visitor, text)?;
            visitor.on_use(id)?;
        }
    }

    if let Some(metadata) = root.get("metadata") {
        for (key, value) in expect_object(visitor, metadata, "`metadata`")? {
            let (source, _) = locator.key(key, 0);
            visitor.on_metadata(key, value.clone(), source);
        }
    }

    if let Some(shapes) = root.get("shapes") {
        for (key, definition) in expect_object(visitor, shapes, "`shapes`")? {
            load_shape(visitor, &locator, key, definition)?;
        }
    }
    Ok(())
}

fn load_shape(
    visitor: &mut LoaderVisitor,
    locator: &Locator<'_>,
    key: &str,
    definition: &Node,
) -> Result<(), LoadError> {
    let id = parse_id(visitor, key)?;
    if id.is_member() {
        return Err(invalid(visitor, format!("Shape keys cannot be member IDs: `{}`", id)));
    }
    visitor.on_namespace(id.namespace())?;

    let what = format!("Shape `{}`", id);
    let definition = expect_object(visitor, definition, &what)?;
    let (source, offset) = locator.key(key, 0);
    let type_name = definition
        .get("type")
        .and_then(Node::as_str)
        .ok_or_else(|| invalid(visitor, format!("{} is missing a `type`", what)))?;

    if type_name == "apply" {
        return apply_traits(visitor, &id, definition.get("traits"), &source);
    }
    let shape_type: ShapeType = type_name
        .parse()
        .map_err(|e: String| invalid(visitor, format!("{}: {}", what, e)))?;
    if shape_type == ShapeType::Member {
        return Err(invalid(visitor, format!("{} cannot be a member", what)));
    }

    let mut builder = Shape::builder(shape_type).id(id.clone()).source(source.clone());
    if shape_type == ShapeType::Service {
        if let Some(version) = definition.get("version") {
            let version = version
                .as_str()
                .ok_or_else(|| invalid(visitor, format!("{}: `version` must be a string", what)))?;
            builder = builder.version(version);
        }
    }
    let mut pending = PendingShape::new(builder);

    match shape_type {
        ShapeType::List | ShapeType::Set => {
            let member = required(visitor, definition, "member", &what)?;
            pending = pending.member(load_member(visitor, locator, &id, "member", member, offset)?);
        }
        ShapeType::Map => {
            for name in ["key", "value"] {
                let member = required(visitor, definition, name, &what)?;
                pending = pending.member(load_member(visitor, locator, &id, name, member, offset)?);
            }
        }
        ShapeType::Structure | ShapeType::Union => {
            if let Some(members) = definition.get("members") {
                for (name, member) in expect_object(visitor, members, "`members`")? {
                    pending = pending.member(load_member(visitor, locator, &id, name, member, offset)?);
                }
            }
        }
        ShapeType::Operation => {
            if let Some(input) = definition.get("input") {
                let reference = target(visitor, input)?;
                pending = pending.reference(reference, |b, t| b.operation_mut().input = Some(t));
            }
            if let Some(output) = definition.get("output") {
                let reference = target(visitor, output)?;
                pending = pending.reference(reference, |b, t| b.operation_mut().output = Some(t));
            }
            for reference in targets(visitor, definition.get("errors"), "`errors`")? {
                pending = pending.reference(reference, |b, t| b.operation_mut().errors.push(t));
            }
        }
        ShapeType::Resource => {
            if let Some(identifiers) = definition.get("identifiers") {
                for (name, value) in expect_object(visitor, identifiers, "`identifiers`")? {
                    let reference = target(visitor, value)?;
                    let name = name.clone();
                    pending = pending.reference(reference, move |b, t| {
                        b.resource_mut().identifiers.insert(name, t);
                    });
                }
            }
            type Lifecycle = fn(&mut ShapeBuilder, ShapeId);
            let lifecycle: [(&str, Lifecycle); 5] = [
                ("create", |b, t| b.resource_mut().create = Some(t)),
                ("read", |b, t| b.resource_mut().read = Some(t)),
                ("update", |b, t| b.resource_mut().update = Some(t)),
                ("delete", |b, t| b.resource_mut().delete = Some(t)),
                ("list", |b, t| b.resource_mut().list = Some(t)),
            ];
            for (name, apply) in lifecycle {
                if let Some(value) = definition.get(name) {
                    pending = pending.reference(target(visitor, value)?, apply);
                }
            }
            for reference in targets(visitor, definition.get("operations"), "`operations`")? {
                pending = pending.reference(reference, |b, t| b.resource_mut().operations.push(t));
            }
            for reference in targets(visitor, definition.get("resources"), "`resources`")? {
                pending = pending.reference(reference, |b, t| b.resource_mut().resources.push(t));
            }
        }
        ShapeType::Service => {
            for reference in targets(visitor, definition.get("operations"), "`operations`")? {
                pending = pending.reference(reference, |b, t| b.service_mut().operations.push(t));
            }
            for reference in targets(visitor, definition.get("resources"), "`resources`")? {
                pending = pending.reference(reference, |b, t| b.service_mut().resources.push(t));
            }
        }
        _ => {}
    }

    apply_traits(visitor, &id, definition.get("traits"), &source)?;
    visitor.on_shape(pending);
    Ok(())
}

fn required<'n>(
    visitor: &LoaderVisitor,
    definition: &'n Map<String, Node>,
    name: &str,
    what: &str,
) -> Result<&'n Node, LoadError> {
    definition
        .get(name)
        .ok_or_else(|| invalid(visitor, format!("{} is missing `{}`", what, name)))
}

/// `{ "target": "..." }`
fn target(visitor: &LoaderVisitor, node: &Node) -> Result<ShapeReference, LoadError> {
    let text = node
        .get("target")
        .and_then(Node::as_str)
        .ok_or_else(|| invalid(visitor, format!("Expected an object with a `target` string, found {}", node)))?;
    visitor.reference(text)
}

fn targets(visitor: &LoaderVisitor, node: Option<&Node>, what: &str) -> Result<Vec<ShapeReference>, LoadError> {
    match node {
        None => Ok(Vec::new()),
        Some(node) => expect_array(visitor, node, what)?
            .iter()
            .map(|item| target(visitor, item))
            .collect(),
    }
}

fn load_member(
    visitor: &mut LoaderVisitor,
    locator: &Locator<'_>,
    container: &ShapeId,
    name: &str,
    definition: &Node,
    container_offset: usize,
) -> Result<PendingShape, LoadError> {
    let id = container.with_member(name).map_err(|source| LoadError::InvalidShapeId {
        file: visitor.file().to_string(),
        source,
    })?;
    let object = expect_object(visitor, definition, &format!("Member `{}`", id))?;
    let (source, _) = locator.key(name, container_offset);
    let reference = target(visitor, definition)?;
    apply_traits(visitor, &id, object.get("traits"), &source)?;
    Ok(
        PendingShape::new(ShapeBuilder::new(ShapeType::Member).id(id).source(source))
            .reference(reference, |b, t| b.set_target(t)),
    )
}

fn apply_traits(
    visitor: &mut LoaderVisitor,
    target: &ShapeId,
    traits: Option<&Node>,
    source: &SourceLocation,
) -> Result<(), LoadError> {
    let Some(traits) = traits else {
        return Ok(());
    };
    for (name, value) in expect_object(visitor, traits, "`traits`")? {
        let reference = visitor.reference(name)?;
        visitor.on_trait(target.clone(), reference, value.clone(), source.clone());
    }
    Ok(())
}

//! The loader visitor: accumulates declarations, then builds the model
//!
//! Loading has two phases. While open, front-ends register shapes, trait
//! applications and metadata; references that cannot be resolved yet are
//! queued as resolver closures. [`LoaderVisitor::on_end`] consumes the
//! visitor, runs every queued resolver, merges trait values and builds the
//! shapes.

use super::{version_parts, LoadError, ValidatedResult, MODEL_ERROR, MODEL_VERSION};
use crate::domain::prelude::{self, is_public_prelude_shape};
use crate::domain::traits::{coerce_trait_value, merge_trait_values, TraitDefinition, TraitMerge};
use crate::domain::{
    is_valid_namespace, Model, Node, Shape, ShapeBuilder, ShapeId, ShapeType, SourceLocation,
    TraitFactory, TypedTrait, PRELUDE_NAMESPACE,
};
use crate::validation::{Severity, ValidationEvent};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// A shape reference as written in a model file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeReference {
    /// An absolute ID, or a name imported with `use`
    Resolved(ShapeId),
    /// A relative name; `expected` is the name in the current namespace
    Deferred { expected: ShapeId },
}

impl ShapeReference {
    /// The ID the reference would resolve to if nothing else matched
    pub fn expected(&self) -> &ShapeId {
        match self {
            ShapeReference::Resolved(id) => id,
            ShapeReference::Deferred { expected } => expected,
        }
    }
}

type Resolver = Box<dyn FnOnce(&mut ShapeBuilder, ShapeId)>;

/// A shape builder waiting for its references to resolve
///
/// Members are kept with their container so duplicate definitions of a
/// shape can be built and compared as a whole.
pub struct PendingShape {
    builder: ShapeBuilder,
    resolvers: Vec<(ShapeReference, Resolver)>,
    members: Vec<PendingShape>,
}

impl PendingShape {
    pub fn new(builder: ShapeBuilder) -> Self {
        Self {
            builder,
            resolvers: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Converts a built shape (and its members) back into pending form
    pub fn from_shape(shape: &Shape) -> Self {
        let mut builder = shape.to_builder();
        let mut members = Vec::new();
        for member in shape.members() {
            if let Some(name) = member.member_name() {
                builder = builder.remove_member(name);
            }
            members.push(PendingShape::new(member.to_builder()));
        }
        Self {
            builder,
            resolvers: Vec::new(),
            members,
        }
    }

    pub fn id(&self) -> Option<&ShapeId> {
        self.builder.get_id()
    }

    pub fn source(&self) -> &SourceLocation {
        self.builder.get_source()
    }

    /// Queues `apply` to run with the resolved ID of `reference`
    ///
    /// Resolvers run in registration order, so list-valued properties keep
    /// their declared order.
    pub fn reference(
        mut self,
        reference: ShapeReference,
        apply: impl FnOnce(&mut ShapeBuilder, ShapeId) + 'static,
    ) -> Self {
        self.resolvers.push((reference, Box::new(apply)));
        self
    }

    pub fn member(mut self, member: PendingShape) -> Self {
        self.members.push(member);
        self
    }

    fn ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.id()
            .into_iter()
            .chain(self.members.iter().filter_map(PendingShape::id))
    }

    fn resolve(&mut self, resolve: &impl Fn(&ShapeReference) -> ShapeId) {
        for (reference, apply) in self.resolvers.drain(..) {
            apply(&mut self.builder, resolve(&reference));
        }
        for member in &mut self.members {
            member.resolve(resolve);
        }
    }

    fn build(self) -> Result<Shape, crate::domain::ShapeError> {
        let mut builder = self.builder;
        for member in self.members {
            builder.push_member(member.build()?);
        }
        builder.build()
    }
}

struct PendingTrait {
    target: ShapeId,
    name: ShapeReference,
    value: Node,
    source: SourceLocation,
}

/// Accumulates model declarations from any number of sources
///
/// Not thread-safe: one visitor builds one model.
pub struct LoaderVisitor {
    factory: TraitFactory,
    allow_unknown_traits: bool,
    include_prelude: bool,
    version: Option<String>,
    file: String,
    namespace: Option<String>,
    aliases: BTreeMap<String, ShapeId>,
    shapes: BTreeMap<ShapeId, Vec<PendingShape>>,
    traits: Vec<PendingTrait>,
    metadata: BTreeMap<String, (Node, SourceLocation)>,
    events: Vec<ValidationEvent>,
}

impl Default for LoaderVisitor {
    fn default() -> Self {
        Self::new()
    }
}

fn model_error(message: String) -> ValidationEvent {
    ValidationEvent::new(MODEL_ERROR, Severity::Error, message)
}

impl LoaderVisitor {
    pub fn new() -> Self {
        Self {
            factory: TraitFactory::builtin(),
            allow_unknown_traits: false,
            include_prelude: true,
            version: None,
            file: String::new(),
            namespace: None,
            aliases: BTreeMap::new(),
            shapes: BTreeMap::new(),
            traits: Vec::new(),
            metadata: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn with_trait_factory(mut self, factory: TraitFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Reports unknown traits as WARNING instead of ERROR
    pub fn allow_unknown_traits(mut self, allow: bool) -> Self {
        self.allow_unknown_traits = allow;
        self
    }

    pub fn include_prelude(mut self, include: bool) -> Self {
        self.include_prelude = include;
        self
    }

    /// Starts a new source; the namespace and `use` aliases are per file
    pub fn open_file(&mut self, filename: impl Into<String>) {
        self.file = filename.into();
        self.namespace = None;
        self.aliases.clear();
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Declares the model version of the current file
    ///
    /// Every file loaded into one model must declare compatible versions.
    pub fn on_version(&mut self, version: &str) -> Result<(), LoadError> {
        let found = version_parts(version)?;
        if let Some(previous) = &self.version {
            if previous == version {
                return Ok(());
            }
            let known = version_parts(previous)?;
            if found[0] != known[0] || (found[0] == 0 && found[1] != known[1]) {
                return Err(LoadError::ConflictingVersion {
                    found: version.to_string(),
                    previous: previous.clone(),
                });
            }
        }
        if !super::is_version_supported(version, MODEL_VERSION)? {
            return Err(LoadError::IncompatibleVersion {
                found: version.to_string(),
                supported: MODEL_VERSION,
            });
        }
        self.version = Some(version.to_string());
        Ok(())
    }

    pub fn on_namespace(&mut self, namespace: &str) -> Result<(), LoadError> {
        if !is_valid_namespace(namespace) {
            return Err(LoadError::InvalidNamespace(namespace.to_string()));
        }
        self.namespace = Some(namespace.to_string());
        Ok(())
    }

    pub fn namespace(&self) -> Result<&str, LoadError> {
        self.namespace.as_deref().ok_or(LoadError::MissingNamespace)
    }

    /// Imports an absolute shape ID under its bare name for the current file
    pub fn on_use(&mut self, id: ShapeId) -> Result<(), LoadError> {
        let name = id.name().to_string();
        if let Some(existing) = self.aliases.get(&name) {
            if existing != &id {
                return Err(LoadError::AliasConflict {
                    name,
                    existing: existing.to_string(),
                });
            }
        }
        self.aliases.insert(name, id);
        Ok(())
    }

    fn shape_id_error(&self, source: crate::domain::ShapeIdError) -> LoadError {
        LoadError::InvalidShapeId {
            file: self.file.clone(),
            source,
        }
    }

    /// Resolves the name of a shape being defined in the current namespace
    pub fn define(&self, name: &str) -> Result<ShapeId, LoadError> {
        if name.contains('#') {
            return ShapeId::parse(name).map_err(|e| self.shape_id_error(e));
        }
        let namespace = self.namespace()?;
        if let Some(existing) = self.aliases.get(name) {
            return Err(LoadError::AliasConflict {
                name: name.to_string(),
                existing: existing.to_string(),
            });
        }
        ShapeId::from_relative(namespace, name).map_err(|e| self.shape_id_error(e))
    }

    /// Turns reference text into a [`ShapeReference`]
    ///
    /// Absolute IDs and `use` aliases resolve now. Relative names are
    /// deferred until every shape has been declared.
    pub fn reference(&self, text: &str) -> Result<ShapeReference, LoadError> {
        if text.contains('#') {
            return ShapeId::parse(text)
                .map(ShapeReference::Resolved)
                .map_err(|e| self.shape_id_error(e));
        }
        let (base, member) = match text.split_once('$') {
            Some((base, member)) => (base, Some(member)),
            None => (text, None),
        };
        if let Some(alias) = self.aliases.get(base) {
            let id = match member {
                Some(member) => alias.with_member(member),
                None => Ok(alias.clone()),
            };
            return id
                .map(ShapeReference::Resolved)
                .map_err(|e| self.shape_id_error(e));
        }
        let expected =
            ShapeId::from_relative(self.namespace()?, text).map_err(|e| self.shape_id_error(e))?;
        Ok(ShapeReference::Deferred { expected })
    }

    pub fn on_error(&mut self, event: ValidationEvent) {
        self.events.push(event);
    }

    pub fn on_shape(&mut self, shape: PendingShape) {
        let Some(id) = shape.id().cloned() else {
            self.on_error(
                model_error(format!("A {} shape was defined without an ID", shape.builder.shape_type()))
                    .with_source(shape.source().clone()),
            );
            return;
        };
        if self.include_prelude && prelude::is_prelude_shape(&id) {
            tracing::debug!(shape = %id, "ignoring prelude shape definition");
            return;
        }
        let entries = self.shapes.entry(id.clone()).or_default();
        if let Some(first) = entries.first() {
            if !first.source().is_none() && first.source() == shape.source() {
                tracing::warn!(
                    shape = %id,
                    source = %shape.source(),
                    "ignoring duplicate shape definition from the same location"
                );
                return;
            }
        }
        entries.push(shape);
    }

    pub fn on_built_shape(&mut self, shape: &Shape) {
        if shape.is_member() {
            return;
        }
        self.on_shape(PendingShape::from_shape(shape));
    }

    /// Applies a trait value to a shape; the trait name resolves at the end
    pub fn on_trait(&mut self, target: ShapeId, name: ShapeReference, value: Node, source: SourceLocation) {
        self.traits.push(PendingTrait {
            target,
            name,
            value,
            source,
        });
    }

    /// Adds a metadata entry; array values under the same key concatenate
    pub fn on_metadata(&mut self, key: &str, value: Node, source: SourceLocation) {
        let (previous, previous_source) = match self.metadata.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert((value, source));
                return;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };
        if !source.is_none() && *previous_source == source {
            return;
        }
        match merge_trait_values(previous, &value) {
            TraitMerge::Merged(merged) => *previous = merged,
            TraitMerge::Duplicate => tracing::debug!(key, "ignoring duplicate metadata definition"),
            TraitMerge::Conflict => {
                let message = format!(
                    "Metadata conflict for key `{}`. Defined in both `{}` and `{}`",
                    key, previous_source, source
                );
                self.events.push(model_error(message).with_source(source));
            }
        }
    }

    /// Finishes loading: resolves references and traits, then builds shapes
    pub fn on_end(mut self) -> ValidatedResult<Model> {
        let use_prelude = self.include_prelude;
        let declared: BTreeSet<ShapeId> = self
            .shapes
            .values()
            .flatten()
            .flat_map(|pending| pending.ids().cloned().collect::<Vec<_>>())
            .collect();

        let resolve = |reference: &ShapeReference| -> ShapeId {
            match reference {
                ShapeReference::Resolved(id) => id.clone(),
                ShapeReference::Deferred { expected } => {
                    if declared.contains(expected) {
                        return expected.clone();
                    }
                    if use_prelude {
                        let fallback =
                            ShapeId::from_relative(PRELUDE_NAMESPACE, &expected.relative_reference());
                        if let Ok(fallback) = fallback {
                            if is_public_prelude_shape(&fallback) {
                                return fallback;
                            }
                        }
                    }
                    expected.clone()
                }
            }
        };
        for pending in self.shapes.values_mut().flatten() {
            pending.resolve(&resolve);
        }

        self.finalize_traits(&declared);
        let shapes = self.build_shapes();

        let mut builder = Model::builder();
        if use_prelude {
            builder = builder.add_model(prelude::prelude());
        }
        builder = builder.add_shapes(shapes);
        for (key, (value, _)) in self.metadata {
            builder = builder.put_metadata(key, value);
        }
        ValidatedResult::new(builder.build(), self.events)
    }

    /// IDs of every trait definition visible to this load
    fn trait_definitions(&self) -> BTreeSet<ShapeId> {
        let trait_id = TraitDefinition::id();
        let mut definitions: BTreeSet<ShapeId> = self
            .shapes
            .iter()
            .filter(|(_, entries)| {
                entries
                    .first()
                    .is_some_and(|p| p.builder.get_traits().contains_key(&trait_id))
            })
            .map(|(id, _)| id.clone())
            .collect();
        for pending in &self.traits {
            let is_definition = match &pending.name {
                ShapeReference::Resolved(id) => id == &trait_id,
                ShapeReference::Deferred { expected } => {
                    expected.name() == trait_id.name() && !self.shapes.contains_key(expected)
                }
            };
            if is_definition {
                definitions.insert(pending.target.clone());
            }
        }
        if self.include_prelude {
            definitions.extend(prelude::prelude().trait_definitions().keys().cloned());
        }
        definitions
    }

    fn definition_type(&self, id: &ShapeId) -> Option<ShapeType> {
        match self.shapes.get(id).and_then(|entries| entries.first()) {
            Some(pending) => Some(pending.builder.shape_type()),
            None if self.include_prelude => prelude::prelude().get_shape(id).map(Shape::shape_type),
            None => None,
        }
    }

    fn resolve_trait_name(&self, name: &ShapeReference, definitions: &BTreeSet<ShapeId>) -> Option<ShapeId> {
        match name {
            ShapeReference::Resolved(id) => {
                (definitions.contains(id) || id == &TraitDefinition::id()).then(|| id.clone())
            }
            ShapeReference::Deferred { expected } => {
                if definitions.contains(expected) {
                    return Some(expected.clone());
                }
                let prelude_id =
                    ShapeId::from_relative(PRELUDE_NAMESPACE, &expected.relative_reference()).ok()?;
                definitions.contains(&prelude_id).then_some(prelude_id)
            }
        }
    }

    fn finalize_traits(&mut self, declared: &BTreeSet<ShapeId>) {
        let definitions = self.trait_definitions();
        let pending = std::mem::take(&mut self.traits);

        // Per target, the merged value and the location of the first value
        let mut computed: BTreeMap<ShapeId, BTreeMap<ShapeId, (Node, SourceLocation)>> = BTreeMap::new();
        for item in pending {
            if !declared.contains(&item.target) {
                self.events.push(
                    model_error(format!(
                        "Trait `{}` applied to unknown shape `{}`",
                        item.name.expected(),
                        item.target
                    ))
                    .with_source(item.source),
                );
                continue;
            }
            let Some(trait_id) = self.resolve_trait_name(&item.name, &definitions) else {
                let severity = if self.allow_unknown_traits {
                    Severity::Warning
                } else {
                    Severity::Error
                };
                self.events.push(
                    ValidationEvent::new(
                        MODEL_ERROR,
                        severity,
                        format!(
                            "Unable to resolve trait `{}` ({} value defined in the `{}` namespace). If \
                             this is a custom trait, then it must be defined before it can be used in a model.",
                            item.name.expected().relative_reference(),
                            crate::domain::NodeType::of(&item.value),
                            item.name.expected().namespace()
                        ),
                    )
                    .with_shape_id(item.target)
                    .with_source(item.source),
                );
                continue;
            };

            let value = coerce_trait_value(item.value, self.definition_type(&trait_id));
            let traits = computed.entry(item.target.clone()).or_default();
            let (previous, previous_source) = match traits.entry(trait_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert((value, item.source));
                    continue;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };
            if !item.source.is_none() && *previous_source == item.source {
                continue;
            }
            match merge_trait_values(previous, &value) {
                TraitMerge::Merged(merged) => *previous = merged,
                TraitMerge::Duplicate => {
                    tracing::debug!(shape = %item.target, %trait_id, "ignoring duplicate trait value")
                }
                TraitMerge::Conflict => {
                    let message = format!(
                        "Conflicting `{}` trait found on shape `{}`. The previous trait was defined at \
                         `{}`, and a conflicting trait was defined at `{}`.",
                        trait_id, item.target, previous_source, item.source
                    );
                    self.events.push(
                        model_error(message)
                            .with_shape_id(item.target)
                            .with_source(item.source),
                    );
                }
            }
        }

        for (target, traits) in computed {
            for (trait_id, (value, source)) in traits {
                match self.factory.create_trait(trait_id.clone(), value, source.clone()) {
                    Ok(created) => self.apply_trait(&target, created),
                    Err(e) => self.events.push(
                        model_error(format!("Error creating trait `{}`: {}", trait_id.name(), e))
                            .with_shape_id(target.clone())
                            .with_source(source),
                    ),
                }
            }
        }
    }

    /// Applies a finished trait to every pending definition of `target`,
    /// merging with a value the builder already carries
    fn apply_trait(&mut self, target: &ShapeId, applied: crate::domain::Trait) {
        let container = target.without_member();
        let Some(entries) = self.shapes.get_mut(&container) else {
            return;
        };
        let mut conflict = None;
        for (index, entry) in entries.iter_mut().enumerate() {
            let builder = if target.is_member() {
                match entry.members.iter_mut().find(|m| m.id() == Some(target)) {
                    Some(member) => &mut member.builder,
                    None => continue,
                }
            } else {
                &mut entry.builder
            };
            let merged = match builder.get_traits().get(applied.id()) {
                None => applied.clone(),
                Some(existing) => match merge_trait_values(existing.value(), applied.value()) {
                    TraitMerge::Merged(value) => {
                        crate::domain::Trait::new(applied.id().clone(), value)
                            .with_source(existing.source().clone())
                    }
                    TraitMerge::Duplicate => continue,
                    TraitMerge::Conflict => {
                        if index == 0 {
                            conflict = Some(existing.source().clone());
                        }
                        continue;
                    }
                },
            };
            builder.set_trait(merged);
        }
        if let Some(previous) = conflict {
            self.events.push(
                model_error(format!(
                    "Conflicting `{}` trait found on shape `{}`. The previous trait was defined at \
                     `{}`, and a conflicting trait was defined at `{}`.",
                    applied.id(),
                    target,
                    previous,
                    applied.source()
                ))
                .with_shape_id(target.clone())
                .with_source(applied.source().clone()),
            );
        }
    }

    fn build_shapes(&mut self) -> Vec<Shape> {
        let mut built = Vec::new();
        for (id, entries) in std::mem::take(&mut self.shapes) {
            let mut kept: Option<Shape> = None;
            for pending in entries {
                let source = pending.source().clone();
                let shape = match pending.build() {
                    Ok(shape) => shape,
                    Err(e) => {
                        self.events.push(
                            model_error(e.to_string())
                                .with_shape_id(id.clone())
                                .with_source(source),
                        );
                        continue;
                    }
                };
                match &kept {
                    None => kept = Some(shape),
                    Some(first) if first == &shape => {
                        tracing::debug!(shape = %id, "ignoring equivalent duplicate shape definition")
                    }
                    Some(first) => self.events.push(
                        model_error(format!(
                            "Duplicate shape definition for `{}` found at `{}` and `{}`",
                            id,
                            first.source(),
                            source
                        ))
                        .with_shape_id(id.clone())
                        .with_source(source),
                    ),
                }
            }
            built.extend(kept);
        }
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prelude_trait;
    use serde_json::json;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    fn visitor() -> LoaderVisitor {
        let mut visitor = LoaderVisitor::new();
        visitor.open_file("a.json");
        visitor.on_version("1.0").unwrap();
        visitor.on_namespace("ns").unwrap();
        visitor
    }

    fn structure(visitor: &LoaderVisitor, name: &str, member_target: &str) -> PendingShape {
        let container = visitor.define(name).unwrap();
        let member = PendingShape::new(
            ShapeBuilder::new(ShapeType::Member).id(container.with_member("m").unwrap()),
        )
        .reference(visitor.reference(member_target).unwrap(), |b, t| b.set_target(t));
        PendingShape::new(Shape::builder(ShapeType::Structure).id(container)).member(member)
    }

    #[test]
    fn forward_references_prefer_the_namespace_then_the_prelude() {
        let mut visitor = visitor();
        let a = structure(&visitor, "A", "String");
        let b = structure(&visitor, "B", "Later");
        let c = structure(&visitor, "C", "Missing");
        visitor.on_shape(a);
        visitor.on_shape(b);
        visitor.on_shape(c);
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::Integer).id(id("ns#Later"))));

        let result = visitor.on_end();
        assert!(result.events().is_empty(), "{:#?}", result.events());
        let model = result.result();
        let target = |s: &str| model.get_shape(&id(s)).unwrap().target().cloned();
        assert_eq!(target("ns#A$m"), Some(id("smithy.api#String")));
        assert_eq!(target("ns#B$m"), Some(id("ns#Later")));
        assert_eq!(target("ns#C$m"), Some(id("ns#Missing")));
    }

    #[test]
    fn namespace_shapes_shadow_the_prelude() {
        let mut visitor = visitor();
        let a = structure(&visitor, "A", "String");
        visitor.on_shape(a);
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::String).id(id("ns#String"))));
        let model = visitor.on_end().into_result().unwrap();
        assert_eq!(
            model.get_shape(&id("ns#A$m")).unwrap().target(),
            Some(&id("ns#String"))
        );
    }

    #[test]
    fn aliases_are_per_file() {
        let mut visitor = visitor();
        visitor.on_use(id("other#Thing")).unwrap();
        assert_eq!(
            visitor.reference("Thing").unwrap(),
            ShapeReference::Resolved(id("other#Thing"))
        );
        assert!(matches!(
            visitor.on_use(id("third#Thing")),
            Err(LoadError::AliasConflict { .. })
        ));
        assert!(matches!(visitor.define("Thing"), Err(LoadError::AliasConflict { .. })));

        visitor.open_file("b.json");
        assert!(matches!(visitor.reference("Thing"), Err(LoadError::MissingNamespace)));
        visitor.on_namespace("ns").unwrap();
        assert_eq!(
            visitor.reference("Thing").unwrap(),
            ShapeReference::Deferred {
                expected: id("ns#Thing")
            }
        );
    }

    #[test]
    fn versions_must_be_compatible() {
        let mut visitor = LoaderVisitor::new();
        assert!(matches!(
            visitor.on_version("2.0"),
            Err(LoadError::IncompatibleVersion { .. })
        ));
        visitor.on_version("1.0").unwrap();
        assert!(matches!(
            visitor.on_version("2.0"),
            Err(LoadError::ConflictingVersion { .. })
        ));
        assert_eq!(visitor.version(), Some("1.0"));
    }

    #[test]
    fn conflicting_trait_values_keep_the_first() {
        let mut visitor = visitor();
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::String).id(id("ns#X"))));
        let name = visitor.reference("documentation").unwrap();
        visitor.on_trait(id("ns#X"), name.clone(), json!("foo"), SourceLocation::new("a.json", 1, 1));
        visitor.on_trait(id("ns#X"), name, json!("baz"), SourceLocation::new("b.json", 2, 2));

        let result = visitor.on_end();
        assert_eq!(result.events().len(), 1);
        let message = result.events()[0].message();
        assert!(message.contains("a.json:1:1") && message.contains("b.json:2:2"));
        let shape = result.result().get_shape(&id("ns#X")).unwrap();
        assert_eq!(
            shape.get_trait(&prelude_trait("documentation")).unwrap().value(),
            &json!("foo")
        );
    }

    #[test]
    fn array_traits_concatenate_and_equal_values_merge() {
        let mut visitor = visitor();
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::String).id(id("ns#X"))));
        for (i, value) in [json!(["a"]), json!(["b"])].into_iter().enumerate() {
            let name = visitor.reference("tags").unwrap();
            visitor.on_trait(id("ns#X"), name, value, SourceLocation::new("a.json", i as u32 + 1, 1));
        }
        for line in [10, 11] {
            let name = visitor.reference("sensitive").unwrap();
            visitor.on_trait(id("ns#X"), name, Node::Null, SourceLocation::new("a.json", line, 1));
        }

        let model = visitor.on_end().into_result().unwrap();
        let shape = model.get_shape(&id("ns#X")).unwrap();
        assert_eq!(shape.get_trait(&prelude_trait("tags")).unwrap().value(), &json!(["a", "b"]));
        assert_eq!(shape.get_trait(&prelude_trait("sensitive")).unwrap().value(), &json!(true));
    }

    #[test]
    fn unknown_traits_and_targets() {
        let mut visitor = visitor().allow_unknown_traits(true);
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::String).id(id("ns#X"))));
        let custom = visitor.reference("custom").unwrap();
        visitor.on_trait(id("ns#X"), custom, json!(true), SourceLocation::none());
        let docs = visitor.reference("documentation").unwrap();
        visitor.on_trait(id("ns#Nope"), docs, json!("x"), SourceLocation::none());

        let result = visitor.on_end();
        let severities: Vec<Severity> = result.events().iter().map(|e| e.severity()).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
        assert!(result.events()[0].message().contains("Unable to resolve trait `custom`"));
        assert!(result.events()[1].message().contains("unknown shape `ns#Nope`"));
    }

    #[test]
    fn custom_trait_definitions_resolve_by_relative_name() {
        let mut visitor = visitor();
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::Boolean).id(id("ns#marker"))));
        let definition = visitor.reference("trait").unwrap();
        visitor.on_trait(id("ns#marker"), definition, Node::Null, SourceLocation::none());
        visitor.on_shape(PendingShape::new(Shape::builder(ShapeType::String).id(id("ns#X"))));
        let marker = visitor.reference("marker").unwrap();
        visitor.on_trait(id("ns#X"), marker, Node::Null, SourceLocation::none());

        let model = visitor.on_end().into_result().unwrap();
        let shape = model.get_shape(&id("ns#X")).unwrap();
        assert_eq!(shape.get_trait(&id("ns#marker")).unwrap().value(), &json!(true));
        assert!(model.trait_definition(&id("ns#marker")).is_some());
    }

    #[test]
    fn duplicate_shapes() {
        let mut visitor = visitor();
        let same = || {
            PendingShape::new(
                Shape::builder(ShapeType::String)
                    .id(id("ns#S"))
                    .source(SourceLocation::new("a.json", 3, 1)),
            )
        };
        visitor.on_shape(same());
        visitor.on_shape(same());
        visitor.on_shape(PendingShape::new(
            Shape::builder(ShapeType::String)
                .id(id("ns#S"))
                .source(SourceLocation::new("b.json", 1, 1)),
        ));
        visitor.on_shape(PendingShape::new(
            Shape::builder(ShapeType::Integer)
                .id(id("ns#S"))
                .source(SourceLocation::new("c.json", 1, 1)),
        ));

        let result = visitor.on_end();
        assert_eq!(result.events().len(), 1, "{:#?}", result.events());
        assert!(result.events()[0].message().contains("a.json:3:1` and `c.json:1:1"));
        assert_eq!(
            result.result().get_shape(&id("ns#S")).unwrap().shape_type(),
            ShapeType::String
        );
    }

    #[test]
    fn conflicting_metadata() {
        let mut visitor = visitor();
        visitor.on_metadata("list", json!([1]), SourceLocation::new("a.json", 1, 1));
        visitor.on_metadata("list", json!([2]), SourceLocation::new("b.json", 1, 1));
        visitor.on_metadata("key", json!("a"), SourceLocation::new("a.json", 2, 1));
        visitor.on_metadata("key", json!("b"), SourceLocation::new("b.json", 2, 1));

        let result = visitor.on_end();
        assert_eq!(result.events().len(), 1);
        assert_eq!(result.result().metadata_property("list"), Some(&json!([1, 2])));
        assert_eq!(result.result().metadata_property("key"), Some(&json!("a")));
    }
}

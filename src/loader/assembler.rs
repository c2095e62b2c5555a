use super::visitor::{LoaderVisitor, PendingShape};
use super::{ast, LoadError, ValidatedResult};
use crate::domain::{Model, Node, Shape, SourceLocation, TraitFactory};
use crate::validation::ModelValidator;
use std::fs;
use std::path::{Path, PathBuf};

enum Source {
    Import(PathBuf),
    Unparsed { name: String, contents: String },
}

/// Collects model sources and assembles them into a validated [`Model`]
///
/// ```no_run
/// use shape_model::loader::ModelAssembler;
///
/// let result = ModelAssembler::new()
///     .add_import("model/")
///     .assemble()?;
/// for event in result.events() {
///     println!("{}", event);
/// }
/// # Ok::<(), shape_model::loader::LoadError>(())
/// ```
pub struct ModelAssembler {
    sources: Vec<Source>,
    shapes: Vec<Shape>,
    models: Vec<Model>,
    metadata: Vec<(String, Node)>,
    factory: TraitFactory,
    validator: ModelValidator,
    allow_unknown_traits: bool,
    validate: bool,
    prelude: bool,
}

impl Default for ModelAssembler {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            shapes: Vec::new(),
            models: Vec::new(),
            metadata: Vec::new(),
            factory: TraitFactory::builtin(),
            validator: ModelValidator::new(),
            allow_unknown_traits: false,
            validate: true,
            prelude: true,
        }
    }
}

impl ModelAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already built shape
    pub fn add_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Merges every shape and metadata entry of another model
    pub fn add_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Adds a JSON model file, or every `.json` file below a directory
    pub fn add_import(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(Source::Import(path.into()));
        self
    }

    /// Adds JSON model text; `name` is used in source locations
    pub fn add_unparsed_model(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.sources.push(Source::Unparsed {
            name: name.into(),
            contents: contents.into(),
        });
        self
    }

    pub fn put_metadata(mut self, key: impl Into<String>, value: Node) -> Self {
        self.metadata.push((key.into(), value));
        self
    }

    /// Reports unknown traits as warnings instead of errors
    pub fn allow_unknown_traits(mut self, allow: bool) -> Self {
        self.allow_unknown_traits = allow;
        self
    }

    /// Skips validators; only loading events are reported
    pub fn disable_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Leaves the prelude out of the assembled model
    pub fn disable_prelude(mut self) -> Self {
        self.prelude = false;
        self
    }

    pub fn trait_factory(mut self, factory: TraitFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces the validator run after loading
    pub fn validator(mut self, validator: ModelValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Loads every source, resolves references and validates the result
    ///
    /// Only unreadable files, malformed documents and version problems are
    /// errors. Everything else is reported as an event.
    pub fn assemble(&self) -> Result<ValidatedResult<Model>, LoadError> {
        let mut visitor = LoaderVisitor::new()
            .with_trait_factory(self.factory.clone())
            .allow_unknown_traits(self.allow_unknown_traits)
            .include_prelude(self.prelude);

        for model in &self.models {
            for shape in model.shapes() {
                visitor.on_built_shape(shape);
            }
            for (key, value) in model.metadata() {
                visitor.on_metadata(key, value.clone(), SourceLocation::none());
            }
        }
        for shape in &self.shapes {
            visitor.on_shape(PendingShape::from_shape(shape));
        }
        for (key, value) in &self.metadata {
            visitor.on_metadata(key, value.clone(), SourceLocation::none());
        }

        for source in &self.sources {
            match source {
                Source::Import(path) => {
                    for file in model_files(path)? {
                        let contents = fs::read_to_string(&file).map_err(|source| LoadError::Io {
                            path: file.clone(),
                            source,
                        })?;
                        tracing::debug!(file = %file.display(), "loading model file");
                        ast::load(&mut visitor, &file.to_string_lossy(), &contents)?;
                    }
                }
                Source::Unparsed { name, contents } => ast::load(&mut visitor, name, contents)?,
            }
        }

        let (model, mut events) = visitor.on_end().into_parts();
        if self.validate {
            events.extend(self.validator.validate(&model));
        }
        events.sort_by(|a, b| {
            a.shape_id()
                .cmp(&b.shape_id())
                .then_with(|| a.event_id().cmp(b.event_id()))
        });
        tracing::debug!(shapes = model.len(), events = events.len(), "model assembled");
        Ok(ValidatedResult::new(model, events))
    }
}

/// A file, or every `.json` file below a directory in path order
fn model_files(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(io_error)?;
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_error)? {
        let entry_path = entry.map_err(io_error)?.path();
        if entry_path.is_dir() {
            files.extend(model_files(&entry_path)?);
        } else if entry_path.extension().is_some_and(|ext| ext == "json") {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

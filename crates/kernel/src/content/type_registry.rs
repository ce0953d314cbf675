//! Content type registry.
//!
//! Holds content type and component definitions, loaded from YAML files in
//! the schema directory at startup or registered in code, and cached in
//! memory for fast access from request handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::populate::PUBLISHED_AT;
use vellum_sdk::types::{ComponentDefinition, ContentTypeDefinition, FieldDefinition, FieldType};

/// Errors raised while loading schema definition files.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("plural name '{plural}' is used by both '{first}' and '{second}'")]
    DuplicatePlural {
        plural: String,
        first: String,
        second: String,
    },
}

/// Names every rendered entry already carries.
const RESERVED_ATTRIBUTES: [&str; 2] = ["id", PUBLISHED_AT];

/// On-disk layout of one schema file.
#[derive(Debug, Default, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    content_types: Vec<ContentTypeDefinition>,
    #[serde(default)]
    components: Vec<ComponentDefinition>,
}

/// Whose attributes a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOwner<'a> {
    ContentType(&'a str),
    Component(&'a str),
}

/// Registry of content types and components.
#[derive(Clone, Default)]
pub struct ContentTypeRegistry {
    inner: Arc<ContentTypeRegistryInner>,
}

#[derive(Default)]
struct ContentTypeRegistryInner {
    types: DashMap<String, ContentTypeDefinition>,
    /// plural name -> machine name
    plurals: DashMap<String, String>,
    components: DashMap<String, ComponentDefinition>,
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a content type.
    pub fn register_type(&self, def: ContentTypeDefinition) -> Result<(), SchemaError> {
        if let Some(existing) = self.inner.plurals.get(&def.plural_name)
            && *existing != def.machine_name
        {
            return Err(SchemaError::DuplicatePlural {
                plural: def.plural_name.clone(),
                first: existing.clone(),
                second: def.machine_name.clone(),
            });
        }

        // Drop a stale plural if the type was re-registered under a new one
        if let Some(previous) = self.inner.types.get(&def.machine_name)
            && previous.plural_name != def.plural_name
        {
            self.inner.plurals.remove(&previous.plural_name);
        }

        self.inner
            .plurals
            .insert(def.plural_name.clone(), def.machine_name.clone());
        debug!(type_name = %def.machine_name, plural = %def.plural_name, "registered content type");
        self.inner.types.insert(def.machine_name.clone(), def);
        Ok(())
    }

    /// Register (or replace) a component.
    pub fn register_component(&self, def: ComponentDefinition) {
        debug!(uid = %def.uid, "registered component");
        self.inner.components.insert(def.uid.clone(), def);
    }

    /// Load every `*.yaml` / `*.yml` file in `dir`.
    ///
    /// Files are read in name order. Returns the number of content types
    /// and components registered.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, SchemaError> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == "yaml" || e == "yml")
            })
            .collect();
        paths.sort();

        let mut count = 0;
        for path in paths {
            count += self.load_file(&path)?;
        }

        info!(dir = %dir.display(), count, "loaded schema definitions");
        Ok(count)
    }

    /// Load a single schema file.
    pub fn load_file(&self, path: &Path) -> Result<usize, SchemaError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SchemaFile = serde_yml::from_str(&raw).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let count = file.content_types.len() + file.components.len();
        for component in file.components {
            self.register_component(component);
        }
        for def in file.content_types {
            self.register_type(def)?;
        }
        Ok(count)
    }

    /// Get a content type by machine name.
    pub fn get(&self, type_name: &str) -> Option<ContentTypeDefinition> {
        self.inner.types.get(type_name).map(|r| r.clone())
    }

    /// Get a content type by its plural (route) name.
    pub fn get_by_plural(&self, plural: &str) -> Option<ContentTypeDefinition> {
        let machine_name = self.inner.plurals.get(plural)?.clone();
        self.get(&machine_name)
    }

    /// All attributes of a content type or component.
    pub fn fields_of(&self, owner: SchemaOwner<'_>) -> Option<Vec<FieldDefinition>> {
        match owner {
            SchemaOwner::ContentType(name) => self.inner.types.get(name).map(|d| d.fields.clone()),
            SchemaOwner::Component(uid) => {
                self.inner.components.get(uid).map(|d| d.fields.clone())
            }
        }
    }

    /// Definition of one attribute.
    pub fn attribute_definition(
        &self,
        owner: SchemaOwner<'_>,
        attribute: &str,
    ) -> Option<FieldDefinition> {
        match owner {
            SchemaOwner::ContentType(name) => self
                .inner
                .types
                .get(name)
                .and_then(|d| d.get_field(attribute).cloned()),
            SchemaOwner::Component(uid) => self
                .inner
                .components
                .get(uid)
                .and_then(|d| d.get_field(attribute).cloned()),
        }
    }

    /// Walk a dotted attribute path starting at `content_type`.
    ///
    /// Relations step into their target type, components into their
    /// component schema. Returns the definition of the last segment.
    pub fn resolve_path(&self, content_type: &str, path: &str) -> Result<FieldDefinition, AppError> {
        let unknown = || AppError::UnknownAttributePath(path.to_string());

        let mut parent: Option<FieldDefinition> = None;
        for segment in path.split('.') {
            // Only relations and components have children
            let owner = match parent.as_ref().map(|f| &f.field_type) {
                None => SchemaOwner::ContentType(content_type),
                Some(FieldType::Relation { target, .. }) => SchemaOwner::ContentType(target),
                Some(FieldType::Component { component, .. }) => SchemaOwner::Component(component),
                Some(_) => return Err(unknown()),
            };
            let field = self.attribute_definition(owner, segment).ok_or_else(unknown)?;
            parent = Some(field);
        }

        parent.ok_or_else(unknown)
    }

    /// Consistency check: every relation target and component must be
    /// registered, and no content type may declare `id` or `publishedAt`.
    /// Returns one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut check = |owner: &str, field: &FieldDefinition| match &field.field_type {
            FieldType::Relation { target, .. } if !self.inner.types.contains_key(target) => {
                problems.push(format!(
                    "{owner}.{}: relation targets unknown content type '{target}'",
                    field.field_name
                ));
            }
            FieldType::Component { component, .. }
                if !self.inner.components.contains_key(component) =>
            {
                problems.push(format!(
                    "{owner}.{}: unknown component '{component}'",
                    field.field_name
                ));
            }
            _ => {}
        };

        for def in self.inner.types.iter() {
            for field in &def.fields {
                check(&def.machine_name, field);
            }
        }
        for def in self.inner.components.iter() {
            for field in &def.fields {
                check(&def.uid, field);
            }
        }

        // Rendered entries carry these next to their attributes
        for def in self.inner.types.iter() {
            for field in &def.fields {
                if RESERVED_ATTRIBUTES.contains(&field.field_name.as_str()) {
                    problems.push(format!(
                        "{}.{}: attribute name is reserved",
                        def.machine_name, field.field_name
                    ));
                }
            }
        }

        problems.sort();
        for problem in &problems {
            warn!(%problem, "schema problem");
        }
        problems
    }

    /// List content type names.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.types.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered content types.
    pub fn len(&self) -> usize {
        self.inner.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.types.is_empty()
    }
}

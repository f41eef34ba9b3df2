use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::model::Schema;
use crate::error::{Error, Result};

/// Schema lookup consumed by the traversal engine
///
/// Nested schemas (components, relation targets, dynamic zone elements) are
/// always resolved through this trait, one level at a time.
pub trait ModelSource: Send + Sync {
    fn get_model(&self, uid: &str) -> Result<Arc<Schema>>;
}

impl<T: ModelSource + ?Sized> ModelSource for Arc<T> {
    fn get_model(&self, uid: &str) -> Result<Arc<Schema>> {
        (**self).get_model(uid)
    }
}

/// In-memory schema registry, read-only once the application is built
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: HashMap<String, Arc<Schema>>,
}

/// A definition file holds either one schema or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Many(Vec<Schema>),
    One(Box<Schema>),
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schemas(schemas: impl IntoIterator<Item = Schema>) -> Self {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema);
        }
        registry
    }

    /// Register (or replace) a schema under its uid
    pub fn register(&mut self, schema: Schema) -> &mut Self {
        tracing::debug!("Registered schema '{}'", schema.uid);
        self.models.insert(schema.uid.clone(), Arc::new(schema));
        self
    }

    pub fn with(mut self, schema: Schema) -> Self {
        self.register(schema);
        self
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.models.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered uids, sorted
    pub fn uids(&self) -> Vec<&str> {
        let mut uids: Vec<&str> = self.models.keys().map(String::as_str).collect();
        uids.sort_unstable();
        uids
    }

    /// Parse JSON definitions (one schema or an array of schemas)
    pub fn load_json_str(&mut self, source: &str) -> Result<usize> {
        let file: SchemaFile = serde_json::from_str(source)?;
        Ok(self.register_file(file))
    }

    /// Parse YAML definitions (one schema or a sequence of schemas)
    pub fn load_yaml_str(&mut self, source: &str) -> Result<usize> {
        let file: SchemaFile = serde_yaml::from_str(source)?;
        Ok(self.register_file(file))
    }

    /// Load every `.json`, `.yaml` and `.yml` file in a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
            let loaded = match extension {
                "json" => registry.load_json_str(&std::fs::read_to_string(&path)?)?,
                "yaml" | "yml" => registry.load_yaml_str(&std::fs::read_to_string(&path)?)?,
                _ => continue,
            };
            tracing::debug!("Loaded {} schema(s) from {}", loaded, path.display());
        }

        tracing::info!("Schema registry loaded {} model(s) from {}", registry.len(), dir.display());
        Ok(registry)
    }

    fn register_file(&mut self, file: SchemaFile) -> usize {
        match file {
            SchemaFile::Many(schemas) => {
                let count = schemas.len();
                for schema in schemas {
                    self.register(schema);
                }
                count
            }
            SchemaFile::One(schema) => {
                self.register(*schema);
                1
            }
        }
    }
}

impl ModelSource for SchemaRegistry {
    fn get_model(&self, uid: &str) -> Result<Arc<Schema>> {
        self.models
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::model_not_found(uid))
    }
}

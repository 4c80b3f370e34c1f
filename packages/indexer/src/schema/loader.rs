//! Loading and caching of schema mapping configurations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use regex::Regex;

use super::config::{MappingConfig, SchemaFile};
use crate::error::{LidoError, Result};

/// File name suffix of schema files in a config directory.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.yaml";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SCHEMA_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid regex"));

/// Source of schema files.
pub trait ConfigLoader: Send + Sync {
    /// Load the schema file for a schema name.
    ///
    /// # Errors
    /// `UnknownSchema` if no such schema exists.
    fn load(&self, schema: &str) -> Result<SchemaFile>;
}

/// Loads `<schema>.schema.yaml` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ConfigLoader for DirectoryLoader {
    fn load(&self, schema: &str) -> Result<SchemaFile> {
        if !SCHEMA_NAME.is_match(schema) {
            return Err(LidoError::UnknownSchema(schema.to_string()));
        }
        let path = self.dir.join(format!("{}{SCHEMA_FILE_SUFFIX}", schema.to_lowercase()));
        if !path.is_file() {
            return Err(LidoError::UnknownSchema(schema.to_string()));
        }
        tracing::debug!(path = %path.display(), "loading schema");
        SchemaFile::from_yaml(&std::fs::read_to_string(&path)?)
    }
}

/// Schema files held in memory, for library users and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    files: HashMap<String, SchemaFile>,
}

impl InMemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_schema(mut self, name: &str, file: SchemaFile) -> Self {
        self.files.insert(name.to_lowercase(), file);
        self
    }
}

impl ConfigLoader for InMemoryLoader {
    fn load(&self, schema: &str) -> Result<SchemaFile> {
        self.files
            .get(&schema.to_lowercase())
            .cloned()
            .ok_or_else(|| LidoError::UnknownSchema(schema.to_string()))
    }
}

type CacheKey = (String, Option<String>);

/// Resolved configurations keyed by `(schema, source)`, loaded at most once.
pub struct ConfigCache {
    loader: Box<dyn ConfigLoader>,
    files: Mutex<HashMap<String, Arc<SchemaFile>>>,
    resolved: Mutex<HashMap<CacheKey, Arc<MappingConfig>>>,
}

impl ConfigCache {
    pub fn new(loader: impl ConfigLoader + 'static) -> Self {
        Self::from_boxed(Box::new(loader))
    }

    pub fn from_boxed(loader: Box<dyn ConfigLoader>) -> Self {
        Self {
            loader,
            files: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Get the configuration of a schema for a source.
    ///
    /// # Arguments
    /// * `schema` - Schema name, e.g. `finc`
    /// * `source` - Source identifier of the record variant; empty means none
    ///
    /// # Errors
    /// Whatever the loader reports, typically `UnknownSchema` or `Yaml`.
    pub fn get(&self, schema: &str, source: Option<&str>) -> Result<Arc<MappingConfig>> {
        let key: CacheKey = (
            schema.to_lowercase(),
            source
                .map(str::to_lowercase)
                .filter(|s| !s.is_empty()),
        );

        if let Some(config) = self
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(config));
        }

        let file = self.file(&key.0)?;
        let config = Arc::new(file.resolve(schema, key.1.as_deref()));
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&config));
        Ok(config)
    }

    fn file(&self, schema: &str) -> Result<Arc<SchemaFile>> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = files.get(schema) {
            return Ok(Arc::clone(file));
        }
        let file = Arc::new(self.loader.load(schema)?);
        files.insert(schema.to_string(), Arc::clone(&file));
        Ok(file)
    }

    /// Number of resolved configurations held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("resolved", &self.len())
            .finish_non_exhaustive()
    }
}

//! Registry mapping source names to record constructors.

use std::collections::HashMap;
use std::sync::Arc;

use super::{DaphneLidoRecord, LidoRecord, RecordModel, RecordSettings, Source102LidoRecord};
use crate::config::DEFAULT_RECORD_VARIANT;
use crate::error::{LidoError, Result};

/// Builds a record variant from the XML of one transformed unit.
pub type RecordConstructor = fn(String, Arc<RecordSettings>) -> Result<Box<dyn RecordModel>>;

/// Registry of record variants, matched case-insensitively by name.
pub struct RecordResolver {
    constructors: HashMap<String, RecordConstructor>,
    default_name: String,
}

impl RecordResolver {
    /// Create an empty resolver whose default variant is `lido`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            default_name: DEFAULT_RECORD_VARIANT.to_string(),
        }
    }

    /// Register a constructor under a name.
    pub fn register(&mut self, name: impl Into<String>, constructor: RecordConstructor) {
        self.constructors
            .insert(name.into().to_lowercase(), constructor);
    }

    /// Find the constructor for a source name.
    ///
    /// An absent or blank name resolves to the default variant.
    ///
    /// # Errors
    /// `UnknownRecordVariant` if no variant is registered under the name.
    pub fn resolve(&self, name: Option<&str>) -> Result<RecordConstructor> {
        let key = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_lowercase(),
            _ => self.default_name.clone(),
        };
        self.constructors
            .get(&key)
            .copied()
            .ok_or(LidoError::UnknownRecordVariant(key))
    }

    /// Check if a variant is registered under a name.
    #[must_use]
    pub fn has_variant(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_lowercase())
    }

    /// Names of all registered variants, sorted.
    #[must_use]
    pub fn variant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RecordResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a resolver with every built-in variant registered.
pub fn create_default_resolver() -> RecordResolver {
    let mut resolver = RecordResolver::new();
    resolver.register(DEFAULT_RECORD_VARIANT, LidoRecord::boxed);
    resolver.register("daphne", DaphneLidoRecord::boxed);
    resolver.register("source102", Source102LidoRecord::boxed);
    resolver
}

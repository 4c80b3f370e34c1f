//! Mapping configuration files and the resolved per-source configuration.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::document::FieldValue;
use crate::error::Result;

/// A `{from, to}` field pair of a copy or move task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPair {
    pub from: String,
    pub to: String,
}

impl FieldPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Task kinds of one section of a schema file. Absent kinds inherit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSet {
    #[serde(default)]
    pub copy: Option<Vec<FieldPair>>,
    #[serde(default, rename = "move")]
    pub moves: Option<Vec<FieldPair>>,
    #[serde(default, rename = "static")]
    pub statics: Option<BTreeMap<String, FieldValue>>,
    #[serde(default)]
    pub suppress: Option<Vec<String>>,
}

/// Contents of a `<schema>.schema.yaml` file.
///
/// ```yaml
/// copy:
///   - { from: author, to: vf1_author }
/// static:
///   source_id: 0
/// sources:
///   daphne:
///     static:
///       source_id: 102
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub copy: Option<Vec<FieldPair>>,
    #[serde(default, rename = "move")]
    pub moves: Option<Vec<FieldPair>>,
    #[serde(default, rename = "static")]
    pub statics: Option<BTreeMap<String, FieldValue>>,
    #[serde(default)]
    pub suppress: Option<Vec<String>>,
    /// Per-source sections, keyed by lowercase source identifier.
    #[serde(default)]
    pub sources: BTreeMap<String, TaskSet>,
}

impl SchemaFile {
    /// Parse a schema file from YAML.
    ///
    /// # Errors
    /// `Yaml` on malformed YAML or unknown keys.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Resolve the configuration for a source.
    ///
    /// Task kinds present in the source section replace the schema-wide ones.
    /// An unknown or absent source gets the schema-wide tasks.
    #[must_use]
    pub fn resolve(&self, schema: &str, source: Option<&str>) -> MappingConfig {
        let section = source.and_then(|s| {
            let key = s.to_lowercase();
            self.sources
                .iter()
                .find(|(name, _)| name.to_lowercase() == key)
                .map(|(_, tasks)| tasks)
        });
        let pick = |own: Option<&Option<Vec<FieldPair>>>, base: &Option<Vec<FieldPair>>| {
            own.and_then(Option::as_ref)
                .or(base.as_ref())
                .cloned()
                .unwrap_or_default()
        };

        MappingConfig {
            schema: schema.to_string(),
            copy: pick(section.map(|s| &s.copy), &self.copy),
            moves: pick(section.map(|s| &s.moves), &self.moves),
            statics: section
                .and_then(|s| s.statics.as_ref())
                .or(self.statics.as_ref())
                .cloned()
                .unwrap_or_default(),
            suppress: section
                .and_then(|s| s.suppress.as_ref())
                .or(self.suppress.as_ref())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Resolved mapping configuration for one (schema, source) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingConfig {
    pub schema: String,
    pub copy: Vec<FieldPair>,
    pub moves: Vec<FieldPair>,
    pub statics: BTreeMap<String, FieldValue>,
    pub suppress: Vec<String>,
}

/// One step of a mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task<'a> {
    Copy(&'a FieldPair),
    Move(&'a FieldPair),
    Static(&'a str, &'a FieldValue),
    Suppress(&'a str),
}

impl MappingConfig {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_copy(mut self, from: &str, to: &str) -> Self {
        self.copy.push(FieldPair::new(from, to));
        self
    }

    #[must_use]
    pub fn with_move(mut self, from: &str, to: &str) -> Self {
        self.moves.push(FieldPair::new(from, to));
        self
    }

    #[must_use]
    pub fn with_static(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.statics.insert(field.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_suppress(mut self, field: &str) -> Self {
        self.suppress.push(field.to_string());
        self
    }

    /// Value of `static.source_id` as text, if set and non-empty.
    pub fn source_id(&self) -> Option<String> {
        self.statics
            .get("source_id")
            .map(ToString::to_string)
            .filter(|s| !s.is_empty())
    }

    /// All tasks in execution order: copy, move, static, suppress.
    pub fn tasks(&self) -> Vec<Task<'_>> {
        self.copy
            .iter()
            .map(Task::Copy)
            .chain(self.moves.iter().map(Task::Move))
            .chain(self.statics.iter().map(|(k, v)| Task::Static(k.as_str(), v)))
            .chain(self.suppress.iter().map(|f| Task::Suppress(f.as_str())))
            .collect()
    }
}

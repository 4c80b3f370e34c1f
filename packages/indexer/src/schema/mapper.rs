//! Task engine applying a mapping configuration to a base document.

use thiserror::Error;

use super::config::{MappingConfig, Task};
use crate::config::RECORD_ID_PREFIX;
use crate::document::Document;
use crate::encode::base64_url_encode;
use crate::error::{LidoError, Result};

/// A non-fatal note raised while mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingWarning {
    #[error("Record field '{field}' does not exist, {task} task skipped")]
    MissingSource { task: &'static str, field: String },

    #[error("Record field '{field}' already existed and is overwritten by {task} task")]
    Overwritten { task: &'static str, field: String },
}

/// Output of a successful mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped {
    pub document: Document,
    pub warnings: Vec<MappingWarning>,
}

/// Maps base documents into the field layout of an output schema.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    prefix: String,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaMapper {
    /// Create a mapper deriving `finc-…` ids.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(RECORD_ID_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build the index id of a record.
    ///
    /// # Examples
    /// ```
    /// use lido_indexer::schema::SchemaMapper;
    ///
    /// let mapper = SchemaMapper::new();
    /// assert_eq!(mapper.record_id("102", "DE-Mb112/lido/7?"), "finc-102-REUtTWIxMTIvbGlkby83Pw");
    /// ```
    #[must_use]
    pub fn record_id(&self, source_id: &str, native_id: &str) -> String {
        format!("{}-{source_id}-{}", self.prefix, base64_url_encode(native_id, false))
    }

    /// Map a base document.
    ///
    /// The record id is derived before any task runs, from `static.source_id`
    /// and the native `id` of the document.
    ///
    /// # Arguments
    /// * `document` - Base document with the native record id in `id`
    /// * `config` - Resolved configuration for the record's source
    ///
    /// # Errors
    /// `MissingSourceId` or `MissingRecordId` if the id cannot be derived.
    pub fn map(&self, mut document: Document, config: &MappingConfig) -> Result<Mapped> {
        let native_id = document.id().map(str::to_string);
        let source_id = config.source_id().ok_or_else(|| LidoError::MissingSourceId {
            schema: config.schema.clone(),
            record_id: native_id.clone().unwrap_or_default(),
        })?;
        let native_id = native_id.ok_or_else(|| LidoError::MissingRecordId {
            source_id: source_id.clone(),
        })?;
        document.insert("id", self.record_id(&source_id, &native_id));

        let mut warnings = Vec::new();
        for task in config.tasks() {
            run_task(&mut document, task, &mut warnings);
        }

        for warning in &warnings {
            tracing::warn!(record = %native_id, schema = %config.schema, "{warning}");
        }

        Ok(Mapped { document, warnings })
    }
}

fn run_task(document: &mut Document, task: Task<'_>, warnings: &mut Vec<MappingWarning>) {
    match task {
        Task::Copy(pair) | Task::Move(pair) => {
            let name = if matches!(task, Task::Copy(_)) { "copy" } else { "move" };
            let Some(value) = document.get(&pair.from).cloned() else {
                warnings.push(MappingWarning::MissingSource {
                    task: name,
                    field: pair.from.clone(),
                });
                return;
            };
            if matches!(task, Task::Move(_)) {
                document.remove(&pair.from);
            }
            if document.insert(pair.to.as_str(), value).is_some() {
                warnings.push(MappingWarning::Overwritten {
                    task: name,
                    field: pair.to.clone(),
                });
            }
        }
        Task::Static(field, value) => {
            if document.insert(field, value.clone()).is_some() {
                warnings.push(MappingWarning::Overwritten {
                    task: "static",
                    field: field.to_string(),
                });
            }
        }
        Task::Suppress(field) => {
            document.remove(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use pretty_assertions::assert_eq;

    fn base() -> Document {
        let mut doc = Document::new();
        doc.insert("id", "DE-Mb112/lido/7?");
        doc.insert("author", FieldValue::texts(["Smith, A."]));
        doc.insert("title", "Bildnis");
        doc.insert("fullrecord", "<lido/>");
        doc
    }

    fn config() -> MappingConfig {
        MappingConfig::new("finc").with_static("source_id", 102_i64)
    }

    #[test]
    fn test_record_id_is_derived_first() {
        let mapped = SchemaMapper::new().map(base(), &config()).unwrap();
        assert_eq!(mapped.document.id(), Some("finc-102-REUtTWIxMTIvbGlkby83Pw"));
        assert_eq!(mapped.document.get("source_id"), Some(&FieldValue::from(102_i64)));
        // static source_id was not present before, so no warning
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_record_id_is_deterministic() {
        let mapper = SchemaMapper::new();
        let a = mapper.map(base(), &config()).unwrap();
        let b = mapper.map(base(), &config()).unwrap();
        assert_eq!(a.document.id(), b.document.id());
    }

    #[test]
    fn test_missing_source_id_fails() {
        let err = SchemaMapper::new()
            .map(base(), &MappingConfig::new("finc"))
            .unwrap_err();
        assert!(matches!(err, LidoError::MissingSourceId { .. }));
        assert!(err.to_string().contains("DE-Mb112/lido/7?"));
    }

    #[test]
    fn test_missing_native_id_fails() {
        let mut doc = base();
        doc.remove("id");
        let err = SchemaMapper::new().map(doc, &config()).unwrap_err();
        assert!(matches!(err, LidoError::MissingRecordId { ref source_id } if source_id == "102"));
    }

    #[test]
    fn test_copy_conflict_warns_and_overwrites() {
        let config = config().with_copy("author", "title");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert_eq!(
            mapped.document.get("title"),
            Some(&FieldValue::texts(["Smith, A."]))
        );
        assert!(mapped.document.contains_key("author"));
        assert_eq!(
            mapped.warnings,
            vec![MappingWarning::Overwritten {
                task: "copy",
                field: "title".to_string()
            }]
        );
    }

    #[test]
    fn test_two_copies_to_one_target_last_write_wins() {
        let config = config()
            .with_copy("author", "vf1_author")
            .with_copy("title", "vf1_author");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert_eq!(mapped.document.get("vf1_author"), Some(&FieldValue::text("Bildnis")));
        assert_eq!(
            mapped.warnings,
            vec![MappingWarning::Overwritten {
                task: "copy",
                field: "vf1_author".to_string()
            }]
        );
    }

    #[test]
    fn test_copy_onto_itself_warns() {
        let config = config().with_copy("title", "title");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert_eq!(mapped.document.get("title"), Some(&FieldValue::text("Bildnis")));
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_copy_of_absent_field_warns_and_skips() {
        let config = config().with_copy("isbn", "isbn_facet");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert!(!mapped.document.contains_key("isbn_facet"));
        assert_eq!(
            mapped.warnings,
            vec![MappingWarning::MissingSource {
                task: "copy",
                field: "isbn".to_string()
            }]
        );
    }

    #[test]
    fn test_move_removes_source() {
        let config = config().with_move("author", "vf1_author");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert!(!mapped.document.contains_key("author"));
        assert!(mapped.document.contains_key("vf1_author"));
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_static_overwrite_warns() {
        let config = config().with_static("title", "Fixed");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert_eq!(mapped.document.get("title"), Some(&FieldValue::text("Fixed")));
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_suppress_absent_field_is_silent() {
        let config = config().with_suppress("fullrecord").with_suppress("missing");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert!(!mapped.document.contains_key("fullrecord"));
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_suppress_runs_after_copy() {
        let config = config()
            .with_copy("fullrecord", "raw")
            .with_suppress("fullrecord");
        let mapped = SchemaMapper::new().map(base(), &config).unwrap();
        assert!(mapped.document.contains_key("raw"));
        assert!(!mapped.document.contains_key("fullrecord"));
    }
}

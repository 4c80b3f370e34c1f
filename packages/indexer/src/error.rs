//! Error types for the indexer.
//!
//! One enum covers the whole crate. Each variant belongs to either the run
//! (nothing more can be read safely) or a single unit (the record is dropped,
//! the run may continue), see [`LidoError::scope`].

use thiserror::Error;

/// Main error type for the indexer library.
#[derive(Debug, Error)]
pub enum LidoError {
    /// The aggregate stream has no recognizable root element, ends inside a
    /// unit, or contains malformed markup.
    #[error("Structural error in LIDO stream: {0}")]
    Structural(String),

    /// A transform sheet failed on one unit.
    #[error("Cannot process XSLT stylesheet {sheet} on unit {unit}: {message}")]
    Transform {
        sheet: String,
        unit: usize,
        message: String,
    },

    /// No record variant is registered under the given name.
    #[error("No LIDO record variant '{0}'. Check given parameter -f|--filter")]
    UnknownRecordVariant(String),

    /// No mapping configuration exists for the given schema.
    #[error("No LIDO schema '{0}'. Check given parameter -s|--schema")]
    UnknownSchema(String),

    /// Earliest date lies after the latest date.
    #[error("Invalid date range {start} - {end}, record {source_id}.{record_id}")]
    InvalidDateRange {
        start: String,
        end: String,
        source_id: String,
        record_id: String,
    },

    /// The active mapping configuration lacks `static.source_id`.
    #[error("Schema '{schema}' declares no static source_id, cannot build id for record '{record_id}'")]
    MissingSourceId { schema: String, record_id: String },

    /// The record carries no native identifier.
    #[error("Record has no lidoRecID, cannot build id for source '{source_id}'")]
    MissingRecordId { source_id: String },

    /// A mapped document has no `id` field left.
    #[error("Document of record '{0}' has no id after mapping")]
    MissingDocumentId(String),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// Invalid command-line or configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML configuration invalid: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Aborts the whole run.
    Run,
    /// Aborts only the unit being processed.
    Unit,
}

impl LidoError {
    /// Classify the error as run-scoped or unit-scoped.
    #[must_use]
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Transform { .. }
            | Self::InvalidDateRange { .. }
            | Self::MissingSourceId { .. }
            | Self::MissingRecordId { .. }
            | Self::MissingDocumentId(_)
            | Self::MissingElement { .. }
            | Self::XmlParse(_) => ErrorScope::Unit,
            Self::Structural(_)
            | Self::UnknownRecordVariant(_)
            | Self::UnknownSchema(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Yaml(_)
            | Self::Json(_) => ErrorScope::Run,
        }
    }

    /// Shorthand for `scope() == ErrorScope::Unit`.
    #[must_use]
    pub fn is_unit_scoped(&self) -> bool {
        self.scope() == ErrorScope::Unit
    }
}

/// Result type alias for indexer operations.
pub type Result<T> = std::result::Result<T, LidoError>;

//! Configuration constants and validation functions for the indexer.

use std::path::Path;

use crate::error::{LidoError, Result};

/// Number of documents buffered before the sink is flushed.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Number of leading bytes inspected to find the root wrapper tag.
pub const ROOT_SNIFF_WINDOW: usize = 1024;

/// Prefix of every derived record id.
pub const RECORD_ID_PREFIX: &str = "finc";

/// Directory holding the XSLT sheets.
pub const DEFAULT_XSLT_DIR: &str = "xslt";

/// Directory holding schema mapping and normalization files.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Record variant used when no filter is given.
pub const DEFAULT_RECORD_VARIANT: &str = "lido";

/// Prefix of generic transform sheets, applied to every source.
pub const GENERIC_SHEET_PREFIX: &str = "lido";

/// Relation types whose related work names the collection.
pub const COLLECTION_RELATION_TYPES: &[&str] = &["relatedWork"];

/// Validate the batch size given on the command line.
///
/// # Examples
/// ```
/// use lido_indexer::config::validate_batch_size;
///
/// assert!(validate_batch_size(1000).is_ok());
/// assert!(validate_batch_size(0).is_err());
/// ```
pub fn validate_batch_size(units: usize) -> Result<()> {
    if units == 0 {
        return Err(LidoError::Config(
            "Units must be a positive integer (-u|--units)".to_string(),
        ));
    }
    Ok(())
}

/// Validate the import path: it must be an existing file.
pub fn validate_import_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(LidoError::Config(format!(
            "Import file does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Validate the export path.
///
/// Documents are appended batch by batch, so an existing file would be mixed
/// with the new output. The path must not exist yet and must not be a
/// directory.
///
/// # Examples
/// ```
/// use lido_indexer::config::validate_export_path;
///
/// let dir = std::env::temp_dir();
/// assert!(validate_export_path(&dir).is_err());
/// ```
pub fn validate_export_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(LidoError::Config(format!(
            "Export path is a directory: {}",
            path.display()
        )));
    }
    if path.exists() {
        return Err(LidoError::Config(format!(
            "Export file {} already exists and would be overwritten. Remove it first",
            path.display()
        )));
    }
    Ok(())
}

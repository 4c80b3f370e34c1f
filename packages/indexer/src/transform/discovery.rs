//! Lookup of sheet files in a sheet directory.

use std::path::{Path, PathBuf};

use crate::config::GENERIC_SHEET_PREFIX;
use crate::error::Result;

const SHEET_EXTENSION: &str = "xsl";

/// Collect the sheets to apply for a record filter.
///
/// Generic `lido-*.xsl` sheets come first, then `<filter>-*.xsl` sheets, each
/// group in lexical order. A missing directory gives an empty list.
///
/// # Errors
/// `Io` if the directory exists but cannot be read.
pub fn discover_sheets(dir: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "sheet directory not found, units are not transformed");
        return Ok(Vec::new());
    }

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SHEET_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), path.clone()));
        }
    }
    files.sort();

    let mut sheets = with_prefix(&files, GENERIC_SHEET_PREFIX);
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        let filter = filter.to_lowercase();
        if filter != GENERIC_SHEET_PREFIX {
            sheets.extend(with_prefix(&files, &filter));
        }
    }

    for sheet in &sheets {
        tracing::debug!(sheet = %sheet.display(), "using sheet");
    }
    Ok(sheets)
}

fn with_prefix(files: &[(String, PathBuf)], prefix: &str) -> Vec<PathBuf> {
    let prefix = format!("{prefix}-");
    files
        .iter()
        .filter(|(name, _)| name.starts_with(&prefix))
        .map(|(_, path)| path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn sheet_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "lido-02-titles.xsl",
            "daphne-01-repository.xsl",
            "lido-01-cleanup.xsl",
            "source102-01.xsl",
            "lido-notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "<xsl/>").unwrap();
        }
        dir
    }

    #[test]
    fn test_generic_sheets_only_without_filter() {
        let dir = sheet_dir();
        let sheets = discover_sheets(dir.path(), None).unwrap();
        assert_eq!(names(&sheets), vec!["lido-01-cleanup.xsl", "lido-02-titles.xsl"]);
    }

    #[test]
    fn test_filter_sheets_follow_generic_ones() {
        let dir = sheet_dir();
        let sheets = discover_sheets(dir.path(), Some("Daphne")).unwrap();
        assert_eq!(
            names(&sheets),
            vec!["lido-01-cleanup.xsl", "lido-02-titles.xsl", "daphne-01-repository.xsl"]
        );
    }

    #[test]
    fn test_lido_filter_does_not_repeat_generic_sheets() {
        let dir = sheet_dir();
        assert_eq!(discover_sheets(dir.path(), Some("lido")).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sheets = discover_sheets(&dir.path().join("xslt"), Some("daphne")).unwrap();
        assert!(sheets.is_empty());
    }
}

//! Normalization utilities for metadata values.
//!
//! Pure functions for casefolding, punctuation stripping, ISBN conversion,
//! date validation and title handling. Functions that depend on
//! site-specific word lists take a [`NormalizeConfig`] explicitly.

mod dates;
mod isbn;
mod text;
mod title;

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

pub use dates::{date_range_to_str, extract_year, format_timestamp, validate_iso8601_date};
pub use isbn::{isbn10_to_13, normalize_isbn};
pub use text::{
    array_trim, author_match, coordinate_to_decimal, create_id_sort_key, create_sortable_string,
    has_trailing_punctuation, iunique, normalize, normalize_unicode, strip_control_characters,
    strip_leading_article, strip_leading_punctuation, strip_trailing_punctuation,
    trim_xml_whitespace, uc_first, unique_preserving_order, DEFAULT_LEADING_PUNCTUATION,
};
pub use title::{create_title_key, split_title};

/// File name of the optional normalization settings in the config directory.
pub const NORMALIZE_CONFIG_FILE: &str = "normalize.yaml";

/// Unicode normalization form applied to extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnicodeForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

/// Word lists and switches used by the normalization functions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Normalized title prefixes for which the whole title forms the dedup key.
    pub full_title_prefixes: Vec<String>,
    /// Lowercase words ending in a period that keep their period.
    pub abbreviations: Vec<String>,
    /// Leading articles removed for sorting, including the trailing space.
    pub articles: Vec<String>,
    /// Unicode form applied by [`normalize_unicode`], if any.
    pub unicode_form: Option<UnicodeForm>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            full_title_prefixes: Vec::new(),
            abbreviations: list(&[
                "ca.", "co.", "dr.", "etc.", "hrsg.", "jh.", "jr.", "nr.", "sr.", "st.", "vol.",
                "bd.", "aufl.",
            ]),
            articles: list(&[
                "the ", "a ", "an ", "der ", "die ", "das ", "ein ", "eine ", "le ", "la ", "les ",
                "l'",
            ]),
            unicode_form: Some(UnicodeForm::Nfc),
        }
    }
}

impl NormalizeConfig {
    /// Parse settings from a YAML string. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load `normalize.yaml` from a config directory, or fall back to defaults
    /// when the file does not exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(NORMALIZE_CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no normalization settings, using defaults");
            return Ok(Self::default());
        }
        let yaml = std::fs::read_to_string(&path)?;
        Self::from_yaml(&yaml)
    }
}

//! Transformation stage: ordered XSLT sheets applied to each unit.

mod discovery;
mod xsltproc;

use std::fmt;

use crate::error::{LidoError, Result};

pub use discovery::discover_sheets;
pub use xsltproc::XsltprocSheet;

/// A single transformation step over serialized XML.
pub trait Sheet: Send + Sync {
    /// Name used in error messages, usually the file name of the sheet.
    fn name(&self) -> &str;

    /// Transform one document.
    ///
    /// # Errors
    /// A human-readable message if the transformation fails.
    fn apply(&self, xml: &str) -> std::result::Result<String, String>;
}

/// A sheet backed by a closure.
///
/// # Examples
/// ```
/// use lido_indexer::transform::{FnSheet, Sheet};
///
/// let sheet = FnSheet::new("upper", |xml: &str| Ok(xml.to_uppercase()));
/// assert_eq!(sheet.apply("<a/>").unwrap(), "<A/>");
/// ```
pub struct FnSheet<F> {
    name: String,
    func: F,
}

impl<F> FnSheet<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Sheet for FnSheet<F>
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, xml: &str) -> std::result::Result<String, String> {
        (self.func)(xml)
    }
}

/// Sheets applied strictly in order, each consuming the previous output.
#[derive(Default)]
pub struct SheetChain {
    sheets: Vec<Box<dyn Sheet>>,
}

impl SheetChain {
    /// Create an empty chain, which passes units through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet to the chain.
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Sheet + 'static) -> Self {
        self.sheets.push(Box::new(sheet));
        self
    }

    pub fn push(&mut self, sheet: Box<dyn Sheet>) {
        self.sheets.push(sheet);
    }

    /// Build a chain of `xsltproc` sheets from a sheet directory.
    ///
    /// # Errors
    /// `Io` if the directory exists but cannot be read.
    pub fn from_dir(dir: &std::path::Path, filter: Option<&str>) -> Result<Self> {
        let mut chain = Self::new();
        for path in discover_sheets(dir, filter)? {
            chain.push(Box::new(XsltprocSheet::new(path)));
        }
        tracing::info!(sheets = chain.len(), dir = %dir.display(), "loaded transform sheets");
        Ok(chain)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Names of the sheets in application order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    /// Run every sheet over the XML of one unit.
    ///
    /// # Arguments
    /// * `xml` - Serialized unit
    /// * `unit` - Index of the unit, reported on failure
    ///
    /// # Errors
    /// `Transform` naming the first sheet that failed.
    pub fn apply(&self, xml: &str, unit: usize) -> Result<String> {
        let mut current = xml.to_string();
        for sheet in &self.sheets {
            current = sheet.apply(&current).map_err(|message| LidoError::Transform {
                sheet: sheet.name().to_string(),
                unit,
                message,
            })?;
        }
        Ok(current)
    }
}

impl fmt::Debug for SheetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetChain")
            .field("sheets", &self.names())
            .finish()
    }
}

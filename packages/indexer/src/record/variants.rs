//! Source-specific record variants.

use std::sync::Arc;

use super::{strip_isil, LidoRecord, RecordModel, RecordSettings};
use crate::error::Result;

/// Records of the Daphne provenance database.
///
/// Institutions come from the repository names instead of the record source.
#[derive(Debug)]
pub struct DaphneLidoRecord {
    inner: LidoRecord,
}

impl DaphneLidoRecord {
    pub fn parse(xml: String, settings: Arc<RecordSettings>) -> Result<Self> {
        Ok(Self {
            inner: LidoRecord::parse(xml, settings)?,
        })
    }

    pub fn boxed(xml: String, settings: Arc<RecordSettings>) -> Result<Box<dyn RecordModel>> {
        Ok(Box::new(Self::parse(xml, settings)?))
    }
}

impl RecordModel for DaphneLidoRecord {
    fn base(&self) -> &LidoRecord {
        &self.inner
    }

    fn source_id(&self) -> &str {
        "daphne"
    }

    fn default_language(&self) -> &str {
        "de"
    }

    fn institution(&self) -> Vec<String> {
        strip_isil(&self.inner.repository_name_ids())
    }
}

/// Records of source 102, whose repositories are exported as branches.
#[derive(Debug)]
pub struct Source102LidoRecord {
    inner: LidoRecord,
}

impl Source102LidoRecord {
    pub fn parse(xml: String, settings: Arc<RecordSettings>) -> Result<Self> {
        Ok(Self {
            inner: LidoRecord::parse(xml, settings)?,
        })
    }

    pub fn boxed(xml: String, settings: Arc<RecordSettings>) -> Result<Box<dyn RecordModel>> {
        Ok(Box::new(Self::parse(xml, settings)?))
    }
}

impl RecordModel for Source102LidoRecord {
    fn base(&self) -> &LidoRecord {
        &self.inner
    }

    fn source_id(&self) -> &str {
        "source102"
    }

    fn default_language(&self) -> &str {
        "de"
    }

    fn branches(&self) -> Vec<String> {
        strip_isil(&self.inner.repository_name_ids())
    }
}

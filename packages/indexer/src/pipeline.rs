//! Pipeline controller: segment, transform, resolve, extract, map, emit.

use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_RECORD_VARIANT;
use crate::error::{LidoError, Result};
use crate::record::{base_document, create_default_resolver, RecordConstructor, RecordResolver, RecordSettings};
use crate::schema::{ConfigCache, ConfigLoader, Mapped, SchemaMapper};
use crate::segment::{RawUnit, UnitStream};
use crate::sink::DocumentSink;
use crate::transform::SheetChain;

/// What happens when a single unit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the run on the first failing unit.
    #[default]
    FailFast,
    /// Log the failure, count it and continue with the next unit.
    SkipUnit,
}

/// Lifecycle of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Streaming,
    Draining,
    Done,
    Failed,
}

/// Counters of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units_read: usize,
    pub documents_emitted: usize,
    pub units_failed: usize,
    pub warnings: usize,
    pub elapsed: Duration,
}

struct Mapping {
    schema: String,
    configs: ConfigCache,
    mapper: SchemaMapper,
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    filter: Option<String>,
    schema: Option<String>,
    sheets: SheetChain,
    resolver: RecordResolver,
    loader: Option<Box<dyn ConfigLoader>>,
    settings: RecordSettings,
    policy: ErrorPolicy,
}

impl PipelineBuilder {
    /// Record variant to use; `None` selects the generic `lido` variant.
    #[must_use]
    pub fn filter(mut self, filter: Option<&str>) -> Self {
        self.filter = filter.map(str::to_string);
        self
    }

    /// Output schema to map to; `None` emits base documents.
    #[must_use]
    pub fn schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(str::to_string);
        self
    }

    #[must_use]
    pub fn sheets(mut self, sheets: SheetChain) -> Self {
        self.sheets = sheets;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: RecordResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn config_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: RecordSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the record variant and schema and build the pipeline.
    ///
    /// # Errors
    /// `UnknownRecordVariant` or `UnknownSchema` if either cannot be found,
    /// `Config` if a schema is given without a config loader.
    pub fn build(self) -> Result<Pipeline> {
        let constructor = self.resolver.resolve(self.filter.as_deref())?;
        let variant = self
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_RECORD_VARIANT)
            .to_lowercase();

        let mapping = match self.schema {
            Some(schema) => {
                let loader = self.loader.ok_or_else(|| {
                    LidoError::Config(format!("no configuration source for schema '{schema}'"))
                })?;
                let configs = ConfigCache::from_boxed(loader);
                // load once so an unknown schema fails before any unit is read
                configs.get(&schema, None)?;
                Some(Mapping {
                    schema,
                    configs,
                    mapper: SchemaMapper::new(),
                })
            }
            None => None,
        };

        Ok(Pipeline {
            sheets: self.sheets,
            constructor,
            variant,
            settings: Arc::new(self.settings),
            mapping,
            policy: self.policy,
            state: PipelineState::Init,
        })
    }
}

/// Sequential pipeline over one aggregate document.
pub struct Pipeline {
    sheets: SheetChain,
    constructor: RecordConstructor,
    variant: String,
    settings: Arc<RecordSettings>,
    mapping: Option<Mapping>,
    policy: ErrorPolicy,
    state: PipelineState,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            filter: None,
            schema: None,
            sheets: SheetChain::new(),
            resolver: create_default_resolver(),
            loader: None,
            settings: RecordSettings::default(),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Name of the selected record variant.
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Turn one raw unit into an output document.
    ///
    /// # Errors
    /// Any unit-scoped error: `Transform`, `XmlParse`, `InvalidDateRange`,
    /// `MissingSourceId`, `MissingRecordId` or `MissingDocumentId`.
    pub fn process_unit(&self, unit: &RawUnit) -> Result<Mapped> {
        let xml = self.sheets.apply(&unit.xml, unit.index)?;
        let record = (self.constructor)(xml, Arc::clone(&self.settings))?;
        let document = base_document(record.as_ref())?;

        let mapped = match &self.mapping {
            Some(mapping) => {
                let source = Some(record.source_id()).filter(|s| !s.is_empty());
                let config = mapping.configs.get(&mapping.schema, source)?;
                mapping.mapper.map(document, &config)?
            }
            None => Mapped {
                document,
                warnings: Vec::new(),
            },
        };

        if mapped.document.id().is_none() {
            let label = match record.id() {
                "" => format!("unit {}", unit.index),
                id => id.to_string(),
            };
            return Err(LidoError::MissingDocumentId(label));
        }
        Ok(mapped)
    }

    /// Process a whole stream into a sink.
    ///
    /// # Errors
    /// The first run-scoped error, or the first unit error under
    /// [`ErrorPolicy::FailFast`].
    pub fn run<R: Read>(&mut self, input: R, sink: &mut dyn DocumentSink) -> Result<RunSummary> {
        self.run_with_progress(input, sink, |_| {})
    }

    /// Like [`Pipeline::run`], calling `progress` after every unit.
    ///
    /// # Errors
    /// See [`Pipeline::run`].
    pub fn run_with_progress<R, F>(
        &mut self,
        input: R,
        sink: &mut dyn DocumentSink,
        mut progress: F,
    ) -> Result<RunSummary>
    where
        R: Read,
        F: FnMut(&RunSummary),
    {
        if self.state != PipelineState::Init {
            return Err(LidoError::Config(format!(
                "pipeline cannot run again from state {:?}",
                self.state
            )));
        }

        let started = Instant::now();
        let mut summary = RunSummary::default();
        tracing::info!(variant = %self.variant, sheets = self.sheets.len(), "starting run");

        self.state = PipelineState::Streaming;
        if let Err(e) = self.stream(input, sink, &mut summary, &mut progress) {
            self.state = PipelineState::Failed;
            tracing::error!(units = summary.units_read, error = %e, "run failed");
            return Err(e);
        }

        self.state = PipelineState::Draining;
        if let Err(e) = sink.flush() {
            self.state = PipelineState::Failed;
            return Err(e);
        }
        self.state = PipelineState::Done;

        summary.elapsed = started.elapsed();
        tracing::info!(
            units = summary.units_read,
            documents = summary.documents_emitted,
            failed = summary.units_failed,
            warnings = summary.warnings,
            elapsed_ms = summary.elapsed.as_millis(),
            "run finished"
        );
        Ok(summary)
    }

    fn stream<R, F>(
        &self,
        input: R,
        sink: &mut dyn DocumentSink,
        summary: &mut RunSummary,
        progress: &mut F,
    ) -> Result<()>
    where
        R: Read,
        F: FnMut(&RunSummary),
    {
        for unit in UnitStream::new(input)? {
            let unit = unit?;
            summary.units_read += 1;
            tracing::debug!(unit = unit.index, "processing unit");

            match self.process_unit(&unit) {
                Ok(mapped) => {
                    summary.warnings += mapped.warnings.len();
                    sink.write(&mapped.document)?;
                    summary.documents_emitted += 1;
                }
                Err(e) if e.is_unit_scoped() && self.policy == ErrorPolicy::SkipUnit => {
                    tracing::warn!(unit = unit.index, error = %e, "skipping unit");
                    summary.units_failed += 1;
                }
                Err(e) => return Err(e),
            }
            progress(summary);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("variant", &self.variant)
            .field("sheets", &self.sheets)
            .field("schema", &self.mapping.as_ref().map(|m| m.schema.as_str()))
            .field("policy", &self.policy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use crate::schema::{InMemoryLoader, SchemaFile};
    use crate::sink::CollectingSink;
    use crate::transform::FnSheet;
    use pretty_assertions::assert_eq;

    fn unit(id: &str, earliest: &str, latest: &str) -> String {
        format!(
            "<lido><lidoRecID>{id}</lidoRecID><descriptiveMetadata><eventWrap><eventSet><event>\
             <eventDate><date><earliestDate>{earliest}</earliestDate><latestDate>{latest}</latestDate></date></eventDate>\
             </event></eventSet></eventWrap></descriptiveMetadata></lido>"
        )
    }

    fn wrap(units: &[String]) -> String {
        format!("<lidoWrap>{}</lidoWrap>", units.concat())
    }

    fn loader() -> InMemoryLoader {
        let file = SchemaFile::from_yaml(
            "static:\n  source_id: 7\nsources:\n  daphne:\n    static:\n      source_id: 102\n",
        )
        .unwrap();
        InMemoryLoader::new().with_schema("finc", file)
    }

    #[test]
    fn test_run_without_schema_emits_base_documents() {
        let input = wrap(&[unit("a", "1900", "1901"), unit("b", "", "")]);
        let mut pipeline = Pipeline::builder().build().unwrap();
        let mut sink = CollectingSink::new();

        let summary = pipeline.run(input.as_bytes(), &mut sink).unwrap();

        assert_eq!(summary.units_read, 2);
        assert_eq!(summary.documents_emitted, 2);
        assert_eq!(sink.documents[0].id(), Some("a"));
        assert_eq!(sink.documents[1].id(), Some("b"));
        assert_eq!(sink.flushes, 1);
        assert_eq!(pipeline.state(), PipelineState::Done);
    }

    #[test]
    fn test_run_with_schema_derives_ids() {
        let input = wrap(&[unit("DE-Mb112/lido/7?", "", "")]);
        let mut pipeline = Pipeline::builder()
            .filter(Some("Daphne"))
            .schema(Some("finc"))
            .config_loader(loader())
            .build()
            .unwrap();
        let mut sink = CollectingSink::new();

        pipeline.run(input.as_bytes(), &mut sink).unwrap();

        assert_eq!(pipeline.variant(), "daphne");
        let doc = &sink.documents[0];
        assert_eq!(doc.id(), Some("finc-102-REUtTWIxMTIvbGlkby83Pw"));
        assert_eq!(doc.get("language"), Some(&FieldValue::text("de")));
    }

    #[test]
    fn test_unknown_filter_and_schema_fail_at_build() {
        let err = Pipeline::builder().filter(Some("nope")).build().unwrap_err();
        assert!(matches!(err, LidoError::UnknownRecordVariant(_)));

        let err = Pipeline::builder()
            .schema(Some("solr"))
            .config_loader(loader())
            .build()
            .unwrap_err();
        assert!(matches!(err, LidoError::UnknownSchema(_)));
    }

    #[test]
    fn test_fail_fast_stops_on_inverted_range() {
        let input = wrap(&[unit("a", "1950", "1900"), unit("b", "", "")]);
        let mut pipeline = Pipeline::builder().build().unwrap();
        let mut sink = CollectingSink::new();

        let err = pipeline.run(input.as_bytes(), &mut sink).unwrap_err();

        assert!(matches!(err, LidoError::InvalidDateRange { .. }));
        assert!(sink.documents.is_empty());
        assert_eq!(sink.flushes, 0);
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_skip_unit_continues() {
        let input = wrap(&[unit("a", "1950", "1900"), unit("", "", ""), unit("c", "", "")]);
        let mut pipeline = Pipeline::builder()
            .policy(ErrorPolicy::SkipUnit)
            .build()
            .unwrap();
        let mut sink = CollectingSink::new();

        let summary = pipeline.run(input.as_bytes(), &mut sink).unwrap();

        assert_eq!(summary.units_read, 3);
        assert_eq!(summary.units_failed, 2);
        assert_eq!(summary.documents_emitted, 1);
        assert_eq!(sink.documents[0].id(), Some("c"));
    }

    #[test]
    fn test_structural_error_aborts_even_when_skipping() {
        let input = format!("<lidoWrap>{}<lido>", unit("a", "", ""));
        let mut pipeline = Pipeline::builder()
            .policy(ErrorPolicy::SkipUnit)
            .build()
            .unwrap();
        let mut sink = CollectingSink::new();

        let err = pipeline.run(input.as_bytes(), &mut sink).unwrap_err();
        assert!(matches!(err, LidoError::Structural(_)));
        assert_eq!(sink.documents.len(), 1);
    }

    #[test]
    fn test_transform_failure_names_unit() {
        let sheets = SheetChain::new().with_sheet(FnSheet::new("lido-01.xsl", |xml: &str| {
            if xml.contains("<lidoRecID>b<") {
                Err("template error".to_string())
            } else {
                Ok(xml.to_string())
            }
        }));
        let input = wrap(&[unit("a", "", ""), unit("b", "", "")]);
        let mut pipeline = Pipeline::builder().sheets(sheets).build().unwrap();

        let err = pipeline
            .run(input.as_bytes(), &mut CollectingSink::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot process XSLT stylesheet lido-01.xsl on unit 1: template error"
        );
    }

    #[test]
    fn test_pipeline_runs_once() {
        let mut pipeline = Pipeline::builder().build().unwrap();
        let input = wrap(&[]);
        pipeline.run(input.as_bytes(), &mut CollectingSink::new()).unwrap();
        assert!(pipeline.run(input.as_bytes(), &mut CollectingSink::new()).is_err());
    }

    #[test]
    fn test_progress_is_reported_per_unit() {
        let input = wrap(&[unit("a", "", ""), unit("b", "", "")]);
        let mut pipeline = Pipeline::builder().build().unwrap();
        let mut seen = Vec::new();
        pipeline
            .run_with_progress(input.as_bytes(), &mut CollectingSink::new(), |s| {
                seen.push(s.units_read);
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2]);
    }
}

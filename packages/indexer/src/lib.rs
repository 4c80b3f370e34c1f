//! LIDO Indexer - Turn aggregate LIDO XML exports into search index documents.
//!
//! An export of a museum collection arrives as one large XML document holding
//! many LIDO records under a single wrapper element. This crate streams it
//! unit by unit, runs each unit through a chain of XSLT sheets, reads the
//! record fields, maps them into the field layout of an output schema and
//! writes one JSON object per line.
//!
//! # Example
//!
//! ```
//! use lido_indexer::pipeline::Pipeline;
//! use lido_indexer::sink::CollectingSink;
//!
//! let xml = r#"<lidoWrap xmlns="http://www.lido-schema.org">
//!   <lido><lidoRecID>DE-Mb112/lido/7</lidoRecID></lido>
//! </lidoWrap>"#;
//!
//! let mut pipeline = Pipeline::builder().build().unwrap();
//! let mut sink = CollectingSink::new();
//! let summary = pipeline.run(xml.as_bytes(), &mut sink).unwrap();
//!
//! assert_eq!(summary.documents_emitted, 1);
//! assert_eq!(sink.documents[0].id(), Some("DE-Mb112/lido/7"));
//! ```
//!
//! # Architecture
//!
//! - [`segment`]: Root discovery and streaming unit iterator
//! - [`transform`]: XSLT sheet chain and sheet discovery
//! - [`record`]: Record variants, field getters and base documents
//! - [`daterange`]: Date range completion and validation
//! - [`schema`]: Schema files, task engine and config cache
//! - [`pipeline`]: Controller tying the stages together
//! - [`sink`]: JSON-lines output
//! - [`normalize`]: Text, title, date and ISBN helpers
//! - [`document`]: Output document model
//! - [`xml`]: XML utilities
//! - [`config`]: Constants and validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod daterange;
pub mod document;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod segment;
pub mod sink;
pub mod transform;
pub mod xml;

pub use document::{Document, FieldValue, Scalar};
pub use error::{LidoError, Result};
pub use pipeline::{ErrorPolicy, Pipeline, RunSummary};

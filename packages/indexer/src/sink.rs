//! Output sinks for mapped documents.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::document::Document;
use crate::error::Result;

/// Receiver of output documents, in input order.
pub trait DocumentSink {
    /// Accept one document. May buffer.
    ///
    /// # Errors
    /// Serialization or IO errors of the underlying writer.
    fn write(&mut self, document: &Document) -> Result<()>;

    /// Write out everything buffered so far.
    ///
    /// # Errors
    /// IO errors of the underlying writer.
    fn flush(&mut self) -> Result<()>;
}

/// Writes one JSON object per line, in batches.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    buffer: String,
    pending: usize,
    batch_size: usize,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink that writes every `batch_size` documents.
    pub fn new(writer: W, batch_size: usize) -> Self {
        Self {
            writer,
            buffer: String::new(),
            pending: 0,
            batch_size: batch_size.max(1),
            written: 0,
        }
    }

    /// Number of documents written out to the writer.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_batch(&mut self) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        self.writer.write_all(self.buffer.as_bytes())?;
        self.writer.flush()?;
        tracing::debug!(documents = self.pending, "wrote batch");
        self.written += self.pending;
        self.pending = 0;
        self.buffer.clear();
        Ok(())
    }
}

impl JsonLinesSink<File> {
    /// Create a sink appending to a new export file.
    ///
    /// # Errors
    /// `Io` if the file already exists or cannot be created.
    pub fn create(path: &Path, batch_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(file, batch_size))
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn write(&mut self, document: &Document) -> Result<()> {
        self.buffer.push_str(&document.to_json_line()?);
        self.buffer.push('\n');
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.write_batch()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.write_batch()
    }
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub documents: Vec<Document>,
    pub flushes: usize,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for CollectingSink {
    fn write(&mut self, document: &Document) -> Result<()> {
        self.documents.push(document.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

//! Manifest output: one JSON record per watermarked image.
//!
//! JSON Lines records are streamed as they arrive. JSON records are buffered
//! and written as a single array by [`ManifestWriter::finish`].

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Manifest format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// One JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl ManifestFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes manifest records in JSON or JSONL format.
pub struct ManifestWriter<W: Write, T: Serialize> {
    writer: W,
    format: ManifestFormat,
    pending: Vec<T>,
    items_written: usize,
}

impl<T: Serialize> ManifestWriter<BufWriter<File>, T> {
    /// Create (or truncate) a manifest file.
    pub fn create(path: &Path, format: ManifestFormat) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write, T: Serialize> ManifestWriter<W, T> {
    pub fn new(writer: W, format: ManifestFormat) -> Self {
        Self {
            writer,
            format,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    /// Add a record: written immediately for JSONL, buffered for JSON.
    pub fn push(&mut self, item: T) -> io::Result<()> {
        match self.format {
            ManifestFormat::Json => self.pending.push(item),
            ManifestFormat::JsonLines => {
                // JSONL is never pretty-printed (one object per line)
                serde_json::to_writer(&mut self.writer, &item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.items_written += 1;
            }
        }
        Ok(())
    }

    /// Number of records pushed so far.
    pub fn len(&self) -> usize {
        self.items_written + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write any buffered records, flush, and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == ManifestFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, &self.pending)
                .map_err(io::Error::other)?;
            writeln!(self.writer)?;
            self.items_written += self.pending.len();
            self.pending.clear();
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

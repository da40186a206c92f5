//! Parquet file writer
//!
//! Provides utilities for writing result tables to Parquet files.

use super::table::ResultTable;
use crate::error::{Error, Result};
use crate::types::Compression as Codec;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::Builder;
use tracing::{debug, info};

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    dictionary_enabled: bool,
    statistics_enabled: bool,
}

impl ParquetWriterConfig {
    /// Get dictionary encoding enabled
    #[must_use]
    pub fn is_dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    /// Get statistics enabled
    #[must_use]
    pub fn is_statistics_enabled(&self) -> bool {
        self.statistics_enabled
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Get compression codec
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl From<Codec> for ParquetWriterConfig {
    fn from(codec: Codec) -> Self {
        Self::default().with_codec(codec)
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression from the configured codec
    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.compression = match codec {
            Codec::Snappy => Compression::SNAPPY,
            Codec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Codec::Gzip => Compression::GZIP(GzipLevel::default()),
            Codec::None => Compression::UNCOMPRESSED,
        };
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Enable or disable statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Build writer properties
    fn build_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size);

        if !self.dictionary_enabled {
            builder = builder.set_dictionary_enabled(false);
        }

        if !self.statistics_enabled {
            builder = builder.set_statistics_enabled(EnabledStatistics::None);
        }

        builder.build()
    }
}

/// Parquet writer over any sink
pub struct ParquetWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    rows_written: usize,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Create a new Parquet writer
    pub fn new(sink: W, schema: &Schema, config: &ParquetWriterConfig) -> Result<Self> {
        let props = config.build_properties();
        let writer = ArrowWriter::try_new(sink, Arc::new(schema.clone()), Some(props))?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch)?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Close the writer and finalize the file
    pub fn close(self) -> Result<usize> {
        let rows = self.rows_written;
        self.writer.close()?;
        Ok(rows)
    }
}

/// Write a table to `path` as Parquet
///
/// The file is written next to `path` under a temporary name and renamed
/// into place, so readers never observe a partial file. Repeated writes of
/// the same table produce identical bytes. Returns the number of rows
/// written.
pub fn persist(
    table: &ResultTable,
    path: impl AsRef<Path>,
    config: &ParquetWriterConfig,
) -> Result<usize> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let fail = |message: String| Error::persistence(&shown, message);

    check_columns(table).map_err(fail)?;

    let batch = table.to_record_batch().map_err(|e| fail(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Created like `File::create`, so the final file honours the umask
    let mut tmp = Builder::new()
        .prefix(".retail-prices-")
        .suffix(".parquet.tmp")
        .make_in(dir, |tmp_path| {
            OpenOptions::new().write(true).create_new(true).open(tmp_path)
        })
        .map_err(|e| fail(format!("cannot create a file in {}: {e}", dir.display())))?;
    debug!("Writing {} rows to {}", batch.num_rows(), tmp.path().display());

    let mut writer = ParquetWriter::new(tmp.as_file_mut(), &batch.schema(), config)
        .map_err(|e| fail(e.to_string()))?;
    writer.write(&batch).map_err(|e| fail(e.to_string()))?;
    let rows = writer.close().map_err(|e| fail(e.to_string()))?;

    tmp.as_file()
        .sync_all()
        .map_err(|e| fail(format!("failed to flush: {e}")))?;
    tmp.persist(path)
        .map_err(|e| fail(format!("failed to move file into place: {}", e.error)))?;

    info!("Wrote {} rows to {}", rows, shown);
    Ok(rows)
}

/// Reject tables that cannot map onto a Parquet schema
fn check_columns(table: &ResultTable) -> std::result::Result<(), String> {
    let names = table.schema().column_names();
    if names.is_empty() {
        return Err("table has no columns".to_string());
    }
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(format!("duplicate column name '{name}'"));
        }
    }
    Ok(())
}

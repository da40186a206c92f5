//! Output module
//!
//! Assembles normalized rows into a table and writes it as Parquet.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Appending pages of rows in page-index order ([`TableAssembler`])
//! - Converting the sealed [`ResultTable`] to an Arrow `RecordBatch`
//! - Writing Parquet files atomically ([`persist`])

mod convert;
mod table;
mod writer;

pub use convert::{arrow_type, to_arrow_schema, TIMESTAMP_TZ};
pub use table::{ResultTable, TableAssembler};
pub use writer::{persist, ParquetWriter, ParquetWriterConfig};

#[cfg(test)]
mod tests;

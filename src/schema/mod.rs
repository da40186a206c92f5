//! Record schema and normalizer
//!
//! Maps heterogeneous raw JSON records onto a fixed, typed column layout.
//!
//! # Features
//!
//! - **Typed Columns**: utf8, int64, float64, boolean, timestamp, category
//! - **Defaults**: Absent optional fields take a configured default
//! - **Strict Coercion**: Uncoercible values fail the whole record
//! - **Forward Compatible**: Unknown source fields are dropped

mod normalize;
mod types;

pub use normalize::coerce;
pub use types::{CellValue, ColumnSpec, ColumnType, NormalizedRow, RecordSchema};

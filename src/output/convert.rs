//! Conversion of result tables to Arrow
//!
//! Column types map as follows:
//! - `utf8` → `Utf8`
//! - `int64` / `float64` / `boolean` → the matching primitive
//! - `timestamp` → `Timestamp(Microsecond, "UTC")`
//! - `category` → `Dictionary(Int32, Utf8)`

use super::table::ResultTable;
use crate::error::{Error, Result};
use crate::schema::{CellValue, ColumnSpec, ColumnType, NormalizedRow, RecordSchema};
use arrow::array::{
    ArrayRef, BooleanArray, DictionaryArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Int32Type, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Timezone attached to timestamp columns
pub const TIMESTAMP_TZ: &str = "UTC";

/// Arrow type of a column
pub fn arrow_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Utf8 => DataType::Utf8,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Timestamp => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into()))
        }
        ColumnType::Category => {
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
        }
    }
}

/// Arrow schema of a record schema; required columns are non-nullable
pub fn to_arrow_schema(schema: &RecordSchema) -> Schema {
    let fields: Vec<Field> = schema
        .columns()
        .iter()
        .map(|spec| {
            Field::new(
                spec.column_name(),
                arrow_type(spec.column_type),
                !spec.required,
            )
        })
        .collect();
    Schema::new(fields)
}

impl ResultTable {
    /// Arrow schema of this table
    pub fn arrow_schema(&self) -> SchemaRef {
        Arc::new(to_arrow_schema(self.schema()))
    }

    /// Build a single record batch holding every row
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let columns = self
            .schema()
            .columns()
            .iter()
            .enumerate()
            .map(|(index, spec)| build_array(self.rows(), index, spec))
            .collect::<Result<Vec<ArrayRef>>>()?;

        Ok(RecordBatch::try_new(self.arrow_schema(), columns)?)
    }
}

fn build_array(rows: &[NormalizedRow], index: usize, spec: &ColumnSpec) -> Result<ArrayRef> {
    let array: ArrayRef = match spec.column_type {
        ColumnType::Utf8 => {
            Arc::new(StringArray::from(collect(rows, index, spec, CellValue::as_str)?))
        }
        ColumnType::Int64 => {
            Arc::new(Int64Array::from(collect(rows, index, spec, CellValue::as_i64)?))
        }
        ColumnType::Float64 => {
            Arc::new(Float64Array::from(collect(rows, index, spec, CellValue::as_f64)?))
        }
        ColumnType::Boolean => {
            Arc::new(BooleanArray::from(collect(rows, index, spec, CellValue::as_bool)?))
        }
        ColumnType::Timestamp => {
            let values = collect(rows, index, spec, |cell| match cell {
                CellValue::Timestamp(micros) => Some(*micros),
                _ => None,
            })?;
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone(TIMESTAMP_TZ))
        }
        ColumnType::Category => {
            let values = collect(rows, index, spec, CellValue::as_str)?;
            Arc::new(values.into_iter().collect::<DictionaryArray<Int32Type>>())
        }
    };
    Ok(array)
}

/// Pull one column out of the rows, mapping `Null` to `None`
fn collect<'a, T>(
    rows: &'a [NormalizedRow],
    index: usize,
    spec: &ColumnSpec,
    extract: impl Fn(&'a CellValue) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    rows.iter()
        .enumerate()
        .map(|(pos, row)| match row.get(index) {
            Some(CellValue::Null) => Ok(None),
            Some(cell) => extract(cell).map(Some).ok_or_else(|| {
                Error::table(format!(
                    "row {pos}: column '{}' expects {}, found {cell:?}",
                    spec.column_name(),
                    spec.column_type
                ))
            }),
            None => Err(Error::table(format!(
                "row {pos} has no cell for column '{}'",
                spec.column_name()
            ))),
        })
        .collect()
}

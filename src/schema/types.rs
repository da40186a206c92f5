//! Schema types
//!
//! A [`RecordSchema`] is an ordered list of [`ColumnSpec`]s. Each spec maps
//! one source field of a raw record onto a typed output column.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Target type of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Utf8,
    Int64,
    Float64,
    Boolean,
    /// Microseconds since the Unix epoch, UTC
    Timestamp,
    /// Low-cardinality string, dictionary encoded on output
    Category,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Utf8 => write!(f, "utf8"),
            ColumnType::Int64 => write!(f, "int64"),
            ColumnType::Float64 => write!(f, "float64"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Category => write!(f, "category"),
        }
    }
}

/// A single typed cell of a normalized row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Utf8(String),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Timestamp(i64),
    Category(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Utf8(s) | CellValue::Category(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int64(v) | CellValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// One row, positionally aligned with the schema's columns
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow(pub(crate) Vec<CellValue>);

impl NormalizedRow {
    pub fn values(&self) -> &[CellValue] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mapping of one source field onto an output column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name in the raw record (dot-notation for nested fields)
    pub source: String,

    /// Output column name (defaults to the source name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether the field must be present and non-null
    #[serde(default)]
    pub required: bool,

    /// Value used when an optional field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    /// Allowed values (category columns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ColumnSpec {
    /// Create an optional column with the given source field and type
    pub fn new(source: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            source: source.into(),
            name: None,
            column_type,
            required: false,
            default: None,
            allowed: None,
        }
    }

    /// Rename the output column
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the column as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default used when the field is absent
    #[must_use]
    pub fn with_default(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict a category column to a fixed set of values
    #[must_use]
    pub fn with_allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Output column name
    pub fn column_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.source)
    }
}

/// Fixed column schema used to normalize raw records
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub(crate) columns: Vec<ColumnSpec>,
    /// Resolved default per column, coerced once at construction
    pub(crate) defaults: Vec<CellValue>,
}

impl RecordSchema {
    /// Build a schema, validating names and defaults
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::invalid_value("schema", "schema has no columns"));
        }

        let mut seen = HashSet::new();
        for spec in &columns {
            if !seen.insert(spec.column_name().to_string()) {
                return Err(Error::invalid_value(
                    "schema",
                    format!("duplicate column name '{}'", spec.column_name()),
                ));
            }
            if spec.allowed.is_some() && spec.column_type != ColumnType::Category {
                return Err(Error::invalid_value(
                    "schema",
                    format!(
                        "column '{}' lists allowed values but is not a category",
                        spec.column_name()
                    ),
                ));
            }
        }

        let defaults = columns
            .iter()
            .map(|spec| match &spec.default {
                Some(value) if !value.is_null() => {
                    super::normalize::coerce(value, spec).map_err(|e| {
                        Error::invalid_value(
                            "schema",
                            format!("bad default for column '{}': {e}", spec.column_name()),
                        )
                    })
                }
                _ => Ok(CellValue::Null),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns, defaults })
    }

    /// Column specs in output order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Output column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnSpec::column_name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by output name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.column_name() == name)
    }

    /// Built-in schema for Azure retail price items
    pub fn retail_prices() -> Result<Self> {
        use ColumnType::{Boolean, Category, Float64, Timestamp, Utf8};

        Self::new(vec![
            ColumnSpec::new("currencyCode", Category)
                .named("currency_code")
                .required(),
            ColumnSpec::new("tierMinimumUnits", Float64)
                .named("tier_minimum_units")
                .with_default(0.0),
            ColumnSpec::new("retailPrice", Float64)
                .named("retail_price")
                .required(),
            ColumnSpec::new("unitPrice", Float64)
                .named("unit_price")
                .required(),
            ColumnSpec::new("armRegionName", Utf8).named("arm_region_name"),
            ColumnSpec::new("location", Utf8),
            ColumnSpec::new("effectiveStartDate", Timestamp).named("effective_start_date"),
            ColumnSpec::new("effectiveEndDate", Timestamp).named("effective_end_date"),
            ColumnSpec::new("meterId", Utf8).named("meter_id").required(),
            ColumnSpec::new("meterName", Utf8).named("meter_name"),
            ColumnSpec::new("productId", Utf8).named("product_id"),
            ColumnSpec::new("skuId", Utf8).named("sku_id"),
            ColumnSpec::new("productName", Utf8).named("product_name"),
            ColumnSpec::new("skuName", Utf8).named("sku_name"),
            ColumnSpec::new("serviceName", Utf8).named("service_name"),
            ColumnSpec::new("serviceId", Utf8).named("service_id"),
            ColumnSpec::new("serviceFamily", Category).named("service_family"),
            ColumnSpec::new("unitOfMeasure", Utf8).named("unit_of_measure"),
            ColumnSpec::new("type", Category).named("price_type"),
            ColumnSpec::new("isPrimaryMeterRegion", Boolean)
                .named("is_primary_meter_region")
                .with_default(false),
            ColumnSpec::new("armSkuName", Utf8).named("arm_sku_name"),
            ColumnSpec::new("reservationTerm", Utf8).named("reservation_term"),
        ])
    }
}

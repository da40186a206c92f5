//! Record normalization
//!
//! Pure mapping of raw JSON records onto a [`RecordSchema`]. Nothing here
//! performs I/O or logs, so every rule is testable against fixed fixtures.

use super::types::{CellValue, ColumnSpec, ColumnType, NormalizedRow, RecordSchema};
use crate::decode::extract_path;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Longest rendering of an offending value kept in an error
const MAX_VALUE_PREVIEW: usize = 64;

impl RecordSchema {
    /// Normalize one raw record into a row
    ///
    /// Absent or null optional fields take the column default. Absent or
    /// null required fields, and values that cannot be coerced, fail with
    /// [`Error::SchemaViolation`]. Fields not named by the schema are dropped.
    pub fn normalize(&self, raw: &JsonObject) -> Result<NormalizedRow> {
        let mut values = Vec::with_capacity(self.columns.len());

        for (spec, default) in self.columns.iter().zip(&self.defaults) {
            match lookup(raw, &spec.source) {
                None | Some(JsonValue::Null) => {
                    if spec.required {
                        return Err(Error::schema_violation(
                            &spec.source,
                            spec.column_type.to_string(),
                            "null",
                            "required field is missing",
                        ));
                    }
                    values.push(default.clone());
                }
                Some(value) => values.push(coerce(value, spec)?),
            }
        }

        Ok(NormalizedRow(values))
    }

    /// Normalize every record of a page, failing on the first violation
    pub fn normalize_page(&self, items: &[JsonObject]) -> Result<Vec<NormalizedRow>> {
        items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                self.normalize(item).map_err(|e| match e {
                    Error::SchemaViolation {
                        field,
                        expected,
                        value,
                        message,
                    } => Error::SchemaViolation {
                        field,
                        expected,
                        value,
                        message: format!("item {position}: {message}"),
                    },
                    other => other,
                })
            })
            .collect()
    }
}

fn lookup<'a>(raw: &'a JsonObject, source: &str) -> Option<&'a JsonValue> {
    match source.split_once('.') {
        None => raw.get(source),
        Some((head, rest)) => extract_path(raw.get(head)?, rest),
    }
}

/// Coerce a present, non-null value to the column's type
pub fn coerce(value: &JsonValue, spec: &ColumnSpec) -> Result<CellValue> {
    let cell = match spec.column_type {
        ColumnType::Utf8 => match value {
            JsonValue::String(s) => Some(CellValue::Utf8(s.clone())),
            JsonValue::Number(n) => Some(CellValue::Utf8(n.to_string())),
            JsonValue::Bool(b) => Some(CellValue::Utf8(b.to_string())),
            _ => None,
        },
        ColumnType::Int64 => coerce_i64(value).map(CellValue::Int64),
        ColumnType::Float64 => coerce_f64(value).map(CellValue::Float64),
        ColumnType::Boolean => match value {
            JsonValue::Bool(b) => Some(CellValue::Boolean(*b)),
            JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Some(CellValue::Boolean(true)),
            JsonValue::String(s) if s.eq_ignore_ascii_case("false") => {
                Some(CellValue::Boolean(false))
            }
            _ => None,
        },
        ColumnType::Timestamp => coerce_timestamp(value).map(CellValue::Timestamp),
        ColumnType::Category => match value {
            JsonValue::String(s) => {
                if let Some(allowed) = &spec.allowed {
                    if !allowed.iter().any(|a| a == s) {
                        return Err(violation(spec, value, "value is not an allowed category"));
                    }
                }
                Some(CellValue::Category(s.clone()))
            }
            _ => None,
        },
    };

    cell.ok_or_else(|| violation(spec, value, "value cannot be coerced"))
}

fn coerce_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_f64(value: &JsonValue) -> Option<f64> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn coerce_timestamp(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_micros());
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc().timestamp_micros());
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_micros())
        }
        JsonValue::Number(n) => n.as_i64()?.checked_mul(1_000_000),
        _ => None,
    }
}

fn violation(spec: &ColumnSpec, value: &JsonValue, message: &str) -> Error {
    let mut rendered = value.to_string();
    if rendered.len() > MAX_VALUE_PREVIEW {
        let mut cut = MAX_VALUE_PREVIEW;
        while !rendered.is_char_boundary(cut) {
            cut -= 1;
        }
        rendered.truncate(cut);
        rendered.push_str("...");
    }
    Error::schema_violation(&spec.source, spec.column_type.to_string(), rendered, message)
}

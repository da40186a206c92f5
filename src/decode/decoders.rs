//! Envelope decoder implementation

use crate::error::{Error, Result};
use crate::types::{JsonObject, OptionStringExt};
use serde_json::Value;

/// Default name of the items array in the envelope
pub const DEFAULT_ITEMS_FIELD: &str = "Items";

/// Default name of the next-page link in the envelope
pub const DEFAULT_NEXT_FIELD: &str = "NextPageLink";

/// A decoded response envelope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Item records in response order
    pub items: Vec<JsonObject>,
    /// Next page URL; `None` marks the final page
    pub next_url: Option<String>,
}

/// Decoder for paged JSON envelopes
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    items_path: String,
    next_path: String,
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_FIELD, DEFAULT_NEXT_FIELD)
    }
}

impl EnvelopeDecoder {
    /// Create a decoder for the given items and next-link paths
    pub fn new(items_path: impl Into<String>, next_path: impl Into<String>) -> Self {
        Self {
            items_path: items_path.into(),
            next_path: next_path.into(),
        }
    }

    pub fn items_path(&self) -> &str {
        &self.items_path
    }

    pub fn next_path(&self) -> &str {
        &self.next_path
    }

    /// Decode a response body
    ///
    /// Fails when the body is not JSON, when the items array is missing, or
    /// when an item is not an object. A missing, null or empty next link
    /// decodes to `None`.
    pub fn decode(&self, body: &str) -> Result<Envelope> {
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })?;
        self.decode_value(&value)
    }

    /// Decode an already parsed envelope
    pub fn decode_value(&self, value: &Value) -> Result<Envelope> {
        if !value.is_object() {
            return Err(Error::decode("response envelope is not a JSON object"));
        }

        let items = match extract_path(value, &self.items_path) {
            Some(Value::Array(arr)) => arr
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(map.clone()),
                    other => Err(Error::decode(format!(
                        "item {i} in '{}' is not an object: {other}",
                        self.items_path
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::decode(format!(
                    "'{}' is not an array: {other}",
                    self.items_path
                )))
            }
            None => {
                return Err(Error::decode(format!(
                    "envelope has no '{}' field",
                    self.items_path
                )))
            }
        };

        let next_url = match extract_path(value, &self.next_path) {
            Some(Value::String(s)) => s.trim().to_string().none_if_empty(),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(Error::decode(format!(
                    "'{}' is not a string: {other}",
                    self.next_path
                )))
            }
        };

        Ok(Envelope { items, next_url })
    }
}

/// Walk a dot-notation path (optionally prefixed with `$.`) into a value
///
/// Array segments such as `data[0]` or `data[-1]` index into arrays.
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: i64 = index_str.parse().ok()?;
            let arr = current.as_array()?;
            #[allow(clippy::cast_possible_wrap)]
            let idx = if index < 0 {
                usize::try_from(arr.len() as i64 + index).ok()?
            } else {
                usize::try_from(index).ok()?
            };
            current = arr.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current)
}

//! Common types used throughout retail-prices
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Ordered list of query parameters
pub type QueryParams = Vec<(String, String)>;

// ============================================================================
// Pagination Mode
// ============================================================================

/// How page locators are derived
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Follow the next-page link returned by each response (sequential)
    Cursor,
    /// Derive each page from its index via a skip parameter (prefetch allowed)
    #[default]
    Offset,
}

impl PaginationMode {
    /// Whether locators can be computed before earlier pages arrive
    pub fn allows_prefetch(self) -> bool {
        matches!(self, Self::Offset)
    }
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaginationMode::Cursor => write!(f, "cursor"),
            PaginationMode::Offset => write!(f, "offset"),
        }
    }
}

// ============================================================================
// Parquet Compression
// ============================================================================

/// Compression codec for Parquet output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_mode_serde() {
        let mode: PaginationMode = serde_json::from_str("\"cursor\"").unwrap();
        assert_eq!(mode, PaginationMode::Cursor);

        let json = serde_json::to_string(&PaginationMode::Offset).unwrap();
        assert_eq!(json, "\"offset\"");
    }

    #[test]
    fn test_pagination_mode_prefetch() {
        assert!(PaginationMode::Offset.allows_prefetch());
        assert!(!PaginationMode::Cursor.allows_prefetch());
        assert_eq!(PaginationMode::default(), PaginationMode::Offset);
    }

    #[test]
    fn test_compression_serde() {
        let c: Compression = serde_json::from_str("\"zstd\"").unwrap();
        assert_eq!(c, Compression::Zstd);
        assert_eq!(Compression::default(), Compression::Snappy);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!("test".to_string().none_if_empty(), Some("test".to_string()));
        assert_eq!(String::new().none_if_empty(), None);
    }
}

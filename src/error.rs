//! Error types for retail-prices
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The fetch pipeline distinguishes transient failures (retried by the
//! retry policy) from fatal ones (surfaced at once). Any failure that ends a
//! run midway carries a [`Progress`] so callers know what was committed.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// How far a run got before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Pages released into the table
    pub pages_committed: usize,
    /// Rows released into the table
    pub rows_committed: usize,
}

impl Progress {
    pub fn new(pages_committed: usize, rows_committed: usize) -> Self {
        Self {
            pages_committed,
            rows_committed,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages ({} rows) committed",
            self.pages_committed, self.rows_committed
        )
    }
}

/// Why a run was aborted
#[derive(Error, Debug)]
pub enum AbortCause {
    #[error("cancelled by caller")]
    Cancelled,

    #[error("overall timeout elapsed")]
    TimedOut,

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: Box<Error> },
}

/// The main error type for retail-prices
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Fetch Errors
    // ============================================================================
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transient fetch failure for {url}: {message}")]
    TransientFetch {
        url: String,
        status: Option<u16>,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Fatal fetch failure for {url}: {message}")]
    FatalFetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: Box<Error>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Schema violation on field '{field}' (expected {expected}, got {value}): {message}")]
    SchemaViolation {
        field: String,
        expected: String,
        value: String,
        message: String,
    },

    #[error("Table error: {message}")]
    Table { message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Failed to persist table to {path}: {message}")]
    Persistence { path: String, message: String },

    // ============================================================================
    // Run Outcome Errors
    // ============================================================================
    #[error("Fetch aborted with {progress}: {cause}")]
    Aborted { progress: Progress, cause: AbortCause },

    #[error("Fetch halted with {progress}: {source}")]
    Halted {
        progress: Progress,
        source: Box<Error>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a transient fetch error
    pub fn transient(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TransientFetch {
            url: url.into(),
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a fatal fetch error
    pub fn fatal(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::FatalFetch {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a schema violation error
    pub fn schema_violation(
        field: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            expected: expected.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a table error
    pub fn table(message: impl Into<String>) -> Self {
        Self::Table {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientFetch { .. })
    }

    /// Server-provided hint for how long to wait before retrying
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::TransientFetch { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Committed progress, for errors that ended a run midway
    pub fn progress(&self) -> Option<Progress> {
        match self {
            Error::Aborted { progress, .. } | Error::Halted { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    /// Walk through run-level wrappers to the error that caused them
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Halted { source, .. } => source.root_cause(),
            Error::RetriesExhausted { last_error, .. }
            | Error::Aborted {
                cause: AbortCause::RetriesExhausted { last_error, .. },
                ..
            } => last_error.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for retail-prices
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

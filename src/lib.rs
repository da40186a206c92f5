// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # retail-prices
//!
//! Bulk fetcher for the Azure Retail Prices API. Walks a paginated JSON
//! endpoint with bounded concurrency, retries transient failures with
//! jittered exponential backoff, normalizes every record onto a typed
//! schema and writes the result as a single Parquet file.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retail_prices::prelude::*;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::default();
//!     let client = Arc::new(HttpClient::with_config(settings.http_client_config())?);
//!     let driver = PaginationDriver::new(
//!         HttpPageFetcher::with_decoder(client, settings.decoder()),
//!         create_paginator(&settings.pagination_config())?,
//!         settings.record_schema()?,
//!     )
//!     .with_config(settings.fetch.driver_config());
//!
//!     let outcome = driver.run(&CancellationToken::new()).await?;
//!     persist(&outcome.table, "prices.parquet", &ParquetWriterConfig::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PaginationDriver                        │
//! │  locators → fetch (retry) → reorder buffer → TableAssembler  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────┬───┴────────┬────────────┬──────────┐
//! │ Pagination │   Fetch    │   Retry    │  Schema    │  Output  │
//! ├────────────┼────────────┼────────────┼────────────┼──────────┤
//! │ Cursor     │ HTTP GET   │ Backoff    │ Coerce     │ Arrow    │
//! │ Offset     │ Rate limit │ Jitter     │ Defaults   │ Parquet  │
//! │            │ Decode     │ Observer   │ Violations │ Atomic   │
//! └────────────┴────────────┴────────────┴────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with rate limiting and failure classification
pub mod http;

/// Response envelope decoding
pub mod decode;

/// Page fetchers
pub mod fetch;

/// Retry policy and observers
pub mod retry;

/// Pagination strategies
pub mod pagination;

/// Record schema and normalization
pub mod schema;

/// Pagination driver
pub mod engine;

/// Table assembly and Parquet output
pub mod output;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Commonly used types
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::engine::{DriverConfig, FetchOutcome, PaginationDriver};
    pub use crate::error::{Error, Result};
    pub use crate::fetch::{HttpPageFetcher, PageFetcher};
    pub use crate::http::HttpClient;
    pub use crate::output::{persist, ParquetWriterConfig, ResultTable};
    pub use crate::pagination::{create_paginator, PaginationConfig};
    pub use crate::retry::RetryPolicy;
    pub use crate::schema::RecordSchema;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

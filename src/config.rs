//! Configuration types for fetch runs
//!
//! Settings are loaded from YAML; every field has a default, so an empty
//! document is a valid configuration. CLI flags override file values.

use crate::decode::{EnvelopeDecoder, DEFAULT_ITEMS_FIELD, DEFAULT_NEXT_FIELD};
use crate::engine::DriverConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::output::ParquetWriterConfig;
use crate::pagination::PaginationConfig;
use crate::retry::RetryPolicy;
use crate::schema::{ColumnSpec, RecordSchema};
use crate::types::{Compression, PaginationMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public Azure retail prices endpoint
pub const DEFAULT_ENDPOINT: &str = "https://prices.azure.com/api/retail/prices";

/// API version sent with every request unless overridden
pub const DEFAULT_API_VERSION: &str = "2021-10-01-preview";

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Complete run configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where records come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Fetch behaviour
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Parquet output
    #[serde(default)]
    pub output: OutputConfig,

    /// Column schema; the built-in retail price schema when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<ColumnSpec>>,
}

impl Settings {
    /// Parse settings from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.fetch.validate()?;
        self.output.validate()?;
        self.record_schema().map(|_| ())
    }

    /// Schema rows are normalized against
    pub fn record_schema(&self) -> Result<RecordSchema> {
        match &self.schema {
            Some(columns) => RecordSchema::new(columns.clone()),
            None => RecordSchema::retail_prices(),
        }
    }

    /// Paginator settings for the configured source
    pub fn pagination_config(&self) -> PaginationConfig {
        let mut config = PaginationConfig::new(&self.source.endpoint, self.fetch.pagination)
            .page_size(self.fetch.page_size);
        config.skip_param.clone_from(&self.source.skip_param);
        if let Some(top) = &self.source.top_param {
            config = config.top_param(top);
        }
        for (key, value) in &self.source.params {
            config = config.param(key, value);
        }
        if let Some(filter) = &self.source.filter {
            config = config.filter(filter);
        }
        config
    }

    /// HTTP client settings: timeout and rate limit from `fetch`, headers from `source`
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder =
            HttpClientConfig::builder().timeout(seconds(self.fetch.timeout_seconds));
        builder = match self.fetch.requests_per_second {
            0 => builder.no_rate_limit(),
            rps => builder.rate_limit(RateLimiterConfig::new(rps, rps)),
        };
        for (key, value) in &self.source.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }

    /// Response decoder for the configured envelope fields
    pub fn decoder(&self) -> EnvelopeDecoder {
        EnvelopeDecoder::new(&self.source.items_field, &self.source.next_field)
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// Endpoint, query and envelope layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the prices API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// OData filter expression, sent as `$filter`
    #[serde(default)]
    pub filter: Option<String>,

    /// Fixed query parameters sent with every request
    #[serde(default = "default_params")]
    pub params: BTreeMap<String, String>,

    /// Extra request headers, such as an API key
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query parameter carrying the offset
    #[serde(default = "default_skip_param")]
    pub skip_param: String,

    /// Query parameter carrying the page size, if the API accepts one
    #[serde(default)]
    pub top_param: Option<String>,

    /// Field holding the items array
    #[serde(default = "default_items_field")]
    pub items_field: String,

    /// Field holding the next-page link
    #[serde(default = "default_next_field")]
    pub next_field: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            filter: None,
            params: default_params(),
            headers: BTreeMap::new(),
            skip_param: default_skip_param(),
            top_param: None,
            items_field: default_items_field(),
            next_field: default_next_field(),
        }
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::invalid_value("source.endpoint", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "source.endpoint",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.skip_param.is_empty() {
            return Err(Error::invalid_value("source.skip_param", "must not be empty"));
        }
        if self.items_field.is_empty() {
            return Err(Error::invalid_value("source.items_field", "must not be empty"));
        }
        if self.next_field.is_empty() {
            return Err(Error::invalid_value("source.next_field", "must not be empty"));
        }
        for (name, value) in &self.headers {
            if reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(Error::invalid_value(
                    "source.headers",
                    format!("invalid header name '{name}'"),
                ));
            }
            if reqwest::header::HeaderValue::from_str(value).is_err() {
                return Err(Error::invalid_value(
                    "source.headers",
                    format!("invalid value for header '{name}'"),
                ));
            }
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_params() -> BTreeMap<String, String> {
    BTreeMap::from([("api-version".to_string(), DEFAULT_API_VERSION.to_string())])
}

fn default_skip_param() -> String {
    crate::pagination::DEFAULT_SKIP_PARAM.to_string()
}

fn default_items_field() -> String {
    DEFAULT_ITEMS_FIELD.to_string()
}

fn default_next_field() -> String {
    DEFAULT_NEXT_FIELD.to_string()
}

// ============================================================================
// Fetch Config
// ============================================================================

/// Retry, concurrency and limit settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_backoff")]
    pub base_backoff_seconds: f64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: f64,

    /// Pages in flight at once (offset pagination)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub pagination: PaginationMode,

    /// Request rate shared by all fetches; 0 disables limiting
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Stop dispatching once this many rows are committed
    #[serde(default)]
    pub stop_after: Option<usize>,

    #[serde(default)]
    pub max_pages: Option<usize>,

    #[serde(default)]
    pub overall_timeout_seconds: Option<f64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_seconds: default_base_backoff(),
            max_backoff_seconds: default_max_backoff(),
            max_concurrency: default_max_concurrency(),
            timeout_seconds: default_timeout(),
            page_size: default_page_size(),
            pagination: PaginationMode::default(),
            requests_per_second: default_rps(),
            stop_after: None,
            max_pages: None,
            overall_timeout_seconds: None,
        }
    }
}

impl FetchConfig {
    fn validate(&self) -> Result<()> {
        check_seconds("fetch.base_backoff_seconds", self.base_backoff_seconds, true)?;
        check_seconds("fetch.max_backoff_seconds", self.max_backoff_seconds, true)?;
        if self.max_backoff_seconds < self.base_backoff_seconds {
            return Err(Error::invalid_value(
                "fetch.max_backoff_seconds",
                "must not be less than base_backoff_seconds",
            ));
        }
        check_seconds("fetch.timeout_seconds", self.timeout_seconds, false)?;
        if let Some(limit) = self.overall_timeout_seconds {
            check_seconds("fetch.overall_timeout_seconds", limit, false)?;
        }
        if self.max_concurrency == 0 {
            return Err(Error::invalid_value("fetch.max_concurrency", "must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("fetch.page_size", "must be at least 1"));
        }
        if self.stop_after == Some(0) {
            return Err(Error::invalid_value("fetch.stop_after", "must be at least 1"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("fetch.max_pages", "must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            seconds(self.base_backoff_seconds),
            seconds(self.max_backoff_seconds),
        )
    }

    pub fn driver_config(&self) -> DriverConfig {
        let mut config = DriverConfig::default()
            .max_concurrency(self.max_concurrency)
            .retry(self.retry_policy());
        config.stop_after = self.stop_after;
        config.max_pages = self.max_pages;
        config.overall_timeout = self.overall_timeout_seconds.map(seconds);
        config
    }

}

fn check_seconds(field: &str, value: f64, allow_zero: bool) -> Result<()> {
    if !value.is_finite() || value < 0.0 || (!allow_zero && value == 0.0) {
        let bound = if allow_zero { "non-negative" } else { "positive" };
        return Err(Error::invalid_value(
            field,
            format!("must be a {bound} number of seconds, got {value}"),
        ));
    }
    Ok(())
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_backoff() -> f64 {
    0.5
}

fn default_max_backoff() -> f64 {
    30.0
}

fn default_max_concurrency() -> usize {
    8
}

fn default_timeout() -> f64 {
    30.0
}

fn default_page_size() -> u32 {
    100
}

fn default_rps() -> u32 {
    3
}

// ============================================================================
// Output Config
// ============================================================================

/// Parquet output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Target file; no file is written when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub compression: Compression,

    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            compression: Compression::default(),
            row_group_size: default_row_group_size(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.row_group_size == 0 {
            return Err(Error::invalid_value("output.row_group_size", "must be at least 1"));
        }
        if self.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(Error::invalid_value("output.path", "must not be empty"));
        }
        Ok(())
    }

    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::from(self.compression).with_row_group_size(self.row_group_size)
    }
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

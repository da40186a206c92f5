//! CLI commands and argument parsing

use crate::config::Settings;
use crate::types::{Compression, PaginationMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Azure retail prices fetcher
#[derive(Parser, Debug)]
#[command(name = "retail-prices")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for summaries
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page and optionally write a Parquet file
    Fetch(FetchArgs),

    /// Print the active column schema
    Schema,
}

/// Overrides for a fetch run; unset flags keep the settings file values
#[derive(Args, Debug, Default, Clone)]
pub struct FetchArgs {
    /// Parquet file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// OData filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Prices API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base backoff in seconds
    #[arg(long)]
    pub base_backoff: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long)]
    pub pagination: Option<PaginationMode>,

    /// Stop once this many rows are committed
    #[arg(long)]
    pub stop_after: Option<usize>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    pub overall_timeout: Option<f64>,

    #[arg(long)]
    pub compression: Option<Compression>,
}

impl FetchArgs {
    /// Apply the flags that were given on top of `settings`
    pub fn apply(&self, settings: &mut Settings) {
        let source = &mut settings.source;
        if let Some(endpoint) = &self.endpoint {
            source.endpoint.clone_from(endpoint);
        }
        if self.filter.is_some() {
            source.filter.clone_from(&self.filter);
        }

        let fetch = &mut settings.fetch;
        if let Some(n) = self.max_concurrency {
            fetch.max_concurrency = n;
        }
        if let Some(n) = self.max_retries {
            fetch.max_retries = n;
        }
        if let Some(secs) = self.base_backoff {
            fetch.base_backoff_seconds = secs;
            fetch.max_backoff_seconds = fetch.max_backoff_seconds.max(secs);
        }
        if let Some(secs) = self.timeout {
            fetch.timeout_seconds = secs;
        }
        if let Some(n) = self.page_size {
            fetch.page_size = n;
        }
        if let Some(mode) = self.pagination {
            fetch.pagination = mode;
        }
        if self.stop_after.is_some() {
            fetch.stop_after = self.stop_after;
        }
        if self.max_pages.is_some() {
            fetch.max_pages = self.max_pages;
        }
        if self.overall_timeout.is_some() {
            fetch.overall_timeout_seconds = self.overall_timeout;
        }

        let output = &mut settings.output;
        if self.output.is_some() {
            output.path.clone_from(&self.output);
        }
        if let Some(codec) = self.compression {
            output.compression = codec;
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

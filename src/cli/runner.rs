//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat};
use crate::config::Settings;
use crate::engine::{FetchReport, PaginationDriver};
use crate::error::{Error, Result};
use crate::fetch::HttpPageFetcher;
use crate::http::HttpClient;
use crate::output::persist;
use crate::pagination::create_paginator;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Every page was fetched and persisted
pub const EXIT_SUCCESS: i32 = 0;
/// Nothing was committed, or the configuration was rejected
pub const EXIT_FAILURE: i32 = 1;
/// Some pages were committed before the run aborted or halted
pub const EXIT_PARTIAL: i32 = 2;
/// The fetch completed but the table could not be written
pub const EXIT_PERSISTENCE: i32 = 3;

/// Process exit code for a failed run
pub fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Persistence { .. } => EXIT_PERSISTENCE,
        Error::Aborted { progress, .. } | Error::Halted { progress, .. }
            if progress.pages_committed > 0 =>
        {
            EXIT_PARTIAL
        }
        _ => EXIT_FAILURE,
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => {
                let cancel = CancellationToken::new();
                let interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted, cancelling fetch");
                        interrupt.cancel();
                    }
                });
                self.fetch(args, &cancel).await
            }
            Commands::Schema => self.schema(),
        }
    }

    /// Load settings from the config file, if any
    fn load_settings(&self) -> Result<Settings> {
        match &self.cli.config {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
        }
    }

    /// Fetch every page, then persist the table when an output path is set
    pub async fn fetch(&self, args: &FetchArgs, cancel: &CancellationToken) -> Result<()> {
        let mut settings = self.load_settings()?;
        args.apply(&mut settings);
        settings.validate()?;

        let client = Arc::new(HttpClient::with_config(settings.http_client_config())?);
        let fetcher = HttpPageFetcher::with_decoder(client, settings.decoder());
        let paginator = create_paginator(&settings.pagination_config())?;
        let driver = PaginationDriver::new(fetcher, paginator, settings.record_schema()?)
            .with_config(settings.fetch.driver_config());

        let outcome = driver.run(cancel).await?;

        let output = settings.output.path.as_ref();
        if let Some(path) = output {
            persist(&outcome.table, path, &settings.output.writer_config())?;
        } else {
            info!("No output path set, table kept in memory only");
        }

        self.output_message(&summary(
            &outcome.report,
            output.map(|p| p.display().to_string()),
        ));
        Ok(())
    }

    /// Print the active column schema
    fn schema(&self) -> Result<()> {
        let settings = self.load_settings()?;
        let schema = settings.record_schema()?;

        let columns: Vec<Value> = schema
            .columns()
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.column_name(),
                    "source": spec.source,
                    "type": spec.column_type.to_string(),
                    "required": spec.required,
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "SCHEMA",
            "schema": { "columns": columns }
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn summary(report: &FetchReport, output: Option<String>) -> Value {
    json!({
        "type": "SUMMARY",
        "summary": {
            "pages": report.pages_committed,
            "rows": report.rows_committed,
            "retries": report.retries,
            "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "output": output,
        }
    })
}

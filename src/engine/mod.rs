//! Execution engine module
//!
//! Drives a paginator to completion and assembles the result table.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PaginationDriver` - Walks the locator chain, fetching through the retry policy
//! - `DriverConfig` - Concurrency, limits and timeout for a run
//! - `FetchSession` / `FetchReport` - Per-page bookkeeping and the run summary
//!
//! Cursor pagination fetches one page at a time. Offset pagination keeps up
//! to `max_concurrency` pages in flight and parks completed pages in an
//! index-keyed buffer; pages are committed strictly in index order, so the
//! table never depends on completion order.
//!
//! A failed page surfaces once every lower page has been committed, so the
//! reported progress is always a prefix of the chain. Nothing is dispatched
//! after a failure.

mod types;

pub use types::{
    DriverConfig, DriverState, FetchOutcome, FetchReport, FetchSession, PageRecord, PageStatus,
};

use crate::error::{AbortCause, Error, Result};
use crate::fetch::PageFetcher;
use crate::output::TableAssembler;
use crate::pagination::{Page, PageLocator, Paginator};
use crate::retry::{Retried, RetryObserver, TracingRetryObserver};
use crate::schema::RecordSchema;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pagination driver
pub struct PaginationDriver<F: PageFetcher> {
    fetcher: F,
    paginator: Box<dyn Paginator>,
    schema: RecordSchema,
    config: DriverConfig,
    observer: Arc<dyn RetryObserver>,
}

impl<F: PageFetcher> PaginationDriver<F> {
    /// Create a driver with default configuration
    pub fn new(fetcher: F, paginator: Box<dyn Paginator>, schema: RecordSchema) -> Self {
        Self {
            fetcher,
            paginator,
            schema,
            config: DriverConfig::default(),
            observer: Arc::new(TracingRetryObserver),
        }
    }

    /// Set driver configuration
    #[must_use]
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the retry observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run to completion
    ///
    /// Fails with [`Error::Aborted`] on cancellation, timeout or retry
    /// exhaustion and with [`Error::Halted`] on fatal fetch errors and schema
    /// violations. Both carry the progress committed before the failure.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<FetchOutcome> {
        let started = Instant::now();
        let token = cancel.child_token();
        let prefetch = self.paginator.mode().allows_prefetch();
        let width = if prefetch {
            self.config.max_concurrency.max(1)
        } else {
            1
        };

        let mut run = RunState::new(&self.schema, &self.config, self.paginator.as_ref());
        info!(
            "Fetching {} ({} pagination, up to {} pages in flight)",
            self.paginator.first().url,
            self.paginator.mode(),
            width
        );

        let deadline = async {
            match self.config.overall_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut in_flight = FuturesUnordered::new();
        let mut last_report = Instant::now();

        loop {
            if let Err(e) = run.release() {
                return Err(run.fail(e));
            }
            if run.finished() {
                break;
            }

            while in_flight.len() < width {
                let Some(locator) = run.next_locator(in_flight.is_empty()) else {
                    break;
                };
                in_flight.push(self.fetch_page(locator, &token));
            }
            if in_flight.is_empty() {
                break;
            }
            if last_report.elapsed() >= self.config.progress_interval {
                let progress = run.assembler.progress();
                info!(
                    "Running {} concurrent API calls, got {} rows from {} pages",
                    in_flight.len(),
                    progress.rows_committed,
                    progress.pages_committed
                );
                last_report = Instant::now();
            }

            let (locator, outcome) = tokio::select! {
                biased;
                () = token.cancelled() => return Err(run.fail(Error::Cancelled)),
                () = &mut deadline => {
                    token.cancel();
                    return Err(run.abort(AbortCause::TimedOut));
                }
                Some(done) = in_flight.next() => done,
            };
            run.record(&locator, outcome);
        }

        run.session.transition(DriverState::Done);
        let progress = run.assembler.progress();
        let table = run.assembler.finalize()?;
        let report = FetchReport {
            pages_committed: progress.pages_committed,
            rows_committed: progress.rows_committed,
            retries: run.session.retries(),
            elapsed: started.elapsed(),
        };
        info!("Fetched {}", report);

        Ok(FetchOutcome {
            table,
            report,
            session: run.session,
        })
    }

    async fn fetch_page(
        &self,
        locator: PageLocator,
        cancel: &CancellationToken,
    ) -> (PageLocator, Result<Retried<Page>>) {
        let label = format!("page {}", locator.index);
        let outcome = self
            .config
            .retry
            .run(
                &label,
                || self.fetcher.fetch(&locator),
                cancel,
                self.observer.as_ref(),
            )
            .await;
        (locator, outcome)
    }
}

/// Mutable state of one run
struct RunState<'a> {
    schema: &'a RecordSchema,
    config: &'a DriverConfig,
    paginator: &'a dyn Paginator,
    session: FetchSession,
    assembler: TableAssembler,
    /// Fetched pages waiting for their turn
    ready: BTreeMap<usize, Page>,
    /// Failed pages waiting for their turn
    failed: BTreeMap<usize, Error>,
    /// Index of the terminal page, once known
    end: Option<usize>,
    /// Next index to dispatch
    next_index: usize,
    /// Next cursor locator (cursor pagination)
    cursor: Option<PageLocator>,
    /// Set when the run should end at the next check
    stopped: bool,
}

impl<'a> RunState<'a> {
    fn new(
        schema: &'a RecordSchema,
        config: &'a DriverConfig,
        paginator: &'a dyn Paginator,
    ) -> Self {
        Self {
            schema,
            config,
            paginator,
            session: FetchSession::new(),
            assembler: TableAssembler::new(schema.clone()),
            ready: BTreeMap::new(),
            failed: BTreeMap::new(),
            end: None,
            next_index: 0,
            cursor: (!paginator.mode().allows_prefetch()).then(|| paginator.first()),
            stopped: false,
        }
    }

    fn limit_reached(&self) -> bool {
        self.config
            .stop_after
            .is_some_and(|limit| self.assembler.progress().rows_committed >= limit)
    }

    fn finished(&self) -> bool {
        self.stopped
            || self
                .end
                .is_some_and(|end| self.assembler.next_index() > end)
    }

    /// Locator to dispatch next, if any
    fn next_locator(&mut self, idle: bool) -> Option<PageLocator> {
        if self.stopped || !self.failed.is_empty() || self.limit_reached() {
            return None;
        }
        let index = self.next_index;
        if self.end.is_some_and(|end| index > end)
            || self.config.max_pages.is_some_and(|max| index >= max)
        {
            return None;
        }

        let locator = if self.paginator.mode().allows_prefetch() {
            self.paginator.locator_for(index)?
        } else if idle {
            self.cursor.take()?
        } else {
            return None;
        };

        self.next_index += 1;
        self.session.requested(index, &locator.url);
        Some(locator)
    }

    /// Book a finished fetch
    fn record(&mut self, locator: &PageLocator, outcome: Result<Retried<Page>>) {
        let index = locator.index;
        let beyond_end = self.end.is_some_and(|end| index > end);

        match outcome {
            Ok(retried) => {
                self.session.completed(index, retried.attempts);
                if beyond_end {
                    debug!("Discarding page {} past the final page", index);
                    return;
                }
                let page = retried.value;
                if page.is_terminal() {
                    self.set_end(index);
                }
                self.ready.insert(index, page);
            }
            Err(error) => {
                let attempts = match &error {
                    Error::RetriesExhausted { attempts, .. } => *attempts,
                    _ => 1,
                };
                self.session.failed(index, attempts);
                if beyond_end {
                    return;
                }
                debug!("Page {} failed: {}", index, error);
                self.failed.insert(index, error);
            }
        }
    }

    fn set_end(&mut self, index: usize) {
        let end = self.end.map_or(index, |e| e.min(index));
        self.end = Some(end);
        self.ready.retain(|&i, _| i <= end);
        self.failed.retain(|&i, _| i <= end);
    }

    /// Commit every page that is next in line
    fn release(&mut self) -> Result<()> {
        loop {
            let index = self.assembler.next_index();
            if self.end.is_some_and(|end| index > end) {
                return Ok(());
            }

            if let Some(page) = self.ready.remove(&index) {
                let rows = self.schema.normalize_page(&page.items)?;
                let count = rows.len();
                self.assembler.append_page(index, rows)?;
                debug!("Committed page {} ({} rows)", index, count);

                if !self.paginator.mode().allows_prefetch() {
                    self.cursor = self.paginator.next(&page)?;
                }
                continue;
            }

            if let Some(error) = self.failed.remove(&index) {
                if self.limit_reached() {
                    debug!("Ignoring failed page {} past the row limit", index);
                    self.stopped = true;
                    return Ok(());
                }
                return Err(error);
            }

            return Ok(());
        }
    }

    /// Wrap an error that ends the run with the committed progress
    fn fail(&mut self, error: Error) -> Error {
        match error {
            Error::RetriesExhausted {
                attempts,
                last_error,
            } => self.abort(AbortCause::RetriesExhausted {
                attempts,
                last_error,
            }),
            Error::Cancelled => self.abort(AbortCause::Cancelled),
            other => {
                self.session.transition(DriverState::Aborted);
                let err = Error::Halted {
                    progress: self.assembler.progress(),
                    source: Box::new(other),
                };
                warn!("{}", err);
                err
            }
        }
    }

    fn abort(&mut self, cause: AbortCause) -> Error {
        self.session.transition(DriverState::Aborted);
        let err = Error::Aborted {
            progress: self.assembler.progress(),
            cause,
        };
        warn!("{}", err);
        err
    }
}

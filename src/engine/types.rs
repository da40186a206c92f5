//! Engine types
//!
//! Driver configuration, state machine, per-run bookkeeping and run report.

use crate::output::ResultTable;
use crate::retry::RetryPolicy;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Configuration for the pagination driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Pages in flight at once (offset pagination only)
    pub max_concurrency: usize,
    /// Retry policy wrapped around every fetch
    pub retry: RetryPolicy,
    /// Stop dispatching once this many rows are committed
    pub stop_after: Option<usize>,
    /// Never dispatch more than this many pages
    pub max_pages: Option<usize>,
    /// Abort the run after this long
    pub overall_timeout: Option<Duration>,
    /// Minimum gap between progress log lines
    pub progress_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            retry: RetryPolicy::default(),
            stop_after: None,
            max_pages: None,
            overall_timeout: None,
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl DriverConfig {
    /// Set max concurrency
    #[must_use]
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Set retry policy
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the row limit
    #[must_use]
    pub fn stop_after(mut self, rows: usize) -> Self {
        self.stop_after = Some(rows);
        self
    }

    /// Set the page limit
    #[must_use]
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Set the overall timeout
    #[must_use]
    pub fn overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    /// Set the progress log interval
    #[must_use]
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Pagination driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Fetching { index: usize },
    Fetched { index: usize },
    Failed { index: usize },
    Done,
    Aborted,
}

impl DriverState {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching { index } => write!(f, "fetching page {index}"),
            Self::Fetched { index } => write!(f, "fetched page {index}"),
            Self::Failed { index } => write!(f, "failed page {index}"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Fetch status of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Requested,
    Completed,
    Failed,
}

/// Bookkeeping for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    pub attempts: u32,
    pub status: PageStatus,
}

/// Per-run record of every requested page
///
/// Only the driver mutates a session.
#[derive(Debug, Clone, Default)]
pub struct FetchSession {
    pages: BTreeMap<usize, PageRecord>,
    state: DriverState,
    retries: u32,
}

impl FetchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn page(&self, index: usize) -> Option<&PageRecord> {
        self.pages.get(&index)
    }

    /// Every requested page, by index
    pub fn pages(&self) -> &BTreeMap<usize, PageRecord> {
        &self.pages
    }

    /// Retries across all pages
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Number of pages with the given status
    pub fn count(&self, status: PageStatus) -> usize {
        self.pages.values().filter(|p| p.status == status).count()
    }

    pub(crate) fn transition(&mut self, state: DriverState) {
        trace!("Driver {} -> {}", self.state, state);
        self.state = state;
    }

    pub(crate) fn requested(&mut self, index: usize, url: &str) {
        self.pages.insert(
            index,
            PageRecord {
                url: url.to_string(),
                attempts: 0,
                status: PageStatus::Requested,
            },
        );
        self.transition(DriverState::Fetching { index });
    }

    pub(crate) fn completed(&mut self, index: usize, attempts: u32) {
        self.finish(index, attempts, PageStatus::Completed);
        self.transition(DriverState::Fetched { index });
    }

    pub(crate) fn failed(&mut self, index: usize, attempts: u32) {
        self.finish(index, attempts, PageStatus::Failed);
        self.transition(DriverState::Failed { index });
    }

    fn finish(&mut self, index: usize, attempts: u32, status: PageStatus) {
        self.retries += attempts.saturating_sub(1);
        if let Some(page) = self.pages.get_mut(&index) {
            page.attempts = attempts;
            page.status = status;
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    pub pages_committed: usize,
    pub rows_committed: usize,
    pub retries: u32,
    pub elapsed: Duration,
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows from {} pages in {:.2?} ({} retries)",
            self.rows_committed, self.pages_committed, self.elapsed, self.retries
        )
    }
}

/// Everything a successful run produces
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub table: ResultTable,
    pub report: FetchReport,
    pub session: FetchSession,
}

//! Retry event reporting

use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A retry decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// Attempt number `attempt` failed transiently; the next starts after `delay`
    Retrying {
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// Succeeded after at least one retry
    Recovered { attempts: u32 },
    /// Retries exhausted
    GaveUp { attempts: u32, error: String },
}

/// Receives every retry decision made by a [`super::RetryPolicy`]
///
/// `label` names the operation being retried, e.g. `page 3`.
pub trait RetryObserver: Send + Sync {
    fn on_event(&self, label: &str, event: &RetryEvent);
}

/// Logs retry events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRetryObserver;

impl RetryObserver for TracingRetryObserver {
    fn on_event(&self, label: &str, event: &RetryEvent) {
        match event {
            RetryEvent::Retrying {
                attempt,
                delay,
                error,
            } => {
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    label, attempt, delay, error
                );
            }
            RetryEvent::Recovered { attempts } => {
                info!("{} recovered after {} attempts", label, attempts);
            }
            RetryEvent::GaveUp { attempts, error } => {
                debug!("{} gave up after {} attempts: {}", label, attempts, error);
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingRetryObserver {
    events: Mutex<Vec<(String, RetryEvent)>>,
}

impl RecordingRetryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded `(label, event)` pairs
    pub fn events(&self) -> Vec<(String, RetryEvent)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of `Retrying` events seen
    pub fn retry_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|(_, e)| matches!(e, RetryEvent::Retrying { .. }))
            .count()
    }
}

impl RetryObserver for RecordingRetryObserver {
    fn on_event(&self, label: &str, event: &RetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((label.to_string(), event.clone()));
        }
    }
}

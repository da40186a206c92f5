//! Retry module
//!
//! Wraps single-attempt operations with bounded retry on transient failures.
//!
//! Delays grow as `min(base * 2^attempt, max_backoff)` plus an optional
//! uniform jitter in `[0, base)`. Every decision is reported to a
//! [`RetryObserver`]; the policy itself never logs.

mod observer;
mod policy;

pub use observer::{RecordingRetryObserver, RetryEvent, RetryObserver, TracingRetryObserver};
pub use policy::{Retried, RetryPolicy};

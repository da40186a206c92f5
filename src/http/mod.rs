//! HTTP transport module
//!
//! Provides a pooled HTTP client with client-side rate limiting.
//!
//! # Features
//!
//! - **Single Attempt**: Each call issues one request; retries live in [`crate::retry`]
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Failure Classification**: Timeouts, connection errors, 429 and 5xx are
//!   transient; every other non-success status is fatal

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;

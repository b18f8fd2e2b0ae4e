//! HTTP client module
//!
//! Provides HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Transient statuses and timeouts are retried with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Bearer Auth**: Every request carries the configured credential
//! - **Classification**: 401 becomes an auth failure, never retried

mod client;
mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestOptions};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;

#[cfg(test)]
mod tests;

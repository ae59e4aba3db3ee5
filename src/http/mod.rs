//! HTTP client module
//!
//! Transport for data page requests.
//!
//! # Features
//!
//! - **Automatic Retries**: timeouts, connection errors, 429 and 5xx are retried
//! - **Backoff Strategies**: constant, linear and exponential backoff
//! - **Rate Limiting**: optional token bucket limiter using governor
//! - **Retry Accounting**: every response reports how many retries it took

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, HttpResponse, RequestConfig};
pub use rate_limit::RateLimiter;

#[cfg(test)]
mod tests;

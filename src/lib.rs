// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-chargebacks
//!
//! Paginated extraction of the `chargebacks` and `alerts` resources of the
//! CB Response Services API.
//!
//! ## Features
//!
//! - **Bearer Auth**: tokens from `GET <base>/auth`, fresh per page or cached with a TTL
//! - **Two Pagination Policies**: empty-page termination and page metadata termination
//! - **Loop Guard**: page ceiling and cursor advancement checks
//! - **Retries**: backoff on timeouts, connection errors, 429 and 5xx
//! - **Lazy Streams**: pages are fetched only as records are pulled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use tap_chargebacks::{streams, SyncEngine, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_chargebacks::Result<()> {
//!     let config = TapConfig::new("user", "password", "merchant")
//!         .with_start_date("2024-01-01T00:00:00Z");
//!     let engine = SyncEngine::new(config);
//!
//!     let mut records = engine.extract(&streams::chargebacks())?;
//!     while let Some(record) = records.next().await {
//!         println!("{}", serde_json::to_string(&record?.data)?);
//!     }
//!     println!("{:?}", records.stats());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              SyncEngine::extract(resource) → RecordStream       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │  Request  │   Paginate    │   HTTP    │   Decode    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Basic →  │ page      │ Empty page    │ Retry     │ Record path │
//! │ Bearer   │ start_date│ Page metadata │ Backoff   │ JSONPath    │
//! │ TTL cache│ limit     │ Loop guard    │ Rate Limit│             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Bearer token authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination policies and loop guard
pub mod pagination;

/// Record location in response bodies
pub mod decode;

/// Page request construction
pub mod request;

/// Stream catalog
pub mod streams;

/// Extraction engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::TapConfig;
pub use engine::{RecordStream, SyncEngine, SyncStats};
pub use error::{Error, Result};
pub use streams::ResourceConfig;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

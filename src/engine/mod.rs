//! Execution engine module
//!
//! Extraction loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Starts one sync session per resource
//! - `RecordStream` - Lazy stream of the records of one session
//! - `SyncStats` - Request, page, record and retry counters

mod session;
mod types;

pub use types::{RecordStream, SyncStats};

use crate::auth::Authenticator;
use crate::config::TapConfig;
use crate::decode::RecordLocator;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::PaginationState;
use crate::request::RequestBuilder;
use crate::streams::ResourceConfig;
use futures::stream::{self, StreamExt};
use session::SyncSession;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::info;
use types::StatsHandle;

/// Sync engine for orchestrating data extraction
#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: TapConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(config: TapConfig) -> Self {
        Self { config }
    }

    /// Get the tap configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Start extracting a resource from page 1.
    ///
    /// Configuration problems are reported here, before any network call.
    /// Everything else surfaces as an item of the returned stream.
    pub fn extract(&self, resource: &ResourceConfig) -> Result<RecordStream> {
        let requests = RequestBuilder::from_config(&self.config)?;
        requests.check(resource)?;
        let locator = RecordLocator::new(&resource.records_path)?;

        let client = HttpClient::with_config(self.config.http_config())?;
        let authenticator = Authenticator::with_client(
            &self.config.base_url,
            self.config.credential(),
            self.config.token_policy(),
            client.inner().clone(),
        );

        info!(
            stream = %resource.name,
            pagination = resource.pagination.name(),
            "Starting sync"
        );

        let stats = StatsHandle::default();
        let session = SyncSession {
            resource: resource.clone(),
            authenticator,
            client,
            requests,
            locator,
            guard: self.config.loop_guard(),
            state: PaginationState::new(),
            buffer: VecDeque::new(),
            stats: stats.clone(),
            started: Instant::now(),
        };

        let inner = stream::try_unfold(session, |mut session| async move {
            let record = session.next_record().await?;
            Ok::<_, Error>(record.map(|record| (record, session)))
        });

        Ok(RecordStream::new(&resource.name, inner.boxed(), stats))
    }

    /// Verify the credential by fetching one token
    pub async fn check(&self) -> Result<()> {
        let authenticator = Authenticator::new(
            &self.config.base_url,
            self.config.credential(),
            self.config.token_policy(),
        );
        authenticator.fetch_token().await?;
        Ok(())
    }
}

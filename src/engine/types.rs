//! Engine types
//!
//! Sync statistics and the lazy record stream handed to callers.

use crate::error::Result;
use crate::types::Record;
use futures::stream::{BoxStream, Stream};
use pin_project_lite::pin_project;
use serde::Serialize;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Data requests issued (retries not included)
    pub requests: u64,
    /// Pages whose records were accepted for emission
    pub pages: u64,
    /// Records handed to the consumer
    pub records: u64,
    /// Retries needed by each data request, in request order
    pub page_retries: Vec<u32>,
    /// Duration in milliseconds, set when the sync ends
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a data request
    pub fn add_request(&mut self) {
        self.requests += 1;
    }

    /// Record the retries one data request needed
    pub fn add_retries(&mut self, retries: u32) {
        self.page_retries.push(retries);
    }

    /// Count a completed page
    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// Count an emitted record
    pub fn add_record(&mut self) {
        self.records += 1;
    }

    /// Retries across all data requests
    pub fn total_retries(&self) -> u64 {
        self.page_retries.iter().map(|&r| u64::from(r)).sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Shared handle to the live statistics of one session
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsHandle(Arc<Mutex<SyncStats>>);

impl StatsHandle {
    pub(crate) fn update(&self, f: impl FnOnce(&mut SyncStats)) {
        let mut stats = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }

    pub(crate) fn snapshot(&self) -> SyncStats {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pin_project! {
    /// Lazily produced records of one resource.
    ///
    /// Pages are fetched only as records are pulled. The stream ends after
    /// the last page or right after yielding the first error.
    pub struct RecordStream {
        #[pin]
        inner: BoxStream<'static, Result<Record>>,
        stream: String,
        stats: StatsHandle,
    }
}

impl RecordStream {
    pub(crate) fn new(
        stream: impl Into<String>,
        inner: BoxStream<'static, Result<Record>>,
        stats: StatsHandle,
    ) -> Self {
        Self {
            inner,
            stream: stream.into(),
            stats,
        }
    }

    /// Name of the stream being extracted
    pub fn stream_name(&self) -> &str {
        &self.stream
    }

    /// Snapshot of the session counters, valid during and after iteration
    pub fn stats(&self) -> SyncStats {
        self.stats.snapshot()
    }
}

impl Stream for RecordStream {
    type Item = Result<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("stream", &self.stream)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

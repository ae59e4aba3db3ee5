//! One extraction of one resource
//!
//! The session owns the cursor, the loop guard and the page buffer. Pages are
//! fetched one at a time and only once the previous page's records have all
//! been pulled.

use super::types::StatsHandle;
use crate::auth::Authenticator;
use crate::decode::RecordLocator;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::pagination::{LoopGuard, NextPage, PaginationState};
use crate::request::RequestBuilder;
use crate::streams::ResourceConfig;
use crate::types::{JsonObject, Record};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info, warn};

pub(crate) struct SyncSession {
    pub(crate) resource: ResourceConfig,
    pub(crate) authenticator: Authenticator,
    pub(crate) client: HttpClient,
    pub(crate) requests: RequestBuilder,
    pub(crate) locator: RecordLocator,
    pub(crate) guard: LoopGuard,
    pub(crate) state: PaginationState,
    pub(crate) buffer: VecDeque<Record>,
    pub(crate) stats: StatsHandle,
    pub(crate) started: Instant,
}

impl SyncSession {
    /// Pull the next record, fetching pages as needed
    pub(crate) async fn next_record(&mut self) -> Result<Option<Record>> {
        match self.advance().await {
            Ok(record) => Ok(record),
            Err(e) => {
                let pages = self.stats.snapshot().pages;
                self.finish();
                warn!(
                    stream = %self.resource.name,
                    pages,
                    error = %e,
                    "Sync failed"
                );
                Err(Error::stream_failed(&self.resource.name, pages, e))
            }
        }
    }

    async fn advance(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.stats.update(|s| s.add_record());
                return Ok(Some(record));
            }

            if self.state.done {
                self.finish();
                let stats = self.stats.snapshot();
                info!(
                    stream = %self.resource.name,
                    requests = stats.requests,
                    pages = stats.pages,
                    records = stats.records,
                    retries = stats.total_retries(),
                    duration_ms = stats.duration_ms,
                    "Sync complete"
                );
                return Ok(None);
            }

            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        self.guard.check_before_request(self.state.pages_fetched)?;

        let requested = self.state.current_page();
        let token = self.authenticator.bearer_token().await?;
        let (url, config) = self
            .requests
            .build(&self.resource, self.state.cursor, &token)?
            .into_parts();

        debug!(stream = %self.resource.name, page = requested, "Requesting page");
        self.stats.update(|s| s.add_request());

        let HttpResponse { response, retries } = self.client.get(&url, config).await?;
        self.stats.update(|s| s.add_retries(retries));

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            Error::schema(
                self.locator.path(),
                format!("response body is not valid JSON: {e}"),
            )
        })?;

        let records = self
            .locator
            .locate(&body)?
            .into_iter()
            .map(|data| self.to_record(data))
            .collect::<Result<Vec<_>>>()?;
        let count = records.len();
        self.state.add_page(count);

        debug!(
            stream = %self.resource.name,
            page = requested,
            records = count,
            retries,
            "Fetched page"
        );

        if count == 0 && self.state.pages_fetched == 1 {
            info!(
                stream = %self.resource.name,
                "First page returned no records, pagination stopped with zero pages of data"
            );
            self.state.mark_done();
            return Ok(());
        }

        let next = self
            .resource
            .pagination
            .next_page(&body, count, &self.state)?;

        if self.guard.check_advance(requested, &next)? {
            if count > 0 {
                self.stats.update(|s| s.add_page());
                self.buffer.extend(records);
            }
        } else {
            debug!(
                stream = %self.resource.name,
                page = requested,
                "Skipping records of a page that did not advance the cursor"
            );
        }

        match next {
            NextPage::Continue { page } => self.state.advance(page),
            NextPage::Done => self.state.mark_done(),
        }

        Ok(())
    }

    /// Wrap an object as a record, checking it carries every primary key
    fn to_record(&self, data: JsonObject) -> Result<Record> {
        for key in &self.resource.primary_keys {
            if data.get(key).map_or(true, Value::is_null) {
                return Err(Error::schema(
                    format!("{}.{key}", self.locator.path()),
                    "record is missing its primary key",
                ));
            }
        }
        Ok(Record::new(&self.resource.name, data))
    }

    fn finish(&mut self) {
        self.state.mark_done();
        self.buffer.clear();
        let elapsed = self.started.elapsed().as_millis() as u64;
        self.stats.update(|s| s.set_duration(elapsed));
    }
}

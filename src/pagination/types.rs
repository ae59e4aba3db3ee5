//! Pagination types
//!
//! Defines the page-advance result, the per-session pagination state and the
//! loop guard shared by every pagination policy.

use crate::error::{Error, Result};
use tracing::warn;

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available, request this page number next
    Continue {
        /// 1-based page number to request
        page: u32,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation to the given page
    pub fn page(page: u32) -> Self {
        Self::Continue { page }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks pagination state during one sync session
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Page to request next. `None` means the implicit first page, which is
    /// requested without a page parameter.
    pub cursor: Option<u32>,
    /// Pages fetched so far
    pub pages_fetched: u64,
    /// Records seen so far
    pub records_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state positioned on the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// The page number the cursor points at
    pub fn current_page(&self) -> u32 {
        self.cursor.unwrap_or(1)
    }

    /// Record a fetched page and its record count
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.records_fetched += records as u64;
    }

    /// Move the cursor to a new page
    pub fn advance(&mut self, page: u32) {
        self.cursor = Some(page);
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}

/// Guards a sync session against runaway pagination.
///
/// Enforces a hard ceiling on the number of pages and requires the cursor to
/// move strictly forward. A limited number of consecutive stalls is tolerated
/// before the session is aborted.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    max_pages: u64,
    max_stalled_pages: u32,
    stalled: u32,
}

impl LoopGuard {
    /// Create a guard
    pub fn new(max_pages: u64, max_stalled_pages: u32) -> Self {
        Self {
            max_pages,
            max_stalled_pages,
            stalled: 0,
        }
    }

    /// Maximum number of pages a session may fetch
    pub fn max_pages(&self) -> u64 {
        self.max_pages
    }

    /// Consecutive stalls seen so far
    pub fn stalled(&self) -> u32 {
        self.stalled
    }

    /// Check the page ceiling before issuing a request
    pub fn check_before_request(&self, pages_fetched: u64) -> Result<()> {
        if pages_fetched >= self.max_pages {
            return Err(Error::pagination(format!(
                "page limit of {} reached without the server signalling the last page",
                self.max_pages
            )));
        }
        Ok(())
    }

    /// Check that `next` moves past the page just requested.
    ///
    /// Returns `Ok(true)` when the cursor advanced (or pagination is done)
    /// and `Ok(false)` for a tolerated stall.
    pub fn check_advance(&mut self, requested: u32, next: &NextPage) -> Result<bool> {
        match *next {
            NextPage::Done => {
                self.stalled = 0;
                Ok(true)
            }
            NextPage::Continue { page } if page > requested => {
                self.stalled = 0;
                Ok(true)
            }
            NextPage::Continue { page } => {
                self.stalled += 1;
                if self.stalled > self.max_stalled_pages {
                    return Err(Error::pagination(format!(
                        "cursor did not advance past page {requested} (next page {page}) \
                         for {} consecutive pages",
                        self.stalled
                    )));
                }
                warn!(
                    requested,
                    next = page,
                    stalled = self.stalled,
                    "Pagination cursor did not advance"
                );
                Ok(false)
            }
        }
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(10_000, 2)
    }
}

//! Pagination policies
//!
//! Each resource selects one policy when its session is created. The policy
//! inspects a decoded page and decides which page comes next.

use super::types::{NextPage, PaginationState};
use crate::error::{Error, Result};
use serde_json::Value;

/// Default path of the current page number in a metadata-paginated body
pub const DEFAULT_CURRENT_PAGE_PATH: &str = "pagination.current_page";
/// Default path of the total page count in a metadata-paginated body
pub const DEFAULT_TOTAL_PAGES_PATH: &str = "pagination.total_pages";

/// How a resource advances through its pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Pagination {
    /// Keep requesting the next page number until a page comes back empty
    #[default]
    EmptyPage,

    /// Follow the `current_page` / `total_pages` pair carried in the body
    PageMetadata {
        /// Dotted path to the current page number
        current_page_path: String,
        /// Dotted path to the total page count
        total_pages_path: String,
    },
}

impl Pagination {
    /// Count-terminated pagination
    pub fn empty_page() -> Self {
        Self::EmptyPage
    }

    /// Metadata pagination using the default `pagination.*` paths
    pub fn page_metadata() -> Self {
        Self::page_metadata_at(DEFAULT_CURRENT_PAGE_PATH, DEFAULT_TOTAL_PAGES_PATH)
    }

    /// Metadata pagination reading the page pair from custom paths
    pub fn page_metadata_at(
        current_page_path: impl Into<String>,
        total_pages_path: impl Into<String>,
    ) -> Self {
        Self::PageMetadata {
            current_page_path: current_page_path.into(),
            total_pages_path: total_pages_path.into(),
        }
    }

    /// Short policy name used in logs and the catalog
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmptyPage => "empty_page",
            Self::PageMetadata { .. } => "page_metadata",
        }
    }

    /// Decide what follows the page described by `state`.
    ///
    /// `records_on_page` is the number of records located in `body`. An empty
    /// page always ends pagination.
    pub fn next_page(
        &self,
        body: &Value,
        records_on_page: usize,
        state: &PaginationState,
    ) -> Result<NextPage> {
        if records_on_page == 0 {
            return Ok(NextPage::Done);
        }

        match self {
            Self::EmptyPage => {
                let page = state.current_page();
                let next = page.checked_add(1).ok_or_else(|| {
                    Error::pagination(format!("page number overflow after page {page}"))
                })?;
                Ok(NextPage::page(next))
            }
            Self::PageMetadata {
                current_page_path,
                total_pages_path,
            } => {
                let current = read_page_number(body, current_page_path)?;
                let total = read_page_number(body, total_pages_path)?;

                if current >= total {
                    return Ok(NextPage::Done);
                }

                let next = current.checked_add(1).ok_or_else(|| {
                    Error::pagination(format!("page number overflow after page {current}"))
                })?;
                Ok(NextPage::page(next))
            }
        }
    }
}

/// Read a non-negative integer page number at a dotted path
fn read_page_number(body: &Value, path: &str) -> Result<u32> {
    let value = lookup(body, path)
        .ok_or_else(|| Error::schema(path, "pagination metadata is missing"))?;

    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            Error::schema(
                path,
                format!("pagination metadata is not a page number: {value}"),
            )
        })
}

fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    path.split('.')
        .try_fold(body, |current, part| current.as_object()?.get(part))
}

//! Pagination module
//!
//! Supports: empty-page termination, page metadata termination
//!
//! # Overview
//!
//! Each resource picks a [`Pagination`] policy. After every page the policy
//! reports the next page number or that the resource is exhausted, and the
//! [`LoopGuard`] verifies the cursor keeps moving forward within a page
//! ceiling.

mod strategies;
mod types;

pub use strategies::{Pagination, DEFAULT_CURRENT_PAGE_PATH, DEFAULT_TOTAL_PAGES_PATH};
pub use types::{LoopGuard, NextPage, PaginationState};

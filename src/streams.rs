//! Stream catalog
//!
//! Static definitions of the two resources the tap extracts.

use crate::error::{Error, Result};
use crate::pagination::Pagination;
use serde::Serialize;

/// Client segment of every resource path
pub const CLIENT_SEGMENT: &str = "FIXD_Automotive_Inc";

/// Records requested per chargebacks page
pub const CHARGEBACKS_PAGE_SIZE: u32 = 100;

/// Where both resources keep their records
pub const DEFAULT_RECORDS_PATH: &str = "$[data][*]";

/// Definition of one extractable resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConfig {
    /// Stream name
    pub name: String,
    /// Path below the API root, starting with `/`
    pub path: String,
    /// Fields that identify a record
    pub primary_keys: Vec<String>,
    /// Field to order incremental syncs by
    pub replication_key: Option<String>,
    /// Location of the records in a page body
    pub records_path: String,
    /// Page-advance policy
    #[serde(skip)]
    pub pagination: Pagination,
    /// Send the configured start date as a filter
    pub filter_by_start_date: bool,
    /// Fixed page size sent as `limit`
    pub page_size: Option<u32>,
}

impl ResourceConfig {
    /// Create a resource with `id` as primary key and count-terminated pagination
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            primary_keys: vec!["id".to_string()],
            replication_key: None,
            records_path: DEFAULT_RECORDS_PATH.to_string(),
            pagination: Pagination::default(),
            filter_by_start_date: false,
            page_size: None,
        }
    }

    /// Set the record path
    #[must_use]
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    /// Set the pagination policy
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// Require and send the configured start date
    #[must_use]
    pub fn filtered_by_start_date(mut self) -> Self {
        self.filter_by_start_date = true;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

fn resource_path(resource: &str) -> String {
    format!("/clients/{CLIENT_SEGMENT}/{resource}")
}

/// The chargebacks resource: filtered by start date, ends on an empty page
pub fn chargebacks() -> ResourceConfig {
    ResourceConfig::new("chargebacks", resource_path("chargebacks"))
        .with_pagination(Pagination::empty_page())
        .filtered_by_start_date()
        .with_page_size(CHARGEBACKS_PAGE_SIZE)
}

/// The alerts resource: paginated by body metadata
pub fn alerts() -> ResourceConfig {
    ResourceConfig::new("alerts", resource_path("alerts"))
        .with_pagination(Pagination::page_metadata())
}

/// All resources in sync order
pub fn catalog() -> Vec<ResourceConfig> {
    vec![alerts(), chargebacks()]
}

/// Look up a resource by stream name
pub fn find_stream(name: &str) -> Result<ResourceConfig> {
    catalog()
        .into_iter()
        .find(|resource| resource.name == name)
        .ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
}

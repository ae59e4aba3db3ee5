//! Page request construction
//!
//! Turns a resource, a page cursor and the configured filters into the URL,
//! query parameters and headers of one data request.

use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::streams::ResourceConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// One fully built data request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Absolute URL of the resource
    pub url: String,
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
}

impl PageRequest {
    /// Split into the URL and the HTTP client's per-request settings
    pub fn into_parts(self) -> (String, RequestConfig) {
        let config = self
            .query
            .into_iter()
            .fold(RequestConfig::new(), |config, (k, v)| config.query(k, v));
        let config = self
            .headers
            .into_iter()
            .fold(config, |config, (k, v)| config.header(k, v));
        (self.url, config)
    }
}

/// Builds page requests for any resource from the tap-wide filters
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    start_date: Option<DateTime<Utc>>,
    user_agent: Option<String>,
}

impl RequestBuilder {
    /// Create a builder for an API root
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            start_date: None,
            user_agent: None,
        }
    }

    /// Create a builder from the tap configuration
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            start_date: config.start_date()?,
            user_agent: config.user_agent(),
        })
    }

    /// Set the start date filter
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Check that every filter the resource needs is configured
    pub fn check(&self, resource: &ResourceConfig) -> Result<()> {
        if resource.filter_by_start_date && self.start_date.is_none() {
            return Err(Error::config(format!(
                "stream '{}' requires 'start_date' to be configured",
                resource.name
            )));
        }
        Ok(())
    }

    /// Build the request for one page.
    ///
    /// `cursor` is `None` for the first page, which is requested without a
    /// page parameter.
    pub fn build(
        &self,
        resource: &ResourceConfig,
        cursor: Option<u32>,
        token: &str,
    ) -> Result<PageRequest> {
        self.check(resource)?;

        let mut query = BTreeMap::new();

        if let Some(page) = cursor {
            query.insert("page".to_string(), page.to_string());
        }

        if resource.filter_by_start_date {
            if let Some(start_date) = self.start_date {
                query.insert(
                    "start_date".to_string(),
                    start_date.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
        }

        if let Some(key) = &resource.replication_key {
            query.insert("sort".to_string(), "asc".to_string());
            query.insert("order_by".to_string(), key.clone());
        }

        if let Some(limit) = resource.page_size {
            query.insert("limit".to_string(), limit.to_string());
        }

        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        if let Some(user_agent) = &self.user_agent {
            headers.insert("User-Agent".to_string(), user_agent.clone());
        }

        Ok(PageRequest {
            url: format!("{}{}", self.base_url, resource.path),
            query,
            headers,
        })
    }
}

//! Tap configuration
//!
//! The configuration is supplied as a JSON (or YAML) document. Required keys
//! are `user`, `password` and `merchant_id`; everything else has a default.
//! Validation runs on load so configuration problems surface before any
//! network activity.

use crate::auth::{Credential, TokenPolicy};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::pagination::LoopGuard;
use crate::types::{BackoffType, OptionStringExt};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.cbresponseservices.com/v2";

// ============================================================================
// Tap Config
// ============================================================================

/// Runtime configuration for the tap
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// The user for the Chargebacks API
    #[serde(default)]
    pub user: String,

    /// The password for the Chargebacks API
    #[serde(default)]
    pub password: String,

    /// The merchant ID to use for alert and chargeback calls
    #[serde(default)]
    pub merchant_id: String,

    /// The earliest record date to sync (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Optional User-Agent header for data requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API root, overridable for testing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// First backoff delay
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff delay ceiling
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Backoff growth between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// When set, tokens are cached for this long instead of fetched per page
    #[serde(default)]
    pub token_ttl_seconds: Option<u64>,

    /// When set, data requests are rate limited per stream
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Hard ceiling on pages fetched in one sync
    #[serde(default = "default_max_pages")]
    pub max_pages: u64,

    /// Consecutive non-advancing pages tolerated before failing
    #[serde(default = "default_max_stalled_pages")]
    pub max_stalled_pages: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_max_pages() -> u64 {
    10_000
}

fn default_max_stalled_pages() -> u32 {
    2
}

impl TapConfig {
    /// Create a config with the required fields and defaults for the rest
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            merchant_id: merchant_id.into(),
            start_date: None,
            user_agent: None,
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            request_timeout_seconds: default_request_timeout_seconds(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff: BackoffType::default(),
            token_ttl_seconds: None,
            requests_per_second: None,
            max_pages: default_max_pages(),
            max_stalled_pages: default_max_stalled_pages(),
        }
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Parse and validate a JSON config string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file (`.yaml`/`.yml` as YAML, anything else as JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let config: Self = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("user", &self.user),
            ("password", &self.password),
            ("merchant_id", &self.merchant_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        let base = Url::parse(&self.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", base.scheme()),
            ));
        }

        self.start_date()?;

        if self.max_pages == 0 {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be at least 1",
            ));
        }
        if self.token_ttl_seconds == Some(0) {
            return Err(Error::invalid_value(
                "token_ttl_seconds",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Parsed start date. Accepts RFC 3339 timestamps, naive datetimes (read as UTC)
    /// and plain dates (midnight UTC).
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.start_date.clone().none_if_empty() else {
            return Ok(None);
        };
        let raw = raw.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Some(naive.and_utc()));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Some(naive.and_utc()))
            .ok_or_else(|| {
                Error::invalid_value("start_date", format!("'{raw}' is not an ISO-8601 date"))
            })
    }

    /// User-Agent header value, if one is configured
    pub fn user_agent(&self) -> Option<String> {
        self.user_agent.clone().none_if_empty()
    }

    /// Credential for the auth endpoint
    pub fn credential(&self) -> Credential {
        Credential::new(&self.user, &self.password)
    }

    /// Token policy derived from `token_ttl_seconds`
    pub fn token_policy(&self) -> TokenPolicy {
        match self.token_ttl_seconds {
            Some(secs) => TokenPolicy::Cached {
                ttl: Duration::from_secs(secs),
            },
            None => TokenPolicy::PerRequest,
        }
    }

    /// HTTP client settings for data requests
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.request_timeout_seconds))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
            .requests_per_second(self.requests_per_second)
            .build()
    }

    /// Loop guard limits
    pub fn loop_guard(&self) -> LoopGuard {
        LoopGuard::new(self.max_pages, self.max_stalled_pages)
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("start_date", &self.start_date)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

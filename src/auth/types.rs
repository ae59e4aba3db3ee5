//! Auth types
//!
//! Credentials, token policy and the cached token representation.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// User/password pair for the credential endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// API user
    pub user: String,
    /// API password
    pub password: String,
}

impl Credential {
    /// Create a new credential
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How a session obtains bearer tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// Fetch a fresh token before every data request
    #[default]
    PerRequest,
    /// Reuse a token until it is close to expiry
    Cached {
        /// How long a fetched token is considered valid
        ttl: Duration,
    },
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires after `ttl` from now
    pub fn expires_in(token: String, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now().checked_add_signed(ttl);
        Self { token, expires_at }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

//! Authenticator implementation
//!
//! Exchanges the user/password credential for a short-lived bearer token at
//! `GET <base>/auth` and hands tokens out according to the session's policy.

use super::types::{CachedToken, Credential, TokenPolicy};
use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Location of the token in the auth response body
pub const TOKEN_PATH: &str = "data.accessToken";

/// Authenticator fetches bearer tokens for one sync session
pub struct Authenticator {
    /// Credential endpoint
    auth_url: String,
    /// User/password pair
    credential: Credential,
    /// Refresh policy
    policy: TokenPolicy,
    /// Cached token for `TokenPolicy::Cached`
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator against `<base_url>/auth`
    pub fn new(base_url: &str, credential: Credential, policy: TokenPolicy) -> Self {
        Self::with_client(base_url, credential, policy, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(
        base_url: &str,
        credential: Credential,
        policy: TokenPolicy,
        http_client: Client,
    ) -> Self {
        Self {
            auth_url: format!("{}/auth", base_url.trim_end_matches('/')),
            credential,
            policy,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// The credential endpoint URL
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// The refresh policy
    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Get a token for the next data request according to the policy
    pub async fn bearer_token(&self) -> Result<String> {
        match self.policy {
            TokenPolicy::PerRequest => self.fetch_token().await,
            TokenPolicy::Cached { ttl } => self.get_or_refresh_token(ttl).await,
        }
    }

    /// Fetch a new token from the credential endpoint (one network call)
    pub async fn fetch_token(&self) -> Result<String> {
        let response = self
            .http_client
            .get(&self.auth_url)
            .basic_auth(&self.credential.user, Some(&self.credential.password))
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Token response is not JSON: {e}")))?;

        let token = extract_jsonpath(&body, TOKEN_PATH)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::auth(format!("Could not extract token from path: {TOKEN_PATH}"))
            })?;

        debug!(url = %self.auth_url, "Fetched access token");
        Ok(token)
    }

    /// Get a valid cached token, refreshing if necessary
    async fn get_or_refresh_token(&self, ttl: std::time::Duration) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another holder may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let token = self.fetch_token().await?;
        *cached = Some(CachedToken::expires_in(token.clone(), ttl));
        Ok(token)
    }

    /// Clear the cached token (forces a refetch on the next request)
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("auth_url", &self.auth_url)
            .field("credential", &self.credential)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Extract a scalar from JSON using a simple dotted path
/// Supports basic paths like "$.data.token" or "data.token"
pub fn extract_jsonpath(value: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

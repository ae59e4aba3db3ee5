//! Authentication module
//!
//! The vendor API issues short-lived bearer tokens from `GET <base>/auth`
//! in exchange for HTTP basic credentials. By default a fresh token is
//! fetched for every data request; `TokenPolicy::Cached` keeps one token per
//! session until it nears expiry.

mod authenticator;
mod types;

pub use authenticator::{extract_jsonpath, Authenticator, TOKEN_PATH};
pub use types::{CachedToken, Credential, TokenPolicy};

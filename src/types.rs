//! Common types used throughout the tap
//!
//! Shared type aliases and small utility types used across modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Record
// ============================================================================

/// One extracted business entity, tagged with the stream it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Stream (resource) name, e.g. "chargebacks"
    pub stream: String,
    /// The record object as returned by the API
    pub data: JsonObject,
}

impl Record {
    /// Create a new record
    pub fn new(stream: impl Into<String>, data: JsonObject) -> Self {
        Self {
            stream: stream.into(),
            data,
        }
    }

    /// The record's `id` field, if present
    pub fn id(&self) -> Option<&JsonValue> {
        self.data.get("id")
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

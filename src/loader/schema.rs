//! Normalized event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed user interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque user identifier, stable across sessions
    pub user_id: String,

    /// Session id recorded by the tracker, if the source carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Normalized URL path (may include a product slug)
    pub path: String,

    /// Selector of the UI element involved; identifies the event type
    pub css: String,

    /// Human-readable label or message
    pub text: String,

    /// Free-text payload such as a search query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Second-resolution timestamp
    pub event_time: DateTime<Utc>,
}

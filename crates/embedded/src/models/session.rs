//! Display session and impression records

use serde::{Deserialize, Serialize};

use super::MessageId;

/// One stretch of time during which embedded messages were on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedSession {
    pub id: String,
    /// Milliseconds since epoch
    pub start: i64,
    /// Milliseconds since epoch
    pub end: i64,
}

/// How often and how long one message was shown during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedImpression {
    pub message_id: MessageId,
    pub display_count: u32,
    /// Total seconds on screen
    pub display_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<i64>,
}

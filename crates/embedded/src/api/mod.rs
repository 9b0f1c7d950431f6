//! Server collaborators
//!
//! This module provides:
//! - Collaborator traits the sync engine is written against
//! - Typed response shapes for the messages endpoint
//! - A blocking HTTP client implementing both collaborators

mod client;

pub use client::{ApiClient, MESSAGES_PATH, RECEIVED_EVENT_PATH, CLICK_EVENT_PATH};

use crate::error::FetchError;
use crate::models::{EmbeddedMessage, Identity, MessageId};

/// Parameters for one messages request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub identity: Identity,
    /// Restrict to these placements; empty means all
    pub placement_ids: Vec<i64>,
    /// Identifiers already delivered to this client; a hint the server may ignore
    pub current_message_ids: Vec<MessageId>,
}

/// Retrieves embedded messages from the server
pub trait MessageFetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> Result<EmbeddedMessagesResponse, FetchError>;
}

/// Reports delivery telemetry for embedded messages
pub trait TelemetryReporter: Send + Sync {
    /// Report that `message_id` was received by `identity`
    fn report_received(&self, identity: &Identity, message_id: &MessageId) -> anyhow::Result<()>;
}

/// Messages endpoint response types
pub mod wire {
    use serde::{Deserialize, Serialize};

    use crate::models::EmbeddedMessage;

    /// Top-level body of the messages endpoint
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EmbeddedMessagesResponse {
        #[serde(default)]
        pub placements: Vec<Placement>,
    }

    /// One display slot and the messages assigned to it
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Placement {
        #[serde(default)]
        pub placement_id: Option<i64>,
        #[serde(default)]
        pub embedded_messages: Vec<EmbeddedMessage>,
    }

    /// Error body returned with non-success statuses
    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub msg: Option<String>,
        pub code: Option<String>,
    }
}

pub use wire::{EmbeddedMessagesResponse, Placement};

impl EmbeddedMessagesResponse {
    /// Flatten placements into one list, keeping placement order then message order
    pub fn into_messages(self) -> Vec<EmbeddedMessage> {
        self.placements
            .into_iter()
            .flat_map(|placement| placement.embedded_messages)
            .collect()
    }
}

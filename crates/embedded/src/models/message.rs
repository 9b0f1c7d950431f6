//! Embedded message model as delivered by the messages endpoint

use serde::{Deserialize, Serialize};

/// Server-assigned identifier for an embedded message
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty identifiers are treated the same as missing ones
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing and bookkeeping fields for a message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedMetadata {
    /// Some responses omit the identifier; such messages are never deduplicated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    /// Display slot the message belongs to
    pub placement_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_proof: Option<bool>,
    /// Milliseconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Milliseconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// A single embedded message
///
/// Instances are only produced by a successful fetch and are never mutated
/// afterwards. `elements` and `payload` are carried through untouched for the
/// rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedMessage {
    pub metadata: EmbeddedMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl EmbeddedMessage {
    /// Create a new message builder
    pub fn builder(placement_id: i64) -> EmbeddedMessageBuilder {
        EmbeddedMessageBuilder::new(placement_id)
    }

    /// The identifier, if the server supplied a non-empty one
    pub fn id(&self) -> Option<&MessageId> {
        self.metadata
            .message_id
            .as_ref()
            .filter(|id| !id.is_empty())
    }

    pub fn placement_id(&self) -> i64 {
        self.metadata.placement_id
    }
}

/// Builder for creating EmbeddedMessage instances
pub struct EmbeddedMessageBuilder {
    metadata: EmbeddedMetadata,
    elements: Option<serde_json::Value>,
    payload: Option<serde_json::Value>,
}

impl EmbeddedMessageBuilder {
    fn new(placement_id: i64) -> Self {
        Self {
            metadata: EmbeddedMetadata {
                placement_id,
                ..Default::default()
            },
            elements: None,
            payload: None,
        }
    }

    pub fn message_id(mut self, id: impl Into<MessageId>) -> Self {
        self.metadata.message_id = Some(id.into());
        self
    }

    pub fn campaign_id(mut self, campaign_id: i64) -> Self {
        self.metadata.campaign_id = Some(campaign_id);
        self
    }

    pub fn is_proof(mut self, is_proof: bool) -> Self {
        self.metadata.is_proof = Some(is_proof);
        self
    }

    pub fn created_at(mut self, millis: i64) -> Self {
        self.metadata.created_at = Some(millis);
        self
    }

    pub fn expires_at(mut self, millis: i64) -> Self {
        self.metadata.expires_at = Some(millis);
        self
    }

    pub fn elements(mut self, elements: serde_json::Value) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn build(self) -> EmbeddedMessage {
        EmbeddedMessage {
            metadata: self.metadata,
            elements: self.elements,
            payload: self.payload,
        }
    }
}

//! FFI-friendly type wrappers for UniFFI export
//!
//! These types convert internal Rust types to FFI-compatible versions:
//! - `MessageId` → `String`
//! - Opaque JSON (`elements`, `payload`) → serialized `String`
//! - `usize` counters → `u32`

use crate::error::{FailureKind, FetchError};
use crate::models::{EmbeddedImpression, EmbeddedMessage, MessageId};
use crate::sync::{SyncOutcome, SyncStats};

// ============================================================================
// Error Types
// ============================================================================

/// FFI-friendly error type
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EmbeddedError {
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Config error: {message}")]
    Config { message: String },
}

impl From<anyhow::Error> for EmbeddedError {
    fn from(e: anyhow::Error) -> Self {
        let message = format!("{:#}", e);
        if e.downcast_ref::<rusqlite::Error>().is_some() || e.downcast_ref::<std::io::Error>().is_some() {
            EmbeddedError::Storage { message }
        } else if e.downcast_ref::<ureq::Error>().is_some() || e.downcast_ref::<FetchError>().is_some() {
            EmbeddedError::Network { message }
        } else if e.downcast_ref::<serde_json::Error>().is_some() {
            EmbeddedError::InvalidArgument { message }
        } else {
            EmbeddedError::Storage { message }
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// FFI-friendly embedded message
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiEmbeddedMessage {
    pub message_id: Option<String>,
    pub placement_id: i64,
    pub campaign_id: Option<i64>,
    pub is_proof: Option<bool>,
    /// Milliseconds since epoch
    pub created_at: Option<i64>,
    /// Milliseconds since epoch
    pub expires_at: Option<i64>,
    /// Rendering elements as a JSON string
    pub elements_json: Option<String>,
    /// Custom payload as a JSON string
    pub payload_json: Option<String>,
}

impl From<EmbeddedMessage> for FfiEmbeddedMessage {
    fn from(m: EmbeddedMessage) -> Self {
        Self {
            message_id: m.id().map(|id| id.as_str().to_string()),
            placement_id: m.metadata.placement_id,
            campaign_id: m.metadata.campaign_id,
            is_proof: m.metadata.is_proof,
            created_at: m.metadata.created_at,
            expires_at: m.metadata.expires_at,
            elements_json: m.elements.map(|v| v.to_string()),
            payload_json: m.payload.map(|v| v.to_string()),
        }
    }
}

/// FFI-friendly impression, one per message shown during a session
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiEmbeddedImpression {
    pub message_id: String,
    pub display_count: u32,
    /// Seconds on screen
    pub display_duration: f64,
    pub placement_id: Option<i64>,
}

impl From<FfiEmbeddedImpression> for EmbeddedImpression {
    fn from(i: FfiEmbeddedImpression) -> Self {
        Self {
            message_id: MessageId::new(i.message_id),
            display_count: i.display_count,
            display_duration: i.display_duration,
            placement_id: i.placement_id,
        }
    }
}

// ============================================================================
// Sync Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiFailureKind {
    InvalidApiKey,
    SubscriptionInactive,
    Other,
}

impl From<FailureKind> for FfiFailureKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::InvalidApiKey => FfiFailureKind::InvalidApiKey,
            FailureKind::SubscriptionInactive => FfiFailureKind::SubscriptionInactive,
            FailureKind::Other => FfiFailureKind::Other,
        }
    }
}

/// FFI-friendly sync statistics
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSyncStats {
    pub messages_fetched: u32,
    pub newly_retrieved: u32,
    pub already_reported: u32,
    pub unidentified: u32,
    pub reported: u32,
    pub report_failures: u32,
    pub retried: u32,
    pub duration_ms: u64,
}

impl From<SyncStats> for FfiSyncStats {
    fn from(s: SyncStats) -> Self {
        Self {
            messages_fetched: s.messages_fetched as u32,
            newly_retrieved: s.newly_retrieved as u32,
            already_reported: s.already_reported as u32,
            unidentified: s.unidentified as u32,
            reported: s.reported as u32,
            report_failures: s.report_failures as u32,
            retried: s.retried as u32,
            duration_ms: s.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiSyncOutcome {
    Synced { stats: FfiSyncStats },
    NoMessages,
    Failed { kind: FfiFailureKind },
    AlreadyInProgress,
}

impl From<SyncOutcome> for FfiSyncOutcome {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Synced(stats) => FfiSyncOutcome::Synced {
                stats: stats.into(),
            },
            SyncOutcome::NoMessages => FfiSyncOutcome::NoMessages,
            SyncOutcome::Failed { kind } => FfiSyncOutcome::Failed { kind: kind.into() },
            SyncOutcome::AlreadyInProgress => FfiSyncOutcome::AlreadyInProgress,
        }
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// Host-side update listener
#[uniffi::export(callback_interface)]
pub trait UpdateListenerCallback: Send + Sync {
    /// Embedded messaging was disabled by the server (bad key or inactive subscription)
    fn on_embedded_messaging_disabled(&self);
}

/// Log level for FFI logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for FfiLogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => FfiLogLevel::Error,
            log::Level::Warn => FfiLogLevel::Warn,
            log::Level::Info => FfiLogLevel::Info,
            log::Level::Debug => FfiLogLevel::Debug,
            log::Level::Trace => FfiLogLevel::Trace,
        }
    }
}

impl From<FfiLogLevel> for log::Level {
    fn from(level: FfiLogLevel) -> Self {
        match level {
            FfiLogLevel::Error => log::Level::Error,
            FfiLogLevel::Warn => log::Level::Warn,
            FfiLogLevel::Info => log::Level::Info,
            FfiLogLevel::Debug => log::Level::Debug,
            FfiLogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Host-side log sink
#[uniffi::export(callback_interface)]
pub trait LogCallback: Send + Sync {
    /// Called for every record at or above the configured level
    fn on_log(&self, level: FfiLogLevel, target: String, message: String);
}

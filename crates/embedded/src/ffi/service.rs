//! EmbeddedService facade for UniFFI export
//!
//! Wraps the API client, SQLite ledger storage and sync manager behind a
//! high-level, FFI-friendly API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::api::ApiClient;
use crate::config::SdkConfig;
use crate::ffi::logging;
use crate::ffi::types::*;
use crate::models::{EmbeddedImpression, EmbeddedSession, Identity, MessageId};
use crate::storage::SqliteKeyValueStore;
use crate::sync::{EmbeddedManager, EmbeddedUpdateListener};

/// Adapts a host callback to the core listener trait
struct ForeignUpdateListener(Box<dyn UpdateListenerCallback>);

impl EmbeddedUpdateListener for ForeignUpdateListener {
    fn on_embedded_messaging_disabled(&self) {
        self.0.on_embedded_messaging_disabled();
    }
}

/// Main service object for embedded messaging
///
/// This is the primary entry point for Swift/Kotlin code. One instance owns
/// one canonical message list and one dedup ledger.
#[derive(uniffi::Object)]
pub struct EmbeddedService {
    client: Arc<ApiClient>,
    manager: EmbeddedManager,
}

#[uniffi::export]
impl EmbeddedService {
    /// Create a new EmbeddedService
    ///
    /// # Arguments
    /// * `config_json` - SDK config (`apiKey`, `packageName`, optional `baseUrl`, ...)
    /// * `db_path` - Path to the SQLite database holding the dedup ledger
    #[uniffi::constructor]
    pub fn new(config_json: String, db_path: String) -> Result<Arc<Self>, EmbeddedError> {
        let config = SdkConfig::from_json(&config_json).map_err(|e| EmbeddedError::Config {
            message: format!("{:#}", e),
        })?;

        if let Some(parent) = PathBuf::from(&db_path).parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let store = SqliteKeyValueStore::new(&db_path)?;

        let client = Arc::new(ApiClient::new(config));
        let manager = EmbeddedManager::with_client(client.clone(), Arc::new(store));

        Ok(Arc::new(Self { client, manager }))
    }

    /// Run one sync cycle
    ///
    /// # Arguments
    /// * `user_id_or_email` - Sent as `email` when it looks like one, else as `userId`
    /// * `placement_ids` - Restrict to these placements; empty for all
    pub fn sync(&self, user_id_or_email: String, placement_ids: Vec<i64>) -> FfiSyncOutcome {
        let identity = Identity::classify(user_id_or_email);
        self.manager.sync(&identity, &placement_ids).into()
    }

    /// Current canonical message list
    pub fn get_messages(&self) -> Vec<FfiEmbeddedMessage> {
        self.manager
            .messages()
            .into_iter()
            .map(FfiEmbeddedMessage::from)
            .collect()
    }

    /// Canonical messages for one placement
    pub fn get_messages_for_placement(&self, placement_id: i64) -> Vec<FfiEmbeddedMessage> {
        self.manager
            .messages_for_placement(placement_id)
            .into_iter()
            .map(FfiEmbeddedMessage::from)
            .collect()
    }

    /// Register a listener for "embedded messaging disabled"
    pub fn add_update_listener(&self, listener: Box<dyn UpdateListenerCallback>) {
        self.manager
            .add_update_listener(Arc::new(ForeignUpdateListener(listener)));
    }

    /// Tell every registered listener embedded messaging is disabled
    pub fn notify_embedded_messaging_disabled(&self) {
        self.manager.notify_embedded_messaging_disabled();
    }

    /// Whether a sync cycle is currently running
    pub fn is_syncing(&self) -> bool {
        self.manager.is_syncing()
    }

    /// Unix timestamp (seconds) of the last successful sync
    pub fn last_synced_at(&self) -> Option<i64> {
        self.manager.last_synced_at().map(|t| t.timestamp())
    }

    /// Report a tap on a message or one of its buttons
    pub fn track_click(
        &self,
        user_id_or_email: String,
        message_id: String,
        button_identifier: Option<String>,
        clicked_url: Option<String>,
    ) -> Result<(), EmbeddedError> {
        let message_id = required_message_id(message_id)?;
        let identity = Identity::classify(user_id_or_email);
        self.client.track_click(
            &identity,
            &message_id,
            button_identifier.as_deref(),
            clicked_url.as_deref(),
        )?;
        Ok(())
    }

    /// Report that the user dismissed a message
    pub fn track_dismiss(
        &self,
        user_id_or_email: String,
        message_id: String,
        button_identifier: Option<String>,
    ) -> Result<(), EmbeddedError> {
        let message_id = required_message_id(message_id)?;
        let identity = Identity::classify(user_id_or_email);
        self.client
            .track_dismiss(&identity, &message_id, button_identifier.as_deref())?;
        Ok(())
    }

    /// Report a display session
    ///
    /// # Arguments
    /// * `session_id` - Host-generated session identifier
    /// * `start_ms`, `end_ms` - Session bounds in milliseconds since epoch
    /// * `impressions` - Per-message display counts and durations
    pub fn track_session(
        &self,
        user_id_or_email: String,
        session_id: String,
        start_ms: i64,
        end_ms: i64,
        impressions: Vec<FfiEmbeddedImpression>,
    ) -> Result<(), EmbeddedError> {
        if session_id.is_empty() {
            return Err(EmbeddedError::InvalidArgument {
                message: "session_id must not be empty".to_string(),
            });
        }

        let identity = Identity::classify(user_id_or_email);
        let session = EmbeddedSession {
            id: session_id,
            start: start_ms,
            end: end_ms,
        };
        let impressions: Vec<EmbeddedImpression> = impressions.into_iter().map(Into::into).collect();
        self.client.track_session(&identity, &session, &impressions)?;
        Ok(())
    }
}

fn required_message_id(message_id: String) -> Result<MessageId, EmbeddedError> {
    if message_id.is_empty() {
        return Err(EmbeddedError::InvalidArgument {
            message: "message_id must not be empty".to_string(),
        });
    }
    Ok(MessageId::new(message_id))
}

// ============================================================================
// Free Functions
// ============================================================================

/// Install the callback logger and start forwarding records at `max_level`
///
/// Returns false if a different logger was already installed.
#[uniffi::export]
pub fn initialize_logging(callback: Box<dyn LogCallback>, max_level: FfiLogLevel) -> bool {
    let installed = logging::install_logger(max_level.into()).is_ok();
    logging::set_log_sink(Some(Arc::from(callback)));
    installed
}

/// Change the maximum forwarded log level
#[uniffi::export]
pub fn update_log_level(level: FfiLogLevel) {
    logging::set_log_level(level.into());
}

/// Whether `value` would be sent as an email identity
#[uniffi::export]
pub fn is_email_identity(value: String) -> bool {
    crate::models::is_email(&value)
}

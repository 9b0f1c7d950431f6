//! Embedded crate - client-side embedded messaging
//!
//! This crate provides platform-independent embedded messaging including:
//! - Domain models (EmbeddedMessage, MessageId, Identity)
//! - Reconciliation of fresh fetches against the current message list
//! - A persisted dedup ledger for at-most-once received telemetry
//! - A single-flight sync manager with listener notifications
//! - HTTP client and durable key-value stores for the collaborators
//!
//! This crate has zero UI dependencies and exports a UniFFI surface for
//! Swift/Kotlin hosts.

uniffi::setup_scaffolding!();

pub mod api;
pub mod config;
pub mod error;
pub mod ffi;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod storage;
pub mod sync;

pub use api::{ApiClient, EmbeddedMessagesResponse, FetchRequest, MessageFetcher, Placement, TelemetryReporter};
pub use config::SdkConfig;
pub use error::{FailureKind, FetchError};
pub use ledger::{DedupLedger, LEDGER_KEY, SeenIds, filter_unseen, record};
pub use models::{
    EmbeddedImpression, EmbeddedMessage, EmbeddedMetadata, EmbeddedSession, Identity, MessageId,
    is_email,
};
pub use reconcile::{Reconciliation, reconcile};
pub use storage::{InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore};
pub use sync::{
    EmbeddedAction, EmbeddedActionHandler, EmbeddedManager, EmbeddedUpdateListener, SyncOutcome,
    SyncPhase, SyncStats,
};

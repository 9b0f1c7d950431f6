//! Sync engine for embedded messages
//!
//! Drives fetch, reconciliation, received telemetry and ledger persistence,
//! one cycle at a time per manager.

mod listeners;
mod manager;

pub use listeners::{EmbeddedAction, EmbeddedActionHandler, EmbeddedUpdateListener, ListenerRegistry};
pub use manager::{EmbeddedManager, SyncOutcome, SyncPhase, SyncStats};

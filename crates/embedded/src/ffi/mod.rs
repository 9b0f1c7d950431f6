//! FFI bindings for UniFFI export
//!
//! This module provides Swift/Kotlin bindings for the embedded crate via UniFFI.
//!
//! ## Usage from Swift
//!
//! ```swift
//! import EmbeddedFFI
//!
//! // Initialize logging first
//! initializeLogging(callback: myLogCallback, maxLevel: .info)
//!
//! let service = try EmbeddedService(
//!     configJson: #"{"apiKey": "...", "packageName": "com.example.app"}"#,
//!     dbPath: "/path/to/embedded.db"
//! )
//! service.addUpdateListener(listener: myListener)
//!
//! switch service.sync(userIdOrEmail: "jane@example.com", placementIds: []) {
//! case .synced(let stats): print("reported \(stats.reported)")
//! default: break
//! }
//! let banners = service.getMessagesForPlacement(placementId: 12)
//! ```

mod logging;
mod service;
mod types;

pub use logging::{install_logger, set_log_level, set_log_sink};
pub use service::*;
pub use types::*;

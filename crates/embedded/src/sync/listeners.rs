//! Listener registry owned by a sync manager

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::models::EmbeddedMessage;

/// Receives state changes from the sync engine
pub trait EmbeddedUpdateListener: Send + Sync {
    /// Embedded messaging is unusable for this project (bad key or lapsed subscription)
    fn on_embedded_messaging_disabled(&self);
}

/// Action attached to a message element, e.g. a button or the default tap target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub data: Option<String>,
}

/// Handles taps dispatched by the rendering layer
///
/// The sync engine only stores these; it never invokes them.
pub trait EmbeddedActionHandler: Send + Sync {
    fn on_action(&self, message: &EmbeddedMessage, action: &EmbeddedAction);
}

/// Registered update listeners and action handlers
#[derive(Default)]
pub struct ListenerRegistry {
    update_listeners: RwLock<Vec<Arc<dyn EmbeddedUpdateListener>>>,
    action_handlers: RwLock<Vec<Arc<dyn EmbeddedActionHandler>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update_listener(&self, listener: Arc<dyn EmbeddedUpdateListener>) {
        self.update_listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn add_action_handler(&self, handler: Arc<dyn EmbeddedActionHandler>) {
        self.action_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Snapshot of the registered update listeners, in registration order
    pub fn update_listeners(&self) -> Vec<Arc<dyn EmbeddedUpdateListener>> {
        self.update_listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the registered action handlers, in registration order
    pub fn action_handlers(&self) -> Vec<Arc<dyn EmbeddedActionHandler>> {
        self.action_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Call `on_embedded_messaging_disabled` once on every update listener
    ///
    /// Listeners are invoked on a snapshot so they may register others.
    /// Returns the number of listeners notified.
    pub fn notify_embedded_messaging_disabled(&self) -> usize {
        let listeners = self.update_listeners();
        for listener in &listeners {
            listener.on_embedded_messaging_disabled();
        }
        listeners.len()
    }
}

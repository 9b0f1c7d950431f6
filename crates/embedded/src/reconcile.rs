//! Message reconciliation
//!
//! Pure functions that can be tested without any collaborators.

use std::collections::HashSet;

use crate::models::EmbeddedMessage;

/// Result of reconciling a fresh fetch against the previous canonical list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// The new canonical list: the fresh messages, in server order
    pub canonical: Vec<EmbeddedMessage>,
    /// Fresh messages whose identifier was not in the previous list
    pub newly_retrieved: Vec<EmbeddedMessage>,
}

/// Reconcile a freshly fetched message list against the previous one
///
/// The fresh list wins wholesale: no fields are merged and no ordering from
/// `previous` is kept. A fresh message is newly retrieved when its identifier
/// is absent from `previous`; unidentified messages are always newly retrieved.
pub fn reconcile(previous: &[EmbeddedMessage], fresh: &[EmbeddedMessage]) -> Reconciliation {
    let known: HashSet<&str> = previous
        .iter()
        .filter_map(|m| m.id())
        .map(|id| id.as_str())
        .collect();

    let newly_retrieved = fresh
        .iter()
        .filter(|m| m.id().is_none_or(|id| !known.contains(id.as_str())))
        .cloned()
        .collect();

    Reconciliation {
        canonical: fresh.to_vec(),
        newly_retrieved,
    }
}

//! Dedup ledger of messages already reported as received
//!
//! The only I/O is [`DedupLedger::load`] and [`DedupLedger::persist`], run at the
//! edges of a sync cycle. Filtering and extending the set are pure.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::warn;

use crate::models::{EmbeddedMessage, MessageId};
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of reported identifiers
pub const LEDGER_KEY: &str = "itbl_embedded_messages";

/// Identifiers for which received telemetry was already emitted
pub type SeenIds = BTreeSet<MessageId>;

/// Persisted ledger handle
pub struct DedupLedger {
    store: Arc<dyn KeyValueStore>,
}

impl DedupLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted identifiers
    ///
    /// Missing, unreadable or malformed state yields an empty set.
    pub fn load(&self) -> SeenIds {
        let raw = match self.store.get(LEDGER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SeenIds::new(),
            Err(e) => {
                warn!("Failed to read dedup ledger, starting empty: {:#}", e);
                return SeenIds::new();
            }
        };

        match serde_json::from_str::<Vec<MessageId>>(&raw) {
            Ok(ids) => ids.into_iter().filter(|id| !id.is_empty()).collect(),
            Err(e) => {
                warn!("Dedup ledger is malformed, starting empty: {}", e);
                SeenIds::new()
            }
        }
    }

    /// Replace the persisted identifiers with `seen`
    pub fn persist(&self, seen: &SeenIds) -> Result<()> {
        let json = serde_json::to_string(seen).context("Failed to serialize dedup ledger")?;
        self.store
            .set(LEDGER_KEY, &json)
            .context("Failed to persist dedup ledger")
    }
}

/// Keep the candidates not yet in `seen`, preserving order
///
/// Unidentified candidates always pass.
pub fn filter_unseen(candidates: &[EmbeddedMessage], seen: &SeenIds) -> Vec<EmbeddedMessage> {
    candidates
        .iter()
        .filter(|m| m.id().is_none_or(|id| !seen.contains(id)))
        .cloned()
        .collect()
}

/// Union of `into` and the non-empty `ids`
pub fn record<'a>(ids: impl IntoIterator<Item = &'a MessageId>, into: &SeenIds) -> SeenIds {
    let mut updated = into.clone();
    updated.extend(ids.into_iter().filter(|id| !id.is_empty()).cloned());
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKeyValueStore;

    fn msg(id: &str) -> EmbeddedMessage {
        EmbeddedMessage::builder(1).message_id(id).build()
    }

    fn seen(ids: &[&str]) -> SeenIds {
        ids.iter().map(|id| MessageId::new(*id)).collect()
    }

    fn ledger_with(raw: Option<&str>) -> (DedupLedger, Arc<InMemoryKeyValueStore>) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        if let Some(raw) = raw {
            store.set(LEDGER_KEY, raw).unwrap();
        }
        (DedupLedger::new(store.clone()), store)
    }

    #[test]
    fn test_load_empty() {
        let (ledger, _) = ledger_with(None);
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_load_malformed_fails_open() {
        for raw in ["not json", "{\"a\":1}", "[1,2,3]", ""] {
            let (ledger, _) = ledger_with(Some(raw));
            assert!(ledger.load().is_empty(), "expected empty ledger for {:?}", raw);
        }
    }

    #[test]
    fn test_load_legacy_array_with_duplicates() {
        let (ledger, _) = ledger_with(Some(r#"["a","b","a",""]"#));
        assert_eq!(ledger.load(), seen(&["a", "b"]));
    }

    #[test]
    fn test_persist_roundtrip_replaces() {
        let (ledger, store) = ledger_with(Some(r#"["old"]"#));

        ledger.persist(&seen(&["b", "a"])).unwrap();
        assert_eq!(ledger.load(), seen(&["a", "b"]));
        assert_eq!(store.get(LEDGER_KEY).unwrap().as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_filter_unseen_preserves_order() {
        let candidates = vec![msg("c"), msg("a"), msg("d"), EmbeddedMessage::builder(2).build()];
        let result = filter_unseen(&candidates, &seen(&["a"]));

        let ids: Vec<_> = result.iter().map(|m| m.id().map(|id| id.as_str())).collect();
        assert_eq!(ids, vec![Some("c"), Some("d"), None]);
    }

    #[test]
    fn test_filter_unseen_removes_all_seen() {
        let result = filter_unseen(&[msg("A")], &seen(&["A"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_record_unions_and_skips_empty() {
        let ids = [MessageId::new("b"), MessageId::new(""), MessageId::new("a")];
        let updated = record(&ids, &seen(&["a"]));
        assert_eq!(updated, seen(&["a", "b"]));
    }

    #[test]
    fn test_record_leaves_input_untouched() {
        let before = seen(&["x"]);
        let after = record(&[MessageId::new("y")], &before);
        assert_eq!(before, seen(&["x"]));
        assert_eq!(after, seen(&["x", "y"]));
    }
}

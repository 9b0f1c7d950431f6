//! Sync cycle orchestration
//!
//! One cycle: load ledger, fetch, reconcile, report newly received messages,
//! then swap in the new canonical list and persist the ledger.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::listeners::{EmbeddedActionHandler, EmbeddedUpdateListener, ListenerRegistry};
use crate::api::{ApiClient, FetchRequest, MessageFetcher, TelemetryReporter};
use crate::error::{FailureKind, FetchError};
use crate::ledger::{self, DedupLedger, SeenIds};
use crate::models::{EmbeddedMessage, Identity, MessageId};
use crate::reconcile::reconcile;
use crate::storage::KeyValueStore;

/// Workers sending received events; each one blocks on an HTTP round trip
const REPORT_THREADS: usize = 4;

/// Where a sync cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Reconciling,
    Reporting,
    Persisting,
    /// Last cycle's fetch failed; the next `sync` starts over
    Failed,
}

/// Statistics from a completed sync cycle
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStats {
    /// Messages in the fetch response, across all placements
    pub messages_fetched: usize,
    /// Messages absent from the previous canonical list
    pub newly_retrieved: usize,
    /// Newly retrieved messages skipped because the ledger already had them
    pub already_reported: usize,
    /// Newly retrieved messages with no identifier; never reported
    pub unidentified: usize,
    /// Received events accepted by the telemetry collaborator
    pub reported: usize,
    /// Received events that failed; those ids stay out of the ledger and are
    /// sent again by the next cycle that still fetches them
    pub report_failures: usize,
    /// Messages whose earlier received event failed, attempted again this cycle
    pub retried: usize,
    /// Duration of the cycle
    pub duration_ms: u64,
}

/// How a call to [`EmbeddedManager::sync`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Canonical list replaced and ledger persisted
    Synced(SyncStats),
    /// Fetch succeeded with zero messages; stored state untouched
    NoMessages,
    /// Fetch failed; stored state untouched
    Failed { kind: FailureKind },
    /// Another cycle was running; this call did nothing
    AlreadyInProgress,
}

/// Clears the single-flight flag when a cycle ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the canonical message list, the dedup ledger and the listener registry
///
/// Readers only ever see snapshots; the list is replaced exclusively by a
/// successful sync cycle.
pub struct EmbeddedManager {
    fetcher: Arc<dyn MessageFetcher>,
    reporter: Arc<dyn TelemetryReporter>,
    ledger: DedupLedger,
    messages: RwLock<Vec<EmbeddedMessage>>,
    listeners: ListenerRegistry,
    phase: Mutex<SyncPhase>,
    in_flight: AtomicBool,
    last_synced_at: RwLock<Option<DateTime<Utc>>>,
    /// Ids whose received event failed in the last cycle
    pending: Mutex<SeenIds>,
    /// `None` when the pool could not be built; reports then run sequentially
    report_pool: Option<ThreadPool>,
}

impl EmbeddedManager {
    /// Create a manager from its collaborators
    pub fn new(
        fetcher: Arc<dyn MessageFetcher>,
        reporter: Arc<dyn TelemetryReporter>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            fetcher,
            reporter,
            ledger: DedupLedger::new(store),
            messages: RwLock::new(Vec::new()),
            listeners: ListenerRegistry::new(),
            phase: Mutex::new(SyncPhase::Idle),
            in_flight: AtomicBool::new(false),
            last_synced_at: RwLock::new(None),
            pending: Mutex::new(SeenIds::new()),
            report_pool: ThreadPoolBuilder::new()
                .num_threads(REPORT_THREADS)
                .thread_name(|i| format!("embedded-report-{}", i))
                .build()
                .inspect_err(|e| warn!("Embedded telemetry pool unavailable, reporting sequentially: {}", e))
                .ok(),
        }
    }

    /// Create a manager that fetches and reports through one API client
    pub fn with_client(client: Arc<ApiClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(client.clone(), client, store)
    }

    /// Run one sync cycle for `identity`
    ///
    /// `placement_ids` restricts the fetch; empty means every placement.
    /// Never returns an error: fetch failures leave state untouched and are
    /// described by the outcome.
    pub fn sync(&self, identity: &Identity, placement_ids: &[i64]) -> SyncOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Embedded sync already in progress, skipping");
            return SyncOutcome::AlreadyInProgress;
        }
        let _guard = InFlightGuard(&self.in_flight);
        let start = Instant::now();

        let seen = self.ledger.load();

        // 1. Fetch
        self.set_phase(SyncPhase::Fetching);
        let request = FetchRequest {
            identity: identity.clone(),
            placement_ids: placement_ids.to_vec(),
            current_message_ids: seen.iter().cloned().collect(),
        };
        let fresh = match self.fetcher.fetch(&request) {
            Ok(response) => response.into_messages(),
            Err(e) => return self.fail(e),
        };

        if fresh.is_empty() {
            debug!("Embedded sync returned no messages; keeping current list");
            self.set_phase(SyncPhase::Idle);
            return SyncOutcome::NoMessages;
        }

        // 2. Reconcile against the current canonical list
        self.set_phase(SyncPhase::Reconciling);
        let previous = self.messages();
        let reconciliation = reconcile(&previous, &fresh);

        let mut stats = SyncStats {
            messages_fetched: fresh.len(),
            newly_retrieved: reconciliation.newly_retrieved.len(),
            ..Default::default()
        };

        // 3. Report newly retrieved messages the ledger has not seen
        self.set_phase(SyncPhase::Reporting);
        let unseen = ledger::filter_unseen(&reconciliation.newly_retrieved, &seen);
        stats.already_reported = reconciliation.newly_retrieved.len() - unseen.len();
        let retries = self.pending_retries(&fresh, &reconciliation.newly_retrieved, &seen);
        stats.retried = retries.len();

        let mut to_report = unseen;
        to_report.extend(retries);
        let (reported, failed) = self.report_received(identity, &to_report, &mut stats);
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = failed;

        // 4. Swap in the new list and persist the ledger
        self.set_phase(SyncPhase::Persisting);
        *self.messages.write().unwrap_or_else(PoisonError::into_inner) = reconciliation.canonical;
        let updated = ledger::record(&reported, &seen);
        if let Err(e) = self.ledger.persist(&updated) {
            warn!("Embedded sync could not persist dedup ledger: {:#}", e);
        }
        *self
            .last_synced_at
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        self.set_phase(SyncPhase::Idle);
        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Embedded sync complete: {} fetched, {} new, {} reported, {} failed in {}ms",
            stats.messages_fetched,
            stats.newly_retrieved,
            stats.reported,
            stats.report_failures,
            stats.duration_ms
        );
        SyncOutcome::Synced(stats)
    }

    /// Fetched messages whose received event failed in an earlier cycle
    ///
    /// Those messages are already canonical, so reconciliation no longer
    /// reports them as newly retrieved.
    fn pending_retries(
        &self,
        fresh: &[EmbeddedMessage],
        newly_retrieved: &[EmbeddedMessage],
        seen: &SeenIds,
    ) -> Vec<EmbeddedMessage> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_empty() {
            return Vec::new();
        }

        let newly: HashSet<&MessageId> = newly_retrieved.iter().filter_map(|m| m.id()).collect();
        let mut queued = HashSet::new();
        fresh
            .iter()
            .filter(|m| {
                m.id().is_some_and(|id| {
                    pending.contains(id)
                        && !seen.contains(id)
                        && !newly.contains(id)
                        && queued.insert(id.clone())
                })
            })
            .cloned()
            .collect()
    }

    /// Send received events for `messages` on the report pool
    ///
    /// Every report is attempted. Returns the identifiers that succeeded and
    /// those that failed.
    fn report_received(
        &self,
        identity: &Identity,
        messages: &[EmbeddedMessage],
        stats: &mut SyncStats,
    ) -> (Vec<MessageId>, SeenIds) {
        let mut unique = HashSet::new();
        let ids: Vec<&MessageId> = messages
            .iter()
            .filter_map(|m| m.id())
            .filter(|id| unique.insert(*id))
            .collect();
        stats.unidentified = messages.iter().filter(|m| m.id().is_none()).count();

        let results: Vec<anyhow::Result<()>> = match &self.report_pool {
            Some(pool) => pool.install(|| {
                ids.par_iter()
                    .map(|id| self.reporter.report_received(identity, id))
                    .collect()
            }),
            None => ids
                .iter()
                .map(|id| self.reporter.report_received(identity, id))
                .collect(),
        };

        let mut reported = Vec::with_capacity(ids.len());
        let mut failed = SeenIds::new();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => reported.push(id.clone()),
                Err(e) => {
                    warn!("Failed to report embedded message {} as received: {:#}", id, e);
                    failed.insert(id.clone());
                }
            }
        }
        stats.reported = reported.len();
        stats.report_failures = failed.len();
        (reported, failed)
    }

    fn fail(&self, error: FetchError) -> SyncOutcome {
        let kind = error.classify();
        self.set_phase(SyncPhase::Failed);

        if kind.disables_messaging() {
            warn!("Embedded messaging disabled by server: {}", error);
            self.notify_embedded_messaging_disabled();
        } else {
            warn!("Embedded sync fetch failed: {}", error);
        }
        SyncOutcome::Failed { kind }
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Current phase of the sync state machine
    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a sync cycle is running right now
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// When the last successful cycle finished
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_synced_at
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the canonical list
    pub fn messages(&self) -> Vec<EmbeddedMessage> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Canonical messages in `placement_id`, in canonical order
    pub fn messages_for_placement(&self, placement_id: i64) -> Vec<EmbeddedMessage> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| m.placement_id() == placement_id)
            .cloned()
            .collect()
    }

    pub fn add_update_listener(&self, listener: Arc<dyn EmbeddedUpdateListener>) {
        self.listeners.add_update_listener(listener);
    }

    pub fn add_action_handler(&self, handler: Arc<dyn EmbeddedActionHandler>) {
        self.listeners.add_action_handler(handler);
    }

    pub fn update_listeners(&self) -> Vec<Arc<dyn EmbeddedUpdateListener>> {
        self.listeners.update_listeners()
    }

    pub fn action_handlers(&self) -> Vec<Arc<dyn EmbeddedActionHandler>> {
        self.listeners.action_handlers()
    }

    /// Tell every update listener that embedded messaging is disabled
    pub fn notify_embedded_messaging_disabled(&self) {
        let notified = self.listeners.notify_embedded_messaging_disabled();
        debug!("Notified {} listeners that embedded messaging is disabled", notified);
    }
}

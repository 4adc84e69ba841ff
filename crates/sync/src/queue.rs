//! Durable offline action queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use binflow_store::KeyValueStore;

use crate::action::{Action, ActionExecutor, QueuedAction};
use crate::connectivity::Connectivity;

/// Key-value slot holding the queue snapshot.
const QUEUE_KEY: &str = "sync.queue.v1";

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplayOutcome {
    pub success: usize,
    pub failed: usize,
}

/// Ordered, durable queue of pending backend writes.
///
/// Every mutation is mirrored to the key-value store immediately after the
/// in-memory state changes, so a reload restores pending work. Replay is
/// single-flight: a second caller during an active pass gets an empty
/// outcome, and entries enqueued mid-pass are kept for the next one.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    connectivity: Arc<Connectivity>,
    entries: Mutex<Vec<QueuedAction>>,
    replaying: AtomicBool,
}

impl OfflineQueue {
    /// Create an empty queue (nothing is read from the store).
    pub fn new(store: Arc<dyn KeyValueStore>, connectivity: Arc<Connectivity>) -> Self {
        Self {
            store,
            connectivity,
            entries: Mutex::new(Vec::new()),
            replaying: AtomicBool::new(false),
        }
    }

    /// Create a queue and restore the persisted snapshot, if any.
    ///
    /// A corrupt snapshot is logged and discarded rather than propagated; the
    /// queue starts empty in that case.
    pub async fn load(store: Arc<dyn KeyValueStore>, connectivity: Arc<Connectivity>) -> Self {
        let queue = Self::new(store, connectivity);

        match queue.store.get(QUEUE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<QueuedAction>>(&json) {
                Ok(restored) => {
                    if !restored.is_empty() {
                        tracing::info!(pending = restored.len(), "restored offline queue");
                    }
                    *queue.entries.lock().await = restored;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding corrupt offline queue snapshot");
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to read offline queue snapshot");
            }
        }

        queue
    }

    /// Append an action to the queue and persist the snapshot.
    pub async fn enqueue(&self, action: Action) -> QueuedAction {
        let entry = QueuedAction {
            id: Uuid::now_v7(),
            created_at: chrono::Utc::now(),
            attempts: 0,
            action,
        };

        let mut entries = self.entries.lock().await;
        entries.push(entry.clone());
        self.persist(&entries).await;
        tracing::info!(id = %entry.id, pending = entries.len(), "queued offline action");

        entry
    }

    /// Replay pending actions, oldest first.
    ///
    /// No-op (empty outcome) when the queue is empty, the client is offline,
    /// or another replay pass is already running. Successes leave the queue;
    /// failures are re-queued in order ahead of anything enqueued during the
    /// pass and will be retried on the next one.
    pub async fn replay(&self, executor: &dyn ActionExecutor) -> ReplayOutcome {
        if self.connectivity.is_offline() {
            tracing::debug!("skipping replay while offline");
            return ReplayOutcome::default();
        }
        if self.replaying.swap(true, Ordering::SeqCst) {
            tracing::debug!("replay already in progress");
            return ReplayOutcome::default();
        }

        let snapshot = {
            let mut entries = self.entries.lock().await;
            if entries.is_empty() {
                self.replaying.store(false, Ordering::SeqCst);
                return ReplayOutcome::default();
            }
            std::mem::take(&mut *entries)
        };

        tracing::info!(pending = snapshot.len(), "replaying offline queue");

        let mut outcome = ReplayOutcome::default();
        let mut retained: Vec<QueuedAction> = Vec::new();

        for mut entry in snapshot {
            match executor.execute(&entry.action).await {
                Ok(()) => {
                    outcome.success += 1;
                    tracing::info!(id = %entry.id, "replayed offline action");
                }
                Err(err) => {
                    outcome.failed += 1;
                    entry.attempts += 1;
                    tracing::warn!(
                        id = %entry.id,
                        attempts = entry.attempts,
                        error = %err,
                        "offline action failed, keeping it queued"
                    );
                    retained.push(entry);
                }
            }
        }

        {
            let mut entries = self.entries.lock().await;
            let enqueued_mid_pass = std::mem::take(&mut *entries);
            *entries = retained;
            entries.extend(enqueued_mid_pass);
            self.persist(&entries).await;
        }

        self.replaying.store(false, Ordering::SeqCst);
        outcome
    }

    /// Remove a single entry by id without executing it.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.persist(&entries).await;
        }
        removed
    }

    /// Empty the queue unconditionally (manual reset / logout).
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await;
    }

    /// Snapshot of the pending entries, in replay order.
    pub async fn pending(&self) -> Vec<QueuedAction> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Mirror the in-memory state to the key-value store. Persistence
    /// failures are logged, not propagated; the in-memory queue stays
    /// authoritative for this process.
    async fn persist(&self, entries: &[QueuedAction]) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize offline queue");
                return;
            }
        };
        if let Err(err) = self.store.put(QUEUE_KEY, &json).await {
            tracing::error!(error = %err, "failed to persist offline queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ReportDraft, SyncError};
    use async_trait::async_trait;
    use binflow_core::ReportId;
    use binflow_store::MemoryStore;
    use std::sync::Mutex as StdMutex;

    fn report(description: &str) -> Action {
        Action::SubmitReport {
            report: ReportDraft {
                report_id: ReportId::new(),
                description: description.to_string(),
                latitude: 5.6037,
                longitude: -0.1870,
                photo_url: None,
            },
        }
    }

    fn description(action: &Action) -> String {
        match action {
            Action::SubmitReport { report } => report.description.clone(),
            _ => panic!("test only queues reports"),
        }
    }

    /// Executor that records execution order and fails selected entries.
    struct RecordingExecutor {
        executed: StdMutex<Vec<String>>,
        fail_on: Vec<String>,
    }

    impl RecordingExecutor {
        fn new(fail_on: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                executed: StdMutex::new(Vec::new()),
                fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
            })
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionExecutor for RecordingExecutor {
        async fn execute(&self, action: &Action) -> Result<(), SyncError> {
            let desc = description(action);
            self.executed.lock().unwrap().push(desc.clone());
            if self.fail_on.contains(&desc) {
                Err(SyncError::Network("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// Executor that blocks until released, for single-flight tests.
    struct StallingExecutor {
        entered: tokio::sync::Semaphore,
        release: tokio::sync::Semaphore,
    }

    impl StallingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entered: tokio::sync::Semaphore::new(0),
                release: tokio::sync::Semaphore::new(0),
            })
        }
    }

    #[async_trait]
    impl ActionExecutor for StallingExecutor {
        async fn execute(&self, _action: &Action) -> Result<(), SyncError> {
            self.entered.add_permits(1);
            let permit = self.release.acquire().await.expect("semaphore closed");
            permit.forget();
            Ok(())
        }
    }

    fn queue() -> (Arc<OfflineQueue>, Arc<MemoryStore>, Arc<Connectivity>) {
        let store = Arc::new(MemoryStore::new());
        let connectivity = Arc::new(Connectivity::new());
        let queue = Arc::new(OfflineQueue::new(store.clone(), connectivity.clone()));
        (queue, store, connectivity)
    }

    #[tokio::test]
    async fn replays_in_enqueue_order_and_requeues_failures() {
        let (queue, _, _) = queue();
        queue.enqueue(report("first")).await;
        queue.enqueue(report("second")).await;
        queue.enqueue(report("third")).await;

        let executor = RecordingExecutor::new(&["second"]);
        let outcome = queue.replay(executor.as_ref()).await;

        assert_eq!(outcome, ReplayOutcome { success: 2, failed: 1 });
        assert_eq!(executor.executed(), vec!["first", "second", "third"]);

        let pending = queue.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(description(&pending[0].action), "second");
        assert_eq!(pending[0].attempts, 1);
    }

    #[tokio::test]
    async fn failed_entry_keeps_its_identity_across_passes() {
        let (queue, _, _) = queue();
        let entry = queue.enqueue(report("stuck")).await;

        let executor = RecordingExecutor::new(&["stuck"]);
        queue.replay(executor.as_ref()).await;
        queue.replay(executor.as_ref()).await;

        let pending = queue.pending().await;
        assert_eq!(pending[0].id, entry.id);
        assert_eq!(pending[0].created_at, entry.created_at);
        assert_eq!(pending[0].attempts, 2);
    }

    #[tokio::test]
    async fn replay_is_a_noop_while_offline() {
        let (queue, _, connectivity) = queue();
        queue.enqueue(report("held back")).await;
        connectivity.mark_offline();

        let executor = RecordingExecutor::new(&[]);
        let outcome = queue.replay(executor.as_ref()).await;

        assert_eq!(outcome, ReplayOutcome::default());
        assert!(executor.executed().is_empty());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn replay_of_empty_queue_is_a_noop() {
        let (queue, _, _) = queue();
        let executor = RecordingExecutor::new(&[]);
        assert_eq!(queue.replay(executor.as_ref()).await, ReplayOutcome::default());
    }

    #[tokio::test]
    async fn only_one_replay_pass_runs_at_a_time() {
        let (queue, _, _) = queue();
        queue.enqueue(report("slow")).await;

        let stalling = StallingExecutor::new();
        let first = {
            let queue = queue.clone();
            let stalling = stalling.clone();
            tokio::spawn(async move { queue.replay(stalling.as_ref()).await })
        };

        // Wait until the first pass is inside the executor, then try again.
        let permit = stalling.entered.acquire().await.unwrap();
        permit.forget();
        let second = queue.replay(stalling.as_ref()).await;
        assert_eq!(second, ReplayOutcome::default());

        stalling.release.add_permits(1);
        let first = first.await.unwrap();
        assert_eq!(first, ReplayOutcome { success: 1, failed: 0 });
    }

    #[tokio::test]
    async fn entries_enqueued_mid_pass_survive_for_the_next_one() {
        let (queue, _, _) = queue();
        queue.enqueue(report("in flight")).await;

        let stalling = StallingExecutor::new();
        let pass = {
            let queue = queue.clone();
            let stalling = stalling.clone();
            tokio::spawn(async move { queue.replay(stalling.as_ref()).await })
        };

        let permit = stalling.entered.acquire().await.unwrap();
        permit.forget();
        queue.enqueue(report("latecomer")).await;
        stalling.release.add_permits(1);
        pass.await.unwrap();

        let pending = queue.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(description(&pending[0].action), "latecomer");
    }

    #[tokio::test]
    async fn snapshot_survives_a_reload() {
        let store = Arc::new(MemoryStore::new());
        let connectivity = Arc::new(Connectivity::new());

        let queue = OfflineQueue::new(store.clone(), connectivity.clone());
        queue.enqueue(report("persisted")).await;
        drop(queue);

        let restored = OfflineQueue::load(store, connectivity).await;
        let pending = restored.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(description(&pending[0].action), "persisted");
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.put("sync.queue.v1", "not json").await.unwrap();

        let restored =
            OfflineQueue::load(store, Arc::new(Connectivity::new())).await;
        assert!(restored.is_empty().await);
    }

    #[tokio::test]
    async fn remove_and_clear_persist() {
        let (queue, store, connectivity) = queue();
        let a = queue.enqueue(report("a")).await;
        queue.enqueue(report("b")).await;

        assert!(queue.remove(a.id).await);
        assert!(!queue.remove(a.id).await);
        assert_eq!(queue.len().await, 1);

        queue.clear().await;
        assert!(queue.is_empty().await);

        let reloaded = OfflineQueue::load(store, connectivity).await;
        assert!(reloaded.is_empty().await);
    }
}

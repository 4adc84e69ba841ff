//! Background worker that probes connectivity and drains the offline queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::action::ActionExecutor;
use crate::connectivity::Connectivity;
use crate::queue::OfflineQueue;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Probes backend reachability (typically a cheap health-endpoint GET).
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn check(&self) -> bool;
}

/// Background sync worker.
///
/// On every tick it probes connectivity, updates the shared
/// [`Connectivity`] flag, and — while online — replays whatever the offline
/// queue holds. The offline-to-online edge therefore triggers a replay on
/// the first tick after reconnecting; subsequent ticks retry entries that
/// failed earlier passes.
pub struct SyncWorker {
    queue: Arc<OfflineQueue>,
    executor: Arc<dyn ActionExecutor>,
    probe: Arc<dyn ConnectivityProbe>,
    connectivity: Arc<Connectivity>,
    poll_interval: Duration,
}

/// Handle to a running [`SyncWorker`].
#[derive(Debug)]
pub struct SyncWorkerHandle {
    shutdown: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SyncWorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.join.await;
    }
}

impl SyncWorker {
    pub fn new(
        queue: Arc<OfflineQueue>,
        executor: Arc<dyn ActionExecutor>,
        probe: Arc<dyn ConnectivityProbe>,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            queue,
            executor,
            probe,
            connectivity,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawn the worker loop.
    pub fn start(self) -> SyncWorkerHandle {
        let shutdown = Arc::new(Notify::new());
        let shutdown_signal = shutdown.clone();

        let join = tokio::spawn(async move {
            tracing::info!("sync worker started");

            let mut interval = tokio::time::interval(self.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_signal.notified() => {
                        tracing::info!("sync worker received shutdown signal");
                        break;
                    }
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                }
            }

            tracing::info!("sync worker stopped");
        });

        SyncWorkerHandle { shutdown, join }
    }

    async fn tick(&self) {
        if !self.probe.check().await {
            if self.connectivity.mark_offline() {
                tracing::info!("connectivity lost, pausing sync");
            }
            return;
        }

        if self.connectivity.mark_online() {
            tracing::info!("connectivity restored");
        }

        if self.queue.is_empty().await {
            return;
        }

        let outcome = self.queue.replay(self.executor.as_ref()).await;
        if outcome.success > 0 || outcome.failed > 0 {
            tracing::info!(
                success = outcome.success,
                failed = outcome.failed,
                "replayed offline queue"
            );
        }
    }
}

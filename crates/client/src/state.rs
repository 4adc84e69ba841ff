//! Application state shared by the UI layer.

use std::sync::Arc;

use binflow_pricing::{PricingService, SystemClock};
use binflow_store::{KeyValueStore, SqliteStore, StoreError};
use binflow_sync::{
    Action, Connectivity, OfflineQueue, PickupRequest, ReportDraft, RewardRedemption, SyncWorker,
    SyncWorkerHandle,
};

use crate::api::ApiClient;
use crate::config::ClientConfig;

/// What happened to a write issued through [`AppState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Delivered to the backend immediately.
    Sent,
    /// Captured in the offline queue; the sync worker will deliver it.
    Queued,
}

/// Shared client state: API access, durability, connectivity, pricing.
///
/// Writes are optimistic: when the client is offline or the live call fails,
/// the action lands in the offline queue and the caller gets
/// [`WriteOutcome::Queued`] rather than an error.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub connectivity: Arc<Connectivity>,
    pub queue: Arc<OfflineQueue>,
    pub pricing: Arc<PricingService>,
}

impl AppState {
    /// Wire the client against the default on-disk store.
    pub async fn new(config: ClientConfig) -> Result<Self, StoreError> {
        let store = Arc::new(SqliteStore::new()?);
        Ok(Self::with_store(config, store).await)
    }

    /// Wire the client against an explicit store (tests, custom paths).
    pub async fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let api = Arc::new(ApiClient::new(config));
        let connectivity = Arc::new(Connectivity::new());
        let queue = Arc::new(OfflineQueue::load(store.clone(), connectivity.clone()).await);
        let pricing = Arc::new(PricingService::new(api.clone(), Arc::new(SystemClock)));

        Self {
            api,
            store,
            connectivity,
            queue,
            pricing,
        }
    }

    /// Start the background sync worker for this state.
    pub fn start_sync_worker(&self) -> SyncWorkerHandle {
        SyncWorker::new(
            self.queue.clone(),
            self.api.clone(),
            self.api.clone(),
            self.connectivity.clone(),
        )
        .start()
    }

    /// Submit an illegal-dumping report, queueing it when offline.
    pub async fn submit_report(&self, report: ReportDraft) -> WriteOutcome {
        self.write(Action::SubmitReport { report }).await
    }

    /// Book a waste pickup, queueing it when offline.
    pub async fn schedule_pickup(&self, pickup: PickupRequest) -> WriteOutcome {
        self.write(Action::SchedulePickup { pickup }).await
    }

    /// Redeem reward points, queueing the redemption when offline.
    pub async fn redeem_reward(&self, redemption: RewardRedemption) -> WriteOutcome {
        self.write(Action::RedeemReward { redemption }).await
    }

    async fn write(&self, action: Action) -> WriteOutcome {
        use binflow_sync::ActionExecutor;

        if self.connectivity.is_offline() {
            self.queue.enqueue(action).await;
            return WriteOutcome::Queued;
        }

        match self.api.execute(&action).await {
            Ok(()) => WriteOutcome::Sent,
            Err(err) => {
                tracing::warn!(error = %err, "live write failed, queueing for replay");
                self.queue.enqueue(action).await;
                WriteOutcome::Queued
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binflow_core::ReportId;
    use binflow_store::MemoryStore;

    fn draft() -> ReportDraft {
        ReportDraft {
            report_id: ReportId::new(),
            description: "burned waste by the roadside".to_string(),
            latitude: 5.6037,
            longitude: -0.1870,
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn offline_writes_are_queued_not_errored() {
        let state = AppState::with_store(
            ClientConfig::new("http://127.0.0.1:9"),
            Arc::new(MemoryStore::new()),
        )
        .await;
        state.connectivity.mark_offline();

        let outcome = state.submit_report(draft()).await;
        assert_eq!(outcome, WriteOutcome::Queued);
        assert_eq!(state.queue.len().await, 1);
    }

    #[tokio::test]
    async fn failed_live_write_falls_back_to_the_queue() {
        // Port 9 (discard) refuses connections; the live call fails fast.
        let state = AppState::with_store(
            ClientConfig::new("http://127.0.0.1:9"),
            Arc::new(MemoryStore::new()),
        )
        .await;

        let outcome = state.submit_report(draft()).await;
        assert_eq!(outcome, WriteOutcome::Queued);
        assert_eq!(state.queue.len().await, 1);
    }
}

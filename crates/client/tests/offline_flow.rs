//! End-to-end offline flow against in-memory fakes: capture writes while
//! offline, survive a restart, replay on reconnect, and keep quoting prices
//! from the fallback table the whole time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use binflow_core::ReportId;
use binflow_pricing::{
    ManualClock, PriceSource, PricingRpc, PricingService, PricingZone, ResolverConfig, RpcError,
    ZoneQuery,
};
use binflow_store::MemoryStore;
use binflow_sync::{
    Action, ActionExecutor, Connectivity, OfflineQueue, ReportDraft, SyncError,
};

/// Backend fake: scriptable availability, optional per-description failures.
struct FakeBackend {
    down: AtomicBool,
    reject: Mutex<Vec<String>>,
    delivered: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            down: AtomicBool::new(false),
            reject: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        })
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn reject(&self, description: &str) {
        self.reject.lock().unwrap().push(description.to_string());
    }

    fn accept_everything(&self) {
        self.reject.lock().unwrap().clear();
    }

    fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for FakeBackend {
    async fn execute(&self, action: &Action) -> Result<(), SyncError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SyncError::Network("backend unreachable".to_string()));
        }
        let Action::SubmitReport { report } = action else {
            return Ok(());
        };
        if self.reject.lock().unwrap().contains(&report.description) {
            return Err(SyncError::Api(503, "try later".to_string()));
        }
        self.delivered.lock().unwrap().push(report.description.clone());
        Ok(())
    }
}

struct UnreachableRpc;

#[async_trait]
impl PricingRpc for UnreachableRpc {
    async fn find_nearest_zone(&self, _query: &ZoneQuery) -> Result<Vec<PricingZone>, RpcError> {
        Err(RpcError::Network("no route to host".to_string()))
    }
}

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

#[tokio::test]
async fn writes_survive_a_restart_and_replay_in_order() {
    let store = Arc::new(MemoryStore::new());
    let backend = FakeBackend::new();

    // Session one: offline, three reports captured.
    {
        let connectivity = Arc::new(Connectivity::new());
        connectivity.mark_offline();
        let queue = OfflineQueue::load(store.clone(), connectivity).await;

        queue.enqueue(report("first")).await;
        queue.enqueue(report("second")).await;
        queue.enqueue(report("third")).await;
    }

    // Session two: the snapshot is restored from the store.
    let connectivity = Arc::new(Connectivity::new());
    let queue = OfflineQueue::load(store.clone(), connectivity.clone()).await;
    assert_eq!(queue.len().await, 3);

    // Reconnect; the backend rejects the second report this pass.
    backend.reject("second");
    let outcome = queue.replay(backend.as_ref()).await;
    assert_eq!(outcome.success, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(backend.delivered(), vec!["first", "third"]);

    // The rejected report is still queued, and lands on the next pass.
    backend.accept_everything();
    let outcome = queue.replay(backend.as_ref()).await;
    assert_eq!(outcome.success, 1);
    assert!(queue.is_empty().await);
    assert_eq!(backend.delivered(), vec!["first", "third", "second"]);

    // A third session sees the drained snapshot.
    let queue = OfflineQueue::load(store, Arc::new(Connectivity::new())).await;
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn backend_outage_never_blocks_a_price_quote() {
    let pricing = PricingService::with_config(
        Arc::new(UnreachableRpc),
        ManualClock::new(),
        ResolverConfig {
            rpc_timeout: std::time::Duration::from_millis(50),
            max_retries: 1,
            retry_backoff: std::time::Duration::ZERO,
            max_distance_km: 10.0,
        },
    );

    let quote = pricing.location_price(5.6037, -0.1870, 120).await;
    assert_eq!(quote.price, 30.0);
    assert_eq!(quote.source, PriceSource::Default);
    assert!(quote.zone.is_none());

    // Unsupported sizes coerce to the standard bin rather than failing.
    let quote = pricing.location_price(5.6037, -0.1870, 75).await;
    assert_eq!(quote.bin_size.liters(), 120);
    assert_eq!(quote.price, 30.0);
}

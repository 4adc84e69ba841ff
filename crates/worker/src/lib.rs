//! `binflow-worker` — the app's offline interception layer.
//!
//! Models the isolated worker context that sits between the app and the
//! network: versioned cache buckets with per-route strategies (cache-first
//! for the app shell, network-first for API reads, full bypass for auth),
//! plus the background sync dispatcher that drains offline reports and
//! nudges open tabs to refresh their user data.
//!
//! The worker talks to pages exclusively through [`WorkerMessage`] passing;
//! there is no shared state between the two sides.

pub mod buckets;
pub mod dispatch;
pub mod fetch;
pub mod messages;
pub mod request;

pub use buckets::{CacheBucket, CacheStorage};
pub use dispatch::{
    ClientRegistry, DispatchError, ReportStore, ReportSubmitter, StoredReport, SyncDispatcher,
    SyncOutcome, SyncTag,
};
pub use fetch::{FetchDecision, WorkerCache, WorkerCacheConfig, WorkerError};
pub use messages::WorkerMessage;
pub use request::{CachedResponse, FetchError, FetchRequest, Fetcher, RequestMode};

//! `binflow-sync` — offline-first write queue.
//!
//! User actions attempted without connectivity are captured as serializable
//! [`Action`] descriptors in a durable [`OfflineQueue`], then replayed
//! oldest-first against the backend once connectivity returns. A background
//! [`SyncWorker`] owns the probe-and-replay loop.
//!
//! Replay is single-flight and loss-free: entries enqueued while a pass is
//! running are picked up by the next pass, failed entries are re-queued in
//! order, and every queue mutation is mirrored to the key-value store so a
//! restart resumes pending work.

pub mod action;
pub mod connectivity;
pub mod queue;
pub mod worker;

pub use action::{
    Action, ActionExecutor, PickupRequest, QueuedAction, ReportDraft, RewardRedemption, SyncError,
};
pub use connectivity::{Connectivity, ConnectivityState};
pub use queue::{OfflineQueue, ReplayOutcome};
pub use worker::{ConnectivityProbe, SyncWorker, SyncWorkerHandle};

//! Deferred write actions.
//!
//! Queued work is stored as tagged data, not closures, so a snapshot written
//! by one process can be replayed by another after a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use binflow_core::{BinSize, PickupId, ReportId};

/// An illegal-dumping report composed on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub report_id: ReportId,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A waste-pickup booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub pickup_id: PickupId,
    pub bin_size: BinSize,
    pub address: String,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A reward-points redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRedemption {
    pub reward_id: String,
    pub points: u32,
}

/// A deferred backend write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    SubmitReport { report: ReportDraft },
    SchedulePickup { pickup: PickupRequest },
    RedeemReward { redemption: RewardRedemption },
}

/// An action waiting in the offline queue.
///
/// `id` is a UUIDv7, so enqueue order and id order agree. `attempts` counts
/// failed replay executions; it is informational and never gates replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    pub action: Action,
}

/// Sync-layer error.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("client is offline")]
    Offline,
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Executes a queued action against the backend.
///
/// Implemented by the API client; test code substitutes fakes.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &Action) -> Result<(), SyncError>;
}

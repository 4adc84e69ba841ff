//! Messages exchanged between open app tabs and the worker context.
//!
//! The two sides share no memory; this tagged enum is the whole protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message on the page ↔ worker channel.
///
/// `SkipWaiting` and `CacheUserData` flow page → worker; `SyncUserData`
/// flows worker → pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate the waiting worker generation immediately.
    SkipWaiting,
    /// Warm the API cache with fresh user stats/activity.
    CacheUserData { payload: Value },
    /// Ask every open tab to refresh its cached user data.
    SyncUserData { timestamp: DateTime<Utc> },
}

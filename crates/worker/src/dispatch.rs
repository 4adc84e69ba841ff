//! Background sync dispatcher.
//!
//! Reacts to platform sync events inside the worker context: drains the
//! durable store of offline-captured reports one at a time, and relays
//! user-data refresh signals to every open tab. Also terminates the direct
//! message channel from pages (skip-waiting, proactive user-data pushes).

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::fetch::WorkerCache;
use crate::messages::WorkerMessage;

/// Tag of a platform sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTag {
    /// Replay offline-captured dumping reports.
    Reports,
    /// Tell open tabs to refresh cached user stats/activity.
    UserData,
}

impl SyncTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncTag::Reports => "sync-reports",
            SyncTag::UserData => "sync-user-data",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "sync-reports" => Some(SyncTag::Reports),
            "sync-user-data" => Some(SyncTag::UserData),
            _ => None,
        }
    }
}

/// A report captured offline, as persisted in the worker's durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: Uuid,
    pub payload: serde_json::Value,
}

/// Dispatcher-level failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("report store error: {0}")]
    Storage(String),
    #[error("report submission failed: {0}")]
    Submit(String),
}

/// Durable store of offline reports (get-all and delete-by-id, matching the
/// object store it fronts).
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// All pending reports, oldest first.
    async fn all(&self) -> Result<Vec<StoredReport>, DispatchError>;
    async fn delete(&self, id: Uuid) -> Result<(), DispatchError>;
}

/// Submits one report to the backend.
#[async_trait]
pub trait ReportSubmitter: Send + Sync {
    async fn submit(&self, report: &StoredReport) -> Result<(), DispatchError>;
}

/// Outcome of one sync-event dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub submitted: usize,
    pub failed: usize,
    pub clients_notified: usize,
}

/// Connected app tabs, addressed as a broadcast group.
///
/// Channels whose receiving tab has gone away are pruned on the next send.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    senders: Mutex<Vec<mpsc::UnboundedSender<WorkerMessage>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab; the returned receiver is the tab's end of the channel.
    pub fn connect(&self) -> mpsc::UnboundedReceiver<WorkerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().expect("client registry lock poisoned").push(tx);
        rx
    }

    /// Send a message to every connected tab. Returns how many received it.
    pub fn broadcast(&self, message: WorkerMessage) -> usize {
        let mut senders = self.senders.lock().expect("client registry lock poisoned");
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        senders.len()
    }

    pub fn len(&self) -> usize {
        self.senders.lock().expect("client registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker-side dispatcher for sync events and page messages.
pub struct SyncDispatcher {
    cache: Arc<WorkerCache>,
    reports: Arc<dyn ReportStore>,
    submitter: Arc<dyn ReportSubmitter>,
    clients: ClientRegistry,
}

impl SyncDispatcher {
    pub fn new(
        cache: Arc<WorkerCache>,
        reports: Arc<dyn ReportStore>,
        submitter: Arc<dyn ReportSubmitter>,
    ) -> Self {
        Self {
            cache,
            reports,
            submitter,
            clients: ClientRegistry::new(),
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Handle a platform sync event.
    pub async fn handle_sync(&self, tag: SyncTag) -> Result<SyncOutcome, DispatchError> {
        match tag {
            SyncTag::Reports => self.flush_reports().await,
            SyncTag::UserData => {
                let notified = self.clients.broadcast(WorkerMessage::SyncUserData {
                    timestamp: Utc::now(),
                });
                tracing::debug!(clients = notified, "requested user-data refresh");
                Ok(SyncOutcome {
                    clients_notified: notified,
                    ..SyncOutcome::default()
                })
            }
        }
    }

    /// Handle a direct message from an open tab.
    pub async fn handle_message(&self, message: WorkerMessage) {
        match message {
            WorkerMessage::SkipWaiting => {
                tracing::info!("page requested immediate worker activation");
                self.cache.request_skip_waiting();
            }
            WorkerMessage::CacheUserData { payload } => {
                self.cache.cache_user_data(payload).await;
            }
            WorkerMessage::SyncUserData { .. } => {
                // Worker → page only; a page echoing it back is a no-op.
                tracing::debug!("ignoring SYNC_USER_DATA from a page");
            }
        }
    }

    /// Submit pending reports one at a time, deleting each on success and
    /// leaving failures in place for the next sync event.
    async fn flush_reports(&self) -> Result<SyncOutcome, DispatchError> {
        let pending = self.reports.all().await?;
        if pending.is_empty() {
            return Ok(SyncOutcome::default());
        }

        tracing::info!(pending = pending.len(), "submitting offline reports");
        let mut outcome = SyncOutcome::default();

        for report in pending {
            match self.submitter.submit(&report).await {
                Ok(()) => {
                    if let Err(err) = self.reports.delete(report.id).await {
                        // The report will be re-submitted next pass; the
                        // backend treats report ids as idempotency keys.
                        tracing::warn!(id = %report.id, error = %err, "failed to delete submitted report");
                    }
                    outcome.submitted += 1;
                }
                Err(err) => {
                    tracing::warn!(id = %report.id, error = %err, "report submission failed, keeping it");
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}

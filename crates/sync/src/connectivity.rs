//! Connectivity state shared across the client.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::action::SyncError;

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Online and able to reach the backend.
    Online,
    /// Offline (network unreachable or backend unavailable).
    Offline,
}

/// Shared connectivity flag.
///
/// Writers report probe results via [`mark_online`](Self::mark_online) /
/// [`mark_offline`](Self::mark_offline); the return value exposes the
/// transition edge so exactly one caller observes each state change.
#[derive(Debug)]
pub struct Connectivity {
    offline: AtomicBool,
}

impl Connectivity {
    /// Starts online; the first failed probe flips it.
    pub fn new() -> Self {
        Self {
            offline: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        if self.is_offline() {
            ConnectivityState::Offline
        } else {
            ConnectivityState::Online
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Record an online probe. Returns `true` when this call transitioned
    /// the state from offline to online.
    pub fn mark_online(&self) -> bool {
        self.offline.swap(false, Ordering::SeqCst)
    }

    /// Record an offline probe. Returns `true` when this call transitioned
    /// the state from online to offline.
    pub fn mark_offline(&self) -> bool {
        !self.offline.swap(true, Ordering::SeqCst)
    }

    /// Ensure the client is online; error if offline.
    pub fn require_online(&self) -> Result<(), SyncError> {
        if self.is_offline() {
            Err(SyncError::Offline)
        } else {
            Ok(())
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_transitions_exactly_once() {
        let conn = Connectivity::new();
        assert_eq!(conn.state(), ConnectivityState::Online);

        assert!(conn.mark_offline());
        assert!(!conn.mark_offline());
        assert!(conn.is_offline());

        assert!(conn.mark_online());
        assert!(!conn.mark_online());
        assert_eq!(conn.state(), ConnectivityState::Online);
    }

    #[test]
    fn require_online_gates_on_state() {
        let conn = Connectivity::new();
        assert!(conn.require_online().is_ok());

        conn.mark_offline();
        assert!(matches!(conn.require_online(), Err(SyncError::Offline)));
    }
}

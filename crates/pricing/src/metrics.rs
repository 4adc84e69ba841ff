//! Resolver metrics and derived health.

use serde::Serialize;

/// Counters tracked by the pricing service, over the life of the process.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub rpc_calls: u64,
    pub rpc_successes: u64,
    pub rpc_failures: u64,
    pub circuit_breaker_trips: u64,
}

impl MetricsSnapshot {
    /// Fraction of settled RPC calls that failed. Zero when nothing has been
    /// attempted yet.
    pub fn failure_ratio(&self) -> f64 {
        let settled = self.rpc_successes + self.rpc_failures;
        if settled == 0 {
            return 0.0;
        }
        self.rpc_failures as f64 / settled as f64
    }
}

/// Coarse health of the pricing lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Lookups are flowing normally.
    Healthy,
    /// More than half of recent lookups failed; fallback pricing is likely.
    Warning,
    /// The circuit breaker is open; no lookups are being attempted.
    Degraded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_ratio_handles_zero_calls() {
        assert_eq!(MetricsSnapshot::default().failure_ratio(), 0.0);
    }

    #[test]
    fn failure_ratio_counts_settled_calls_only() {
        let snapshot = MetricsSnapshot {
            rpc_successes: 1,
            rpc_failures: 3,
            ..Default::default()
        };
        assert_eq!(snapshot.failure_ratio(), 0.75);
    }
}

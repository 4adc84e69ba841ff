//! Circuit breaker guarding the pricing RPC.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;

const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Consecutive-failure circuit breaker.
///
/// Closed until `threshold` consecutive failures are recorded; while open,
/// calls are blocked until `reset_timeout` has elapsed since the most recent
/// failure, after which a single half-open probe is allowed through. A
/// successful probe closes the breaker; a failed one keeps it open and
/// restarts the cooldown.
///
/// State is process-lifetime only; nothing is persisted.
#[derive(Debug)]
pub struct CircuitBreaker {
    clock: Arc<dyn Clock>,
    threshold: u32,
    reset_timeout: Duration,
    failures: u32,
    last_failure: Option<Instant>,
    open: bool,
}

impl CircuitBreaker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(clock, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT)
    }

    pub fn with_policy(clock: Arc<dyn Clock>, threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            clock,
            threshold,
            reset_timeout,
            failures: 0,
            last_failure: None,
            open: false,
        }
    }

    /// Whether a call may be attempted right now.
    ///
    /// True when closed, or when open but the cooldown has elapsed (the
    /// half-open probe).
    pub fn is_allowed(&self) -> bool {
        if !self.open {
            return true;
        }
        match self.last_failure {
            Some(at) => self.clock.now().saturating_duration_since(at) >= self.reset_timeout,
            None => true,
        }
    }

    /// Record a successful call: closes the breaker and clears all failure
    /// state.
    pub fn record_success(&mut self) {
        self.failures = 0;
        self.last_failure = None;
        self.open = false;
    }

    /// Record a failed call.
    ///
    /// Returns `true` when this failure tripped the breaker open (a
    /// closed-to-open transition), so callers can count trips.
    pub fn record_failure(&mut self) -> bool {
        self.failures += 1;
        self.last_failure = Some(self.clock.now());
        if !self.open && self.failures >= self.threshold {
            self.open = true;
            return true;
        }
        false
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }
}

//! `binflow-client` — app-facing facade.
//!
//! Wires the offline queue, pricing resolver and connectivity tracking
//! around one [`ApiClient`] that speaks to the hosted backend. UI layers
//! hold an [`AppState`] and call its write methods; whether a write went out
//! live or was queued for replay is reported, never thrown.

pub mod api;
pub mod config;
pub mod state;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use state::{AppState, WriteOutcome};

/// Initialize process-wide logging. App shells call this once at startup.
pub fn init_observability() {
    binflow_observability::init();
}

//! `binflow-pricing` — GPS-based pricing resolution.
//!
//! Resolves per-bin-size prices for a geographic location by querying the
//! backend's nearest-zone lookup, with the layers a flaky mobile network
//! demands stacked around the call:
//!
//! - a TTL cache keyed by quantized coordinates ([`cache`]),
//! - a circuit breaker that stops hammering a failing backend ([`breaker`]),
//! - timeout + retry with linear backoff ([`resolver`]),
//! - a static fallback price table ([`tables`]).
//!
//! The public entry point is [`PricingService`], an explicitly constructed
//! service object with an injected clock and RPC implementation. Its lookup
//! contract never fails: callers always get a price, sourced from GPS data
//! when possible and from the fallback table otherwise.

pub mod breaker;
pub mod cache;
pub mod clock;
pub mod metrics;
pub mod resolver;
pub mod tables;
pub mod zone;

pub use breaker::CircuitBreaker;
pub use cache::PricingCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::{HealthStatus, MetricsSnapshot};
pub use resolver::{LocationPrice, LocationPrices, PriceSource, PricingService, ResolverConfig};
pub use zone::{PricingRpc, PricingZone, RpcError, ZoneQuery, ZoneSummary};

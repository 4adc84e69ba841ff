//! GPS pricing resolution service.
//!
//! [`PricingService`] owns the cache, breaker and metrics for the pricing
//! lookup path, and composes them around the injected [`PricingRpc`]:
//! validate → cache → breaker → timeout/retry → record + cache outcome.
//!
//! The zone lookup never fails across its public boundary: every failure
//! mode (bad input, open breaker, exhausted retries) collapses to `None`,
//! which callers read as "use fallback pricing". Two concurrent lookups for
//! the same slot may both miss the cache and both hit the network; requests
//! are not coalesced.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use binflow_core::{BinSize, Coordinates};

use crate::breaker::CircuitBreaker;
use crate::cache::PricingCache;
use crate::clock::Clock;
use crate::metrics::{HealthStatus, MetricsSnapshot};
use crate::tables::default_price;
use crate::zone::{PricingRpc, PricingZone, RpcError, ZoneQuery, ZoneSummary};

/// Tunables for the lookup path.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Per-attempt deadline for the RPC.
    pub rpc_timeout: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
    /// Search radius passed to the nearest-zone lookup.
    pub max_distance_km: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            max_distance_km: 10.0,
        }
    }
}

/// Where a quoted price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Resolved from the nearest pricing zone.
    Gps,
    /// Taken from the static fallback table.
    Default,
}

/// A price quote for one bin size at one location.
#[derive(Debug, Clone, Serialize)]
pub struct LocationPrice {
    pub bin_size: BinSize,
    pub price: f64,
    pub source: PriceSource,
    pub zone: Option<ZoneSummary>,
}

/// Price quotes for every supported bin size at one location.
#[derive(Debug, Clone, Serialize)]
pub struct LocationPrices {
    pub source: PriceSource,
    pub zone: Option<ZoneSummary>,
    /// Keyed by capacity in liters.
    pub prices: BTreeMap<u32, f64>,
}

/// Location-based pricing with cache, breaker, retry and fallback.
pub struct PricingService {
    rpc: Arc<dyn PricingRpc>,
    config: ResolverConfig,
    cache: Mutex<PricingCache>,
    breaker: Mutex<CircuitBreaker>,
    metrics: Mutex<MetricsSnapshot>,
}

impl PricingService {
    pub fn new(rpc: Arc<dyn PricingRpc>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(rpc, clock, ResolverConfig::default())
    }

    pub fn with_config(
        rpc: Arc<dyn PricingRpc>,
        clock: Arc<dyn Clock>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            rpc,
            config,
            cache: Mutex::new(PricingCache::new(clock.clone())),
            breaker: Mutex::new(CircuitBreaker::new(clock)),
            metrics: Mutex::new(MetricsSnapshot::default()),
        }
    }

    /// Find the nearest pricing zone within the configured search radius.
    ///
    /// `None` means "no zone": not found, invalid input, breaker open, or
    /// lookup failed. Callers fall back to the static table either way.
    pub async fn find_nearest_zone(&self, latitude: f64, longitude: f64) -> Option<PricingZone> {
        self.find_nearest_zone_within(latitude, longitude, self.config.max_distance_km)
            .await
    }

    /// As [`Self::find_nearest_zone`], with an explicit search radius.
    pub async fn find_nearest_zone_within(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Option<PricingZone> {
        self.metrics().total_requests += 1;

        if Coordinates::new(latitude, longitude).is_err() {
            tracing::warn!(latitude, longitude, "rejecting invalid coordinates");
            return None;
        }

        {
            let cache = self.cache();
            if let Some(entry) = cache.get(latitude, longitude) {
                if cache.is_valid(entry) {
                    let zone = entry.zone.clone();
                    drop(cache);
                    self.metrics().cache_hits += 1;
                    return zone;
                }
            }
        }

        if !self.breaker().is_allowed() {
            tracing::debug!("pricing breaker open, skipping zone lookup");
            return None;
        }

        self.metrics().rpc_calls += 1;

        let query = ZoneQuery {
            latitude,
            longitude,
            max_distance_km,
        };

        match self.call_with_retry(&query).await {
            Ok(zones) => {
                let zone = zones.into_iter().next();
                self.breaker().record_success();
                self.metrics().rpc_successes += 1;
                self.cache().insert(latitude, longitude, zone.clone(), false);
                zone
            }
            Err(err) => {
                tracing::warn!(error = %err, latitude, longitude, "nearest-zone lookup failed");
                self.metrics().rpc_failures += 1;
                if self.breaker().record_failure() {
                    self.metrics().circuit_breaker_trips += 1;
                    tracing::warn!("pricing circuit breaker opened");
                }
                // Cache the failure with the short TTL to rate-limit retries.
                self.cache().insert(latitude, longitude, None, true);
                None
            }
        }
    }

    /// Price one bin size at a location.
    ///
    /// Unsupported sizes are coerced to the standard 120L bin. When the
    /// resolved zone has no price for the size, the quote falls back to the
    /// static table and carries no zone.
    pub async fn location_price(
        &self,
        latitude: f64,
        longitude: f64,
        requested_liters: u32,
    ) -> LocationPrice {
        let size = BinSize::from_liters_or_standard(requested_liters);

        if let Some(zone) = self.find_nearest_zone(latitude, longitude).await {
            if let Some(price) = zone.price_for(size) {
                return LocationPrice {
                    bin_size: size,
                    price,
                    source: PriceSource::Gps,
                    zone: Some(zone.summary()),
                };
            }
        }

        LocationPrice {
            bin_size: size,
            price: default_price(size),
            source: PriceSource::Default,
            zone: None,
        }
    }

    /// Price every supported bin size at a location with a single lookup.
    ///
    /// Capacities the zone does not serve are filled from the static table.
    pub async fn all_prices_for_location(&self, latitude: f64, longitude: f64) -> LocationPrices {
        let zone = self.find_nearest_zone(latitude, longitude).await;

        let mut prices = BTreeMap::new();
        for size in BinSize::ALL {
            let price = zone
                .as_ref()
                .and_then(|z| z.price_for(size))
                .unwrap_or_else(|| default_price(size));
            prices.insert(size.liters(), price);
        }

        LocationPrices {
            source: if zone.is_some() {
                PriceSource::Gps
            } else {
                PriceSource::Default
            },
            zone: zone.map(|z| z.summary()),
            prices,
        }
    }

    /// Monthly base cost: per-pickup price times pickups per month.
    pub async fn base_cost(
        &self,
        latitude: f64,
        longitude: f64,
        requested_liters: u32,
        pickups_per_month: u32,
    ) -> f64 {
        let quote = self.location_price(latitude, longitude, requested_liters).await;
        quote.price * f64::from(pickups_per_month)
    }

    /// Coarse health of the lookup path.
    pub fn health_status(&self) -> HealthStatus {
        if self.breaker().is_open() {
            return HealthStatus::Degraded;
        }
        if self.metrics().failure_ratio() > 0.5 {
            return HealthStatus::Warning;
        }
        HealthStatus::Healthy
    }

    /// Snapshot of the service counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics().clone()
    }

    /// Drop all cached lookups (manual invalidation).
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    async fn call_with_retry(&self, query: &ZoneQuery) -> Result<Vec<PricingZone>, RpcError> {
        let mut last_err = RpcError::Network("lookup not attempted".to_string());

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_backoff * attempt).await;
            }

            match tokio::time::timeout(self.config.rpc_timeout, self.rpc.find_nearest_zone(query))
                .await
            {
                Ok(Ok(zones)) => return Ok(zones),
                Ok(Err(err)) => {
                    tracing::debug!(attempt, error = %err, "zone lookup attempt failed");
                    last_err = err;
                }
                Err(_) => {
                    tracing::debug!(attempt, "zone lookup attempt timed out");
                    last_err = RpcError::Timeout;
                }
            }
        }

        Err(last_err)
    }

    // Lock accessors. None of these guards is ever held across an await.
    fn cache(&self) -> MutexGuard<'_, PricingCache> {
        self.cache.lock().expect("pricing cache lock poisoned")
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().expect("pricing breaker lock poisoned")
    }

    fn metrics(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.metrics.lock().expect("pricing metrics lock poisoned")
    }
}

//! Time-bounded cache of zone lookups, keyed by quantized coordinates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::zone::PricingZone;

/// TTL for entries holding a real lookup result (zone found, or a confirmed
/// "no zone in range").
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for entries recording a lookup failure. Kept short so the next probe
/// happens quickly once the backend recovers.
const DEFAULT_ERROR_TTL: Duration = Duration::from_secs(30);

/// One cached lookup outcome.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The resolved zone, or `None` for a confirmed "no zone in range".
    pub zone: Option<PricingZone>,
    pub cached_at: Instant,
    /// Whether this entry records a failed lookup rather than a result.
    pub is_error: bool,
}

/// Coordinate-keyed lookup cache.
///
/// Keys are quantized to 4 decimal places (~11 m), so nearby queries collapse
/// into one slot. Entries are not persisted; the cache lives and dies with
/// the owning service.
#[derive(Debug)]
pub struct PricingCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    error_ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

/// Quantize a coordinate pair into a cache key.
///
/// Each coordinate is rounded to 4 decimal places. Rounding the scaled
/// integer (rather than formatting the float) keeps `-0.00001` and `0.00001`
/// in the same slot.
pub fn quantized_key(latitude: f64, longitude: f64) -> String {
    let lat = (latitude * 1e4).round() as i64;
    let lng = (longitude * 1e4).round() as i64;
    format!("{lat},{lng}")
}

impl PricingCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttls(clock, DEFAULT_TTL, DEFAULT_ERROR_TTL)
    }

    pub fn with_ttls(clock: Arc<dyn Clock>, ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            error_ttl,
            entries: HashMap::new(),
        }
    }

    /// Look up the entry for a coordinate pair, valid or not.
    pub fn get(&self, latitude: f64, longitude: f64) -> Option<&CacheEntry> {
        self.entries.get(&quantized_key(latitude, longitude))
    }

    /// Store a lookup outcome for a coordinate pair.
    pub fn insert(
        &mut self,
        latitude: f64,
        longitude: f64,
        zone: Option<PricingZone>,
        is_error: bool,
    ) {
        self.entries.insert(
            quantized_key(latitude, longitude),
            CacheEntry {
                zone,
                cached_at: self.clock.now(),
                is_error,
            },
        );
    }

    /// Whether an entry is still within its TTL.
    pub fn is_valid(&self, entry: &CacheEntry) -> bool {
        let ttl = if entry.is_error {
            self.error_ttl
        } else {
            self.ttl
        };
        self.clock.now().saturating_duration_since(entry.cached_at) < ttl
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Pricing zone types and the remote lookup contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use binflow_core::BinSize;

/// A geographic pricing zone as returned by the backend's nearest-zone
/// lookup.
///
/// Field names match the RPC payload: one `price_<N>l` column per supported
/// bin capacity, plus the distance from the query point. Columns may be NULL
/// for capacities a zone does not serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingZone {
    pub region: String,
    pub district: String,
    pub community: String,
    #[serde(default)]
    pub suburb: Option<String>,
    pub distance_km: f64,
    #[serde(default)]
    pub price_50l: Option<f64>,
    #[serde(default)]
    pub price_60l: Option<f64>,
    #[serde(default)]
    pub price_80l: Option<f64>,
    #[serde(default)]
    pub price_90l: Option<f64>,
    #[serde(default)]
    pub price_100l: Option<f64>,
    #[serde(default)]
    pub price_120l: Option<f64>,
    #[serde(default)]
    pub price_240l: Option<f64>,
    #[serde(default)]
    pub price_260l: Option<f64>,
    #[serde(default)]
    pub price_320l: Option<f64>,
    #[serde(default)]
    pub price_340l: Option<f64>,
    #[serde(default)]
    pub price_360l: Option<f64>,
    #[serde(default)]
    pub price_660l: Option<f64>,
    #[serde(default)]
    pub price_1100l: Option<f64>,
}

impl PricingZone {
    /// The zone's price for a bin capacity, if it serves that capacity.
    pub fn price_for(&self, size: BinSize) -> Option<f64> {
        match size {
            BinSize::L50 => self.price_50l,
            BinSize::L60 => self.price_60l,
            BinSize::L80 => self.price_80l,
            BinSize::L90 => self.price_90l,
            BinSize::L100 => self.price_100l,
            BinSize::L120 => self.price_120l,
            BinSize::L240 => self.price_240l,
            BinSize::L260 => self.price_260l,
            BinSize::L320 => self.price_320l,
            BinSize::L340 => self.price_340l,
            BinSize::L360 => self.price_360l,
            BinSize::L660 => self.price_660l,
            BinSize::L1100 => self.price_1100l,
        }
    }

    /// Identity-and-distance view of the zone, without the price columns.
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            region: self.region.clone(),
            district: self.district.clone(),
            community: self.community.clone(),
            suburb: self.suburb.clone(),
            distance_km: self.distance_km,
        }
    }

    /// A zone with empty identifiers and no prices. Useful as a base for
    /// struct-update syntax in tests.
    pub fn empty() -> Self {
        Self {
            region: String::new(),
            district: String::new(),
            community: String::new(),
            suburb: None,
            distance_km: 0.0,
            price_50l: None,
            price_60l: None,
            price_80l: None,
            price_90l: None,
            price_100l: None,
            price_120l: None,
            price_240l: None,
            price_260l: None,
            price_320l: None,
            price_340l: None,
            price_360l: None,
            price_660l: None,
            price_1100l: None,
        }
    }
}

/// Zone identity attached to price results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub region: String,
    pub district: String,
    pub community: String,
    pub suburb: Option<String>,
    pub distance_km: f64,
}

/// Arguments for the nearest-zone lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub max_distance_km: f64,
}

/// Remote lookup failure.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("lookup timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// The backend's nearest-zone lookup.
///
/// Returns zero or one zones; an empty vec means no zone within
/// `max_distance_km` of the query point.
#[async_trait]
pub trait PricingRpc: Send + Sync {
    async fn find_nearest_zone(&self, query: &ZoneQuery) -> Result<Vec<PricingZone>, RpcError>;
}

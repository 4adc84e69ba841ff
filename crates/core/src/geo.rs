//! Geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A validated WGS-84 coordinate pair.
///
/// Construction rejects non-finite and out-of-range values, so downstream
/// code (cache keys, RPC payloads) can assume well-formed numbers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> DomainResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(DomainError::validation("coordinates must be finite"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::validation(format!(
                "latitude out of range: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::validation(format!(
                "longitude out of range: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl core::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

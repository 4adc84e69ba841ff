//! Bin-size vocabulary.
//!
//! Pricing is quoted per bin capacity in liters. The set of capacities is
//! fixed by the backend schema (`price_<N>l` columns on pricing zones), so it
//! is modelled as a closed enum rather than a free integer.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A supported bin capacity, in liters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum BinSize {
    L50,
    L60,
    L80,
    L90,
    L100,
    L120,
    L240,
    L260,
    L320,
    L340,
    L360,
    L660,
    L1100,
}

impl BinSize {
    /// All supported capacities, smallest first.
    pub const ALL: [BinSize; 13] = [
        BinSize::L50,
        BinSize::L60,
        BinSize::L80,
        BinSize::L90,
        BinSize::L100,
        BinSize::L120,
        BinSize::L240,
        BinSize::L260,
        BinSize::L320,
        BinSize::L340,
        BinSize::L360,
        BinSize::L660,
        BinSize::L1100,
    ];

    /// The standard household bin used when a requested size is unsupported.
    pub const STANDARD: BinSize = BinSize::L120;

    /// Capacity in liters.
    pub fn liters(self) -> u32 {
        match self {
            BinSize::L50 => 50,
            BinSize::L60 => 60,
            BinSize::L80 => 80,
            BinSize::L90 => 90,
            BinSize::L100 => 100,
            BinSize::L120 => 120,
            BinSize::L240 => 240,
            BinSize::L260 => 260,
            BinSize::L320 => 320,
            BinSize::L340 => 340,
            BinSize::L360 => 360,
            BinSize::L660 => 660,
            BinSize::L1100 => 1100,
        }
    }

    /// Look up a capacity by its liter value.
    pub fn from_liters(liters: u32) -> Option<BinSize> {
        BinSize::ALL.iter().copied().find(|b| b.liters() == liters)
    }

    /// Look up a capacity by its liter value, coercing unsupported values to
    /// [`BinSize::STANDARD`].
    ///
    /// Callers that need to distinguish "unsupported" from "standard" should
    /// use [`BinSize::from_liters`] instead.
    pub fn from_liters_or_standard(liters: u32) -> BinSize {
        match BinSize::from_liters(liters) {
            Some(size) => size,
            None => {
                tracing::debug!(liters, "unsupported bin size, using standard");
                BinSize::STANDARD
            }
        }
    }
}

impl From<BinSize> for u32 {
    fn from(value: BinSize) -> Self {
        value.liters()
    }
}

impl TryFrom<u32> for BinSize {
    type Error = DomainError;

    fn try_from(liters: u32) -> Result<Self, Self::Error> {
        BinSize::from_liters(liters)
            .ok_or_else(|| DomainError::validation(format!("unsupported bin size: {liters}L")))
    }
}

impl core::fmt::Display for BinSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}L", self.liters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liters_round_trip_for_all_sizes() {
        for size in BinSize::ALL {
            assert_eq!(BinSize::from_liters(size.liters()), Some(size));
        }
    }

    #[test]
    fn unsupported_size_coerces_to_standard() {
        assert_eq!(BinSize::from_liters_or_standard(75), BinSize::L120);
        assert_eq!(BinSize::from_liters_or_standard(0), BinSize::L120);
    }

    #[test]
    fn supported_size_is_preserved() {
        assert_eq!(BinSize::from_liters_or_standard(240), BinSize::L240);
    }

    #[test]
    fn serde_uses_liter_values() {
        let json = serde_json::to_string(&BinSize::L240).unwrap();
        assert_eq!(json, "240");

        let parsed: BinSize = serde_json::from_str("660").unwrap();
        assert_eq!(parsed, BinSize::L660);

        assert!(serde_json::from_str::<BinSize>("75").is_err());
    }
}

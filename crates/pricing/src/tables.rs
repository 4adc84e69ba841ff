//! Static fallback price table.
//!
//! Used whenever no zone is found or the lookup is unavailable, so pricing
//! never depends on connectivity.

use binflow_core::BinSize;

/// Fallback price for a bin capacity, in GHS per pickup.
pub fn default_price(size: BinSize) -> f64 {
    match size {
        BinSize::L50 => 15.0,
        BinSize::L60 => 18.0,
        BinSize::L80 => 22.0,
        BinSize::L90 => 25.0,
        BinSize::L100 => 28.0,
        BinSize::L120 => 30.0,
        BinSize::L240 => 55.0,
        BinSize::L260 => 60.0,
        BinSize::L320 => 70.0,
        BinSize::L340 => 75.0,
        BinSize::L360 => 80.0,
        BinSize::L660 => 130.0,
        BinSize::L1100 => 200.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bin_costs_thirty() {
        assert_eq!(default_price(BinSize::L120), 30.0);
    }

    #[test]
    fn prices_increase_with_capacity() {
        let prices: Vec<f64> = BinSize::ALL.iter().map(|s| default_price(*s)).collect();
        assert!(prices.windows(2).all(|w| w[0] < w[1]));
    }
}

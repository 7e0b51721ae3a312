use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use tracing::warn;

/// Minimal bit count for `n` items at false-positive rate `p`, assuming the
/// optimal key count is used.
pub fn num_bits(n: f64, p: f64) -> f64 {
    ((n * p.ln()) / (1.0 / 2f64.powf(LN_2)).ln()).ceil()
}

/// Optimal key count for `m` bits holding `n` items. Zero items means zero keys.
pub fn num_keys(m: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    ((m / n) * LN_2).round().max(1.0)
}

/// Bit length and key count chosen for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomSizing {
    pub num_bits: u64,
    pub num_keys: u64,
}

impl BloomSizing {
    /// Size a filter for `num_items` at `false_positive_rate`, capped at
    /// `max_bits`. `max_bits == 0` yields a single-bit filter.
    pub fn plan(num_items: u64, false_positive_rate: f64, max_bits: u64) -> Self {
        // float -> int casts saturate, NaN becomes 0
        let optimal = num_bits(num_items as f64, false_positive_rate) as u64;
        let num_bits = if max_bits == 0 {
            1
        } else if optimal > max_bits {
            warn!(optimal, max_bits, num_items, "bloom filter clamped to bit budget");
            max_bits
        } else {
            optimal
        };
        let num_keys = num_keys(num_bits as f64, num_items as f64) as u64;
        Self { num_bits, num_keys }
    }
}

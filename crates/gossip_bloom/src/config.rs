use crate::bloom::Bloom;
use crate::consts::{DEFAULT_FALSE_POSITIVE_RATE, DEFAULT_MAX_BITS, DEFAULT_NUM_ITEMS};
use crate::errors::{BloomError, Result};
use crate::sizing::BloomSizing;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sizing parameters handed over by the gossip client.
///
/// Missing fields in a JSON file fall back to the defaults, so
/// `{"num_items": 5000}` is a complete config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub num_items: u64,
    pub false_positive_rate: f64,
    pub max_bits: u64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            num_items: DEFAULT_NUM_ITEMS,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            max_bits: DEFAULT_MAX_BITS,
        }
    }
}

impl BloomConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: BloomConfig = serde_json::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects rates outside (0, 1) and a zero item count. The raw
    /// constructors accept zero items (a keyless filter); a config that is
    /// meant to build a usable filter does not.
    pub fn validate(&self) -> Result<()> {
        self.validate_rate()?;
        if self.num_items == 0 {
            return Err(BloomError::InvalidItemCount);
        }
        Ok(())
    }

    pub fn validate_rate(&self) -> Result<()> {
        let p = self.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(BloomError::InvalidFalsePositiveRate(p));
        }
        Ok(())
    }

    pub fn sizing(&self) -> BloomSizing {
        BloomSizing::plan(self.num_items, self.false_positive_rate, self.max_bits)
    }

    pub fn build(&self) -> Result<Bloom> {
        self.build_with_rng(&mut rand::rng())
    }

    pub fn build_with_rng<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<Bloom> {
        Bloom::from_config_with_rng(self, rng)
    }
}

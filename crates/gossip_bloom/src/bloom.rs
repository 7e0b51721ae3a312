//! Bloom filter keyed by salted FNV-1a over 32-byte item digests.
//!
//! A gossip node inserts the digests of items it already holds and sends the
//! filter along with a pull request; the peer skips every item the filter
//! contains. False positives only cost a missed item for one round, false
//! negatives never happen.
use rand::RngCore;
use tracing::{debug, trace};

use crate::bitvec::{BitVec, Word};
use crate::config::BloomConfig;
use crate::consts::DIGEST_BYTES;
use crate::errors::Result;
use crate::hash::fnv1a;
use crate::sizing::BloomSizing;

pub type Digest = [u8; DIGEST_BYTES];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bloom<W: Word = u64> {
    keys: Vec<u64>,
    bits: BitVec<W>,
    num_bits_set: u64,
}

impl Bloom {
    /// Empty word-packed filter of `num_bits` bits hashing with `keys`.
    pub fn new(num_bits: u64, keys: Vec<u64>) -> Self {
        Self::with_packing(num_bits, keys)
    }

    /// Filter sized for `num_items` at `false_positive_rate`, with keys drawn
    /// from the thread-local generator.
    ///
    /// # Panics
    ///
    /// A rate outside (0, 1) sizes the filter to zero bits, so the first
    /// `add` or `contains` panics. Run [`BloomConfig::validate`] first, or
    /// build through [`Bloom::from_config`].
    pub fn random(num_items: u64, false_positive_rate: f64, max_bits: u64) -> Self {
        Self::random_with_rng(num_items, false_positive_rate, max_bits, &mut rand::rng())
    }

    /// Same as [`Bloom::random`] with keys drawn from `rng`.
    ///
    /// # Panics
    ///
    /// See [`Bloom::random`].
    pub fn random_with_rng<R: RngCore + ?Sized>(
        num_items: u64,
        false_positive_rate: f64,
        max_bits: u64,
        rng: &mut R,
    ) -> Self {
        Self::random_packed(num_items, false_positive_rate, max_bits, rng)
    }

    /// Validate `cfg` and build a randomized filter from it.
    pub fn from_config(cfg: &BloomConfig) -> Result<Self> {
        Self::from_config_with_rng(cfg, &mut rand::rng())
    }

    pub fn from_config_with_rng<R: RngCore + ?Sized>(cfg: &BloomConfig, rng: &mut R) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::random_with_rng(cfg.num_items, cfg.false_positive_rate, cfg.max_bits, rng))
    }
}

impl<W: Word> Bloom<W> {
    pub fn with_packing(num_bits: u64, keys: Vec<u64>) -> Self {
        Self { keys, bits: BitVec::new(num_bits), num_bits_set: 0 }
    }

    /// Randomized construction for any packing.
    ///
    /// # Panics
    ///
    /// See [`Bloom::random`].
    pub fn random_packed<R: RngCore + ?Sized>(
        num_items: u64,
        false_positive_rate: f64,
        max_bits: u64,
        rng: &mut R,
    ) -> Self {
        let sizing = BloomSizing::plan(num_items, false_positive_rate, max_bits);
        let keys: Vec<u64> = (0..sizing.num_keys).map(|_| rng.next_u64()).collect();
        debug!(
            num_items,
            false_positive_rate,
            num_bits = sizing.num_bits,
            num_keys = sizing.num_keys,
            "sized bloom filter"
        );
        Self::with_packing(sizing.num_bits, keys)
    }

    /// Bit index of `key` under salt `k`. Panics on a zero-length filter.
    #[inline]
    pub fn pos(&self, key: &Digest, k: u64) -> u64 {
        slot(self.bits.len(), key, k)
    }

    pub fn add(&mut self, key: &Digest) {
        let len = self.bits.len();
        for &k in &self.keys {
            let pos = slot(len, key, k);
            if !self.bits.get(pos) {
                self.num_bits_set += 1;
                self.bits.set(pos, true);
            }
        }
    }

    /// `false` means `key` was never added. `true` may be a false positive.
    pub fn contains(&self, key: &Digest) -> bool {
        self.keys.iter().all(|&k| self.bits.get(self.pos(key, k)))
    }

    /// Reset every bit; keys and length are kept.
    pub fn clear(&mut self) {
        trace!(num_bits_set = self.num_bits_set, "clearing bloom filter");
        self.bits.clear_all();
        self.num_bits_set = 0;
    }

    pub fn keys(&self) -> &[u64] { &self.keys }

    pub fn num_keys(&self) -> usize { self.keys.len() }

    pub fn num_bits(&self) -> u64 { self.bits.len() }

    pub fn num_bits_set(&self) -> u64 { self.num_bits_set }

    pub fn bits(&self) -> &BitVec<W> { &self.bits }

    /// Fraction of bits set, 0 for an empty filter.
    pub fn saturation(&self) -> f64 {
        if self.bits.is_empty() {
            return 0.0;
        }
        self.num_bits_set as f64 / self.bits.len() as f64
    }

    /// False-positive rate implied by the current fill level.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        self.saturation().powi(self.keys.len() as i32)
    }
}

#[inline]
fn slot(len: u64, key: &Digest, k: u64) -> u64 {
    assert!(len > 0, "bloom filter has no bits");
    fnv1a(key, k) % len
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn digest(n: u32) -> Digest {
        let mut d = [0u8; DIGEST_BYTES];
        d[..4].copy_from_slice(&n.to_le_bytes());
        d[31] = 0xa5;
        d
    }

    #[test]
    fn explicit_construction_is_empty() {
        let bloom = Bloom::new(100, vec![1, 2, 3]);
        assert_eq!(bloom.num_bits(), 100);
        assert_eq!(bloom.num_keys(), 3);
        assert_eq!(bloom.num_bits_set(), 0);
        assert_eq!(bloom.bits().count_ones(), 0);
    }

    #[test]
    fn add_then_contains() {
        let mut bloom = Bloom::new(1024, vec![11, 22, 33]);
        let d = digest(7);
        assert!(!bloom.contains(&d));
        bloom.add(&d);
        assert!(bloom.contains(&d));
        assert!(bloom.num_bits_set() >= 1 && bloom.num_bits_set() <= 3);
        assert_eq!(bloom.num_bits_set(), bloom.bits().count_ones());
    }

    #[test]
    fn contains_is_false_when_any_bit_missing() {
        let mut bloom = Bloom::new(4096, vec![5, 6]);
        let d = digest(1);
        bloom.add(&d);
        let p = bloom.pos(&d, 6);
        let mut other = Bloom::new(4096, vec![5, 6]);
        other.bits.set(bloom.pos(&d, 5), true);
        assert!(!other.contains(&d));
        other.bits.set(p, true);
        assert!(other.contains(&d));
    }

    #[test]
    fn add_is_idempotent() {
        let mut bloom = Bloom::new(512, vec![1, 2, 3, 4]);
        bloom.add(&digest(9));
        let once = bloom.clone();
        bloom.add(&digest(9));
        assert_eq!(bloom, once);
    }

    #[test]
    fn clear_keeps_sizing() {
        let mut bloom = Bloom::new(256, vec![3, 4]);
        for n in 0..20 {
            bloom.add(&digest(n));
        }
        bloom.clear();
        assert_eq!(bloom.num_bits_set(), 0);
        assert_eq!(bloom.num_bits(), 256);
        assert_eq!(bloom.keys(), &[3, 4]);
        for n in 0..20 {
            assert!(!bloom.contains(&digest(n)));
        }
    }

    #[test]
    fn empty_keys_contains_everything() {
        let mut bloom = Bloom::new(8, vec![]);
        bloom.add(&digest(1));
        assert_eq!(bloom.num_bits_set(), 0);
        assert!(bloom.contains(&digest(2)));
    }

    #[test]
    fn pos_uses_salted_fnv() {
        let bloom = Bloom::new(1000, vec![]);
        let d = digest(3);
        assert_eq!(bloom.pos(&d, 77), fnv1a(&d, 77) % 1000);
    }

    #[test]
    #[should_panic(expected = "no bits")]
    fn zero_length_filter_panics_on_add() {
        let mut bloom = Bloom::new(0, vec![1]);
        bloom.add(&digest(0));
    }

    #[test]
    fn seeded_keys_are_reproducible() {
        let a = Bloom::random_with_rng(100, 0.01, 10_000, &mut StdRng::seed_from_u64(7));
        let b = Bloom::random_with_rng(100, 0.01, 10_000, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.keys(), b.keys());
        assert_eq!(a.num_keys(), 7);
        assert_eq!(a.num_bits(), 959);
    }

    #[test]
    fn degenerate_random_sizing() {
        let one_bit = Bloom::random(100, 0.01, 0);
        assert_eq!(one_bit.num_bits(), 1);
        let no_keys = Bloom::random(0, 0.01, 64);
        assert_eq!(no_keys.num_keys(), 0);
    }

    #[test]
    fn packings_set_same_bits() {
        let keys = vec![0xdead, 0xbeef, 0xf00d];
        let mut wide = Bloom::new(333, keys.clone());
        let mut narrow = Bloom::<u8>::with_packing(333, keys);
        for n in 0..50 {
            wide.add(&digest(n));
            narrow.add(&digest(n));
        }
        assert_eq!(wide.num_bits_set(), narrow.num_bits_set());
        for pos in 0..333 {
            assert_eq!(wide.bits().get(pos), narrow.bits().get(pos));
        }
    }

    #[test]
    fn estimated_rate_tracks_saturation() {
        let mut bloom = Bloom::new(64, vec![1, 2]);
        assert_eq!(bloom.estimated_false_positive_rate(), 0.0);
        for n in 0..1000 {
            bloom.add(&digest(n));
        }
        assert_eq!(bloom.saturation(), 1.0);
        assert_eq!(bloom.estimated_false_positive_rate(), 1.0);
    }

    #[test]
    fn byte_packed_random_filter() {
        let mut narrow = Bloom::<u8>::random_packed(100, 0.01, 10_000, &mut StdRng::seed_from_u64(11));
        let wide = Bloom::random_with_rng(100, 0.01, 10_000, &mut StdRng::seed_from_u64(11));
        assert_eq!(narrow.num_bits(), 959);
        assert_eq!(narrow.bits().words().len(), 120);
        assert_eq!(narrow.keys(), wide.keys());
        for n in 0..100 {
            narrow.add(&digest(n));
        }
        assert!((0..100).all(|n| narrow.contains(&digest(n))));
    }

    #[test]
    fn from_config_validates_then_sizes() {
        let cfg = BloomConfig { num_items: 100, false_positive_rate: 0.01, max_bits: 10_000 };
        let a = Bloom::from_config_with_rng(&cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = Bloom::random_with_rng(100, 0.01, 10_000, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
        assert_eq!(Bloom::from_config(&cfg).unwrap().num_bits(), 959);

        let bad = BloomConfig { false_positive_rate: 1.0, ..cfg };
        assert!(matches!(
            Bloom::from_config(&bad),
            Err(crate::errors::BloomError::InvalidFalsePositiveRate(_))
        ));
    }

    #[test]
    #[should_panic(expected = "no bits")]
    fn out_of_range_rate_gives_unusable_filter() {
        assert_eq!(BloomSizing::plan(100, 1.0, 1000), BloomSizing { num_bits: 0, num_keys: 1 });
        let mut bloom = Bloom::random(100, 1.0, 1000);
        bloom.add(&digest(1));
    }
}

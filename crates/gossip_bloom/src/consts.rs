// crates/gossip_bloom/src/consts.rs

/// Length of an item digest in bytes.
pub const DIGEST_BYTES: usize = 32;

/// 64-bit FNV prime.
pub const FNV_PRIME: u64 = 1_099_511_628_211;

pub const DEFAULT_NUM_ITEMS: u64 = 1024;
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.1;
/// Bit budget that keeps a serialized filter inside one gossip packet.
pub const DEFAULT_MAX_BITS: u64 = 7424;

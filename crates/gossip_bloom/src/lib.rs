//! Bloom filter over 32-byte item digests, used by gossip pull requests to
//! advertise which items a node already holds.
pub mod consts;
pub mod errors;
pub mod hash;
pub mod bitvec;
pub mod sizing;
pub mod bloom;
pub mod config;

pub use bitvec::{BitVec, Word};
pub use bloom::{Bloom, Digest};
pub use config::BloomConfig;
pub use errors::{BloomError, Result};
pub use hash::fnv1a;
pub use sizing::{num_bits, num_keys, BloomSizing};

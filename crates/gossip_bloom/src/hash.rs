use crate::consts::FNV_PRIME;

/// FNV-1a over `bytes`, starting from `seed` instead of the usual offset
/// basis. Each bloom key is used as a seed, which gives one hash family per
/// key from the same mixing function.
#[inline]
pub fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = seed;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

//! Fixed-length packed bit vector.
//!
//! Storage is a boxed slice of words; the word type picks the packing
//! granularity (`u8` for byte-packed, `u64` for word-packed). Both behave the
//! same to callers: bit `pos` lives in word `pos / W::BITS` at offset
//! `pos % W::BITS`, least significant bit first.
use core::fmt::Debug;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use crate::errors::{BloomError, Result};

/// Storage lane of a [`BitVec`].
pub trait Word:
    Copy
    + Debug
    + Default
    + Eq
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + BitAndAssign
    + BitOrAssign
{
    /// Bits per word.
    const BITS: u64;
    const ZERO: Self;

    /// Word with only bit `offset` set. `offset < Self::BITS`.
    fn mask(offset: u64) -> Self;

    fn ones(self) -> u32;
}

macro_rules! impl_word {
    ($($t:ty),*) => {$(
        impl Word for $t {
            const BITS: u64 = <$t>::BITS as u64;
            const ZERO: Self = 0;

            #[inline]
            fn mask(offset: u64) -> Self {
                let one: Self = 1;
                one << offset
            }

            #[inline]
            fn ones(self) -> u32 { self.count_ones() }
        }
    )*};
}

impl_word!(u8, u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec<W: Word = u64> {
    words: Box<[W]>,
    len: u64,
}

impl<W: Word> BitVec<W> {
    /// All-zero vector of `len` bits backed by `ceil(len / W::BITS)` words.
    pub fn new(len: u64) -> Self {
        let n = len.div_ceil(W::BITS) as usize;
        Self { words: vec![W::ZERO; n].into_boxed_slice(), len }
    }

    #[inline]
    pub fn len(&self) -> u64 { self.len }

    #[inline]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn words(&self) -> &[W] { &self.words }

    #[inline]
    fn locate(pos: u64) -> (usize, W) {
        ((pos / W::BITS) as usize, W::mask(pos % W::BITS))
    }

    /// Panics if `pos >= len`.
    #[inline]
    pub fn get(&self, pos: u64) -> bool {
        assert!(pos < self.len, "get bit {pos} out of bounds (len {})", self.len);
        let (idx, mask) = Self::locate(pos);
        self.words[idx] & mask != W::ZERO
    }

    /// Panics if `pos >= len`.
    #[inline]
    pub fn set(&mut self, pos: u64, value: bool) {
        assert!(pos < self.len, "set bit {pos} out of bounds (len {})", self.len);
        let (idx, mask) = Self::locate(pos);
        if value {
            self.words[idx] |= mask;
        } else {
            self.words[idx] &= !mask;
        }
    }

    pub fn try_get(&self, pos: u64) -> Result<bool> {
        if pos >= self.len {
            return Err(BloomError::BitOutOfBounds { pos, len: self.len });
        }
        Ok(self.get(pos))
    }

    pub fn try_set(&mut self, pos: u64, value: bool) -> Result<()> {
        if pos >= self.len {
            return Err(BloomError::BitOutOfBounds { pos, len: self.len });
        }
        self.set(pos, value);
        Ok(())
    }

    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| w.ones() as u64).sum()
    }

    /// Zero every word in place.
    pub fn clear_all(&mut self) {
        self.words.fill(W::ZERO);
    }
}

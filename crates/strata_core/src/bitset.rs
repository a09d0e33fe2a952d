//! # Dynamic Bitset
//!
//! Compact growable bit array backing the per-slot "alive" and
//! "pending refresh" flags of the manager.
//!
//! ## Layout
//!
//! Bits are packed 64 per `u64` word. Bits past `len()` in the last word are
//! always zero, so whole-word scans never report phantom slots.
//!
//! ## Performance
//!
//! - Set / test: O(1)
//! - Resize: O(new words)
//! - Iterate set bits: O(words), skipping clear regions with `trailing_zeros`

use std::ops::Index;

const WORD_BITS: usize = 64;

#[inline]
const fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// A growable array of bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicBitset {
    /// Backing words, 64 bits each.
    words: Vec<u64>,
    /// Number of addressable bits.
    len: usize,
}

impl DynamicBitset {
    /// Creates an empty bitset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
        }
    }

    /// Creates a bitset of `len` bits, all set to `value`.
    #[must_use]
    pub fn with_len(len: usize, value: bool) -> Self {
        let mut bitset = Self::new();
        bitset.resize(len, value);
        bitset
    }

    /// Returns the number of addressable bits.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitset holds no bits.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns how many bits fit without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.words.capacity() * WORD_BITS
    }

    /// Sets the bit at `index` to `value`.
    ///
    /// `index` must be less than `len()`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "bit index {index} out of range {}", self.len);
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self.words[index / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Returns the bit at `index`.
    ///
    /// `index` must be less than `len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "bit index {index} out of range {}", self.len);
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Grows or shrinks the bitset to `new_len` bits.
    ///
    /// Newly exposed bits take `fill`.
    pub fn resize(&mut self, new_len: usize, fill: bool) {
        let old_len = self.len;
        if fill && new_len > old_len {
            // Top up the partially used last word before appending whole words.
            let boundary = (words_for(old_len) * WORD_BITS).min(new_len);
            for index in old_len..boundary {
                self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
            }
        }
        let fill_word = if fill { u64::MAX } else { 0 };
        self.words.resize(words_for(new_len), fill_word);
        self.len = new_len;
        self.mask_tail();
    }

    /// Reserves backing storage for at least `capacity` bits.
    pub fn reserve(&mut self, capacity: usize) {
        let needed = words_for(capacity).saturating_sub(self.words.len());
        self.words.reserve(needed);
    }

    /// Removes every bit but keeps the allocation.
    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    /// Releases unused backing storage.
    pub fn shrink_to_fit(&mut self) {
        self.words.shrink_to_fit();
    }

    /// Counts the set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates over the indices of set bits in ascending order.
    #[must_use]
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    fn mask_tail(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl Index<usize> for DynamicBitset {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &bool {
        if self.get(index) {
            &true
        } else {
            &false
        }
    }
}

/// Iterator over the set bits of a [`DynamicBitset`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}

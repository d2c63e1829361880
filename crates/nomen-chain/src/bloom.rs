//! Bloom predicate used by rescans.
//!
//! A plain m-bit, k-hash filter with BLAKE2b-derived indices. False
//! positives deliver extra rescan blocks; false negatives cannot
//! happen.

use nomen_primitives::blake2b256_multi;

/// A Bloom filter over arbitrary byte strings.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u8>,
    hashes: u8,
}

impl BloomFilter {
    /// Create a filter of `size_bits` bits (rounded up to a byte)
    /// with `hashes` probe positions per item.
    pub fn new(size_bits: usize, hashes: u8) -> Self {
        let size_bits = size_bits.max(8);
        Self {
            bits: vec![0u8; size_bits.div_ceil(8)],
            hashes: hashes.max(1),
        }
    }

    /// A small default filter (~1% false positives around a thousand
    /// items).
    pub fn default_size() -> Self {
        Self::new(10_000, 7)
    }

    fn position(&self, seed: u8, item: &[u8]) -> usize {
        let digest = blake2b256_multi(&[&[seed], item]);
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&digest.as_bytes()[..8]);
        (u64::from_le_bytes(arr) % (self.bits.len() as u64 * 8)) as usize
    }

    /// Insert an item.
    pub fn insert(&mut self, item: &[u8]) {
        for seed in 0..self.hashes {
            let pos = self.position(seed, item);
            self.bits[pos / 8] |= 1 << (pos % 8);
        }
    }

    /// Probe for an item.
    pub fn contains(&self, item: &[u8]) -> bool {
        (0..self.hashes).all(|seed| {
            let pos = self.position(seed, item);
            self.bits[pos / 8] & (1 << (pos % 8)) != 0
        })
    }
}

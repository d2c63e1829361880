//! 32-byte hashes and BLAKE2b-256 helpers.

use crate::encoding::{CodecResult, Decodable, Encodable, Reader, Writer};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A 32-byte hash. The all-zero value is the designated null hash
/// (parent of genesis).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Size in bytes.
    pub const SIZE: usize = 32;

    /// The all-zero null hash.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Wrap a 32-byte array.
    pub const fn from_array(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Copy from a slice; the slice must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Some(Hash(arr))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the null hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse lowercase hex (tests and display round-trips).
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encodable for Hash {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(&self.0);
    }
}

impl Decodable for Hash {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let bytes = r.read_bytes(Self::SIZE)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }
}

/// BLAKE2b-256 of a single buffer.
pub fn blake2b256(data: &[u8]) -> Hash {
    let mut hasher = Blake2b256::new();
    Digest::update(&mut hasher, data);
    Hash(hasher.finalize().into())
}

/// BLAKE2b-256 over the concatenation of several buffers.
pub fn blake2b256_multi(parts: &[&[u8]]) -> Hash {
    let mut hasher = Blake2b256::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    Hash(hasher.finalize().into())
}

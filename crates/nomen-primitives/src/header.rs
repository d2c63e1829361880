//! Block headers and proof-of-work solutions.
//!
//! The header is exactly [`HEADER_SIZE`] bytes with a fixed field
//! order; any deviation is a parse error. The 20-byte nonce at
//! [`NONCE_POS`] accommodates cuckoo-cycle header expansion. The block
//! hash is BLAKE2b-256 over the raw header bytes; the solution is
//! serialized alongside but not hashed.

use crate::encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
use crate::hash::{blake2b256, Hash};

/// Serialized header size in bytes.
pub const HEADER_SIZE: usize = 196;

/// Byte offset of the nonce within the header.
pub const NONCE_POS: usize = 176;

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 20;

/// Largest solution arity across networks.
pub const MAX_SOLUTION_SIZE: usize = 42;

/// A block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Header version (version-bit signalling).
    pub version: u32,
    /// Parent block hash; null for genesis.
    pub prev_block: Hash,
    /// Merkle root over transaction IDs.
    pub merkle_root: Hash,
    /// Merkle root over witness transaction IDs.
    pub witness_root: Hash,
    /// Root of the name-auction tree after this block is applied.
    pub tree_root: Hash,
    /// Reserved commitment, all-zero until assigned.
    pub reserved_root: Hash,
    /// Block time in UNIX seconds.
    pub time: u64,
    /// Compact proof-of-work target.
    pub bits: u32,
    /// Cuckoo nonce.
    pub nonce: [u8; NONCE_SIZE],
}

impl BlockHeader {
    /// Block hash: BLAKE2b-256 of the 196 raw header bytes.
    pub fn hash(&self) -> Hash {
        blake2b256(&self.to_vec())
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(self.version);
        self.prev_block.encode(w);
        self.merkle_root.encode(w);
        self.witness_root.encode(w);
        self.tree_root.encode(w);
        self.reserved_root.encode(w);
        w.write_u64(self.time);
        w.write_u32(self.bits);
        w.write_bytes(&self.nonce);
    }
}

impl Decodable for BlockHeader {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let version = r.read_u32()?;
        let prev_block = Hash::decode(r)?;
        let merkle_root = Hash::decode(r)?;
        let witness_root = Hash::decode(r)?;
        let tree_root = Hash::decode(r)?;
        let reserved_root = Hash::decode(r)?;
        let time = r.read_u64()?;
        let bits = r.read_u32()?;
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(r.read_bytes(NONCE_SIZE)?);
        Ok(Self {
            version,
            prev_block,
            merkle_root,
            witness_root,
            tree_root,
            reserved_root,
            time,
            bits,
            nonce,
        })
    }
}

/// A cuckoo-cycle solution: an ordered sequence of 32-bit edge indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    edges: Vec<u32>,
}

impl Solution {
    /// Wrap a list of edge indices.
    pub fn new(edges: Vec<u32>) -> Self {
        Self { edges }
    }

    /// Zero-filled solution of the given arity (genesis placeholders).
    pub fn zero(size: usize) -> Self {
        Self {
            edges: vec![0u32; size],
        }
    }

    /// Edge indices in order.
    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    /// Solution arity.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the solution carries no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl Encodable for Solution {
    fn encode(&self, w: &mut Writer) {
        w.write_u8(self.edges.len() as u8);
        for &edge in &self.edges {
            w.write_u32(edge);
        }
    }
}

impl Decodable for Solution {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let count = r.read_u8()? as usize;
        if count > MAX_SOLUTION_SIZE {
            return Err(CodecError::Oversize {
                what: "solution edges",
                size: count,
                max: MAX_SOLUTION_SIZE,
            });
        }
        let mut edges = Vec::with_capacity(count);
        for _ in 0..count {
            edges.push(r.read_u32()?);
        }
        Ok(Self { edges })
    }
}

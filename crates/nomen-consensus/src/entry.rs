//! Chain entries: a header projection with height and embedded
//! cumulative chainwork.
//!
//! Entries hold their parent's hash, never the parent object; an
//! arena keyed by block hash resolves lookups. Chainwork is serialized
//! with the entry so a restart never replays the chain to recompute it.

use crate::compact::get_proof;
use nomen_primitives::{
    Block, BlockHeader, CodecResult, Decodable, Encodable, Hash, Reader, Solution, Writer,
    NONCE_SIZE,
};
use num_bigint::BigUint;

/// A header message for peer distribution: the raw header plus its
/// solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    pub header: BlockHeader,
    pub solution: Solution,
}

/// An in-memory chain entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    /// Block hash.
    pub hash: Hash,
    /// Block height; 0 for genesis.
    pub height: u32,
    /// Header fields.
    pub version: u32,
    pub prev_block: Hash,
    pub merkle_root: Hash,
    pub witness_root: Hash,
    pub tree_root: Hash,
    pub reserved_root: Hash,
    pub time: u64,
    pub bits: u32,
    pub nonce: [u8; NONCE_SIZE],
    /// Cuckoo solution.
    pub solution: Solution,
    /// Cumulative chainwork up to and including this block.
    pub chainwork: BigUint,
}

impl ChainEntry {
    /// Derive an entry from a block and its parent entry. A missing
    /// parent means genesis: height 0, chainwork equal to the block's
    /// own proof.
    pub fn from_block(block: &Block, prev: Option<&ChainEntry>) -> Self {
        let header = &block.header;
        let height = prev.map_or(0, |p| p.height + 1);
        let chainwork = Self::chainwork(prev.map(|p| &p.chainwork), header.bits);

        Self {
            hash: header.hash(),
            height,
            version: header.version,
            prev_block: header.prev_block,
            merkle_root: header.merkle_root,
            witness_root: header.witness_root,
            tree_root: header.tree_root,
            reserved_root: header.reserved_root,
            time: header.time,
            bits: header.bits,
            nonce: header.nonce,
            solution: block.solution.clone(),
            chainwork,
        }
    }

    /// Work proven by this entry alone.
    pub fn get_proof(&self) -> BigUint {
        get_proof(self.bits)
    }

    /// Cumulative chainwork for a block with `bits` on top of an
    /// optional parent.
    pub fn chainwork(prev: Option<&BigUint>, bits: u32) -> BigUint {
        let proof = get_proof(bits);
        match prev {
            Some(parent) => parent + proof,
            None => proof,
        }
    }

    /// Whether this is the genesis entry.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Reconstruct the header.
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            version: self.version,
            prev_block: self.prev_block,
            merkle_root: self.merkle_root,
            witness_root: self.witness_root,
            tree_root: self.tree_root,
            reserved_root: self.reserved_root,
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
        }
    }

    /// Project to a headers message for peer distribution.
    pub fn to_headers(&self) -> Headers {
        Headers {
            header: self.header(),
            solution: self.solution.clone(),
        }
    }
}

impl Encodable for ChainEntry {
    fn encode(&self, w: &mut Writer) {
        self.hash.encode(w);
        w.write_u32(self.height);
        w.write_u32(self.version);
        self.prev_block.encode(w);
        self.merkle_root.encode(w);
        self.witness_root.encode(w);
        self.tree_root.encode(w);
        self.reserved_root.encode(w);
        w.write_u64(self.time);
        w.write_u32(self.bits);
        w.write_bytes(&self.nonce);
        self.solution.encode(w);

        // Chainwork as fixed-width big-endian u256.
        let bytes = self.chainwork.to_bytes_be();
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(&bytes);
        w.write_bytes(&padded);
    }
}

impl Decodable for ChainEntry {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let hash = Hash::decode(r)?;
        let height = r.read_u32()?;
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
        let solution = Solution::decode(r)?;
        let chainwork = BigUint::from_bytes_be(r.read_bytes(32)?);

        Ok(Self {
            hash,
            height,
            version,
            prev_block,
            merkle_root,
            witness_root,
            tree_root,
            reserved_root,
            time,
            bits,
            nonce,
            solution,
            chainwork,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_primitives::blake2b256;
    use num_traits::Zero;

    fn sample_block(prev: Hash, bits: u32) -> Block {
        Block {
            header: BlockHeader {
                version: 0,
                prev_block: prev,
                merkle_root: blake2b256(b"m"),
                witness_root: blake2b256(b"w"),
                tree_root: Hash::ZERO,
                reserved_root: Hash::ZERO,
                time: 1514765688,
                bits,
                nonce: [0u8; NONCE_SIZE],
            },
            solution: Solution::zero(4),
            txs: Vec::new(),
        }
    }

    #[test]
    fn test_genesis_entry() {
        let block = sample_block(Hash::ZERO, 0x207fffff);
        let entry = ChainEntry::from_block(&block, None);
        assert!(entry.is_genesis());
        assert_eq!(entry.height, 0);
        assert_eq!(entry.chainwork, entry.get_proof());
        assert!(!entry.chainwork.is_zero());
    }

    #[test]
    fn test_chainwork_recurrence() {
        let genesis_block = sample_block(Hash::ZERO, 0x207fffff);
        let genesis = ChainEntry::from_block(&genesis_block, None);

        let block = sample_block(genesis.hash, 0x207fffff);
        let entry = ChainEntry::from_block(&block, Some(&genesis));

        assert_eq!(entry.height, 1);
        assert_eq!(entry.chainwork, &genesis.chainwork + entry.get_proof());
    }

    #[test]
    fn test_entry_roundtrip() {
        let genesis_block = sample_block(Hash::ZERO, 0x1d00ffff);
        let entry = ChainEntry::from_block(&genesis_block, None);
        let bytes = entry.to_vec();
        assert_eq!(ChainEntry::from_bytes(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_header_projection_hashes_back() {
        let block = sample_block(Hash::ZERO, 0x1d00ffff);
        let entry = ChainEntry::from_block(&block, None);
        assert_eq!(entry.header().hash(), entry.hash);
        assert_eq!(entry.to_headers().solution, block.solution);
    }
}

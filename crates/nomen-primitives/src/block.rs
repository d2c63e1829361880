//! Full blocks: header, solution, and transactions.

use crate::encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
use crate::hash::Hash;
use crate::header::{BlockHeader, Solution};
use crate::merkle::merkle_root;
use crate::transaction::Transaction;
use crate::WITNESS_SCALE_FACTOR;

/// Maximum transactions accepted when decoding a block.
const MAX_BLOCK_TXS: usize = 100_000;

/// A full block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Header (hashed; exactly 196 bytes on the wire).
    pub header: BlockHeader,
    /// Cuckoo solution (serialized after the header, not hashed).
    pub solution: Solution,
    /// Transactions in consensus order.
    pub txs: Vec<Transaction>,
}

impl Block {
    /// Block hash: the header hash.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Merkle root over txids.
    pub fn compute_merkle_root(&self) -> Hash {
        let txids: Vec<Hash> = self.txs.iter().map(|tx| tx.txid()).collect();
        merkle_root(&txids)
    }

    /// Merkle root over wtxids.
    pub fn compute_witness_root(&self) -> Hash {
        let wtxids: Vec<Hash> = self.txs.iter().map(|tx| tx.wtxid()).collect();
        merkle_root(&wtxids)
    }

    /// Base size: header, solution, and witness-stripped transactions.
    pub fn base_size(&self) -> usize {
        let mut size = crate::header::HEADER_SIZE + self.solution.to_vec().len();
        size += varint_size(self.txs.len() as u64);
        for tx in &self.txs {
            size += tx.base_size();
        }
        size
    }

    /// Total serialized size including witness data.
    pub fn total_size(&self) -> usize {
        let mut size = crate::header::HEADER_SIZE + self.solution.to_vec().len();
        size += varint_size(self.txs.len() as u64);
        for tx in &self.txs {
            size += tx.total_size();
        }
        size
    }

    /// Block weight: base bytes count four times minus the witness
    /// discount.
    pub fn weight(&self) -> usize {
        self.base_size() * (WITNESS_SCALE_FACTOR - 1) + self.total_size()
    }
}

fn varint_size(v: u64) -> usize {
    if v < 0xfd {
        1
    } else if v <= u16::MAX as u64 {
        3
    } else if v <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

impl Encodable for Block {
    fn encode(&self, w: &mut Writer) {
        self.header.encode(w);
        self.solution.encode(w);
        w.write_varint(self.txs.len() as u64);
        for tx in &self.txs {
            tx.encode(w);
        }
    }
}

impl Decodable for Block {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let header = BlockHeader::decode(r)?;
        let solution = Solution::decode(r)?;
        let count = r.read_varint()? as usize;
        if count > MAX_BLOCK_TXS {
            return Err(CodecError::Oversize {
                what: "block transactions",
                size: count,
                max: MAX_BLOCK_TXS,
            });
        }
        let mut txs = Vec::with_capacity(count);
        for _ in 0..count {
            txs.push(Transaction::decode(r)?);
        }
        Ok(Self {
            header,
            solution,
            txs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::hash::blake2b256;
    use crate::transaction::{Input, Outpoint, Output};

    fn sample_block() -> Block {
        let coinbase = Transaction {
            version: 0,
            inputs: vec![Input {
                prevout: Outpoint::NULL,
                witness: vec![b"epoch".to_vec()],
                sequence: u32::MAX,
            }],
            outputs: vec![Output::plain(1_000_000_000, Address::from_key_hash([9u8; 20]))],
            locktime: 0,
        };

        let mut header = BlockHeader {
            version: 0,
            prev_block: blake2b256(b"parent"),
            merkle_root: Hash::ZERO,
            witness_root: Hash::ZERO,
            tree_root: Hash::ZERO,
            reserved_root: Hash::ZERO,
            time: 1514765688,
            bits: 0x207fffff,
            nonce: [0u8; 20],
        };

        let block = Block {
            header: header.clone(),
            solution: Solution::zero(4),
            txs: vec![coinbase],
        };
        header.merkle_root = block.compute_merkle_root();
        header.witness_root = block.compute_witness_root();
        Block { header, ..block }
    }

    #[test]
    fn test_block_roundtrip() {
        let block = sample_block();
        let bytes = block.to_vec();
        let decoded = Block::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, block);
        // Re-encoding is byte-identical.
        assert_eq!(decoded.to_vec(), bytes);
    }

    #[test]
    fn test_size_accounting() {
        let block = sample_block();
        assert_eq!(block.to_vec().len(), block.total_size());
        assert!(block.base_size() < block.total_size());
        assert_eq!(block.weight(), block.base_size() * 3 + block.total_size());
    }

    #[test]
    fn test_roots_commit_to_txs() {
        let block = sample_block();
        assert_eq!(block.header.merkle_root, block.compute_merkle_root());
        assert_eq!(block.header.witness_root, block.compute_witness_root());

        let mut tampered = block.clone();
        tampered.txs[0].outputs[0].value += 1;
        assert_ne!(tampered.compute_merkle_root(), block.header.merkle_root);
    }
}

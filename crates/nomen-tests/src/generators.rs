//! Test data generators: regtest chains, mined blocks, and auction
//! transactions.

use nomen_chain::Chain;
use nomen_consensus::{solver, verify_pow, NetworkParams};
use nomen_primitives::{
    Address, Block, BlockHeader, Covenant, Encodable, Hash, Input, Outpoint, Output, Solution,
    Transaction, NONCE_SIZE,
};
use nomen_state::compute_blind;
use nomen_storage::MemoryStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for unique transaction material.
static UNIQUE: AtomicU64 = AtomicU64::new(1);

fn unique() -> u64 {
    UNIQUE.fetch_add(1, Ordering::SeqCst)
}

/// A regtest chain over fresh in-memory storage.
pub fn test_chain() -> (Arc<Chain>, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let chain = Chain::open(storage.clone(), NetworkParams::regtest()).unwrap();
    (Arc::new(chain), storage)
}

/// A deterministic test address.
pub fn test_address(seed: u8) -> Address {
    let mut hash = [0u8; 20];
    hash[0] = seed;
    hash[19] = seed.wrapping_mul(7);
    Address::from_key_hash(hash)
}

/// Coinbase paying the block reward to a fixed address. The height
/// in the locktime keeps coinbase txids unique.
pub fn coinbase(height: u32, reward: u64) -> Transaction {
    Transaction {
        version: 0,
        inputs: vec![Input {
            prevout: Outpoint::NULL,
            witness: vec![height.to_le_bytes().to_vec()],
            sequence: u32::MAX,
        }],
        outputs: vec![Output::plain(reward, test_address(0xcb))],
        locktime: height,
    }
}

/// An inputless transaction carrying one covenant output. The unique
/// marker output keeps txids distinct.
pub fn covenant_tx(value: u64, covenant: Covenant) -> Transaction {
    Transaction {
        version: 0,
        inputs: Vec::new(),
        outputs: vec![
            Output {
                value,
                address: test_address(0xc0),
                covenant,
            },
            Output::plain(unique(), test_address(0xc1)),
        ],
        locktime: 0,
    }
}

/// A transaction whose first input spends `funding` and whose first
/// output carries the covenant (positional input-output linking).
pub fn spend_tx(funding: Outpoint, value: u64, covenant: Covenant) -> Transaction {
    Transaction {
        version: 0,
        inputs: vec![Input::from_outpoint(funding)],
        outputs: vec![Output {
            value,
            address: test_address(0xc2),
            covenant,
        }],
        locktime: 0,
    }
}

/// A BID transaction; returns it with the blind's nonce material.
pub fn bid_tx(name: &[u8], bid_value: u64, lockup: u64) -> (Transaction, Vec<u8>) {
    let nonce = unique().to_le_bytes().to_vec();
    let blind = compute_blind(bid_value, &nonce, &nomen_state::name_hash(name));
    let tx = covenant_tx(
        lockup,
        Covenant::Bid {
            name: name.to_vec(),
            blind,
        },
    );
    (tx, nonce)
}

/// The REVEAL spending a bid output.
pub fn reveal_tx(bid: &Transaction, name: &[u8], bid_value: u64, nonce: Vec<u8>) -> Transaction {
    spend_tx(
        Outpoint::new(bid.txid(), 0),
        bid_value,
        Covenant::Reveal {
            name: name.to_vec(),
            nonce,
        },
    )
}

/// Mine one block on the current tip: compute the committed roots,
/// then grind nonces until the tiny cuckoo graph yields a cycle that
/// also clears the target.
pub fn mine(chain: &Chain, txs: Vec<Transaction>) -> Block {
    mine_with_root(chain, txs, None)
}

/// Like [`mine`], with an explicit tree root. `None` computes the
/// correct root; `Some` lets tests build blocks whose covenants the
/// writer must reject (their root is never reached).
pub fn mine_with_root(chain: &Chain, txs: Vec<Transaction>, root: Option<Hash>) -> Block {
    let tip = chain.tip();
    let height = tip.height + 1;
    let params = chain.params().clone();

    let mut all_txs = vec![coinbase(
        height,
        nomen_consensus::get_reward(height, params.halving_interval),
    )];
    all_txs.extend(txs);

    let mut block = Block {
        header: BlockHeader {
            version: 0,
            prev_block: tip.hash,
            merkle_root: Hash::ZERO,
            witness_root: Hash::ZERO,
            tree_root: Hash::ZERO,
            reserved_root: Hash::ZERO,
            time: tip.time + 1,
            bits: params.pow_bits,
            nonce: [0u8; NONCE_SIZE],
        },
        solution: Solution::zero(params.cuckoo.size),
        txs: all_txs,
    };
    block.header.merkle_root = block.compute_merkle_root();
    block.header.witness_root = block.compute_witness_root();
    block.header.tree_root = match root {
        Some(root) => root,
        None => chain.preview_tree_root(&block).unwrap(),
    };

    for attempt in 0u64..100_000 {
        block.header.nonce[..8].copy_from_slice(&attempt.to_le_bytes());
        if !verify_pow(&block.header.hash(), block.header.bits) {
            continue;
        }
        if let Some(solution) = solver::solve(&params.cuckoo, &block.header.to_vec()) {
            block.solution = solution;
            return block;
        }
    }
    panic!("no cuckoo solution found in 100000 attempts");
}

/// Mine and connect one block; returns it.
pub fn mine_and_connect(chain: &Chain, txs: Vec<Transaction>) -> Block {
    let block = mine(chain, txs);
    chain.connect(block.clone()).unwrap();
    block
}

/// Mine empty blocks until the chain reaches `height`.
pub fn mine_until(chain: &Chain, height: u32) {
    while chain.height() < height {
        mine_and_connect(chain, Vec::new());
    }
}

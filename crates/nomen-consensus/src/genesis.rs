//! Deterministic genesis construction.
//!
//! The genesis block carries three transactions:
//!
//! 1. The **coinbase**: one null-prevout input whose witness is the
//!    epoch flag, and the five pre-mine outputs.
//! 2. The **claimer**: spends coinbase output 0, redistributes the
//!    genesis reward to the genesis address, then stakes one CLAIM per
//!    reserved root name in lexicographic order.
//! 3. The **registry**: spends each claim output and installs the
//!    snapshot's resource records via REGISTER covenants.
//!
//! Every byte of the result is a function of the inputs; the builder
//! also emits the constants snippet, JSON, and C-header artifacts
//! consumed elsewhere in the system.

use crate::networks::{Network, NetworkParams};
use crate::params::{
    EPOCH_FLAG, GENESIS_KEY, GENESIS_REWARD, MAX_AIRDROP, MAX_CREATORS, MAX_FOUNDATION,
    MAX_INVESTORS,
};
use crate::root_zone::ROOT_ZONE;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use nomen_primitives::{
    Address, Block, BlockHeader, Covenant, Encodable, Hash, Input, Outpoint, Output, Solution,
    Transaction, NONCE_SIZE,
};
use tracing::debug;

/// Inputs to the genesis builder. The solution is required; callers
/// without a mined solution pass a zero-filled one of network arity.
#[derive(Debug, Clone)]
pub struct GenesisOptions {
    pub time: u64,
    pub bits: u32,
    pub nonce: [u8; NONCE_SIZE],
    pub solution: Solution,
}

impl GenesisOptions {
    /// Default options for a network: its genesis time and initial
    /// bits, a zero nonce, and a zero-filled solution.
    pub fn for_params(params: &NetworkParams) -> Self {
        Self {
            time: params.genesis_time,
            bits: params.pow_bits,
            nonce: [0u8; NONCE_SIZE],
            solution: Solution::zero(params.cuckoo.size),
        }
    }
}

/// Build the genesis block for a network.
pub fn build_genesis(params: &NetworkParams, options: &GenesisOptions) -> Block {
    let claimant = Address::from_key_hash(params.keys.claimant);

    // 1. Coinbase: epoch flag witness, five pre-mine outputs.
    let coinbase = Transaction {
        version: 0,
        inputs: vec![Input {
            prevout: Outpoint::NULL,
            witness: vec![EPOCH_FLAG.as_bytes().to_vec()],
            sequence: u32::MAX,
        }],
        outputs: vec![
            Output::plain(GENESIS_REWARD, claimant.clone()),
            Output::plain(MAX_INVESTORS, Address::from_key_hash(params.keys.investors)),
            Output::plain(
                MAX_FOUNDATION,
                Address::from_key_hash(params.keys.foundation),
            ),
            Output::plain(MAX_CREATORS, Address::from_key_hash(params.keys.creators)),
            Output::plain(MAX_AIRDROP, Address::from_key_hash(params.keys.airdrop)),
        ],
        locktime: 0,
    };

    // 2. Claimer: redistribute the reward, then claim each reserved
    // name. The snapshot is already lexicographically sorted.
    let mut claimer_outputs = vec![Output::plain(
        GENESIS_REWARD,
        Address::from_key_hash(GENESIS_KEY),
    )];
    for entry in ROOT_ZONE {
        claimer_outputs.push(Output {
            value: 0,
            address: claimant.clone(),
            covenant: Covenant::Claim {
                name: entry.name.as_bytes().to_vec(),
            },
        });
    }
    let claimer = Transaction {
        version: 0,
        inputs: vec![Input::from_outpoint(Outpoint::new(coinbase.txid(), 0))],
        outputs: claimer_outputs,
        locktime: 0,
    };

    // 3. Registry: spend each claim output in order, install the
    // snapshot's resources with a zero tree-hash placeholder.
    let claimer_txid = claimer.txid();
    let registry = Transaction {
        version: 0,
        inputs: ROOT_ZONE
            .iter()
            .enumerate()
            .map(|(i, _)| Input::from_outpoint(Outpoint::new(claimer_txid, i as u32 + 1)))
            .collect(),
        outputs: ROOT_ZONE
            .iter()
            .map(|entry| Output {
                value: 0,
                address: claimant.clone(),
                covenant: Covenant::Register {
                    name: entry.name.as_bytes().to_vec(),
                    resource: entry.encode_resource(),
                    tree_hash: Hash::ZERO,
                },
            })
            .collect(),
        locktime: 0,
    };

    let mut block = Block {
        header: BlockHeader {
            version: 0,
            prev_block: Hash::ZERO,
            merkle_root: Hash::ZERO,
            witness_root: Hash::ZERO,
            // The header commits the empty tree; names registered here
            // enter the tree with the first applied block.
            tree_root: Hash::ZERO,
            reserved_root: Hash::ZERO,
            time: options.time,
            bits: options.bits,
            nonce: options.nonce,
        },
        solution: options.solution.clone(),
        txs: vec![coinbase, claimer, registry],
    };

    block.header.merkle_root = block.compute_merkle_root();
    block.header.witness_root = block.compute_witness_root();

    debug!(
        network = %params.network,
        hash = %block.hash(),
        "Built genesis block"
    );

    block
}

/// Build genesis for every network with its default options.
pub fn build_all() -> Vec<(Network, Block)> {
    Network::all()
        .iter()
        .map(|&network| {
            let params = NetworkParams::for_network(network);
            let options = GenesisOptions::for_params(&params);
            (network, build_genesis(&params, &options))
        })
        .collect()
}

/// Textual constants snippet: per-network hash and raw block hex.
pub fn constants_snippet(blocks: &[(Network, Block)]) -> String {
    let mut out = String::new();
    out.push_str("// Generated genesis constants. Do not edit.\n");
    for (network, block) in blocks {
        let upper = network.name().to_uppercase();
        out.push_str(&format!(
            "pub const GENESIS_HASH_{}: &str =\n    \"{}\";\n",
            upper,
            block.hash()
        ));
        out.push_str(&format!(
            "pub const GENESIS_BLOCK_{}: &str =\n    \"{}\";\n",
            upper,
            hex::encode(block.to_vec())
        ));
    }
    out
}

/// JSON artifact: base64-encoded raw blocks keyed by network name.
pub fn genesis_json(blocks: &[(Network, Block)]) -> String {
    let mut map = serde_json::Map::new();
    for (network, block) in blocks {
        map.insert(
            network.name().to_string(),
            serde_json::Value::String(BASE64.encode(block.to_vec())),
        );
    }
    serde_json::Value::Object(map).to_string()
}

/// C header artifact: each raw 196-byte header as an escaped byte
/// literal.
pub fn c_header(blocks: &[(Network, Block)]) -> String {
    let mut out = String::new();
    out.push_str("/* Generated genesis headers. Do not edit. */\n");
    out.push_str("#ifndef NOMEN_GENESIS_H\n#define NOMEN_GENESIS_H\n\n");
    for (network, block) in blocks {
        let bytes = block.header.to_vec();
        out.push_str(&format!(
            "static const unsigned char nomen_genesis_{}[{}] =\n  \"",
            network.name(),
            bytes.len()
        ));
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 && i % 16 == 0 {
                out.push_str("\"\n  \"");
            }
            out.push_str(&format!("\\x{:02x}", byte));
        }
        out.push_str("\";\n\n");
    }
    out.push_str("#endif\n");
    out
}

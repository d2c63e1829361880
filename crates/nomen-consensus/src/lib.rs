//! # nomen-consensus
//!
//! Consensus rules for the nomen naming blockchain.
//!
//! This crate provides:
//! - Compact difficulty targets, proof comparison, and chainwork
//! - The reward halving schedule and version-bit signalling
//! - Cuckoo-cycle proof-of-work verification
//! - Chain entries with embedded cumulative chainwork
//! - Per-network parameter tables
//! - The deterministic genesis builder and its exported artifacts
//!
//! ## Cuckoo cycle
//!
//! The proof-of-work is a fixed-length cycle in a bipartite graph
//! derived from the header via SipHash-2-4. Verification is pure and
//! allocation-free; the miner-side search lives elsewhere.

mod compact;
mod cuckoo;
mod entry;
mod error;
pub mod genesis;
mod networks;
mod reward;
pub mod root_zone;
pub mod solver;
mod validation;

pub use compact::{compact_to_target, get_proof, has_bit, target_to_compact, verify_pow};
pub use cuckoo::{Cuckoo, CuckooError};
pub use entry::{ChainEntry, Headers};
pub use error::{ConsensusError, ConsensusResult};
pub use networks::{CuckooParams, KeyRing, Network, NetworkParams};
pub use reward::get_reward;
pub use validation::{check_block_body, is_final, median_time};

/// Consensus constants shared by every network.
pub mod params {
    /// Decimal exponent of the coin: one coin is 10^EXP dollarydoos.
    pub const EXP: u32 = 6;

    /// Dollarydoos per coin.
    pub const COIN: u64 = 1_000_000;

    /// Base block reward before any halving.
    pub const BASE_REWARD: u64 = 1_000 * COIN;

    /// Genesis block reward; the surplus dollarydoos cap the supply at
    /// exactly [`MAX_MONEY`].
    pub const GENESIS_REWARD: u64 = BASE_REWARD + 4_420_000;

    /// Reward is zero after this many halvings.
    pub const MAX_HALVINGS: u32 = 52;

    /// Pre-mine allocation per investor-class key.
    pub const MAX_INVESTORS: u64 = 102_000_000 * COIN;

    /// Pre-mine allocation for the foundation key.
    pub const MAX_FOUNDATION: u64 = 102_000_000 * COIN;

    /// Pre-mine allocation for the creators key.
    pub const MAX_CREATORS: u64 = 102_000_000 * COIN;

    /// Pre-mine allocation for the airdrop key.
    pub const MAX_AIRDROP: u64 = 1_054_000_000 * COIN;

    /// Total pre-mine.
    pub const MAX_PREMINE: u64 = 1_360_000_000 * COIN;

    /// Total mining subsidy.
    pub const MAX_SUBSIDY: u64 = 680_000_000 * COIN;

    /// Total supply.
    pub const MAX_MONEY: u64 = 2_040_000_000 * COIN;

    /// Maximum base block size in bytes.
    pub const MAX_BLOCK_SIZE: usize = 1_000_000;

    /// Maximum raw (witness-inclusive) block size in bytes.
    pub const MAX_RAW_BLOCK_SIZE: usize = 4_000_000;

    /// Maximum block weight.
    pub const MAX_BLOCK_WEIGHT: usize = 4_000_000;

    /// Maximum signature operations per block.
    pub const MAX_BLOCK_SIGOPS: usize = 80_000;

    /// Maximum name-mutating covenants per block.
    pub const MAX_BLOCK_UPDATES: usize = 500;

    /// Weight factor applied to non-witness bytes.
    pub const WITNESS_SCALE_FACTOR: usize = nomen_primitives::WITNESS_SCALE_FACTOR;

    /// Entries used for the median-time-past calculation.
    pub const MEDIAN_TIMESPAN: usize = 11;

    /// Locktime values at or above this are UNIX times, below are heights.
    pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

    /// Sequence bit disabling relative locktime.
    pub const SEQUENCE_DISABLE_FLAG: u32 = 1 << 31;

    /// Sequence bit selecting time-based relative locktime.
    pub const SEQUENCE_TYPE_FLAG: u32 = 1 << 22;

    /// Granularity shift for time-based relative locktime.
    pub const SEQUENCE_GRANULARITY: u32 = 9;

    /// Mask extracting the relative locktime value.
    pub const SEQUENCE_MASK: u32 = 0xffff;

    /// Script limits, carried for the script subsystem.
    pub const MAX_SCRIPT_SIZE: usize = 10_000;
    pub const MAX_SCRIPT_STACK: usize = 1_000;
    pub const MAX_SCRIPT_PUSH: usize = 520;
    pub const MAX_SCRIPT_OPS: usize = 201;
    pub const MAX_MULTISIG_PUBKEYS: usize = 20;

    /// Witness flag embedded in the genesis coinbase.
    pub const EPOCH_FLAG: &str = "01/Nov/2017 EFF to ICANN: Don't Pick Up the Censor's Pen";

    /// The 20-byte genesis key hash.
    pub const GENESIS_KEY: [u8; 20] = [
        0xf0, 0x23, 0x7a, 0xe2, 0xe8, 0xf8, 0x60, 0xf7, 0xd7, 0x91, 0x24, 0xfc, 0x51, 0x3f, 0x01,
        0x2e, 0x5a, 0xaa, 0x8d, 0x23,
    ];
}

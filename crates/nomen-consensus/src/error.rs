//! Error types for consensus validation.

use crate::cuckoo::CuckooError;
use nomen_primitives::CodecError;
use thiserror::Error;

/// Consensus validation errors.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Header hash does not meet its declared target.
    #[error("Proof of work below target at height {height}")]
    PowBelowTarget { height: u32 },

    /// Cuckoo-cycle solution failed verification.
    #[error("Invalid cuckoo solution: {0}")]
    Cuckoo(#[from] CuckooError),

    /// Solution arity does not match the network parameter.
    #[error("Bad solution size: expected {expected}, got {got}")]
    BadSolutionSize { expected: usize, got: usize },

    /// Declared merkle root does not match the transactions.
    #[error("Bad merkle root: got {got}, expected {expected}")]
    BadMerkleRoot { got: String, expected: String },

    /// Declared witness root does not match the transactions.
    #[error("Bad witness root: got {got}, expected {expected}")]
    BadWitnessRoot { got: String, expected: String },

    /// Block exceeds a size budget.
    #[error("Block too large: {size} bytes, max {max}")]
    BlockTooLarge { size: usize, max: usize },

    /// Block exceeds the weight budget.
    #[error("Block too heavy: weight {weight}, max {max}")]
    BlockTooHeavy { weight: usize, max: usize },

    /// Too many name-mutating covenants in one block.
    #[error("Too many covenant updates: {count}, max {max}")]
    TooManyUpdates { count: usize, max: usize },

    /// Malformed coinbase placement or structure.
    #[error("Bad coinbase: {0}")]
    BadCoinbase(&'static str),

    /// Block time is not after the median of recent blocks.
    #[error("Block time {time} not after median {median}")]
    TimeTooOld { time: u64, median: u64 },

    /// A transaction is not final at this height/time.
    #[error("Non-final transaction {txid}")]
    NonFinal { txid: String },

    /// Wire-format failure while handling consensus data.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

//! Error types for the chain writer.

use thiserror::Error;

/// Errors surfaced by the chain writer.
#[derive(Error, Debug)]
pub enum ChainError {
    /// Block failed a consensus rule; the tip is unchanged.
    #[error("Consensus: {0}")]
    Consensus(#[from] nomen_consensus::ConsensusError),

    /// A covenant was illegal; the block is rejected.
    #[error("State: {0}")]
    State(#[from] nomen_state::StateError),

    /// Wire-format failure.
    #[error("Codec: {0}")]
    Codec(#[from] nomen_primitives::CodecError),

    /// Storage backend failure; the writer halts.
    #[error("Storage: {0}")]
    Storage(#[from] nomen_storage::StorageError),

    /// Block references an unknown parent.
    #[error("Orphan block {hash}: unknown parent {parent}")]
    Orphan { hash: String, parent: String },

    /// Block already known.
    #[error("Duplicate block {0}")]
    Duplicate(String),

    /// Requested block or entry not found.
    #[error("Unknown block {0}")]
    UnknownBlock(String),

    /// A committed-state invariant was violated; the writer must halt.
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

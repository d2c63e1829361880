//! Context-free block body checks and time/locktime rules.
//!
//! Everything here is a pure function of the block and the parameter
//! set; contextual checks (previous entries, the auction store) live
//! with the chain writer.

use crate::error::{ConsensusError, ConsensusResult};
use crate::networks::NetworkParams;
use crate::params::{
    LOCKTIME_THRESHOLD, MAX_BLOCK_SIZE, MAX_BLOCK_UPDATES, MAX_BLOCK_WEIGHT, MAX_RAW_BLOCK_SIZE,
};
use nomen_primitives::{Block, Transaction};

/// Median of the given block times. The slice is the last
/// [`crate::params::MEDIAN_TIMESPAN`] entries or fewer near genesis.
pub fn median_time(times: &[u64]) -> u64 {
    if times.is_empty() {
        return 0;
    }
    let mut sorted = times.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

/// Locktime finality: a transaction is final once its locktime height
/// or time has passed, or when every input opts out with a final
/// sequence.
pub fn is_final(tx: &Transaction, height: u32, time: u64) -> bool {
    if tx.locktime == 0 {
        return true;
    }
    let threshold = if tx.locktime < LOCKTIME_THRESHOLD {
        height as u64
    } else {
        time
    };
    if (tx.locktime as u64) < threshold {
        return true;
    }
    tx.inputs.iter().all(|input| input.sequence == u32::MAX)
}

/// Structural block checks: coinbase placement, merkle commitments,
/// size and weight budgets, and the covenant update budget.
pub fn check_block_body(block: &Block, params: &NetworkParams) -> ConsensusResult<()> {
    if block.txs.is_empty() {
        return Err(ConsensusError::BadCoinbase("empty block"));
    }
    if !block.txs[0].is_coinbase() {
        return Err(ConsensusError::BadCoinbase("first tx not coinbase"));
    }
    if block.txs[1..].iter().any(|tx| tx.is_coinbase()) {
        return Err(ConsensusError::BadCoinbase("extra coinbase"));
    }

    if block.solution.len() != params.cuckoo.size {
        return Err(ConsensusError::BadSolutionSize {
            expected: params.cuckoo.size,
            got: block.solution.len(),
        });
    }

    let merkle = block.compute_merkle_root();
    if merkle != block.header.merkle_root {
        return Err(ConsensusError::BadMerkleRoot {
            got: block.header.merkle_root.to_string(),
            expected: merkle.to_string(),
        });
    }
    let witness = block.compute_witness_root();
    if witness != block.header.witness_root {
        return Err(ConsensusError::BadWitnessRoot {
            got: block.header.witness_root.to_string(),
            expected: witness.to_string(),
        });
    }

    let base = block.base_size();
    if base > MAX_BLOCK_SIZE {
        return Err(ConsensusError::BlockTooLarge {
            size: base,
            max: MAX_BLOCK_SIZE,
        });
    }
    let total = block.total_size();
    if total > MAX_RAW_BLOCK_SIZE {
        return Err(ConsensusError::BlockTooLarge {
            size: total,
            max: MAX_RAW_BLOCK_SIZE,
        });
    }
    let weight = block.weight();
    if weight > MAX_BLOCK_WEIGHT {
        return Err(ConsensusError::BlockTooHeavy {
            weight,
            max: MAX_BLOCK_WEIGHT,
        });
    }

    let updates = block
        .txs
        .iter()
        .flat_map(|tx| tx.outputs.iter())
        .filter(|output| !output.covenant.is_none())
        .count();
    if updates > MAX_BLOCK_UPDATES {
        return Err(ConsensusError::TooManyUpdates {
            count: updates,
            max: MAX_BLOCK_UPDATES,
        });
    }

    Ok(())
}

//! Merkle root computation over transaction hashes.
//!
//! Leaves pair left-to-right; an odd node is paired with itself. The
//! empty tree maps to the null hash.

use crate::hash::{blake2b256_multi, Hash};

/// Compute the merkle root of a list of leaf hashes.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::ZERO;
    }

    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(blake2b256_multi(&[left.as_bytes(), right.as_bytes()]));
        }
        level = next;
    }
    level[0]
}

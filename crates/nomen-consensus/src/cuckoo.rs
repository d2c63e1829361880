//! Cuckoo-cycle proof-of-work verification.
//!
//! The proof is a cycle of fixed length in a bipartite graph whose
//! edges are derived from the header through SipHash-2-4. The verifier
//! expands the header into sipkeys, recomputes the endpoints of every
//! claimed edge, and walks the cycle. It never searches.
//!
//! Node derivation for edge `e` on side `uorv`:
//! `(siphash24(2e + uorv) & (nodes/2 - 1)) << 1 | uorv`. Edge indices
//! must be strictly increasing and below the easiness bound
//! `ease * nodes / 100`.

use nomen_primitives::{blake2b256, Solution, MAX_SOLUTION_SIZE};
use thiserror::Error;

/// Specific cuckoo verification failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuckooError {
    /// Solution arity differs from the network parameter.
    #[error("wrong solution arity: expected {expected}, got {got}")]
    WrongArity { expected: usize, got: usize },

    /// An edge index is at or above the easiness bound.
    #[error("edge index too big")]
    TooBig,

    /// Edge indices are not strictly increasing.
    #[error("edge indices not increasing")]
    TooSmall,

    /// Edge endpoints do not cancel: not a union of cycles.
    #[error("endpoints do not match up")]
    NonMatching,

    /// A node is visited by more than two solution edges.
    #[error("branch in cycle")]
    Branch,

    /// The walk reached a node with no continuing edge.
    #[error("dead end in cycle")]
    DeadEnd,

    /// The walk closed before traversing every edge.
    #[error("cycle too short")]
    ShortCycle,
}

/// Pure cuckoo-cycle verifier for one parameter set.
#[derive(Debug, Clone)]
pub struct Cuckoo {
    /// Graph size: `nodes = 1 << bits`.
    bits: u32,
    /// Cycle length (solution arity).
    size: usize,
    /// Easiness percentage.
    ease: u32,
}

impl Cuckoo {
    /// Create a verifier. `size` must not exceed
    /// [`MAX_SOLUTION_SIZE`]; the node buffer is stack-sized for it.
    pub fn new(bits: u32, size: usize, ease: u32) -> Self {
        assert!(size <= MAX_SOLUTION_SIZE);
        assert!(bits >= 2 && bits <= 31);
        Self { bits, size, ease }
    }

    /// Total node count.
    fn nodes(&self) -> u64 {
        1u64 << self.bits
    }

    /// Upper bound on edge indices.
    fn easiness(&self) -> u64 {
        self.ease as u64 * self.nodes() / 100
    }

    /// Derive the four SipHash keys from the header bytes.
    fn sipkeys(header: &[u8]) -> [u64; 4] {
        let seed = blake2b256(header);
        let b = seed.as_bytes();
        let mut keys = [0u64; 4];
        for (i, key) in keys.iter_mut().enumerate() {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&b[i * 8..i * 8 + 8]);
            *key = u64::from_le_bytes(arr);
        }
        keys
    }

    /// Endpoints of every candidate edge, for the reference solver.
    pub(crate) fn enumerate_edges(&self, header: &[u8]) -> (u64, Vec<(u32, u32)>) {
        let keys = Self::sipkeys(header);
        let easiness = self.easiness();
        let endpoints = (0..easiness as u32)
            .map(|e| (self.sipnode(&keys, e, 0), self.sipnode(&keys, e, 1)))
            .collect();
        (easiness, endpoints)
    }

    /// Endpoint of `edge` on side `uorv` (0 or 1).
    fn sipnode(&self, keys: &[u64; 4], edge: u32, uorv: u32) -> u32 {
        let mask = (self.nodes() >> 1) - 1;
        let hash = siphash24(keys, 2 * edge as u64 + uorv as u64);
        (((hash & mask) << 1) | uorv as u64) as u32
    }

    /// Verify a solution against the header it claims to prove.
    pub fn verify(&self, header: &[u8], solution: &Solution) -> Result<(), CuckooError> {
        let edges = solution.edges();
        if edges.len() != self.size {
            return Err(CuckooError::WrongArity {
                expected: self.size,
                got: edges.len(),
            });
        }

        let keys = Self::sipkeys(header);
        let easiness = self.easiness();

        let mut uvs = [0u32; 2 * MAX_SOLUTION_SIZE];
        let mut xor0 = 0u32;
        let mut xor1 = 0u32;

        for (n, &edge) in edges.iter().enumerate() {
            if edge as u64 >= easiness {
                return Err(CuckooError::TooBig);
            }
            if n > 0 && edge <= edges[n - 1] {
                return Err(CuckooError::TooSmall);
            }
            uvs[2 * n] = self.sipnode(&keys, edge, 0);
            uvs[2 * n + 1] = self.sipnode(&keys, edge, 1);
            xor0 ^= uvs[2 * n];
            xor1 ^= uvs[2 * n + 1];
        }

        // Every node must appear an even number of times.
        if xor0 != 0 || xor1 != 0 {
            return Err(CuckooError::NonMatching);
        }

        // Follow the cycle from the first u-node.
        let len = 2 * self.size;
        let mut n = 0usize;
        let mut i = 0usize;
        loop {
            let mut j = i;
            let mut k = i;
            loop {
                k = (k + 2) % len;
                if k == i {
                    break;
                }
                if uvs[k] == uvs[i] {
                    if j != i {
                        return Err(CuckooError::Branch);
                    }
                    j = k;
                }
            }
            if j == i {
                return Err(CuckooError::DeadEnd);
            }
            i = j ^ 1;
            n += 1;
            if i == 0 {
                break;
            }
        }

        if n == self.size {
            Ok(())
        } else {
            Err(CuckooError::ShortCycle)
        }
    }
}

/// SipHash-2-4 over a single 64-bit word.
fn siphash24(keys: &[u64; 4], nonce: u64) -> u64 {
    let mut v0 = keys[0] ^ 0x736f6d6570736575;
    let mut v1 = keys[1] ^ 0x646f72616e646f6d;
    let mut v2 = keys[2] ^ 0x6c7967656e657261;
    let mut v3 = keys[3] ^ 0x7465646279746573;

    macro_rules! sipround {
        () => {
            v0 = v0.wrapping_add(v1);
            v1 = v1.rotate_left(13);
            v1 ^= v0;
            v0 = v0.rotate_left(32);
            v2 = v2.wrapping_add(v3);
            v3 = v3.rotate_left(16);
            v3 ^= v2;
            v0 = v0.wrapping_add(v3);
            v3 = v3.rotate_left(21);
            v3 ^= v0;
            v2 = v2.wrapping_add(v1);
            v1 = v1.rotate_left(17);
            v1 ^= v2;
            v2 = v2.rotate_left(32);
        };
    }

    v3 ^= nonce;
    sipround!();
    sipround!();
    v0 ^= nonce;
    v2 ^= 0xff;
    sipround!();
    sipround!();
    sipround!();
    sipround!();

    v0 ^ v1 ^ v2 ^ v3
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_primitives::Solution;

    fn tiny_params() -> crate::networks::CuckooParams {
        // Regtest-scale graph: 256 nodes, 4-cycles, easiness 128.
        crate::networks::CuckooParams {
            bits: 8,
            size: 4,
            ease: 50,
        }
    }

    fn tiny_verifier() -> Cuckoo {
        let p = tiny_params();
        Cuckoo::new(p.bits, p.size, p.ease)
    }

    fn solved_header() -> (Vec<u8>, Vec<u32>) {
        for nonce in 0u32..4096 {
            let mut header = b"cuckoo test header ".to_vec();
            header.extend_from_slice(&nonce.to_le_bytes());
            if let Some(sol) = crate::solver::solve(&tiny_params(), &header) {
                return (header, sol.edges().to_vec());
            }
        }
        panic!("no 4-cycle found in 4096 tiny graphs");
    }

    #[test]
    fn test_valid_cycle_verifies() {
        let verifier = tiny_verifier();
        let (header, sol) = solved_header();
        assert_eq!(verifier.verify(&header, &Solution::new(sol)), Ok(()));
    }

    #[test]
    fn test_solution_bound_to_header() {
        let verifier = tiny_verifier();
        let (header, sol) = solved_header();
        let mut other = header.clone();
        other[0] ^= 0xff;
        assert!(verifier.verify(&other, &Solution::new(sol)).is_err());
    }

    #[test]
    fn test_wrong_arity() {
        let verifier = tiny_verifier();
        assert_eq!(
            verifier.verify(b"h", &Solution::new(vec![1, 2, 3])),
            Err(CuckooError::WrongArity {
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn test_unsorted_edges_rejected() {
        let verifier = tiny_verifier();
        let (header, mut sol) = solved_header();
        sol.swap(0, 1);
        assert_eq!(
            verifier.verify(&header, &Solution::new(sol)),
            Err(CuckooError::TooSmall)
        );
    }

    #[test]
    fn test_edge_over_easiness_rejected() {
        let verifier = tiny_verifier();
        assert_eq!(
            verifier.verify(b"h", &Solution::new(vec![1, 2, 3, 4096])),
            Err(CuckooError::TooBig)
        );
    }

    #[test]
    fn test_garbage_edges_rejected() {
        let verifier = tiny_verifier();
        // Distinct ascending edges under the bound; with overwhelming
        // probability their endpoints do not cancel.
        let err = verifier
            .verify(b"garbage", &Solution::new(vec![3, 17, 40, 99]))
            .unwrap_err();
        assert!(matches!(
            err,
            CuckooError::NonMatching | CuckooError::DeadEnd | CuckooError::Branch
        ));
    }

    #[test]
    fn test_siphash_sensitivity() {
        let keys = [1u64, 2, 3, 4];
        let a = siphash24(&keys, 0);
        assert_ne!(siphash24(&keys, 1), a);
        assert_ne!(siphash24(&[1, 2, 3, 5], 0), a);
    }
}

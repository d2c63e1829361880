//! Reference cuckoo solver for tiny graphs.
//!
//! Covers the regtest parameter set (4-cycles over a 256-node graph)
//! so harnesses can mine valid blocks without external workers. The
//! consensus verifier in [`crate::Cuckoo`] never searches; this is
//! the search side, and it deliberately stays naive.

use crate::cuckoo::Cuckoo;
use crate::networks::CuckooParams;
use nomen_primitives::Solution;
use std::collections::HashMap;

/// Search one header's graph for a 4-cycle. Returns `None` when the
/// graph has no such cycle or the parameter set is not a 4-cycle
/// graph.
pub fn solve(params: &CuckooParams, header: &[u8]) -> Option<Solution> {
    if params.size != 4 {
        return None;
    }
    let verifier = Cuckoo::new(params.bits, params.size, params.ease);
    let (easiness, endpoints) = verifier.enumerate_edges(header);

    // Group edges by u-node, then look for two u-nodes reaching the
    // same v-pair: that closes a 4-cycle.
    let mut by_u: HashMap<u32, Vec<u32>> = HashMap::new();
    for edge in 0..easiness as u32 {
        by_u.entry(endpoints[edge as usize].0).or_default().push(edge);
    }

    let mut by_vpair: HashMap<(u32, u32), (u32, u32, u32)> = HashMap::new();
    for (&u, edges) in &by_u {
        for (n, &a) in edges.iter().enumerate() {
            for &b in &edges[n + 1..] {
                let (va, vb) = (endpoints[a as usize].1, endpoints[b as usize].1);
                if va == vb {
                    continue;
                }
                let key = (va.min(vb), va.max(vb));
                match by_vpair.get(&key) {
                    Some(&(other_u, c, d)) if other_u != u => {
                        let mut edges = vec![a, b, c, d];
                        edges.sort_unstable();
                        return Some(Solution::new(edges));
                    }
                    Some(_) => {}
                    None => {
                        by_vpair.insert(key, (u, a, b));
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::NetworkParams;

    #[test]
    fn test_solver_output_verifies() {
        let params = NetworkParams::regtest();
        let verifier = Cuckoo::new(params.cuckoo.bits, params.cuckoo.size, params.cuckoo.ease);

        let mut found = 0;
        for nonce in 0u32..64 {
            let mut header = b"solver test ".to_vec();
            header.extend_from_slice(&nonce.to_le_bytes());
            if let Some(solution) = solve(&params.cuckoo, &header) {
                verifier.verify(&header, &solution).unwrap();
                found += 1;
            }
        }
        assert!(found > 0, "no solvable graph in 64 headers");
    }

    #[test]
    fn test_solver_rejects_other_sizes() {
        let params = NetworkParams::simnet();
        assert!(solve(&params.cuckoo, b"header").is_none());
    }
}

// src/verifier.rs - Independent proof verification and difficulty check

//! Trimming-free proof verification.
//!
//! The verifier shares nothing with the solver but the oracle: it re-derives
//! the keys, recomputes both endpoints of every claimed edge, and checks
//! that the claimed indices form exactly one cycle of the configured length
//! before re-deriving the difficulty hash and comparing it against the
//! target. Every structural failure is an ordinary `Invalid` value.

use blake2::{
    digest::{Update, VariableOutput},
    Blake2bVar,
};
use hashbrown::HashMap;
use thiserror::Error;

use crate::config::{GraphGeometry, Settings};
use crate::oracle::{Side, SipKeys};
use crate::Result;

/// High bit distinguishes V-side nodes when counting degrees
const V_FLAG: u32 = 1 << 31;

/// Outcome of verifying one proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Proof is a well-formed cycle and its hash meets the target
    Valid {
        /// Difficulty hash derived from header, nonce and proof
        hash: [u8; 32],
    },
    /// Proof was rejected; the reason says why
    Invalid(RejectReason),
}

impl Verification {
    /// True for `Valid`
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid { .. })
    }
}

/// Why a proof failed verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Proof length does not match the configured cycle length
    #[error("proof has {actual} edges, expected {expected}")]
    WrongProofLength {
        /// Configured cycle length
        expected: usize,
        /// Length of the claimed proof
        actual: usize,
    },
    /// An edge index lies outside the graph
    #[error("edge index {0} out of range")]
    EdgeOutOfRange(u32),
    /// Indices must be strictly ascending (which also forbids duplicates)
    #[error("edge indices not strictly ascending")]
    EdgesNotAscending,
    /// The claimed edges do not form a single cycle of the required length
    #[error("edges do not form a single {0}-cycle")]
    NotACycle(usize),
    /// Structure is fine but the difficulty hash misses the target
    #[error("difficulty hash above target")]
    AboveTarget {
        /// The derived hash, for reporting
        hash: [u8; 32],
    },
}

/// Difficulty hash: BLAKE2b-256 over `header || nonce_le || proof edges`
pub fn difficulty_hash(header: &[u8], nonce: u64, proof: &[u32]) -> [u8; 32] {
    let mut hasher = Blake2bVar::new(32).unwrap();
    hasher.update(header);
    hasher.update(&nonce.to_le_bytes());
    for &edge in proof {
        hasher.update(&edge.to_le_bytes());
    }
    let mut hash = [0u8; 32];
    hasher.finalize_variable(&mut hash).unwrap();
    hash
}

/// Fixed-width big-endian comparison of a hash against a target boundary
#[inline]
pub fn meets_target(hash: &[u8; 32], target: &[u8; 32]) -> bool {
    hash.as_slice() <= target.as_slice()
}

/// Verify a claimed proof for (header, nonce) against a difficulty target
///
/// Fails closed: anything that does not positively check out is `Invalid`.
/// Only invalid settings produce an `Err`.
pub fn verify(
    header: &[u8],
    nonce: u64,
    proof: &[u32],
    target: &[u8; 32],
    settings: &Settings,
) -> Result<Verification> {
    let geometry = GraphGeometry::from_settings(settings)?;

    if proof.len() != settings.proof_size {
        return Ok(Verification::Invalid(RejectReason::WrongProofLength {
            expected: settings.proof_size,
            actual: proof.len(),
        }));
    }
    for &edge in proof {
        if edge >= geometry.num_edges {
            return Ok(Verification::Invalid(RejectReason::EdgeOutOfRange(edge)));
        }
    }
    if proof.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Ok(Verification::Invalid(RejectReason::EdgesNotAscending));
    }

    let keys = SipKeys::derive(header, nonce);
    if !forms_single_cycle(&keys, proof, &geometry) {
        return Ok(Verification::Invalid(RejectReason::NotACycle(
            settings.proof_size,
        )));
    }

    let hash = difficulty_hash(header, nonce, proof);
    if !meets_target(&hash, target) {
        return Ok(Verification::Invalid(RejectReason::AboveTarget { hash }));
    }

    Ok(Verification::Valid { hash })
}

/// Check that the claimed edges form exactly one alternating cycle
///
/// Every touched node must have degree exactly two, and walking the edges
/// from any starting point must traverse all of them before closing.
fn forms_single_cycle(keys: &SipKeys, proof: &[u32], geometry: &GraphGeometry) -> bool {
    let endpoints: Vec<(u32, u32)> = proof
        .iter()
        .map(|&edge| {
            let u = keys.node(edge, Side::U, geometry.node_mask);
            let v = keys.node(edge, Side::V, geometry.node_mask) | V_FLAG;
            (u, v)
        })
        .collect();

    let mut incidence: HashMap<u32, Vec<usize>> = HashMap::with_capacity(proof.len() * 2);
    for (pos, &(u, v)) in endpoints.iter().enumerate() {
        incidence.entry(u).or_default().push(pos);
        incidence.entry(v).or_default().push(pos);
    }
    if incidence.values().any(|edges| edges.len() != 2) {
        return false;
    }

    // Degrees are all two, so the edges split into disjoint cycles; walk
    // one and require it to cover everything.
    let start = endpoints[0].0;
    let mut node = start;
    let mut prev_pos = usize::MAX;
    let mut steps = 0usize;
    loop {
        let incident = &incidence[&node];
        let pos = if incident[0] == prev_pos {
            incident[1]
        } else {
            incident[0]
        };
        let (u, v) = endpoints[pos];
        node = if node == u { v } else { u };
        prev_pos = pos;
        steps += 1;

        if node == start {
            break;
        }
        if steps > proof.len() {
            return false;
        }
    }
    steps == proof.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::test_scale()
    }

    const PERMISSIVE: [u8; 32] = [0xff; 32];

    #[test]
    fn test_wrong_length_rejected() {
        let result = verify(&[0u8; 32], 0, &[1, 2, 3], &PERMISSIVE, &settings()).unwrap();
        assert_eq!(
            result,
            Verification::Invalid(RejectReason::WrongProofLength {
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let proof = [1, 2, 3, 4, 5, 5000];
        let result = verify(&[0u8; 32], 0, &proof, &PERMISSIVE, &settings()).unwrap();
        assert_eq!(
            result,
            Verification::Invalid(RejectReason::EdgeOutOfRange(5000))
        );
    }

    #[test]
    fn test_unsorted_and_duplicate_rejected() {
        let unsorted = [2, 1, 3, 4, 5, 6];
        let result = verify(&[0u8; 32], 0, &unsorted, &PERMISSIVE, &settings()).unwrap();
        assert_eq!(result, Verification::Invalid(RejectReason::EdgesNotAscending));

        let duplicated = [1, 2, 2, 4, 5, 6];
        let result = verify(&[0u8; 32], 0, &duplicated, &PERMISSIVE, &settings()).unwrap();
        assert_eq!(result, Verification::Invalid(RejectReason::EdgesNotAscending));
    }

    #[test]
    fn test_arbitrary_indices_are_not_a_cycle() {
        let proof = [0, 1, 2, 3, 4, 5];
        let result = verify(&[0u8; 32], 0, &proof, &PERMISSIVE, &settings()).unwrap();
        assert_eq!(result, Verification::Invalid(RejectReason::NotACycle(6)));
    }

    #[test]
    fn test_difficulty_hash_covers_all_inputs() {
        let proof = [1u32, 2, 3, 4, 5, 6];
        let base = difficulty_hash(b"header", 7, &proof);
        assert_eq!(base, difficulty_hash(b"header", 7, &proof));
        assert_ne!(base, difficulty_hash(b"header", 8, &proof));
        assert_ne!(base, difficulty_hash(b"headex", 7, &proof));
        assert_ne!(base, difficulty_hash(b"header", 7, &[1, 2, 3, 4, 5, 7]));
    }

    #[test]
    fn test_target_monotonicity() {
        let hash = difficulty_hash(b"header", 0, &[1, 2, 3, 4, 5, 6]);

        assert!(meets_target(&hash, &[0xff; 32]));
        assert!(meets_target(&hash, &hash));

        let mut above = hash;
        let mut below = hash;
        // Flip well within the array; the hash is never all-ones or all-zeros
        let pos = (0..31).find(|&i| hash[i] != 0xff && hash[i] != 0).unwrap();
        above[pos] += 1;
        below[pos] -= 1;
        assert!(meets_target(&hash, &above));
        assert!(!meets_target(&hash, &below));
    }

    #[test]
    fn test_invalid_settings_error() {
        let mut bad = settings();
        bad.edge_bits = 64;
        assert!(verify(&[0u8; 32], 0, &[1, 2, 3, 4, 5, 6], &PERMISSIVE, &bad).is_err());
    }
}

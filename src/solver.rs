// src/solver.rs - Long-lived solve handle over trimming, recovery and search

//! The solver lifecycle surface.
//!
//! A `Solver` is an explicit handle owning the trimmer and all of its
//! working buffers. Construction allocates everything once; each `solve`
//! call reuses the buffers for a new (header, nonce) pair, and dropping or
//! releasing the handle frees them. Every solution a solver returns has
//! already passed the independent verifier, so a caller never needs to
//! re-check its own output.

use std::time::Instant;

use crate::config::Settings;
use crate::cycle;
use crate::metrics::{SearchStats, SolveStats, TrimStats};
use crate::oracle::SipKeys;
use crate::recovery;
use crate::trimmer::Trimmer;
use crate::verifier::{self, RejectReason, Verification};
use crate::Result;

/// One verified solution for a (header, nonce) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Nonce the solution was found at
    pub nonce: u64,
    /// Ascending edge indices forming the cycle
    pub proof: Vec<u32>,
    /// Difficulty hash, already at or below the target
    pub hash: [u8; 32],
}

/// Everything one solve attempt produced
#[derive(Debug, Clone)]
pub struct SolveOutput {
    /// Verified solutions; empty is the normal outcome
    pub solutions: Vec<Solution>,
    /// The target the solutions were checked against
    pub target: [u8; 32],
    /// Trimming progress for this attempt
    pub trim_stats: TrimStats,
    /// Cycle search progress for this attempt
    pub search_stats: SearchStats,
}

/// Long-lived solver handle.
///
/// Holds the settings it was initialized with and the preallocated
/// trimmer. `solve` takes `&mut self`, so one handle runs one attempt at
/// a time; independent handles are fully isolated.
pub struct Solver {
    settings: Settings,
    trimmer: Trimmer,
    stats: SolveStats,
}

impl Solver {
    /// Allocate a solver for the given settings
    ///
    /// This is the expensive step: all trimming buffers are sized and
    /// allocated here. Invalid settings or a failed allocation surface as
    /// `Err`; nothing is retried.
    pub fn init(settings: Settings) -> Result<Self> {
        let trimmer = Trimmer::new(&settings)?;
        tracing::info!(
            "Solver ready: 2^{} edges, {}-cycles, {} trim rounds",
            settings.edge_bits,
            settings.proof_size,
            settings.trim_rounds
        );
        Ok(Self {
            settings,
            trimmer,
            stats: SolveStats::default(),
        })
    }

    /// Settings this solver was initialized with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rolling statistics across all attempts on this handle
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Run one full solve attempt for (header, nonce)
    ///
    /// Trims the graph, recovers the surviving edges, searches for cycles
    /// and keeps only proofs the verifier accepts against `target`. An
    /// empty solution list is the normal outcome for most nonces.
    pub fn solve(&mut self, header: &[u8], nonce: u64, target: &[u8; 32]) -> Result<SolveOutput> {
        let start = Instant::now();
        let keys = SipKeys::derive(header, nonce);

        let trimmed = self.trimmer.run(&keys)?;
        let edge_set = recovery::recover(&keys, &trimmed.indices, self.trimmer.geometry());
        let (proofs, search_stats) =
            cycle::search_cycles(&edge_set, self.settings.proof_size, self.settings.max_solutions);

        let mut solutions = Vec::new();
        for proof in proofs {
            match verifier::verify(header, nonce, &proof, target, &self.settings)? {
                Verification::Valid { hash } => {
                    tracing::info!(
                        "Solution at nonce {}: hash {}",
                        nonce,
                        hex::encode(&hash[..8])
                    );
                    solutions.push(Solution { nonce, proof, hash });
                }
                Verification::Invalid(RejectReason::AboveTarget { hash }) => {
                    tracing::debug!(
                        "Cycle at nonce {} misses target: hash {}",
                        nonce,
                        hex::encode(&hash[..8])
                    );
                }
                Verification::Invalid(reason) => {
                    // A structurally bad proof out of the finder is a bug,
                    // but a dropped solution is the worst it can cost
                    tracing::warn!("Search produced a rejected proof: {}", reason);
                }
            }
        }

        self.stats
            .record_attempt(start.elapsed().as_millis() as u64, solutions.len());

        Ok(SolveOutput {
            solutions,
            target: *target,
            trim_stats: trimmed.stats,
            search_stats,
        })
    }

    /// Scan a nonce range, collecting solutions until `max_solutions`
    ///
    /// Nonces are tried in order starting at `start_nonce`; the scan stops
    /// early once the configured solution cap is reached.
    pub fn solve_range(
        &mut self,
        header: &[u8],
        start_nonce: u64,
        nonce_count: u64,
        target: &[u8; 32],
    ) -> Result<Vec<Solution>> {
        let mut solutions = Vec::new();
        for offset in 0..nonce_count {
            let nonce = start_nonce + offset;
            let output = self.solve(header, nonce, target)?;
            solutions.extend(output.solutions);
            if solutions.len() >= self.settings.max_solutions {
                solutions.truncate(self.settings.max_solutions);
                tracing::debug!(
                    "Stopping scan at nonce {}: solution cap reached",
                    nonce
                );
                break;
            }
        }
        Ok(solutions)
    }

    /// Tear the solver down, freeing all buffers
    ///
    /// Dropping the handle has the same effect; this form just makes the
    /// release point explicit at call sites.
    pub fn release(self) {
        tracing::debug!(
            "Releasing solver after {} attempts, {} solutions",
            self.stats.attempts,
            self.stats.solutions_found
        );
    }
}

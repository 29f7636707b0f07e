// src/trimmer/mod.rs - Bucketed parallel edge trimmer

//! The edge trimming pipeline.
//!
//! Reduces the 2^edge_bits generated edges down to their 2-core before
//! cycle search. Four stages, each ending in a hard barrier:
//!
//! 1. **generate-coarse**: every edge is evaluated once and scattered into
//!    X-indexed coarse buckets by its U endpoint
//! 2. **generate-fine**: each coarse bucket is re-scattered into (X, Y)
//!    fine buckets
//! 3. **trim rounds**: alternating-side vote/filter passes over the 2-bit
//!    node counters; survivors are rescattered by their other endpoint
//! 4. **tail**: per-bucket stream compaction into one dense index array
//!
//! Workers own disjoint buckets within a pass and the counters are updated
//! by atomic OR, so no pass takes a lock. Bucket overflow drops edges
//! silently; a drop can only cost a solution, never correctness of the
//! edges that remain.

pub mod arena;

use std::time::Instant;

use rayon::prelude::*;

use crate::config::{GraphGeometry, Settings};
use crate::metrics::TrimStats;
use crate::oracle::{SipKeys, Side};
use crate::{CuckooError, Result};

use arena::{BucketArena, CompactionBuffer, CounterPlanes, EdgeEntry};

/// Dense surviving edge set produced by one trimming run
#[derive(Debug, Clone)]
pub struct TrimmedEdges {
    /// Original indices of the surviving edges
    pub indices: Vec<u32>,
    /// Stage timings and per-round counts for this run
    pub stats: TrimStats,
}

/// Long-lived trimmer owning all working buffers.
///
/// Buffers are allocated once and reused across nonces; `run` takes
/// `&mut self` so a single instance can only have one solve in flight.
pub struct Trimmer {
    geometry: GraphGeometry,
    trim_rounds: u32,
    coarse: BucketArena,
    fine_a: BucketArena,
    fine_b: BucketArena,
    counters: CounterPlanes,
    tail: CompactionBuffer,
    pool: rayon::ThreadPool,
}

impl Trimmer {
    /// Allocate a trimmer for the given settings
    ///
    /// Allocation happens exactly once here; a failure is a fatal
    /// `Resource` error rather than something a retry could fix.
    pub fn new(settings: &Settings) -> Result<Self> {
        let geometry = GraphGeometry::from_settings(settings)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.worker_threads)
            .thread_name(|i| format!("trim-{}", i))
            .build()
            .map_err(|e| CuckooError::Resource(format!("worker pool: {}", e)))?;

        tracing::info!(
            "Allocating trimmer buffers: 2^{} edges, {}x{} buckets, ~{}MB",
            geometry.edge_bits,
            geometry.nx,
            geometry.ny,
            geometry.memory_estimate() / (1024 * 1024)
        );

        Ok(Self {
            coarse: BucketArena::new(geometry.nx as usize, geometry.coarse_capacity)?,
            fine_a: BucketArena::new(geometry.nxy as usize, geometry.fine_capacity_a)?,
            fine_b: BucketArena::new(geometry.nxy as usize, geometry.fine_capacity_b)?,
            counters: CounterPlanes::new(geometry.counter_plane_words())?,
            tail: CompactionBuffer::new(geometry.max_trimmed)?,
            pool,
            geometry,
            trim_rounds: settings.trim_rounds,
        })
    }

    /// Graph geometry this trimmer was built for
    pub fn geometry(&self) -> &GraphGeometry {
        &self.geometry
    }

    /// Trim the graph keyed by `keys` down to its 2-core
    pub fn run(&mut self, keys: &SipKeys) -> Result<TrimmedEdges> {
        let total_start = Instant::now();
        let geo = self.geometry;

        self.coarse.reset();
        self.fine_a.reset();
        self.fine_b.reset();
        self.tail.reset();

        let coarse = &self.coarse;
        let fine_a = &self.fine_a;
        let fine_b = &self.fine_b;
        let counters = &self.counters;
        let tail = &self.tail;

        // Stage 1: generate-coarse. Every edge evaluated exactly once.
        let generate_start = Instant::now();
        self.pool.install(|| {
            (0..geo.num_edges)
                .into_par_iter()
                .with_min_len(1024)
                .for_each(|edge| {
                    let u = keys.node(edge, Side::U, geo.node_mask);
                    let v = keys.node(edge, Side::V, geo.node_mask);
                    coarse.push(geo.coarse_bucket(u), EdgeEntry { index: edge, u, v });
                });
        });

        // Stage 2: generate-fine. One worker per coarse bucket.
        self.pool.install(|| {
            (0..geo.nx as usize).into_par_iter().for_each(|xb| {
                for entry in coarse.bucket(xb) {
                    fine_a.push(geo.fine_bucket(entry.u), *entry);
                }
            });
        });
        let generate_ms = generate_start.elapsed().as_millis() as u64;
        let mut dropped_edges = coarse.dropped() + fine_a.dropped();

        tracing::debug!(
            "Generated {} edges into {} fine buckets ({} dropped)",
            fine_a.total_entries(),
            geo.nxy,
            dropped_edges
        );

        // Stage 3: alternating vote/filter rounds.
        let trim_start = Instant::now();
        let mut current = fine_a;
        let mut next = fine_b;
        let mut side = Side::U;
        let mut rounds_executed = 0u32;
        let mut round_survivors = Vec::with_capacity(self.trim_rounds as usize);

        for round in 0..self.trim_rounds {
            self.pool.install(|| counters.par_reset());
            next.reset();

            // Vote: count active-side node incidences.
            self.pool.install(|| {
                (0..geo.nxy as usize).into_par_iter().for_each(|b| {
                    for entry in current.bucket(b) {
                        counters.mark(entry.endpoint(side));
                    }
                });
            });

            // Filter: survivors rescatter keyed by the other endpoint.
            self.pool.install(|| {
                (0..geo.nxy as usize).into_par_iter().for_each(|b| {
                    for entry in current.bucket(b) {
                        if counters.keep(entry.endpoint(side)) {
                            let other = entry.endpoint(side.other());
                            next.push(geo.fine_bucket(other), *entry);
                        }
                    }
                });
            });

            rounds_executed += 1;
            dropped_edges += next.dropped();
            let survivors = next.total_entries();
            round_survivors.push(survivors);

            if round < 4 || round % 32 == 0 {
                tracing::debug!("Round {}: {} edges survive ({:?} side)", round, survivors, side);
            }

            std::mem::swap(&mut current, &mut next);
            side = side.other();

            if survivors == 0 {
                break;
            }
        }
        let trim_ms = trim_start.elapsed().as_millis() as u64;

        // Stage 4: tail compaction into one dense array.
        let tail_start = Instant::now();
        self.pool.install(|| {
            (0..geo.nxy as usize).into_par_iter().for_each(|b| {
                let entries = current.bucket(b);
                if entries.is_empty() {
                    return;
                }
                let (start, granted) = tail.reserve(entries.len());
                for (i, entry) in entries.iter().take(granted).enumerate() {
                    tail.write(start + i, entry.index);
                }
            });
        });
        let tail_ms = tail_start.elapsed().as_millis() as u64;

        dropped_edges += tail.dropped();
        let indices = tail.as_slice().to_vec();

        let stats = TrimStats {
            generate_ms,
            trim_ms,
            tail_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
            rounds_executed,
            round_survivors,
            dropped_edges,
            trimmed_count: indices.len(),
        };

        tracing::info!(
            "Trimming complete: {} -> {} edges in {} rounds, {}ms",
            geo.num_edges,
            stats.trimmed_count,
            stats.rounds_executed,
            stats.total_ms
        );
        if stats.trimmed_count == geo.max_trimmed {
            tracing::warn!(
                "Surviving set hit the {} edge cap; overflow was dropped",
                geo.max_trimmed
            );
        }

        Ok(TrimmedEdges { indices, stats })
    }
}

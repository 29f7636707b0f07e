// src/cycle.rs - Cycle detection over the trimmed edge set

//! CPU cycle detection after trimming.
//!
//! Trimming reduces millions of edges to a few hundred; this module builds
//! an adjacency map over that reduced set and runs a depth-first search for
//! simple cycles of exactly the configured proof length. Cycles are
//! reported as ascending edge-index proofs, deduplicated across rotations
//! and directions by their canonical sorted form.

use std::time::Instant;

use hashbrown::{HashMap, HashSet};

use crate::metrics::SearchStats;
use crate::recovery::EdgeSet;

/// High bit distinguishes V-side nodes in the adjacency key space
const V_FLAG: u32 = 1 << 31;

/// Largest edge set the finder will attempt; beyond this trimming has not
/// converged and a search would be pointless
const MAX_SEARCH_EDGES: usize = 100_000;

/// Graph structure for cycle detection
pub struct CycleGraph {
    /// Adjacency list: node key -> (neighbor key, edge index)
    adjacency: HashMap<u32, Vec<(u32, u32)>>,
    proof_size: usize,
    edge_count: usize,
    stats: SearchStats,
}

/// Search state for DFS cycle detection
struct SearchState {
    path_edges: Vec<u32>,
    visited: HashSet<u32>,
    proofs: Vec<Vec<u32>>,
    seen: HashSet<Vec<u32>>,
    cycles_explored: u32,
    max_depth: usize,
    max_solutions: usize,
}

impl CycleGraph {
    /// Build the adjacency map from a recovered edge set
    pub fn from_edge_set(edge_set: &EdgeSet, proof_size: usize) -> Self {
        let mut adjacency: HashMap<u32, Vec<(u32, u32)>> =
            HashMap::with_capacity(edge_set.len() * 2);

        for record in &edge_set.edges {
            let u_key = record.u;
            let v_key = record.v | V_FLAG;
            adjacency.entry(u_key).or_default().push((v_key, record.index));
            adjacency.entry(v_key).or_default().push((u_key, record.index));
        }

        let stats = SearchStats {
            edges_processed: edge_set.len(),
            nodes_count: adjacency.len(),
            ..SearchStats::default()
        };

        Self {
            adjacency,
            proof_size,
            edge_count: edge_set.len(),
            stats,
        }
    }

    /// Search for simple cycles of exactly `proof_size` edges
    ///
    /// Returns up to `max_solutions` proofs, each an ascending sequence of
    /// original edge indices. Finding none is the normal outcome.
    pub fn find_cycles(&mut self, max_solutions: usize) -> Vec<Vec<u32>> {
        let start_time = Instant::now();

        if self.edge_count < self.proof_size {
            tracing::debug!(
                "Not enough edges for a {}-cycle: {}",
                self.proof_size,
                self.edge_count
            );
            return Vec::new();
        }
        if self.edge_count > MAX_SEARCH_EDGES {
            tracing::warn!(
                "Skipping cycle search on unconverged set of {} edges",
                self.edge_count
            );
            return Vec::new();
        }

        let mut state = SearchState {
            path_edges: Vec::with_capacity(self.proof_size),
            visited: HashSet::with_capacity(self.proof_size * 2),
            proofs: Vec::new(),
            seen: HashSet::new(),
            cycles_explored: 0,
            max_depth: 0,
            max_solutions,
        };

        // Every cycle passes through a U-side node, so U starts see them all
        let mut starts: Vec<u32> = self
            .adjacency
            .keys()
            .copied()
            .filter(|key| key & V_FLAG == 0)
            .collect();
        starts.sort_unstable();

        for start in starts {
            if state.proofs.len() >= max_solutions {
                break;
            }
            state.visited.insert(start);
            self.dfs_cycle_search(start, start, &mut state);
            state.visited.remove(&start);
        }

        self.stats.search_time_ms = start_time.elapsed().as_millis() as u64;
        self.stats.cycles_explored = state.cycles_explored;
        self.stats.cycles_found = state.proofs.len() as u32;
        self.stats.max_depth_reached = state.max_depth;

        if !state.proofs.is_empty() {
            tracing::info!(
                "Found {} {}-cycle(s) in {}ms",
                state.proofs.len(),
                self.proof_size,
                self.stats.search_time_ms
            );
        }

        state.proofs
    }

    /// Depth-first search for cycles closing back at `start`
    ///
    /// Branches freely at nodes of residual degree above two; path edges
    /// are tracked by index so parallel edges stay distinguishable.
    fn dfs_cycle_search(&self, current: u32, start: u32, state: &mut SearchState) {
        if state.proofs.len() >= state.max_solutions {
            return;
        }
        let depth = state.path_edges.len();
        state.max_depth = state.max_depth.max(depth);

        let neighbors = match self.adjacency.get(&current) {
            Some(adj) => adj,
            None => return,
        };

        for &(neighbor, edge) in neighbors {
            if state.path_edges.contains(&edge) {
                continue;
            }

            if neighbor == start && depth + 1 == self.proof_size {
                state.cycles_explored += 1;

                let mut proof = state.path_edges.clone();
                proof.push(edge);
                proof.sort_unstable();
                if state.seen.insert(proof.clone()) {
                    state.proofs.push(proof);
                    if state.proofs.len() >= state.max_solutions {
                        return;
                    }
                }
                continue;
            }

            if depth + 1 < self.proof_size && !state.visited.contains(&neighbor) {
                state.visited.insert(neighbor);
                state.path_edges.push(edge);
                self.dfs_cycle_search(neighbor, start, state);
                state.path_edges.pop();
                state.visited.remove(&neighbor);
            }
        }
    }

    /// Get search statistics
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }
}

/// Search the recovered edge set for proof cycles
///
/// Main entry point after trimming and recovery; combines graph
/// construction and cycle search.
pub fn search_cycles(
    edge_set: &EdgeSet,
    proof_size: usize,
    max_solutions: usize,
) -> (Vec<Vec<u32>>, SearchStats) {
    if edge_set.is_empty() {
        tracing::debug!("No edges to search, trimming removed everything");
        return (Vec::new(), SearchStats::default());
    }

    let mut graph = CycleGraph::from_edge_set(edge_set, proof_size);
    let proofs = graph.find_cycles(max_solutions);
    (proofs, graph.stats().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::EdgeRecord;

    fn edge_set(edges: &[(u32, u32, u32)]) -> EdgeSet {
        EdgeSet {
            edges: edges
                .iter()
                .map(|&(index, u, v)| EdgeRecord { index, u, v })
                .collect(),
        }
    }

    // u1 -e0- v10 -e1- u2 -e2- v20 -e3- u3 -e4- v30 -e5- u1
    fn six_cycle() -> Vec<(u32, u32, u32)> {
        vec![
            (0, 1, 10),
            (1, 2, 10),
            (2, 2, 20),
            (3, 3, 20),
            (4, 3, 30),
            (5, 1, 30),
        ]
    }

    #[test]
    fn test_finds_six_cycle() {
        let set = edge_set(&six_cycle());
        let (proofs, stats) = search_cycles(&set, 6, 10);
        assert_eq!(proofs, vec![vec![0, 1, 2, 3, 4, 5]]);
        assert_eq!(stats.cycles_found, 1);
    }

    #[test]
    fn test_proof_is_ascending() {
        let set = edge_set(&[
            (9, 1, 10),
            (3, 2, 10),
            (7, 2, 20),
            (1, 3, 20),
            (8, 3, 30),
            (2, 1, 30),
        ]);
        let (proofs, _) = search_cycles(&set, 6, 10);
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0], vec![1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn test_wrong_length_is_no_solution() {
        // Only a 4-cycle exists; searching for 6 finds nothing
        let set = edge_set(&[(0, 1, 10), (1, 2, 10), (2, 2, 20), (3, 1, 20)]);
        let (proofs, _) = search_cycles(&set, 6, 10);
        assert!(proofs.is_empty());
    }

    #[test]
    fn test_branching_at_high_degree_nodes() {
        // The 6-cycle plus a chord, so two nodes have residual degree 3
        let mut edges = six_cycle();
        edges.push((6, 1, 20));
        let set = edge_set(&edges);

        let (proofs, _) = search_cycles(&set, 6, 10);
        // The chord only closes 4-cycles; the 6-cycle must still be found
        assert_eq!(proofs, vec![vec![0, 1, 2, 3, 4, 5]]);
    }

    #[test]
    fn test_cycle_reported_once() {
        let set = edge_set(&six_cycle());
        let mut graph = CycleGraph::from_edge_set(&set, 6);
        let proofs = graph.find_cycles(10);
        // Reachable from every U node in both directions, reported once
        assert_eq!(proofs.len(), 1);
        assert!(graph.stats().cycles_explored >= 1);
    }

    #[test]
    fn test_max_solutions_caps_output() {
        // Two disjoint 6-cycles
        let mut edges = six_cycle();
        edges.extend_from_slice(&[
            (10, 101, 110),
            (11, 102, 110),
            (12, 102, 120),
            (13, 103, 120),
            (14, 103, 130),
            (15, 101, 130),
        ]);
        let set = edge_set(&edges);

        let (capped, _) = search_cycles(&set, 6, 1);
        assert_eq!(capped.len(), 1);

        let (all, _) = search_cycles(&set, 6, 10);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_empty_edge_set() {
        let (proofs, stats) = search_cycles(&EdgeSet::default(), 6, 10);
        assert!(proofs.is_empty());
        assert_eq!(stats.cycles_found, 0);
    }

    #[test]
    fn test_dangling_edges_ignored() {
        let mut edges = six_cycle();
        edges.push((7, 5, 40));
        edges.push((8, 6, 40));
        let set = edge_set(&edges);

        let (proofs, _) = search_cycles(&set, 6, 10);
        assert_eq!(proofs, vec![vec![0, 1, 2, 3, 4, 5]]);
    }
}

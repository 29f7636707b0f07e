// src/recovery.rs - Surviving edge materialization for cycle search

//! Recovery and compaction.
//!
//! The trimmer hands back a dense array of surviving edge indices. Before
//! cycle search, both endpoints of every survivor are recomputed from the
//! oracle rather than trusted from the trimming buffers, so a proof always
//! reports original edge indices tied to oracle-derived endpoints.

use crate::config::GraphGeometry;
use crate::oracle::{Side, SipKeys};

/// One recovered edge: original index plus oracle-derived endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Original edge index in the generated graph
    pub index: u32,
    /// Endpoint on the U side
    pub u: u32,
    /// Endpoint on the V side
    pub v: u32,
}

/// The reduced working set the cycle finder traverses sequentially
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    /// Recovered edges, in compaction order
    pub edges: Vec<EdgeRecord>,
}

impl EdgeSet {
    /// Number of edges in the set
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when trimming left nothing behind
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Recompute endpoints for every surviving edge index
pub fn recover(keys: &SipKeys, indices: &[u32], geometry: &GraphGeometry) -> EdgeSet {
    let edges = indices
        .iter()
        .map(|&index| EdgeRecord {
            index,
            u: keys.node(index, Side::U, geometry.node_mask),
            v: keys.node(index, Side::V, geometry.node_mask),
        })
        .collect();
    EdgeSet { edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_recovered_endpoints_match_oracle() {
        let settings = Settings::test_scale();
        let geometry = GraphGeometry::from_settings(&settings).unwrap();
        let keys = SipKeys::derive(&[0x21u8; 32], 5);

        let indices = [0u32, 17, 511, 1023];
        let set = recover(&keys, &indices, &geometry);
        assert_eq!(set.len(), 4);

        for record in &set.edges {
            assert_eq!(record.u, keys.node(record.index, Side::U, geometry.node_mask));
            assert_eq!(record.v, keys.node(record.index, Side::V, geometry.node_mask));
            assert!(record.u <= geometry.node_mask);
            assert!(record.v <= geometry.node_mask);
        }
    }

    #[test]
    fn test_empty_set() {
        let settings = Settings::test_scale();
        let geometry = GraphGeometry::from_settings(&settings).unwrap();
        let keys = SipKeys::derive(&[0u8; 32], 0);

        let set = recover(&keys, &[], &geometry);
        assert!(set.is_empty());
    }
}

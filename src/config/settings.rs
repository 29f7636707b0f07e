// src/config/settings.rs - Solver settings with production-scale defaults

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Main configuration settings for the solver
pub struct Settings {
    /// Graph size exponent: the graph has 2^edge_bits edges
    pub edge_bits: u32,
    /// Required cycle length for a valid proof
    pub proof_size: usize,
    /// Number of alternating-side trimming rounds
    pub trim_rounds: u32,
    /// Slack numerator for generation-stage bucket capacity
    pub coarse_slack_num: u32,
    /// Slack denominator for generation-stage bucket capacity
    pub coarse_slack_den: u32,
    /// Slack numerator for post-round survivor bucket capacity
    pub fine_slack_num: u32,
    /// Slack denominator for post-round survivor bucket capacity
    pub fine_slack_den: u32,
    /// Stop after this many solutions in a nonce range
    pub max_solutions: usize,
    /// Worker threads for the trimming pool (0 = all cores)
    pub worker_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            edge_bits: 29, // Production graph: 2^29 edges, ~536M
            proof_size: 42,
            trim_rounds: 176,
            coarse_slack_num: 133, // ~1.039x expected bucket load
            coarse_slack_den: 128,
            fine_slack_num: 85, // ~0.664x, survivors shrink fast after round 1
            fine_slack_den: 128,
            max_solutions: 10,
            worker_threads: 0,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Small test-scale settings used throughout the test suite
    #[cfg(test)]
    pub(crate) fn test_scale() -> Self {
        Self {
            edge_bits: 10,
            proof_size: 6,
            trim_rounds: 40,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.edge_bits, 29);
        assert_eq!(settings.proof_size, 42);
        assert_eq!(settings.trim_rounds, 176);
        assert_eq!(settings.max_solutions, 10);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::test_scale();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edge_bits, 10);
        assert_eq!(back.proof_size, 6);
        assert_eq!(back.coarse_slack_num, 133);
    }
}

// src/lib.rs - Crate root, error taxonomy and logging setup

//! Cuckoo Cycle proof-of-work engine.
//!
//! A CPU solver and independent verifier for the Cuckoo Cycle puzzle:
//! find a cycle of a fixed length in a pseudorandom bipartite graph keyed
//! by (header, nonce), then meet a difficulty target with a hash over the
//! proof. Solving goes through bucketed lock-free edge trimming down to
//! the graph's 2-core followed by a depth-first cycle search; verifying a
//! claimed proof needs only the oracle and is reachable without ever
//! allocating a solver.

#![warn(missing_docs)]
// Lock-free scatter into preallocated buckets needs raw slot writes
#![allow(unsafe_code)]

pub mod config;
pub mod cycle;
/// Performance counters for trimming, search and solve attempts
pub mod metrics;
/// Keyed SipHash node oracle defining the graph
pub mod oracle;
pub mod recovery;
pub mod solver;
pub mod trimmer;
/// Trimming-free proof verification
pub mod verifier;

// Re-export main types for convenience
pub use config::{GraphGeometry, Settings};
pub use solver::{Solution, SolveOutput, Solver};
pub use verifier::{verify, RejectReason, Verification};

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum CuckooError {
    /// Allocation or worker-pool failure; fatal for the attempt
    #[error("Resource error: {0}")]
    Resource(String),

    /// Invalid settings or malformed input
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO operation errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hex decode errors
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CuckooError>;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize logging for binary entry points
///
/// Installs the global tracing subscriber with `RUST_LOG` filtering.
/// Separate from the solver lifecycle; library users bring their own
/// subscriber and never call this.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("{} v{} - {}", NAME, VERSION, DESCRIPTION);

    Ok(())
}

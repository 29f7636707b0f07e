// src/config/mod.rs - Configuration module exports

//! Solver configuration and graph geometry.
//!
//! `Settings` holds the user-facing tuning knobs (serde round-trippable,
//! JSON on disk); `GraphGeometry` is the validated, derived shape of the
//! edge/node space that the trimmer and verifier actually work with.

pub mod geometry;
pub mod settings;

pub use geometry::GraphGeometry;
pub use settings::Settings;

//! Test module for determinism and integration tests.
//!
//! These tests drive the whole tick loop through [`Simulation`]:
//! - **Determinism tests**: the same seed produces identical results
//! - **Integration tests**: end-to-end fights, casts and lifecycles
//! - **Helper functions**: utilities for test setup
//!
//! # Test Structure
//!
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `integration.rs`: End-to-end tests of the simulation
//! - `helpers.rs`: Test setup utilities and factory functions
//!
//! [`Simulation`]: crate::simulation::Simulation

mod helpers;

// Re-export for convenience
pub use helpers::*;

//! LFP-Simulation: synthetic LFP generation
//!
//! Deterministic multi-channel LFP recordings and matching anatomical
//! annotations for tests, demos, and development.

pub mod lfp_simulator;
pub mod signal_patterns;

pub use lfp_simulator::*;
pub use signal_patterns::*;

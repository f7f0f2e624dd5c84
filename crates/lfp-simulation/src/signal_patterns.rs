//! Signal patterns for LFP simulation

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Deterministic component of a simulated LFP trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LfpPattern {
    /// Constant level (useful for shape-only tests)
    Flat {
        level: f32,
    },
    /// Single oscillation at a fixed frequency
    Oscillation {
        frequency: f32,
        amplitude: f32,
    },
    /// Theta rhythm plus a weaker gamma component riding on slow drift,
    /// roughly the texture of hippocampal LFP
    Realistic {
        theta_amplitude: f32,
        gamma_amplitude: f32,
        drift_amplitude: f32,
    },
}

impl LfpPattern {
    /// Pattern value at time `t` seconds
    pub fn value_at(&self, t: f32) -> f32 {
        match *self {
            LfpPattern::Flat { level } => level,
            LfpPattern::Oscillation { frequency, amplitude } => {
                amplitude * (TAU * frequency * t).sin()
            }
            LfpPattern::Realistic {
                theta_amplitude,
                gamma_amplitude,
                drift_amplitude,
            } => {
                let theta = theta_amplitude * (TAU * 7.0 * t).sin();
                let gamma = gamma_amplitude * (TAU * 55.0 * t).sin();
                let drift = drift_amplitude * (TAU * 0.05 * t).sin();
                theta + gamma + drift
            }
        }
    }
}

impl Default for LfpPattern {
    fn default() -> Self {
        LfpPattern::Realistic {
            theta_amplitude: 0.3,
            gamma_amplitude: 0.08,
            drift_amplitude: 0.15,
        }
    }
}

//! Sleep readiness scoring.
//!
//! The score is a pure function of the current warning and
//! environment flags -- it is always recomputed from scratch, never
//! incremented, so recalculating twice with unchanged flags yields an
//! identical result.

use serde::{Deserialize, Serialize};

const BASE_SCORE: i32 = 100;
const PHASE1_PENALTY: i32 = 20;
const PHASE2_PENALTY: i32 = 40;
const LIGHT_PENALTY: i32 = 10;
const NOISE_PENALTY: i32 = 10;

/// Readiness score breakdown, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepScore {
    pub total: u8,
    pub usage_penalty: u8,
    pub environment_penalty: u8,
    pub phase1_warning: bool,
    pub phase2_warning: bool,
    pub light_exceeded: bool,
    pub noise_exceeded: bool,
}

impl Default for SleepScore {
    fn default() -> Self {
        Self::compute(false, false, false, false)
    }
}

impl SleepScore {
    /// Recompute the full breakdown from the current flags.
    pub fn compute(
        phase1_warning: bool,
        phase2_warning: bool,
        light_exceeded: bool,
        noise_exceeded: bool,
    ) -> Self {
        let mut usage_penalty = 0;
        if phase1_warning {
            usage_penalty += PHASE1_PENALTY;
        }
        if phase2_warning {
            usage_penalty += PHASE2_PENALTY;
        }

        let mut environment_penalty = 0;
        if light_exceeded {
            environment_penalty += LIGHT_PENALTY;
        }
        if noise_exceeded {
            environment_penalty += NOISE_PENALTY;
        }

        let total = (BASE_SCORE - usage_penalty - environment_penalty).clamp(0, 100);

        Self {
            total: total as u8,
            usage_penalty: usage_penalty as u8,
            environment_penalty: environment_penalty as u8,
            phase1_warning,
            phase2_warning,
            light_exceeded,
            noise_exceeded,
        }
    }
}

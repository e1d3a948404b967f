//! Time/skill score model
//!
//! The score is a step-quantized function of elapsed time and destroyed cells.
//! Once a session ends the value is frozen and can no longer change.

use serde::{Deserialize, Serialize};

use crate::consts::{PIXEL_WEIGHT_MILLI, SCORE_STEP, TIME_WEIGHT_MILLI};

/// `floor((elapsed_ms * 0.05 + destroyed * 0.1) / 10) * 10`
///
/// Computed in thousandths of a point so the floor is exact.
pub fn compute_score(elapsed_ms: u64, destroyed_count: u32) -> u64 {
    let raw_milli = elapsed_ms
        .saturating_mul(TIME_WEIGHT_MILLI)
        .saturating_add(u64::from(destroyed_count) * PIXEL_WEIGHT_MILLI);
    let step_milli = SCORE_STEP * 1000;
    (raw_milli / step_milli) * SCORE_STEP
}

/// Score of a session: advancing while playing, frozen after a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    Live(u64),
    Frozen(u64),
}

impl Default for Score {
    fn default() -> Self {
        Score::Live(0)
    }
}

impl Score {
    pub fn value(&self) -> u64 {
        match *self {
            Score::Live(v) | Score::Frozen(v) => v,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Score::Frozen(_))
    }

    /// Recompute a live score; frozen scores ignore the update
    pub fn update(&mut self, elapsed_ms: u64, destroyed_count: u32) {
        if let Score::Live(v) = self {
            *v = compute_score(elapsed_ms, destroyed_count);
        }
    }

    /// Latch the current value; returns it
    pub fn freeze(&mut self) -> u64 {
        let v = self.value();
        *self = Score::Frozen(v);
        v
    }
}

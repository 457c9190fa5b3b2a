//! Score-to-position feedback loop
//!
//! Converts the live score differential into smoothed lane-relative offsets
//! for the two racers. Recomputed from the current gap every tick, so the
//! offsets always converge toward the target even when it moves
//! mid-transition. Purely cosmetic - never feeds back into scoring.

use serde::{Deserialize, Serialize};

use crate::approach;
use crate::consts::*;

/// Smoothed forward offsets for the player and rival cars
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RaceOffsets {
    pub player_z: f32,
    pub ai_z: f32,
}

impl RaceOffsets {
    /// Advance both offsets toward the targets implied by the score gap
    pub fn update(&mut self, player_score: u32, ai_score: u32, dt: f32) {
        let diff = player_score as f32 - ai_score as f32;
        let normalized = (diff / OFFSET_FULL_DIFF).clamp(-1.0, 1.0);
        let player_target = normalized * OFFSET_MAX;
        let ai_target = -normalized * OFFSET_MAX;
        self.player_z = approach(self.player_z, player_target, OFFSET_RATE, dt);
        self.ai_z = approach(self.ai_z, ai_target, OFFSET_RATE, dt);
    }
}

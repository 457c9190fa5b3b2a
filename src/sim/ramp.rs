//! Difficulty ramp
//!
//! Every value here is a pure function of racing elapsed time, recomputed each
//! tick - never incremental state. Resetting the race resets the elapsed-time
//! origin, not the ramp values themselves.

use crate::consts::*;

/// Ramp progression, 0 at the Go signal, 1 at `RAMP_FULL_SECS` and beyond
#[inline]
pub fn progression(elapsed: f32) -> f32 {
    (elapsed / RAMP_FULL_SECS).clamp(0.0, 1.0)
}

/// Note travel speed in units/s: 35 at start, 60 once the ramp saturates
#[inline]
pub fn note_speed(elapsed: f32) -> f32 {
    NOTE_SPEED_BASE + progression(elapsed) * NOTE_SPEED_GAIN
}

/// Seconds between spawn checks: 0.8 at start, floors at 0.5
#[inline]
pub fn spawn_interval(elapsed: f32) -> f32 {
    SPAWN_INTERVAL_BASE - progression(elapsed) * SPAWN_INTERVAL_DROP
}

/// Visual road speed, caps at 10 after 7 s. Cosmetic only.
#[inline]
pub fn scroll_speed(elapsed: f32) -> f32 {
    (elapsed / SCROLL_RAMP_SECS).clamp(0.0, 1.0) * SCROLL_SPEED_MAX
}

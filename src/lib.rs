//! Beat Racer - a four-lane rhythm-racing game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (notes, scoring, race state machine)
//! - `commentary`: Trigger scheduling for the external commentary service
//! - `audio`: Web Audio procedural sound effects (wasm only)
//! - `settings`: Player preferences
//! - `highscores`: Local leaderboard

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod commentary;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Number of input lanes
    pub const LANE_COUNT: usize = 4;

    /// Race length in seconds
    pub const RACE_DURATION_SECS: i32 = 119;
    /// Spawning stops for the final seconds so the track clears before the finish
    pub const ENDGAME_PAUSE_SECS: i32 = 3;
    /// Scripted mid-race breather: no spawns while time_left is in (58, 61]
    pub const MID_PAUSE_LOW: i32 = 58;
    pub const MID_PAUSE_HIGH: i32 = 61;
    /// Double spawns become possible once time_left drops to this value
    pub const DOUBLE_SPAWN_BELOW: i32 = 79;
    /// Chance of spawning two notes at once (once past the threshold)
    pub const DOUBLE_SPAWN_CHANCE: f64 = 0.20;
    /// Chance the rival "hits" a note, decided at spawn
    pub const AI_HIT_CHANCE: f64 = 0.70;

    /// Distance a note travels from spawn to the hit line
    pub const HIT_LINE: f32 = 40.0;
    /// Tolerance around the hit line within which a press counts
    pub const HIT_WINDOW: f32 = 0.8;

    /// Score awarded for a hit (player and rival alike)
    pub const HIT_SCORE: u32 = 10;
    /// Penalty for letting a note slip past, clamped at zero
    pub const MISS_PENALTY: u32 = 5;

    /// Note speed ramp: 35 units/s at race start, 60 after 80 s
    pub const NOTE_SPEED_BASE: f32 = 35.0;
    pub const NOTE_SPEED_GAIN: f32 = 25.0;
    /// Spawn interval ramp: 0.8 s at race start, 0.5 after 80 s
    pub const SPAWN_INTERVAL_BASE: f32 = 0.8;
    pub const SPAWN_INTERVAL_DROP: f32 = 0.3;
    /// Elapsed seconds at which the difficulty ramp saturates
    pub const RAMP_FULL_SECS: f32 = 80.0;
    /// Visual road speed caps at 10 after 7 s
    pub const SCROLL_SPEED_MAX: f32 = 10.0;
    pub const SCROLL_RAMP_SECS: f32 = 7.0;

    /// Score differential that maps to the full lane offset
    pub const OFFSET_FULL_DIFF: f32 = 200.0;
    /// Maximum lane-relative offset for either racer
    pub const OFFSET_MAX: f32 = 1.2;
    /// Exponential approach rate for position smoothing (per second)
    pub const OFFSET_RATE: f32 = 3.0;

    /// Loading screen lingers at least this long after assets are ready
    pub const LOADING_MIN_SECS: f32 = 2.0;
    /// First countdown step fires this long after entering Countdown
    pub const COUNTDOWN_LEAD_SECS: f32 = 3.0;
    /// Grace period between the timer hitting zero and the finish
    pub const FINISH_GRACE_SECS: f32 = 3.0;

    /// Track-space distance between adjacent lane centers
    pub const LANE_SPACING: f32 = 2.0;
    /// Particle pool cap
    pub const MAX_PARTICLES: usize = 256;
}

/// Exponential approach: move `current` toward `target` at `rate` per second.
///
/// Converges from any starting value and keeps converging if the target moves
/// mid-transition.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (rate * dt).min(1.0)
}

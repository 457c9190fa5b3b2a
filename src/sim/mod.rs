//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Driven only by `tick`/`second_tick`, never by wall-clock timers
//! - Seeded RNG only, reseeded per race generation
//! - No rendering or platform dependencies

pub mod notes;
pub mod position;
pub mod ramp;
pub mod schedule;
pub mod state;
pub mod tick;

pub use notes::spawning_allowed;
pub use position::RaceOffsets;
pub use ramp::{note_speed, progression, scroll_speed, spawn_interval};
pub use schedule::{ScheduledAction, Scheduler};
pub use state::{
    EffectKind, GameEvent, Note, Particle, RaceOutcome, RacePhase, RaceState, Snapshot,
};
pub use tick::{second_tick, tick};

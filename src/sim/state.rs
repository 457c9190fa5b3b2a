//! Race state and core simulation types
//!
//! The whole race lives in one `RaceState` owned by the caller; the visual
//! layer only ever reads `Snapshot`s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::schedule::{ScheduledAction, Scheduler};
use crate::consts::*;

/// Current phase of the race lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Title screen, waiting for a start request
    Menu,
    /// Assets/news loading; lingers at least 2 s after readiness
    Loading,
    /// 3-2-1-Go sequence scheduled, timers not yet running
    Countdown,
    /// Timers running, notes spawning
    Racing,
    /// Outcome decided, waiting for replay or exit
    Finished,
}

/// Final outcome by score comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceOutcome {
    Win,
    Lose,
    Draw,
}

/// Sound effect kinds the collaborating audio layer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Hit,
    Miss,
    Horn,
    Win,
    Lose,
    Draw,
}

/// A lane note travelling toward the hit line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    /// Lane index, 0..4
    pub lane: usize,
    /// Distance travelled from spawn; the hit line sits at `HIT_LINE`
    pub position: f32,
    /// Decided once at spawn: will the rival score this note?
    pub will_ai_hit: bool,
    /// Flips false -> true at most once; guards duplicate rival credit
    pub ai_processed: bool,
}

/// A cosmetic hit-burst particle (no gameplay effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Lane identity for color lookup
    pub lane: usize,
    /// 0-1, decreases over time
    pub life: f32,
}

/// Fire-and-forget notifications drained by the caller each frame.
///
/// Collaborators (audio, commentary, asset loading) react to these; none of
/// them may stall the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayEffect(EffectKind),
    NoteHit { lane: usize },
    NoteMissed { lane: usize },
    RivalHit { lane: usize },
    /// 3, 2, 1, then 0 for "Go"
    CountdownStep(u8),
    RaceStarted,
    RaceFinished(RaceOutcome),
    /// Ask the outer layer to preload assets/audio, then call `notify_loading_ready`
    PreloadRequested,
    /// Ask the outer layer to fetch a headline for the loading screen
    HeadlineRequested,
}

/// Read-only per-tick view for the visual layer
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub player_score: u32,
    pub ai_score: u32,
    pub time_left: i32,
    pub notes: Vec<Note>,
    pub particles: Vec<Particle>,
    pub player_z: f32,
    pub ai_z: f32,
    pub scroll_speed: f32,
    pub is_racing: bool,
    pub phase: RacePhase,
    pub result: Option<RaceOutcome>,
    pub line_hues: [f32; LANE_COUNT],
}

/// Complete race simulation state
#[derive(Debug, Clone)]
pub struct RaceState {
    /// Base seed; the per-race generator reseeds from this + `race_id`
    pub seed: u64,
    /// Generation counter; increments on every reset and invalidates
    /// scheduled actions and stale async responses
    pub race_id: u32,
    pub phase: RacePhase,
    pub player_name: String,

    pub player_score: u32,
    pub ai_score: u32,
    /// Seconds remaining, counts down from `RACE_DURATION_SECS`, stops at 0
    pub time_left: i32,
    pub result: Option<RaceOutcome>,

    /// Monotonic sim clock in seconds; survives resets so stale scheduler
    /// entries can only be rejected, never accidentally re-armed
    pub clock: f64,
    /// Clock value when RACING began; ramp time base
    pub race_start: f64,
    /// Clock value when the loading collaborators reported ready
    pub ready_at: Option<f64>,
    /// Race-elapsed time of the most recent spawn
    pub last_spawn: f32,

    pub notes: Vec<Note>,
    pub particles: Vec<Particle>,
    next_note_id: u32,

    /// Latched key state per lane
    pub lanes_pressed: [bool; LANE_COUNT],
    pub offsets: super::position::RaceOffsets,
    /// Per-race cosmetic lane line hues, reseeded with the generation
    pub line_hues: [f32; LANE_COUNT],

    /// Probability the rival scores a note; overridable for deterministic tests
    pub ai_hit_chance: f64,

    pub(crate) rng: Pcg32,
    pub(crate) scheduler: Scheduler,
    pub(crate) events: Vec<GameEvent>,
}

impl RaceState {
    /// Create a fresh state in the menu phase
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let line_hues = std::array::from_fn(|_| rng.random_range(0.0..360.0));
        Self {
            seed,
            race_id: 0,
            phase: RacePhase::Menu,
            player_name: String::new(),
            player_score: 0,
            ai_score: 0,
            time_left: RACE_DURATION_SECS,
            result: None,
            clock: 0.0,
            race_start: 0.0,
            ready_at: None,
            last_spawn: 0.0,
            notes: Vec::new(),
            particles: Vec::new(),
            next_note_id: 1,
            lanes_pressed: [false; LANE_COUNT],
            offsets: super::position::RaceOffsets::default(),
            line_hues,
            ai_hit_chance: AI_HIT_CHANCE,
            rng,
            scheduler: Scheduler::new(),
            events: Vec::new(),
        }
    }

    /// Allocate a note id
    pub(crate) fn next_note_id(&mut self) -> u32 {
        let id = self.next_note_id;
        self.next_note_id += 1;
        id
    }

    /// Seconds of racing elapsed since the Go signal (0 outside RACING/FINISHED)
    pub fn race_elapsed(&self) -> f32 {
        if matches!(self.phase, RacePhase::Racing | RacePhase::Finished) {
            (self.clock - self.race_start) as f32
        } else {
            0.0
        }
    }

    pub fn is_racing(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    /// Request a race start. Rejected outside the menu or with a blank name.
    pub fn start_race(&mut self, player_name: &str) -> bool {
        let name = player_name.trim();
        if self.phase != RacePhase::Menu {
            return false;
        }
        if name.is_empty() {
            log::warn!("start_race rejected: empty player name");
            return false;
        }
        self.player_name = name.to_string();
        self.phase = RacePhase::Loading;
        self.ready_at = None;
        self.events.push(GameEvent::PreloadRequested);
        self.events.push(GameEvent::HeadlineRequested);
        log::info!("Race requested by {name}, loading");
        true
    }

    /// Collaborator signal: assets/audio/news are ready. The loading screen
    /// still lingers `LOADING_MIN_SECS` before the countdown begins.
    pub fn notify_loading_ready(&mut self) {
        if self.phase == RacePhase::Loading && self.ready_at.is_none() {
            self.ready_at = Some(self.clock);
        }
    }

    /// Player input event. Lanes outside 0..4 are ignored.
    pub fn set_lane_input(&mut self, lane: usize, pressed: bool) {
        if lane < LANE_COUNT {
            self.lanes_pressed[lane] = pressed;
        }
    }

    /// Shared reset routine: new generation, reseeded RNG, cleared race state.
    /// Scheduled actions from the previous generation die by tag check.
    pub(crate) fn reset_race_state(&mut self) {
        self.race_id += 1;
        self.rng = Pcg32::seed_from_u64(self.seed.wrapping_add(self.race_id as u64));
        self.player_score = 0;
        self.ai_score = 0;
        self.time_left = RACE_DURATION_SECS;
        self.result = None;
        self.race_start = 0.0;
        self.last_spawn = 0.0;
        self.notes.clear();
        self.particles.clear();
        self.lanes_pressed = [false; LANE_COUNT];
        self.offsets = super::position::RaceOffsets::default();
        self.line_hues = std::array::from_fn(|_| self.rng.random_range(0.0..360.0));
        log::info!("Race state reset, generation {}", self.race_id);
    }

    /// Full reset back to the menu
    pub fn reset(&mut self) {
        self.reset_race_state();
        self.phase = RacePhase::Menu;
    }

    /// Enter the countdown. No-op while a countdown is already in progress or
    /// mid-race; reachable from Loading and (via replay) Finished.
    pub(crate) fn begin_countdown(&mut self) {
        if !matches!(self.phase, RacePhase::Loading | RacePhase::Finished) {
            return;
        }
        self.reset_race_state();
        self.phase = RacePhase::Countdown;
        for (i, step) in [3u8, 2, 1, 0].into_iter().enumerate() {
            self.scheduler.schedule(
                self.clock + COUNTDOWN_LEAD_SECS as f64 + i as f64,
                self.race_id,
                ScheduledAction::CountdownStep(step),
            );
        }
        log::info!("Countdown scheduled for generation {}", self.race_id);
    }

    /// Race again from the results screen
    pub fn replay(&mut self) {
        if self.phase == RacePhase::Finished {
            self.begin_countdown();
        }
    }

    /// Back to the menu from the results screen
    pub fn exit_to_menu(&mut self) {
        if self.phase == RacePhase::Finished {
            self.reset();
        }
    }

    /// Final outcome by score comparison
    pub(crate) fn outcome(&self) -> RaceOutcome {
        use std::cmp::Ordering::*;
        match self.player_score.cmp(&self.ai_score) {
            Greater => RaceOutcome::Win,
            Less => RaceOutcome::Lose,
            Equal => RaceOutcome::Draw,
        }
    }

    /// Read-only view for the visual layer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            player_score: self.player_score,
            ai_score: self.ai_score,
            time_left: self.time_left,
            notes: self.notes.clone(),
            particles: self.particles.clone(),
            player_z: self.offsets.player_z,
            ai_z: self.offsets.ai_z,
            scroll_speed: super::ramp::scroll_speed(self.race_elapsed()),
            is_racing: self.is_racing(),
            phase: self.phase,
            result: self.result,
            line_hues: self.line_hues,
        }
    }

    /// Take the pending fire-and-forget notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

//! Per-frame and per-second simulation drivers
//!
//! Two pull-based tick surfaces: `tick` advances the continuous state (notes,
//! particles, position smoothing, scheduled actions) and `second_tick`
//! advances the coarse one-second timer (countdown, finish scheduling). The
//! caller owns the cadence; nothing in here touches wall-clock timers.

use super::notes;
use super::schedule::ScheduledAction;
use super::state::{EffectKind, GameEvent, RaceOutcome, RacePhase, RaceState};
use crate::consts::*;

/// Advance all per-frame state by one frame of `dt` seconds
pub fn tick(state: &mut RaceState, dt: f32) {
    // A stalled tab can hand us a huge delta; clamp like any fixed-ish loop
    let dt = dt.clamp(0.0, 0.1);
    state.clock += dt as f64;

    for action in state.scheduler.take_due(state.clock, state.race_id) {
        apply_action(state, action);
    }

    match state.phase {
        RacePhase::Menu => {}

        RacePhase::Loading => {
            // Linger a moment after readiness, then roll the countdown
            if let Some(ready_at) = state.ready_at
                && state.clock - ready_at >= LOADING_MIN_SECS as f64
            {
                state.begin_countdown();
            }
        }

        RacePhase::Countdown => {
            notes::update_particles(state, dt);
        }

        RacePhase::Racing => {
            notes::try_spawn(state);
            // Advance-and-rival-scoring and collision resolution run as one
            // consistent pass; no torn reads of ai_processed
            notes::advance_notes(state, dt);
            notes::resolve_lanes(state);
            notes::update_particles(state, dt);
            state
                .offsets
                .update(state.player_score, state.ai_score, dt);
        }

        RacePhase::Finished => {
            notes::update_particles(state, dt);
            state
                .offsets
                .update(state.player_score, state.ai_score, dt);
        }
    }
}

/// Advance the one-second timer state by one unit
pub fn second_tick(state: &mut RaceState) {
    if state.phase != RacePhase::Racing || state.time_left <= 0 {
        return;
    }
    state.time_left -= 1;
    if state.time_left == 0 {
        // Finish line reached; give a grace window for final note resolution
        state.scheduler.schedule(
            state.clock + FINISH_GRACE_SECS as f64,
            state.race_id,
            ScheduledAction::FinishRace,
        );
        log::info!("Timer hit zero, finish in {FINISH_GRACE_SECS}s");
    }
}

fn apply_action(state: &mut RaceState, action: ScheduledAction) {
    match action {
        ScheduledAction::CountdownStep(step) => {
            if state.phase != RacePhase::Countdown {
                return;
            }
            state.events.push(GameEvent::CountdownStep(step));
            if step == 0 {
                // Go
                state.phase = RacePhase::Racing;
                state.race_start = state.clock;
                state.last_spawn = 0.0;
                state.events.push(GameEvent::RaceStarted);
                state.events.push(GameEvent::PlayEffect(EffectKind::Horn));
                log::info!("Race {} started", state.race_id);
            }
        }
        ScheduledAction::FinishRace => {
            if state.phase != RacePhase::Racing {
                return;
            }
            let outcome = state.outcome();
            state.result = Some(outcome);
            state.phase = RacePhase::Finished;
            state.notes.clear();
            state.events.push(GameEvent::RaceFinished(outcome));
            state.events.push(GameEvent::PlayEffect(match outcome {
                RaceOutcome::Win => EffectKind::Win,
                RaceOutcome::Lose => EffectKind::Lose,
                RaceOutcome::Draw => EffectKind::Draw,
            }));
            log::info!(
                "Race {} finished: {:?} ({} vs {})",
                state.race_id,
                outcome,
                state.player_score,
                state.ai_score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Note;

    const DT: f32 = 1.0 / 60.0;

    /// Drive `count` frames, firing `second_tick` once per simulated second
    fn run_frames(state: &mut RaceState, count: usize) {
        let mut acc = 0.0f32;
        for _ in 0..count {
            tick(state, DT);
            acc += DT;
            if acc >= 1.0 {
                acc -= 1.0;
                second_tick(state);
            }
        }
    }

    fn run_seconds(state: &mut RaceState, secs: f32) {
        run_frames(state, (secs * 60.0).ceil() as usize);
    }

    fn start_and_reach_racing(state: &mut RaceState) {
        assert!(state.start_race("Sam"));
        state.notify_loading_ready();
        // 2 s loading linger + 3 s lead + 3 steps to Go
        run_seconds(state, 9.0);
        assert_eq!(state.phase, RacePhase::Racing);
    }

    #[test]
    fn test_menu_to_racing_flow() {
        let mut state = RaceState::new(21);
        tick(&mut state, DT);
        assert_eq!(state.phase, RacePhase::Menu);

        assert!(state.start_race("Sam"));
        assert_eq!(state.phase, RacePhase::Loading);
        // Not ready yet - loading holds indefinitely
        run_seconds(&mut state, 3.0);
        assert_eq!(state.phase, RacePhase::Loading);

        state.notify_loading_ready();
        run_seconds(&mut state, 1.0);
        assert_eq!(state.phase, RacePhase::Loading);
        run_seconds(&mut state, 1.5);
        assert_eq!(state.phase, RacePhase::Countdown);

        // 3-2-1-Go: steps at +3..+6 after entering countdown
        run_seconds(&mut state, 7.0);
        assert_eq!(state.phase, RacePhase::Racing);
        let events = state.drain_events();
        let steps: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountdownStep(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![3, 2, 1, 0]);
        assert!(events.contains(&GameEvent::RaceStarted));
    }

    #[test]
    fn test_no_notes_before_racing() {
        let mut state = RaceState::new(22);
        state.start_race("Sam");
        state.notify_loading_ready();
        // All of loading plus most of the countdown
        run_seconds(&mut state, 7.5);
        assert_ne!(state.phase, RacePhase::Racing);
        assert!(state.notes.is_empty());
    }

    #[test]
    fn test_notes_spawn_once_racing() {
        let mut state = RaceState::new(23);
        start_and_reach_racing(&mut state);
        run_seconds(&mut state, 2.0);
        assert!(!state.notes.is_empty() || state.player_score > 0 || state.ai_score > 0);
    }

    #[test]
    fn test_full_race_no_input_forced_rival() {
        let mut state = RaceState::new(24);
        state.ai_hit_chance = 1.0;
        start_and_reach_racing(&mut state);
        // Run the whole 119 s race plus the finish grace
        run_seconds(&mut state, 124.0);
        assert_eq!(state.phase, RacePhase::Finished);
        assert_eq!(state.time_left, 0);
        // Never pressed a key: only miss penalties, floored at zero
        assert_eq!(state.player_score, 0);
        // Every note was rival-flagged
        assert!(state.ai_score > 0);
        assert_eq!(state.result, Some(RaceOutcome::Lose));
    }

    #[test]
    fn test_timer_stops_at_zero() {
        let mut state = RaceState::new(25);
        start_and_reach_racing(&mut state);
        state.time_left = 1;
        for _ in 0..10 {
            second_tick(&mut state);
        }
        assert_eq!(state.time_left, 0);
    }

    #[test]
    fn test_finish_waits_for_grace_window() {
        let mut state = RaceState::new(26);
        start_and_reach_racing(&mut state);
        state.time_left = 1;
        second_tick(&mut state);
        assert_eq!(state.time_left, 0);
        assert_eq!(state.phase, RacePhase::Racing);
        // Still racing for the ~3 s grace; notes can resolve
        run_seconds(&mut state, 1.0);
        assert_eq!(state.phase, RacePhase::Racing);
        run_seconds(&mut state, 2.5);
        assert_eq!(state.phase, RacePhase::Finished);
    }

    #[test]
    fn test_reset_invalidates_pending_countdown() {
        let mut state = RaceState::new(27);
        state.start_race("Sam");
        state.notify_loading_ready();
        run_seconds(&mut state, 2.5);
        assert_eq!(state.phase, RacePhase::Countdown);
        assert!(!state.scheduler.is_empty());

        // Reset mid-countdown: the scheduled steps belong to a dead generation
        state.reset();
        state.drain_events();
        run_seconds(&mut state, 10.0);
        assert_eq!(state.phase, RacePhase::Menu);
        assert!(state.drain_events().is_empty());
        assert!(!state.is_racing());
    }

    #[test]
    fn test_stale_finish_never_fires_after_replay() {
        let mut state = RaceState::new(28);
        start_and_reach_racing(&mut state);
        state.time_left = 1;
        second_tick(&mut state); // schedules FinishRace under this generation
        let old_generation = state.race_id;

        // Jump straight into a new race before the grace window elapses
        state.phase = RacePhase::Finished;
        state.replay();
        assert_eq!(state.race_id, old_generation + 1);
        assert_eq!(state.phase, RacePhase::Countdown);

        // The old FinishRace comes due during the new countdown and must die
        run_seconds(&mut state, 7.0);
        assert_eq!(state.phase, RacePhase::Racing);
        assert!(state.result.is_none());
    }

    #[test]
    fn test_replay_and_exit_share_reset() {
        let mut state = RaceState::new(29);
        start_and_reach_racing(&mut state);
        state.player_score = 70;
        state.phase = RacePhase::Finished;
        state.result = Some(RaceOutcome::Win);

        state.replay();
        assert_eq!(state.phase, RacePhase::Countdown);
        assert_eq!(state.player_score, 0);
        assert!(state.result.is_none());

        run_seconds(&mut state, 7.0);
        assert_eq!(state.phase, RacePhase::Racing);
        state.phase = RacePhase::Finished;
        state.exit_to_menu();
        assert_eq!(state.phase, RacePhase::Menu);
        assert_eq!(state.time_left, crate::consts::RACE_DURATION_SECS);
    }

    #[test]
    fn test_hit_window_scenario_within_full_tick() {
        let mut state = RaceState::new(30);
        start_and_reach_racing(&mut state);
        state.notes.clear();
        let id = state.next_note_id();
        state.notes.push(Note {
            id,
            lane: 1,
            position: HIT_LINE - 0.5,
            will_ai_hit: false,
            ai_processed: false,
        });
        state.set_lane_input(1, true);
        state.drain_events();
        tick(&mut state, DT);
        assert_eq!(state.player_score, HIT_SCORE);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::NoteHit { lane: 1 }));
        assert!(events.contains(&GameEvent::PlayEffect(EffectKind::Hit)));
    }

    #[test]
    fn test_determinism() {
        let mut a = RaceState::new(777);
        let mut b = RaceState::new(777);
        for state in [&mut a, &mut b] {
            state.start_race("Twin");
            state.notify_loading_ready();
        }
        for _ in 0..(30 * 60) {
            tick(&mut a, DT);
            tick(&mut b, DT);
        }
        assert_eq!(a.notes.len(), b.notes.len());
        assert_eq!(a.ai_score, b.ai_score);
        assert_eq!(a.player_score, b.player_score);
        assert_eq!(a.race_id, b.race_id);
    }
}

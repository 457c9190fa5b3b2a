//! Generation-tagged deferred actions
//!
//! The source of truth for "do this later" inside the sim: countdown steps and
//! the finish-grace delay. Every entry carries the `race_id` it was scheduled
//! under; when the race resets, stale entries fire into nothing.

use serde::{Deserialize, Serialize};

/// An action the tick loop applies when its time comes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// 3, 2, 1, then 0 for "Go"
    CountdownStep(u8),
    /// End of the post-zero grace window; decides the outcome
    FinishRace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    fire_at: f64,
    race_id: u32,
    action: ScheduledAction,
}

/// Pending deferred actions on the monotonic sim clock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: f64, race_id: u32, action: ScheduledAction) {
        self.entries.push(Entry {
            fire_at,
            race_id,
            action,
        });
    }

    /// Remove every entry that is due at `now` and return those belonging to
    /// the current generation, in firing order. Stale-generation entries are
    /// dropped silently - they were cancelled by a reset.
    pub fn take_due(&mut self, now: f64, current_race_id: u32) -> Vec<ScheduledAction> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.fire_at <= now {
                due.push(e.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due.into_iter()
            .filter(|e| {
                if e.race_id == current_race_id {
                    true
                } else {
                    log::debug!(
                        "dropping stale {:?} from generation {}",
                        e.action,
                        e.race_id
                    );
                    false
                }
            })
            .map(|e| e.action)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Commentary trigger scheduling
//!
//! The core decides *when* to ask for race commentary; generating the text
//! and speech is an external service. Requests are rate-limited, tagged with
//! the race generation so stale responses die quietly, and a failure drops
//! the whole feature into a degraded cooldown with a canned fallback line.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Minimum real-time spacing between outgoing requests
pub const REQUEST_SPACING_SECS: f64 = 15.0;
/// How long to stop asking after a failed/absent response
pub const DEGRADED_COOLDOWN_SECS: f64 = 60.0;
/// Per-second-tick chance of a spontaneous commentary request while racing
const TRIGGER_CHANCE: f64 = 0.08;

/// Canned line shown when the service fails or times out
pub const FALLBACK_PHRASE: &str = "What a race this is turning out to be, folks!";

/// An outgoing request for the external commentary service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryRequest {
    /// Generation tag; responses carrying an old tag are discarded
    pub race_id: u32,
    pub context: String,
    pub player_score: u32,
    pub ai_score: u32,
}

/// Decides when commentary is requested and filters what comes back
#[derive(Debug, Clone)]
pub struct CommentaryScheduler {
    last_request: Option<f64>,
    degraded_until: Option<f64>,
    rng: Pcg32,
}

impl CommentaryScheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            last_request: None,
            degraded_until: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn throttled(&self, now: f64) -> bool {
        if let Some(until) = self.degraded_until
            && now < until
        {
            return true;
        }
        if let Some(last) = self.last_request
            && now - last < REQUEST_SPACING_SECS
        {
            return true;
        }
        false
    }

    /// Random mid-race trigger, polled once per timer second
    pub fn on_second_tick(
        &mut self,
        now: f64,
        race_id: u32,
        player_score: u32,
        ai_score: u32,
    ) -> Option<CommentaryRequest> {
        if self.throttled(now) || !self.rng.random_bool(TRIGGER_CHANCE) {
            return None;
        }
        Some(self.dispatch(now, race_id, "mid-race", player_score, ai_score))
    }

    /// Race end always wants a line, subject only to the rate limit
    pub fn on_race_finished(
        &mut self,
        now: f64,
        race_id: u32,
        player_score: u32,
        ai_score: u32,
    ) -> Option<CommentaryRequest> {
        if self.throttled(now) {
            return None;
        }
        Some(self.dispatch(now, race_id, "race-finish", player_score, ai_score))
    }

    fn dispatch(
        &mut self,
        now: f64,
        race_id: u32,
        context: &str,
        player_score: u32,
        ai_score: u32,
    ) -> CommentaryRequest {
        self.last_request = Some(now);
        CommentaryRequest {
            race_id,
            context: context.to_string(),
            player_score,
            ai_score,
        }
    }

    /// Filter a response against the current generation. Stale text from a
    /// race that has since been reset is dropped.
    pub fn accept_response(
        &self,
        current_race_id: u32,
        response_race_id: u32,
        text: String,
    ) -> Option<String> {
        if response_race_id == current_race_id {
            Some(text)
        } else {
            log::debug!(
                "discarding stale commentary from generation {response_race_id} (now {current_race_id})"
            );
            None
        }
    }

    /// The service failed or never answered: hand back the canned line and
    /// stop asking for a while.
    pub fn on_failure(&mut self, now: f64) -> &'static str {
        self.degraded_until = Some(now + DEGRADED_COOLDOWN_SECS);
        log::warn!("commentary degraded for {DEGRADED_COOLDOWN_SECS}s");
        FALLBACK_PHRASE
    }

    pub fn is_degraded(&self, now: f64) -> bool {
        self.degraded_until.is_some_and(|until| now < until)
    }
}

/// Loading-screen headline from the external news fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsHeadline {
    pub text: String,
    pub source_url: Option<String>,
}

impl NewsHeadline {
    /// Shown when the fetch fails or times out
    pub fn fallback() -> Self {
        Self {
            text: "Race day! Crowds gather for the showdown of the season.".to_string(),
            source_url: None,
        }
    }
}

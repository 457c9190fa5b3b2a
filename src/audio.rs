//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed. All
//! playback is best-effort: failures are logged and swallowed, never surfaced
//! to the simulation.

use web_sys::{AudioContext, OscillatorType};

use crate::sim::EffectKind;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: EffectKind) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let result = match effect {
            EffectKind::Hit => self.tone(ctx, OscillatorType::Square, 880.0, 1320.0, 0.08, vol * 0.4),
            EffectKind::Miss => self.tone(ctx, OscillatorType::Sawtooth, 220.0, 110.0, 0.18, vol * 0.35),
            EffectKind::Horn => self.chord(ctx, &[(392.0, 0.0, 0.35), (523.25, 0.0, 0.35)], vol * 0.5),
            EffectKind::Win => self.chord(
                ctx,
                &[(523.25, 0.0, 0.2), (659.25, 0.15, 0.2), (783.99, 0.3, 0.45)],
                vol * 0.5,
            ),
            EffectKind::Lose => self.chord(
                ctx,
                &[(392.0, 0.0, 0.25), (329.63, 0.2, 0.25), (261.63, 0.4, 0.5)],
                vol * 0.45,
            ),
            EffectKind::Draw => self.chord(ctx, &[(440.0, 0.0, 0.3), (440.0, 0.35, 0.3)], vol * 0.4),
        };

        if let Err(e) = result {
            log::debug!("audio playback failed: {e:?}");
        }
    }

    /// One oscillator sweeping from `freq_start` to `freq_end` over `dur` seconds
    fn tone(
        &self,
        ctx: &AudioContext,
        shape: OscillatorType,
        freq_start: f32,
        freq_end: f32,
        dur: f64,
        vol: f32,
    ) -> Result<(), wasm_bindgen::JsValue> {
        let now = ctx.current_time();
        let osc = ctx.create_oscillator()?;
        let gain = ctx.create_gain()?;

        osc.set_type(shape);
        osc.frequency().set_value(freq_start);
        osc.frequency()
            .exponential_ramp_to_value_at_time(freq_end.max(1.0), now + dur)?;

        gain.gain().set_value(vol);
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, now + dur)?;

        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;
        osc.start()?;
        osc.stop_with_when(now + dur)?;
        Ok(())
    }

    /// A short sequence of sine notes: (frequency, start offset, duration)
    fn chord(
        &self,
        ctx: &AudioContext,
        notes: &[(f32, f64, f64)],
        vol: f32,
    ) -> Result<(), wasm_bindgen::JsValue> {
        let now = ctx.current_time();
        for &(freq, offset, dur) in notes {
            let osc = ctx.create_oscillator()?;
            let gain = ctx.create_gain()?;

            osc.set_type(OscillatorType::Sine);
            osc.frequency().set_value(freq);

            gain.gain().set_value(0.0001);
            gain.gain()
                .exponential_ramp_to_value_at_time(vol, now + offset + 0.02)?;
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, now + offset + dur)?;

            osc.connect_with_audio_node(&gain)?;
            gain.connect_with_audio_node(&ctx.destination())?;
            osc.start_with_when(now + offset)?;
            osc.stop_with_when(now + offset + dur)?;
        }
        Ok(())
    }
}

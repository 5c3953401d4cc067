//! Audio cues for gameplay events
//!
//! Procedurally generated tones - no external files needed. The tone table
//! is plain data so it can be tested natively; `AudioManager` plays it
//! through Web Audio oscillators in the browser.

use crate::sim::{EndReason, GameEvent, ObjectKind};

/// C major pentatonic, one octave from C5 (Hz)
pub const PENTATONIC: [f32; 5] = [523.25, 587.33, 659.25, 783.99, 880.0];

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Star collected; `step` walks up the scale with the chain
    Chime { step: u32 },
    /// Wisp collected
    WispChime,
    /// Sequence target lit; plays the degree of its label
    SequenceTone { label: u32 },
    /// Shadow or mist swept away
    Shatter,
    /// Stress bubble released
    BubblePop,
    /// Darkness reached the core
    CoreHit,
    /// Whole sequence lit
    SequenceComplete,
    /// Core went out
    CoreLost,
    /// Countdown or navigation ended the session
    SessionEnd,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// One oscillator voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq: f32,
    /// Exponential glide target, if the pitch bends
    pub glide_to: Option<f32>,
    /// Start offset in seconds
    pub delay: f64,
    /// Length in seconds
    pub duration: f64,
    /// Peak gain before master volume
    pub gain: f32,
    pub waveform: Waveform,
}

impl Note {
    const fn new(freq: f32, delay: f64, duration: f64, gain: f32, waveform: Waveform) -> Self {
        Self {
            freq,
            glide_to: None,
            delay,
            duration,
            gain,
            waveform,
        }
    }

    const fn glide(mut self, to: f32) -> Self {
        self.glide_to = Some(to);
        self
    }
}

/// Pitch of scale step `step`, climbing one octave per five steps (two octaves max)
pub fn scale_pitch(step: u32) -> f32 {
    let step = step % 10;
    let octave = (step / 5) as i32;
    PENTATONIC[(step % 5) as usize] * 2f32.powi(octave)
}

impl SoundEffect {
    /// Which cue, if any, an event should play
    pub fn for_event(event: &GameEvent) -> Option<SoundEffect> {
        match event {
            GameEvent::Collected { kind, chain, .. } => match kind {
                ObjectKind::Star => Some(SoundEffect::Chime {
                    step: chain.saturating_sub(1),
                }),
                ObjectKind::Wisp => Some(SoundEffect::WispChime),
                ObjectKind::Shadow | ObjectKind::Mist => Some(SoundEffect::Shatter),
                ObjectKind::StressBubble => Some(SoundEffect::BubblePop),
                // Targets sound through SequenceAdvanced
                ObjectKind::Target | ObjectKind::Core | ObjectKind::Fragment => None,
            },
            GameEvent::HealthChanged(0) => Some(SoundEffect::CoreLost),
            GameEvent::HealthChanged(_) => Some(SoundEffect::CoreHit),
            GameEvent::SequenceAdvanced { next } => Some(SoundEffect::SequenceTone {
                label: next.saturating_sub(1),
            }),
            GameEvent::SessionEnded(EndReason::SequenceComplete) => Some(SoundEffect::SequenceComplete),
            // CoreLost already played with the zero health change
            GameEvent::SessionEnded(EndReason::CoreExtinguished) => None,
            GameEvent::SessionEnded(_) => Some(SoundEffect::SessionEnd),
        }
    }

    /// Voices making up this cue
    pub fn tone(&self) -> Vec<Note> {
        use Waveform::*;
        match *self {
            SoundEffect::Chime { step } => {
                let f = scale_pitch(step);
                vec![
                    Note::new(f, 0.0, 0.35, 0.25, Sine),
                    Note::new(f * 2.0, 0.0, 0.2, 0.08, Triangle),
                ]
            }
            SoundEffect::WispChime => [0, 2, 4]
                .iter()
                .enumerate()
                .map(|(i, &s)| Note::new(scale_pitch(s + 5), i as f64 * 0.06, 0.25, 0.2, Sine))
                .collect(),
            SoundEffect::SequenceTone { label } => {
                vec![Note::new(scale_pitch(label), 0.0, 0.5, 0.3, Triangle)]
            }
            SoundEffect::Shatter => vec![
                Note::new(220.0, 0.0, 0.18, 0.3, Sawtooth).glide(70.0),
                Note::new(1800.0, 0.0, 0.08, 0.08, Square),
            ],
            SoundEffect::BubblePop => vec![Note::new(300.0, 0.0, 0.12, 0.25, Sine).glide(900.0)],
            SoundEffect::CoreHit => vec![Note::new(180.0, 0.0, 0.35, 0.35, Sine).glide(90.0)],
            SoundEffect::SequenceComplete => PENTATONIC
                .iter()
                .chain(std::iter::once(&(PENTATONIC[0] * 2.0)))
                .enumerate()
                .map(|(i, &f)| Note::new(f, i as f64 * 0.09, 0.4, 0.25, Triangle))
                .collect(),
            SoundEffect::CoreLost => [392.0, 329.63, 261.63, 196.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| Note::new(f, i as f64 * 0.2, 0.35, 0.3, Sine))
                .collect(),
            SoundEffect::SessionEnd => [523.25, 659.25, 783.99]
                .iter()
                .enumerate()
                .map(|(i, &f)| Note::new(f, i as f64 * 0.12, 0.5, 0.22, Triangle))
                .collect(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, Waveform};

    impl From<Waveform> for OscillatorType {
        fn from(w: Waveform) -> Self {
            match w {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            }
        }
    }

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Set volume (0.0 - 1.0); 0 mutes
        pub fn set_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.master_volume;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let now = ctx.current_time();
            for note in effect.tone() {
                let Some((osc, gain)) = self.create_osc(ctx, note.freq, note.waveform.into()) else {
                    continue;
                };
                let t = now + note.delay;
                let end = t + note.duration;

                gain.gain().set_value_at_time(vol * note.gain, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
                if let Some(to) = note.glide_to {
                    osc.frequency().set_value_at_time(note.freq, t).ok();
                    osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
                }

                osc.start_with_when(t).ok();
                osc.stop_with_when(end + 0.05).ok();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn collected(kind: ObjectKind, chain: u32) -> GameEvent {
        GameEvent::Collected {
            kind,
            points: 10,
            label: None,
            pos: Vec2::ZERO,
            chain,
        }
    }

    #[test]
    fn test_chain_climbs_scale() {
        let a = SoundEffect::for_event(&collected(ObjectKind::Star, 1)).unwrap();
        let b = SoundEffect::for_event(&collected(ObjectKind::Star, 2)).unwrap();
        assert!(b.tone()[0].freq > a.tone()[0].freq);
        assert_eq!(a.tone()[0].freq, PENTATONIC[0]);
    }

    #[test]
    fn test_sequence_plays_lit_label() {
        let effect = SoundEffect::for_event(&GameEvent::SequenceAdvanced { next: 3 });
        assert_eq!(effect, Some(SoundEffect::SequenceTone { label: 2 }));
        assert_eq!(SoundEffect::for_event(&collected(ObjectKind::Target, 1)), None);
    }

    #[test]
    fn test_scale_wraps_after_two_octaves() {
        assert_eq!(scale_pitch(5), PENTATONIC[0] * 2.0);
        assert_eq!(scale_pitch(10), scale_pitch(0));
    }

    #[test]
    fn test_core_loss_plays_once() {
        assert_eq!(
            SoundEffect::for_event(&GameEvent::HealthChanged(0)),
            Some(SoundEffect::CoreLost)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::SessionEnded(EndReason::CoreExtinguished)),
            None
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::HealthChanged(60)),
            Some(SoundEffect::CoreHit)
        );
    }

    #[test]
    fn test_every_tone_is_audible() {
        let effects = [
            SoundEffect::Chime { step: 3 },
            SoundEffect::WispChime,
            SoundEffect::SequenceTone { label: 2 },
            SoundEffect::Shatter,
            SoundEffect::BubblePop,
            SoundEffect::CoreHit,
            SoundEffect::SequenceComplete,
            SoundEffect::CoreLost,
            SoundEffect::SessionEnd,
        ];
        for effect in effects {
            let notes = effect.tone();
            assert!(!notes.is_empty(), "{effect:?}");
            assert!(notes.iter().all(|n| n.freq > 20.0 && n.duration > 0.0 && n.gain > 0.0));
        }
    }
}

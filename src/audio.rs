//! Collision sound dispatch
//!
//! The simulation reports impacts as [`ContactEvent`]s. The dispatcher owns
//! the rate limiting (minimum impact, per-body cooldown, per-frame voice cap)
//! and the volume settings, and forwards surviving contacts to a
//! [`CollisionSink`]. Sinks are expected to be non-blocking.

use hashbrown::HashMap;

use crate::sim::{BodyId, ContactEvent};

/// Contacts softer than this are silent
const DEFAULT_MIN_IMPACT: f32 = 0.05;
/// Seconds before the same body may sound again
const DEFAULT_COOLDOWN: f32 = 0.06;
/// Voices started per frame at most
const DEFAULT_MAX_PER_FRAME: usize = 8;
/// Cooldown table size that triggers pruning
const COOLDOWN_PRUNE_LEN: usize = 512;

/// Pitch reference: a body of `REF_RADIUS` sounds at `BASE_FREQ`
const BASE_FREQ: f32 = 440.0;
const REF_RADIUS: f32 = 15.0;
const MIN_FREQ: f32 = 120.0;
const MAX_FREQ: f32 = 1600.0;

/// Receives contacts that passed the dispatcher's policy
pub trait CollisionSink {
    /// `impact` and `pan` are both 0..1
    fn play_collision(&mut self, radius: f32, impact: f32, pan: f32, body_id: Option<BodyId>);
}

impl<F> CollisionSink for F
where
    F: FnMut(f32, f32, f32, Option<BodyId>),
{
    fn play_collision(&mut self, radius: f32, impact: f32, pan: f32, body_id: Option<BodyId>) {
        self(radius, impact, pan, body_id)
    }
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// A synthesized click: pitch from size, loudness from impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionVoice {
    pub frequency: f32,
    pub gain: f32,
    /// Stereo position, -1 (left) to 1 (right)
    pub pan: f32,
    /// Seconds until the envelope reaches silence
    pub duration: f32,
    pub waveform: Waveform,
}

impl CollisionVoice {
    pub fn new(radius: f32, impact: f32, pan: f32, volume: f32) -> Self {
        let impact = impact.clamp(0.0, 1.0);
        let frequency = (BASE_FREQ * (REF_RADIUS / radius.max(1.0)).sqrt()).clamp(MIN_FREQ, MAX_FREQ);
        Self {
            frequency,
            gain: volume.clamp(0.0, 1.0) * 0.6 * impact.sqrt(),
            pan: pan.clamp(0.0, 1.0) * 2.0 - 1.0,
            duration: 0.05 + 0.1 * impact,
            // Hard hits get a brighter tone
            waveform: if impact < 0.5 { Waveform::Sine } else { Waveform::Triangle },
        }
    }
}

/// Sink that queues voices for a synth to drain
#[derive(Debug, Clone, Default)]
pub struct VoiceQueue {
    pub volume: f32,
    pub voices: Vec<CollisionVoice>,
}

impl VoiceQueue {
    pub fn new(volume: f32) -> Self {
        Self { volume, voices: Vec::new() }
    }
}

impl CollisionSink for VoiceQueue {
    fn play_collision(&mut self, radius: f32, impact: f32, pan: f32, _body_id: Option<BodyId>) {
        self.voices.push(CollisionVoice::new(radius, impact, pan, self.volume));
    }
}

/// Applies the sound policy to each frame's contacts
#[derive(Debug, Clone)]
pub struct ContactDispatcher {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    pub min_impact: f32,
    pub cooldown: f32,
    pub max_per_frame: usize,
    last_played: HashMap<BodyId, f32>,
}

impl Default for ContactDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactDispatcher {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            min_impact: DEFAULT_MIN_IMPACT,
            cooldown: DEFAULT_COOLDOWN,
            max_per_frame: DEFAULT_MAX_PER_FRAME,
            last_played: HashMap::new(),
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

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Forward this frame's contacts to `sink`; `now` is in seconds.
    ///
    /// Returns the number of contacts played.
    pub fn dispatch<S: CollisionSink + ?Sized>(
        &mut self,
        events: &[ContactEvent],
        now: f32,
        sink: &mut S,
    ) -> usize {
        if self.effective_volume() <= 0.0 {
            return 0;
        }
        if self.last_played.len() > COOLDOWN_PRUNE_LEN {
            let cooldown = self.cooldown;
            self.last_played.retain(|_, &mut t| now - t < cooldown);
        }

        let mut played = 0;
        for event in events {
            if played >= self.max_per_frame {
                break;
            }
            if event.impact < self.min_impact {
                continue;
            }
            if let Some(id) = event.body_id {
                let cooling = self.last_played.get(&id).is_some_and(|&last| now - last < self.cooldown);
                if cooling {
                    continue;
                }
                self.last_played.insert(id, now);
            }
            sink.play_collision(event.radius, event.impact, event.pan, event.body_id);
            played += 1;
        }
        played
    }

    /// Forget cooldowns, e.g. after a mode switch
    pub fn reset(&mut self) {
        self.last_played.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ContactKind;
    use glam::Vec2;

    fn event(id: Option<BodyId>, impact: f32) -> ContactEvent {
        ContactEvent {
            kind: ContactKind::Ball,
            radius: 12.0,
            impact,
            pan: 0.25,
            position: Vec2::new(100.0, 100.0),
            body_id: id,
        }
    }

    #[test]
    fn test_soft_contacts_are_silent() {
        let mut dispatcher = ContactDispatcher::new();
        let mut queue = VoiceQueue::new(1.0);
        let played = dispatcher.dispatch(&[event(Some(1), 0.01), event(Some(2), 0.5)], 0.0, &mut queue);
        assert_eq!(played, 1);
        assert_eq!(queue.voices.len(), 1);
    }

    #[test]
    fn test_per_body_cooldown() {
        let mut dispatcher = ContactDispatcher::new();
        let mut count = 0;
        let mut sink = |_: f32, _: f32, _: f32, _: Option<BodyId>| count += 1;
        dispatcher.dispatch(&[event(Some(1), 0.5)], 0.0, &mut sink);
        dispatcher.dispatch(&[event(Some(1), 0.5)], 0.03, &mut sink);
        dispatcher.dispatch(&[event(Some(1), 0.5)], 0.1, &mut sink);
        // Anonymous contacts have no cooldown
        dispatcher.dispatch(&[event(None, 0.5), event(None, 0.5)], 0.1, &mut sink);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_frame_cap() {
        let mut dispatcher = ContactDispatcher::new();
        let events: Vec<_> = (0..20).map(|i| event(Some(i), 0.5)).collect();
        let mut queue = VoiceQueue::new(1.0);
        assert_eq!(dispatcher.dispatch(&events, 0.0, &mut queue), DEFAULT_MAX_PER_FRAME);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let mut dispatcher = ContactDispatcher::new();
        dispatcher.set_muted(true);
        let mut queue = VoiceQueue::new(1.0);
        assert_eq!(dispatcher.dispatch(&[event(Some(1), 1.0)], 0.0, &mut queue), 0);
        dispatcher.set_muted(false);
        dispatcher.set_master_volume(2.0);
        assert_eq!(dispatcher.effective_volume(), 1.0);
    }

    #[test]
    fn test_voice_mapping() {
        let small = CollisionVoice::new(5.0, 0.2, 0.0, 1.0);
        let big = CollisionVoice::new(30.0, 0.9, 1.0, 1.0);
        assert!(small.frequency > big.frequency);
        assert!(big.gain > small.gain);
        assert_eq!(small.pan, -1.0);
        assert_eq!(big.pan, 1.0);
        assert_eq!(small.waveform, Waveform::Sine);
        assert_eq!(big.waveform, Waveform::Triangle);
        assert_eq!(CollisionVoice::new(10.0, 1.0, 0.5, 0.0).gain, 0.0);
    }
}

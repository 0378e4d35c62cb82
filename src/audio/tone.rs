// Strum tones - Short falling triangle blips, pre-rendered per stroke
// Down: 150 -> 80 Hz, Up: 250 -> 150 Hz, pitch falls over 100ms, gain 0.3 -> 0.01 over 150ms

use crate::messaging::command::AudioCommand;
use crate::pattern::Stroke;

/// Pre-rendered tone buffers, one per stroke
/// Generated once so the audio callback only copies samples
#[derive(Debug, Clone)]
pub struct StrumSound {
    down_samples: Vec<f32>,
    up_samples: Vec<f32>,
}

impl StrumSound {
    /// Tone length (ms)
    pub const DURATION_MS: f32 = 150.0;
    /// Pitch fall length (ms)
    pub const PITCH_FALL_MS: f32 = 100.0;
    pub const START_GAIN: f32 = 0.3;
    pub const END_GAIN: f32 = 0.01;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            down_samples: Self::generate(sample_rate, Stroke::Down),
            up_samples: Self::generate(sample_rate, Stroke::Up),
        }
    }

    /// Triangle oscillator with exponential pitch and gain ramps
    fn generate(sample_rate: f32, stroke: Stroke) -> Vec<f32> {
        let num_samples = ((Self::DURATION_MS / 1000.0) * sample_rate) as usize;
        let fall_samples = ((Self::PITCH_FALL_MS / 1000.0) * sample_rate).max(1.0);

        let start_freq = stroke.start_frequency();
        let end_freq = stroke.end_frequency();
        let gain_ratio = Self::END_GAIN / Self::START_GAIN;

        let mut samples = Vec::with_capacity(num_samples);
        let mut phase = 0.0f32;

        for i in 0..num_samples {
            let pitch_t = (i as f32 / fall_samples).min(1.0);
            let frequency = start_freq * (end_freq / start_freq).powf(pitch_t);

            let gain_t = i as f32 / num_samples as f32;
            let gain = Self::START_GAIN * gain_ratio.powf(gain_t);

            let triangle = if phase < 0.5 {
                (phase * 4.0) - 1.0
            } else {
                3.0 - (phase * 4.0)
            };
            samples.push(triangle * gain);

            phase += frequency / sample_rate;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }

        samples
    }

    pub fn get(&self, stroke: Stroke) -> &[f32] {
        match stroke {
            Stroke::Down => &self.down_samples,
            Stroke::Up => &self.up_samples,
        }
    }

    /// Tone length in samples
    pub fn duration_samples(&self) -> usize {
        self.down_samples.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingStrum {
    stroke: Stroke,
    at_sample: u64,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStrum {
    stroke: Stroke,
    position: usize,
}

/// Audio-thread mixer for scheduled strums
///
/// Queues are pre-allocated; strums beyond capacity are dropped rather than
/// allocating inside the callback.
#[derive(Debug, Clone)]
pub struct StrumVoices {
    sound: StrumSound,
    volume: f32,
    pending: Vec<PendingStrum>,
    active: Vec<ActiveStrum>,
}

impl StrumVoices {
    pub const MAX_PENDING: usize = 64;
    pub const MAX_ACTIVE: usize = 16;

    pub fn new(sample_rate: f32, volume: f32) -> Self {
        Self {
            sound: StrumSound::new(sample_rate),
            volume: volume.clamp(0.0, 1.0),
            pending: Vec::with_capacity(Self::MAX_PENDING),
            active: Vec::with_capacity(Self::MAX_ACTIVE),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Apply one command from the transport
    pub fn handle(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Strum { stroke, at_sample } => {
                if self.pending.len() < Self::MAX_PENDING {
                    self.pending.push(PendingStrum { stroke, at_sample });
                }
            }
            AudioCommand::SetVolume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
            }
        }
    }

    /// Render the frame at absolute sample index `now`
    pub fn next_sample(&mut self, now: u64) -> f32 {
        self.start_due(now);

        let mut mix = 0.0;
        let sound = &self.sound;
        self.active.retain_mut(|strum| {
            let samples = sound.get(strum.stroke);
            match samples.get(strum.position) {
                Some(sample) => {
                    mix += sample;
                    strum.position += 1;
                    true
                }
                None => false,
            }
        });

        mix * self.volume
    }

    /// Move due strums into playback; late ones start part-way through
    fn start_due(&mut self, now: u64) {
        let mut i = 0;
        while i < self.pending.len() {
            let pending = self.pending[i];
            if pending.at_sample > now {
                i += 1;
                continue;
            }

            self.pending.swap_remove(i);
            let late_by = (now - pending.at_sample) as usize;
            if late_by < self.sound.duration_samples() && self.active.len() < Self::MAX_ACTIVE {
                self.active.push(ActiveStrum {
                    stroke: pending.stroke,
                    position: late_by,
                });
            }
        }
    }

    /// Forget everything queued or sounding
    pub fn reset(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn test_strum_sound_generation() {
        let sound = StrumSound::new(48000.0);

        let down = sound.get(Stroke::Down);
        let up = sound.get(Stroke::Up);

        // 150ms at 48kHz
        assert_eq!(down.len(), 7200);
        assert_eq!(up.len(), 7200);
        assert_eq!(sound.duration_samples(), 7200);

        let peak = down.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!(peak <= StrumSound::START_GAIN + 1e-6);
        assert!(peak > 0.2);
    }

    #[test]
    fn test_down_is_lower_pitched_than_up() {
        let sound = StrumSound::new(48000.0);
        assert!(zero_crossings(sound.get(Stroke::Down)) < zero_crossings(sound.get(Stroke::Up)));
    }

    #[test]
    fn test_tone_decays() {
        let sound = StrumSound::new(48000.0);
        let down = sound.get(Stroke::Down);

        let head = down[..480].iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        let tail = down[down.len() - 480..]
            .iter()
            .map(|s| s.abs())
            .fold(0.0f32, f32::max);
        assert!(tail < head * 0.1);
    }

    #[test]
    fn test_strum_starts_at_scheduled_sample() {
        let mut voices = StrumVoices::new(48000.0, 1.0);
        voices.handle(AudioCommand::Strum {
            stroke: Stroke::Down,
            at_sample: 100,
        });

        for now in 0..100 {
            assert_eq!(voices.next_sample(now), 0.0);
        }
        assert_eq!(voices.pending_count(), 1);

        // Triangle starts at -1, scaled by the start gain
        let first = voices.next_sample(100);
        assert!((first + StrumSound::START_GAIN).abs() < 1e-6);
        assert_eq!(voices.pending_count(), 0);
        assert_eq!(voices.active_count(), 1);

        for now in 101..(100 + 7200) {
            voices.next_sample(now);
        }
        assert_eq!(voices.next_sample(7300), 0.0);
        assert_eq!(voices.active_count(), 0);
    }

    #[test]
    fn test_late_strum_starts_part_way() {
        let mut voices = StrumVoices::new(48000.0, 1.0);
        voices.handle(AudioCommand::Strum {
            stroke: Stroke::Up,
            at_sample: 10,
        });
        // Way past the whole tone: dropped
        voices.handle(AudioCommand::Strum {
            stroke: Stroke::Down,
            at_sample: 0,
        });

        voices.next_sample(20_000);
        assert_eq!(voices.active_count(), 0);

        voices.handle(AudioCommand::Strum {
            stroke: Stroke::Up,
            at_sample: 20_000,
        });
        voices.next_sample(20_050);
        assert_eq!(voices.active_count(), 1);
    }

    #[test]
    fn test_volume() {
        let mut loud = StrumVoices::new(48000.0, 1.0);
        let mut quiet = StrumVoices::new(48000.0, 1.0);
        quiet.handle(AudioCommand::SetVolume(0.5));
        assert_eq!(quiet.volume(), 0.5);

        for voices in [&mut loud, &mut quiet] {
            voices.handle(AudioCommand::Strum {
                stroke: Stroke::Down,
                at_sample: 0,
            });
        }
        let a = loud.next_sample(0);
        let b = quiet.next_sample(0);
        assert!((a * 0.5 - b).abs() < 1e-6);

        loud.handle(AudioCommand::SetVolume(3.0));
        assert_eq!(loud.volume(), 1.0);
    }

    #[test]
    fn test_pending_capacity() {
        let mut voices = StrumVoices::new(48000.0, 1.0);
        for i in 0..(StrumVoices::MAX_PENDING + 10) {
            voices.handle(AudioCommand::Strum {
                stroke: Stroke::Down,
                at_sample: 1_000_000 + i as u64,
            });
        }
        assert_eq!(voices.pending_count(), StrumVoices::MAX_PENDING);

        voices.reset();
        assert_eq!(voices.pending_count(), 0);
    }
}

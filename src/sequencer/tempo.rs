// Tempo - BPM and the playback rate derived from it
// One beat (quarter note) is always two steps (eighth notes), whatever the pattern length

use std::fmt;

/// Steps per beat, fixed
pub const STEPS_PER_BEAT: f64 = 2.0;

/// Beats covered by one step
pub const BEATS_PER_STEP: f64 = 1.0 / STEPS_PER_BEAT;

/// Tempo validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TempoError {
    #[error("BPM {0} out of range (expected {}..={})", Tempo::MIN_BPM, Tempo::MAX_BPM)]
    OutOfRange(u32),
}

/// Tempo in BPM (Beats Per Minute)
/// Range-checked on construction; everything downstream trusts it
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub const MIN_BPM: u32 = 20;
    pub const MAX_BPM: u32 = 300;
    pub const DEFAULT_BPM: u32 = 100;

    /// Creates a new tempo
    pub fn new(bpm: u32) -> Result<Self, TempoError> {
        if (Self::MIN_BPM..=Self::MAX_BPM).contains(&bpm) {
            Ok(Self { bpm })
        } else {
            Err(TempoError::OutOfRange(bpm))
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Duration of one step in seconds
    pub fn step_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() * BEATS_PER_STEP
    }

    /// Steps played per second
    pub fn steps_per_second(&self) -> f64 {
        self.bpm as f64 * STEPS_PER_BEAT / 60.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
        }
    }
}

impl TryFrom<u32> for Tempo {
    type Error = TempoError;

    fn try_from(bpm: u32) -> Result<Self, Self::Error> {
        Self::new(bpm)
    }
}

impl From<Tempo> for u32 {
    fn from(tempo: Tempo) -> Self {
        tempo.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

/// Playback rate in distance units per second
/// The same units measure strip widths, scroll offsets and cycle length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    units_per_second: f64,
}

impl Rate {
    pub fn units_per_second(&self) -> f64 {
        self.units_per_second
    }

    /// Seconds needed to traverse `width` units
    pub fn seconds_for(&self, width: f64) -> f64 {
        width / self.units_per_second
    }

    /// Units traversed in `seconds`
    pub fn units_in(&self, seconds: f64) -> f64 {
        seconds * self.units_per_second
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} units/s", self.units_per_second)
    }
}

/// Convert a tempo into a scroll/traversal rate
///
/// `units_per_second = bpm * 2 / 60 * step_width`. `step_width` must be
/// positive; configuration validation guarantees it.
pub fn resolve_rate(tempo: Tempo, step_width: f64) -> Rate {
    Rate {
        units_per_second: tempo.steps_per_second() * step_width,
    }
}

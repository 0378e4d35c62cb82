// Position tracker - Scroll offset derived from absolute elapsed time
// Recomputed from scratch every frame, so it never accumulates drift

use crate::sequencer::tempo::Rate;

/// Maps audio-clock time to a scroll offset within one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTracker {
    origin_time: f64,
    rate: Rate,
    cycle_length_units: f64,
}

impl PositionTracker {
    pub fn new(origin_time: f64, rate: Rate, cycle_length_units: f64) -> Self {
        Self {
            origin_time,
            rate,
            cycle_length_units,
        }
    }

    pub fn origin_time(&self) -> f64 {
        self.origin_time
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn cycle_length_units(&self) -> f64 {
        self.cycle_length_units
    }

    /// Offset in `[0, cycle_length)`; always 0 for an empty cycle
    pub fn offset(&self, now: f64) -> f64 {
        if self.cycle_length_units <= 0.0 {
            return 0.0;
        }

        let distance = self.rate.units_in(now - self.origin_time);
        let offset = distance.rem_euclid(self.cycle_length_units);

        // rem_euclid may round up to the modulus for tiny negative distances
        if offset >= self.cycle_length_units {
            0.0
        } else {
            offset
        }
    }

    /// Number of whole cycles completed since the origin
    pub fn cycles_completed(&self, now: f64) -> u64 {
        if self.cycle_length_units <= 0.0 || now <= self.origin_time {
            return 0;
        }
        (self.rate.units_in(now - self.origin_time) / self.cycle_length_units) as u64
    }
}

// Lookahead scheduler - Bridges a jittery frame tick to sample-accurate triggers
//
// Each tick commits every event due before `now + lookahead`, stamped with its
// exact clock time. The cursor only moves forward; the timeline index is
// `cursor % len`. Events already older than `now - stale_guard` when reached are
// dropped instead of fired late (no burst after the host was suspended).

use crate::sequencer::clock::{Trigger, TriggerSink};
use crate::sequencer::tempo::Rate;
use crate::sequencer::timeline::Timeline;
use std::ops::Range;

/// Default scheduling horizon (seconds)
pub const DEFAULT_LOOKAHEAD_SECS: f64 = 0.1;

/// Default age after which a missed event is dropped (seconds)
pub const DEFAULT_STALE_GUARD_SECS: f64 = 0.1;

/// Scheduler timing constants
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// How far ahead of `now` events are committed
    pub lookahead_secs: f64,
    /// How far behind `now` an event may be and still fire
    pub stale_guard_secs: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            stale_guard_secs: DEFAULT_STALE_GUARD_SECS,
        }
    }
}

/// What one scheduling pass did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// Cursor positions visited this pass (each exactly once, ever)
    pub cursors: Range<u64>,
    /// Audible events handed to the sink
    pub fired: usize,
    /// Audible events skipped because they were too old
    pub dropped: usize,
    /// Rests and bar boundaries crossed
    pub silent: usize,
}

impl TickReport {
    fn starting_at(cursor: u64) -> Self {
        Self {
            cursors: cursor..cursor,
            ..Self::default()
        }
    }

    /// Number of timeline events consumed
    pub fn visited(&self) -> u64 {
        self.cursors.end - self.cursors.start
    }
}

/// Lookahead scheduler state
#[derive(Debug, Clone)]
pub struct LookaheadScheduler {
    settings: SchedulerSettings,
    cursor: u64,
    next_schedule_time: f64,
}

impl LookaheadScheduler {
    /// Create a scheduler positioned at cursor 0, time `origin`
    pub fn new(settings: SchedulerSettings, origin: f64) -> Self {
        Self {
            settings,
            cursor: 0,
            next_schedule_time: origin,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Monotonic event cursor (not wrapped)
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Clock time at which the event under the cursor is due
    pub fn next_schedule_time(&self) -> f64 {
        self.next_schedule_time
    }

    /// Restart from cursor 0 at `origin`
    pub fn reset(&mut self, origin: f64) {
        self.cursor = 0;
        self.next_schedule_time = origin;
    }

    /// Commit every event due before `now + lookahead`
    ///
    /// An empty timeline (or one with zero cycle length) is a silent no-op.
    pub fn schedule<S>(
        &mut self,
        now: f64,
        timeline: &Timeline,
        rate: &Rate,
        sink: &mut S,
    ) -> TickReport
    where
        S: TriggerSink + ?Sized,
    {
        let mut report = TickReport::starting_at(self.cursor);

        if timeline.is_empty()
            || timeline.cycle_length_units() <= 0.0
            || rate.units_per_second() <= 0.0
        {
            return report;
        }

        let horizon = now + self.settings.lookahead_secs;
        let stale_before = now - self.settings.stale_guard_secs;

        while self.next_schedule_time < horizon {
            let Some(event) = timeline.at_cursor(self.cursor) else {
                break;
            };

            match event.kind.stroke() {
                Some(stroke) if self.next_schedule_time >= stale_before => {
                    sink.schedule_trigger(Trigger {
                        stroke,
                        at_time: self.next_schedule_time,
                    });
                    report.fired += 1;
                }
                Some(_) => report.dropped += 1,
                None => report.silent += 1,
            }

            self.next_schedule_time += event.duration_seconds(rate);
            self.cursor += 1;
        }

        report.cursors.end = self.cursor;

        if report.dropped > 0 {
            tracing::debug!(
                dropped = report.dropped,
                now,
                "Dropped stale strums instead of firing late"
            );
        }

        report
    }
}

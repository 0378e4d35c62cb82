// Timeline - Flattened, cyclic event list built from a pattern
// Block order x repeat order x step order, one bar boundary after each repeat

use crate::pattern::{Pattern, StepSymbol, Stroke};
use crate::sequencer::tempo::{BEATS_PER_STEP, Rate};
use std::fmt;

/// Kind of a flattened timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Step(StepSymbol),
    /// Visual gap between repeats; silent but still takes time to cross
    BarBoundary,
}

impl EventKind {
    /// Audio profile (None for rests and bars)
    pub fn stroke(&self) -> Option<Stroke> {
        match self {
            EventKind::Step(symbol) => symbol.stroke(),
            EventKind::BarBoundary => None,
        }
    }

    pub fn is_bar(&self) -> bool {
        matches!(self, EventKind::BarBoundary)
    }

    /// Glyph for the strip (bars are drawn as a separator)
    pub fn glyph(&self) -> char {
        match self {
            EventKind::Step(symbol) => symbol.glyph(),
            EventKind::BarBoundary => '|',
        }
    }

    /// Style class for the strip
    pub fn class(&self) -> &'static str {
        match self {
            EventKind::Step(symbol) => symbol.class(),
            EventKind::BarBoundary => "bar-line",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Step(symbol) => write!(f, "{}", symbol),
            EventKind::BarBoundary => write!(f, "|"),
        }
    }
}

/// Distance units occupied by steps and bar separators
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StripWidths {
    /// Width of one step; also the unit the tempo rate is scaled by
    pub step_width: f64,
    /// Width of the separator drawn after every block repeat
    pub bar_width: f64,
}

impl StripWidths {
    pub fn new(step_width: f64, bar_width: f64) -> Self {
        Self {
            step_width,
            bar_width,
        }
    }
}

impl Default for StripWidths {
    fn default() -> Self {
        Self::new(50.0, 40.0)
    }
}

/// One flattened event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEvent {
    pub kind: EventKind,
    /// Musical length in beats (a step is an eighth note; bars scale by width)
    pub duration_beats: f64,
    /// Distance on the strip
    pub width_units: f64,
}

impl TimelineEvent {
    fn step(symbol: StepSymbol, widths: &StripWidths) -> Self {
        Self {
            kind: EventKind::Step(symbol),
            duration_beats: BEATS_PER_STEP,
            width_units: widths.step_width,
        }
    }

    fn bar(widths: &StripWidths) -> Self {
        let duration_beats = if widths.step_width > 0.0 {
            widths.bar_width / widths.step_width * BEATS_PER_STEP
        } else {
            0.0
        };
        Self {
            kind: EventKind::BarBoundary,
            duration_beats,
            width_units: widths.bar_width,
        }
    }

    /// Time needed to cross this event at `rate`
    pub fn duration_seconds(&self, rate: &Rate) -> f64 {
        rate.seconds_for(self.width_units)
    }
}

/// Flattened pattern, played cyclically
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
    cycle_length_units: f64,
}

impl Timeline {
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all event widths; 0 for an empty timeline
    pub fn cycle_length_units(&self) -> f64 {
        self.cycle_length_units
    }

    /// Cycle duration in seconds at `rate`
    pub fn cycle_seconds(&self, rate: &Rate) -> f64 {
        rate.seconds_for(self.cycle_length_units)
    }

    /// Event at a monotonically increasing cursor, wrapped into the cycle
    pub fn at_cursor(&self, cursor: u64) -> Option<&TimelineEvent> {
        if self.events.is_empty() {
            return None;
        }
        let index = (cursor % self.events.len() as u64) as usize;
        self.events.get(index)
    }

    /// Number of audible events in one cycle
    pub fn audible_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind.stroke().is_some())
            .count()
    }
}

/// Flatten a pattern snapshot into its cyclic timeline
///
/// Pure: the same pattern and widths always give the same timeline. Blocks
/// without steps contribute nothing, bar included.
pub fn flatten(pattern: &Pattern, widths: &StripWidths) -> Timeline {
    let mut events = Vec::with_capacity(flattened_len(pattern));

    for block in pattern.blocks().iter().filter(|b| !b.is_empty()) {
        for _ in 0..block.repeats() {
            events.extend(
                block
                    .steps()
                    .iter()
                    .map(|&symbol| TimelineEvent::step(symbol, widths)),
            );
            events.push(TimelineEvent::bar(widths));
        }
    }

    let cycle_length_units = events.iter().map(|e| e.width_units).sum();

    Timeline {
        events,
        cycle_length_units,
    }
}

fn flattened_len(pattern: &Pattern) -> usize {
    pattern
        .blocks()
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| (b.step_count() + 1) * b.repeats() as usize)
        .sum()
}

/// Cached flattening keyed on the pattern revision
/// Any pattern mutation makes the next `get` re-flatten
#[derive(Debug, Clone, Default)]
pub struct TimelineCache {
    widths: StripWidths,
    revision: Option<u64>,
    timeline: Timeline,
}

impl TimelineCache {
    pub fn new(widths: StripWidths) -> Self {
        Self {
            widths,
            revision: None,
            timeline: Timeline::default(),
        }
    }

    pub fn widths(&self) -> &StripWidths {
        &self.widths
    }

    /// Drop the cached flattening
    pub fn invalidate(&mut self) {
        self.revision = None;
    }

    /// True if `get` would re-flatten for this pattern
    pub fn is_stale(&self, pattern: &Pattern) -> bool {
        self.revision != Some(pattern.revision())
    }

    /// Timeline for `pattern`, re-flattening if the pattern changed
    pub fn get(&mut self, pattern: &Pattern) -> &Timeline {
        if self.is_stale(pattern) {
            self.timeline = flatten(pattern, &self.widths);
            self.revision = Some(pattern.revision());
            tracing::debug!(
                events = self.timeline.len(),
                cycle_units = self.timeline.cycle_length_units(),
                "Timeline re-flattened"
            );
        }
        &self.timeline
    }

    /// Last flattened timeline, without checking freshness
    pub fn cached(&self) -> &Timeline {
        &self.timeline
    }
}

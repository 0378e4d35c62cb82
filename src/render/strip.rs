// Strip layout - Tiled note cells scrolled by the transport offset
//
// One master block holds a cell per timeline event. It is repeated enough
// times that translating by any offset in [0, cycle) still covers the viewport.

use crate::sequencer::timeline::{EventKind, Timeline};

/// Viewport width assumed when the host cannot tell
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1000.0;

/// One drawable cell of the strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteCell {
    pub kind: EventKind,
    pub glyph: char,
    pub class: &'static str,
    /// Left edge in strip units, relative to the start of its copy
    pub x: f64,
    pub width: f64,
}

impl NoteCell {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    fn shifted(&self, dx: f64) -> Self {
        Self { x: self.x + dx, ..*self }
    }
}

/// Number of master-block copies needed to cover a viewport while scrolling
///
/// Zero when the cycle is empty: nothing is drawn.
pub fn copies_for(viewport_width: f64, cycle_length_units: f64) -> usize {
    if cycle_length_units <= 0.0 {
        return 0;
    }
    (viewport_width.max(0.0) / cycle_length_units).ceil() as usize + 2
}

/// Horizontal translation for a scroll offset
pub fn translate_x(offset: f64) -> f64 {
    -offset
}

/// Layout of the whole scrolling strip
#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    cells: Vec<NoteCell>,
    cycle_length_units: f64,
    viewport_width: f64,
    copies: usize,
}

impl StripLayout {
    /// Lay out one master block from the timeline and tile it for the viewport
    ///
    /// The tile count is fixed at build time. Rebuild the layout whenever the
    /// viewport width or the timeline changes.
    pub fn build(timeline: &Timeline, viewport_width: f64) -> Self {
        let mut x = 0.0;
        let cells = timeline
            .events()
            .iter()
            .map(|event| {
                let cell = NoteCell {
                    kind: event.kind,
                    glyph: event.kind.glyph(),
                    class: event.kind.class(),
                    x,
                    width: event.width_units,
                };
                x += event.width_units;
                cell
            })
            .collect();

        let cycle_length_units = timeline.cycle_length_units();

        Self {
            cells,
            cycle_length_units,
            viewport_width,
            copies: copies_for(viewport_width, cycle_length_units),
        }
    }

    /// Cells of a single copy
    pub fn master_cells(&self) -> &[NoteCell] {
        &self.cells
    }

    pub fn cycle_length_units(&self) -> f64 {
        self.cycle_length_units
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn copies(&self) -> usize {
        self.copies
    }

    /// Width of the whole tiled track
    pub fn track_width(&self) -> f64 {
        self.cycle_length_units * self.copies as f64
    }

    /// Every cell of every copy, positioned on the untranslated track
    pub fn tiled_cells(&self) -> impl Iterator<Item = NoteCell> + '_ {
        (0..self.copies).flat_map(move |copy| {
            let dx = copy as f64 * self.cycle_length_units;
            self.cells.iter().map(move |cell| cell.shifted(dx))
        })
    }

    /// Cells overlapping the viewport after translating by `-offset`,
    /// positioned in viewport coordinates
    pub fn visible_cells(&self, offset: f64) -> impl Iterator<Item = NoteCell> + '_ {
        let shift = translate_x(offset);
        let viewport = self.viewport_width;
        self.tiled_cells()
            .map(move |cell| cell.shifted(shift))
            .filter(move |cell| cell.right() > 0.0 && cell.x < viewport)
    }
}

/// Terminal renderer: one character column per `units_per_column` strip units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStrip {
    pub units_per_column: f64,
}

impl Default for TextStrip {
    fn default() -> Self {
        // 50-unit steps become 5 columns
        Self {
            units_per_column: 10.0,
        }
    }
}

impl TextStrip {
    pub fn new(units_per_column: f64) -> Self {
        Self { units_per_column }
    }

    /// Column count covering the viewport
    pub fn columns(&self, layout: &StripLayout) -> usize {
        if self.units_per_column <= 0.0 {
            return 0;
        }
        (layout.viewport_width() / self.units_per_column).floor().max(0.0) as usize
    }

    /// Render the window visible at `offset`; each glyph sits at its cell's left edge
    pub fn render(&self, layout: &StripLayout, offset: f64) -> String {
        let columns = self.columns(layout);
        let mut line = vec![' '; columns];

        for cell in layout.visible_cells(offset) {
            let column = (cell.x / self.units_per_column).floor();
            if column >= 0.0 && (column as usize) < columns {
                line[column as usize] = cell.glyph;
            }
        }

        line.into_iter().collect()
    }
}

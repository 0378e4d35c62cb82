// Command types - Transport -> audio thread

use crate::pattern::Stroke;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    /// Sound a strum starting at an absolute sample index
    Strum { stroke: Stroke, at_sample: u64 },
    /// Master volume in [0, 1]
    SetVolume(f32),
}

// Strumline - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod messaging;
pub mod pattern;
pub mod render;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioResult, CpalOutput};
pub use config::{ConfigError, ConfigResult, StrumConfig};
pub use messaging::channels::create_command_channel;
pub use pattern::{NotationError, Pattern, PatternBlock, PatternError, StepSymbol, Stroke};
pub use render::{NoteCell, StripLayout, TextStrip};
pub use sequencer::{
    AudioClock, EventKind, FrameTicker, LookaheadScheduler, ManualClock, ManualTicks,
    PositionTracker, Rate, SchedulerSettings, StripWidths, Tempo, TickReport, TickSource,
    Timeline, Transport, TransportError, TransportState, Trigger, TriggerSink, WallClock, flatten,
    resolve_rate,
};

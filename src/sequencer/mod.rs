// Sequencer module - Timing core
// Flattened timeline, tempo, lookahead scheduling, scroll position and transport

pub mod clock;
pub mod position;
pub mod scheduler;
pub mod tempo;
pub mod timeline;
pub mod transport;

pub use clock::{AudioClock, FrameTicker, ManualClock, ManualTicks, TickSource, Trigger, TriggerSink, WallClock};
pub use position::PositionTracker;
pub use scheduler::{LookaheadScheduler, SchedulerSettings, TickReport};
pub use tempo::{Rate, Tempo, TempoError, resolve_rate};
pub use timeline::{EventKind, StripWidths, Timeline, TimelineCache, TimelineEvent, flatten};
pub use transport::{PlaybackSession, Transport, TransportError, TransportResult, TransportState};

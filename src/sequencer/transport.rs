// Transport - Playback control and state management
// Owns the pattern, its flattened timeline and the playing session (if any)

use crate::audio::AudioError;
use crate::pattern::Pattern;
use crate::sequencer::clock::{AudioClock, TickSource, TriggerSink};
use crate::sequencer::position::PositionTracker;
use crate::sequencer::scheduler::{LookaheadScheduler, SchedulerSettings, TickReport};
use crate::sequencer::tempo::{Rate, Tempo, resolve_rate};
use crate::sequencer::timeline::{StripWidths, Timeline, TimelineCache};
use tracing::{debug, info};

/// Transport state (play/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Audio clock unavailable: {0}")]
    Clock(#[from] AudioError),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// State of one uninterrupted run of playback
///
/// Created on start, rebuilt on every resync, dropped on stop. Nothing carries
/// over from one session to the next.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    rate: Rate,
    scheduler: LookaheadScheduler,
    position: PositionTracker,
}

impl PlaybackSession {
    fn new(origin_time: f64, rate: Rate, timeline: &Timeline, settings: SchedulerSettings) -> Self {
        Self {
            rate,
            scheduler: LookaheadScheduler::new(settings, origin_time),
            position: PositionTracker::new(origin_time, rate, timeline.cycle_length_units()),
        }
    }

    pub fn origin_time(&self) -> f64 {
        self.position.origin_time()
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn cycle_length_units(&self) -> f64 {
        self.position.cycle_length_units()
    }

    /// Monotonic event cursor
    pub fn cursor_event_index(&self) -> u64 {
        self.scheduler.cursor()
    }

    /// Clock time of the event under the cursor
    pub fn next_schedule_time(&self) -> f64 {
        self.scheduler.next_schedule_time()
    }

    /// Scroll offset at clock time `now`
    pub fn offset(&self, now: f64) -> f64 {
        self.position.offset(now)
    }
}

/// Transport controller
///
/// Single-threaded: ticks and user commands all go through `&mut self`. The
/// host calls `tick` once per frame while the tick source is subscribed.
pub struct Transport<A, T> {
    audio: A,
    ticks: T,
    pattern: Pattern,
    timeline: TimelineCache,
    tempo: Tempo,
    settings: SchedulerSettings,
    session: Option<PlaybackSession>,
}

impl<A, T> Transport<A, T>
where
    A: AudioClock + TriggerSink,
    T: TickSource,
{
    /// Create a stopped transport with the default strum, tempo and widths
    pub fn new(audio: A, ticks: T) -> Self {
        let mut transport = Self {
            audio,
            ticks,
            pattern: Pattern::default(),
            timeline: TimelineCache::new(StripWidths::default()),
            tempo: Tempo::default(),
            settings: SchedulerSettings::default(),
            session: None,
        };
        transport.refresh_timeline();
        transport
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.replace_pattern(pattern);
        self
    }

    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.set_tempo(tempo);
        self
    }

    pub fn with_widths(mut self, widths: StripWidths) -> Self {
        self.timeline = TimelineCache::new(widths);
        self.refresh_timeline();
        self.resync("layout change");
        self
    }

    pub fn with_scheduler_settings(mut self, settings: SchedulerSettings) -> Self {
        self.settings = settings;
        self.resync("scheduler settings change");
        self
    }

    /// Get current state
    pub fn state(&self) -> TransportState {
        if self.session.is_some() {
            TransportState::Playing
        } else {
            TransportState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    /// Current session (None while stopped)
    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Start playback; a no-op if already playing
    ///
    /// On a clock failure the transport stays stopped.
    pub fn start(&mut self) -> TransportResult<()> {
        if self.is_playing() {
            debug!("Start ignored: already playing");
            return Ok(());
        }

        self.audio.resume()?;
        self.ticks.subscribe();
        self.session = Some(self.new_session());

        info!(tempo = %self.tempo, events = self.timeline().len(), "Playback started");
        Ok(())
    }

    /// Stop playback; a no-op if already stopped
    ///
    /// Strums already handed to the audio sink (at most one lookahead window)
    /// still sound.
    pub fn stop(&mut self) {
        if self.session.take().is_none() {
            debug!("Stop ignored: already stopped");
            return;
        }

        self.ticks.cancel();
        self.audio.suspend();
        info!("Playback stopped");
    }

    /// Toggle play/stop
    pub fn toggle(&mut self) -> TransportResult<()> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Scheduling pass for one host frame
    pub fn tick(&mut self) -> TickReport {
        if !self.ticks.is_subscribed() {
            return TickReport::default();
        }
        let Some(session) = self.session.as_mut() else {
            return TickReport::default();
        };

        let now = self.audio.now();
        let timeline = self.timeline.get(&self.pattern);
        let rate = session.rate;
        session
            .scheduler
            .schedule(now, timeline, &rate, &mut self.audio)
    }

    /// Scroll offset now; 0 while stopped
    pub fn current_offset(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.offset(self.audio.now()))
            .unwrap_or(0.0)
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Change tempo; resyncs if playing and the tempo actually changed
    pub fn set_tempo(&mut self, tempo: Tempo) {
        if tempo == self.tempo {
            return;
        }
        self.tempo = tempo;
        self.resync("tempo change");
    }

    /// Current traversal rate
    pub fn rate(&self) -> Rate {
        resolve_rate(self.tempo, self.widths().step_width)
    }

    pub fn widths(&self) -> &StripWidths {
        self.timeline.widths()
    }

    pub fn scheduler_settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Read-only pattern snapshot
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Flattened timeline of the current pattern
    pub fn timeline(&self) -> &Timeline {
        self.timeline.cached()
    }

    /// Apply an editor mutation
    ///
    /// If the pattern changed, the timeline is re-flattened and a playing
    /// session is resynced.
    pub fn edit<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Pattern) -> R,
    {
        let revision = self.pattern.revision();
        let result = f(&mut self.pattern);

        if self.pattern.revision() != revision {
            self.refresh_timeline();
            self.resync("pattern edit");
        }
        result
    }

    /// Swap in a whole new pattern
    pub fn replace_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
        self.timeline.invalidate();
        self.refresh_timeline();
        self.resync("pattern replaced");
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut T {
        &mut self.ticks
    }

    fn refresh_timeline(&mut self) {
        self.timeline.get(&self.pattern);
    }

    fn new_session(&self) -> PlaybackSession {
        PlaybackSession::new(self.audio.now(), self.rate(), self.timeline(), self.settings)
    }

    /// Restart the playing session at the current clock time
    /// No phase is carried over
    fn resync(&mut self, reason: &str) {
        if self.session.is_none() {
            return;
        }
        let session = self.new_session();
        info!(
            reason,
            origin = session.origin_time(),
            tempo = %self.tempo,
            "Playback resynced"
        );
        self.session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternBlock, StepSymbol, Stroke};
    use crate::sequencer::clock::{ManualClock, ManualTicks};
    use StepSymbol::{Down as D, Rest as R, Up as U};

    fn transport_at(now: f64) -> Transport<ManualClock, ManualTicks> {
        Transport::new(ManualClock::starting_at(now), ManualTicks::new())
            .with_tempo(Tempo::new(120).unwrap())
    }

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Playing.is_playing());
        assert!(TransportState::Stopped.is_stopped());
        assert_eq!(TransportState::default(), TransportState::Stopped);
    }

    #[test]
    fn test_start_initializes_session() {
        let mut transport = transport_at(4.0);
        assert_eq!(transport.state(), TransportState::Stopped);

        transport.start().unwrap();
        assert_eq!(transport.state(), TransportState::Playing);
        assert!(transport.audio().is_running());
        assert!(transport.ticks().is_subscribed());

        let session = transport.session().unwrap();
        assert_eq!(session.origin_time(), 4.0);
        assert_eq!(session.cursor_event_index(), 0);
        assert_eq!(session.next_schedule_time(), 4.0);
        assert_eq!(session.cycle_length_units(), 2560.0);
        assert_eq!(session.rate().units_per_second(), 200.0);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut transport = transport_at(1.0);
        transport.start().unwrap();

        transport.audio_mut().advance(0.5);
        transport.start().unwrap();

        assert_eq!(transport.session().unwrap().origin_time(), 1.0);
        assert_eq!(transport.audio().resume_count(), 1);
    }

    #[test]
    fn test_stop() {
        let mut transport = transport_at(0.0);
        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopped);

        transport.start().unwrap();
        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(transport.session().is_none());
        assert!(!transport.audio().is_running());
        assert!(!transport.ticks().is_subscribed());

        // Ticks after stop schedule nothing
        transport.audio_mut().advance(1.0);
        assert_eq!(transport.tick().visited(), 0);
        assert_eq!(transport.current_offset(), 0.0);
    }

    #[test]
    fn test_start_with_unavailable_clock() {
        let mut transport = Transport::new(ManualClock::unavailable(), ManualTicks::new());

        let result = transport.start();
        assert!(matches!(result, Err(TransportError::Clock(_))));
        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(!transport.ticks().is_subscribed());

        transport.audio_mut().set_available(true);
        assert!(transport.start().is_ok());
        assert!(transport.is_playing());
    }

    #[test]
    fn test_tick_fires_strums() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();

        transport.tick();
        transport.audio_mut().set_time(0.2);
        transport.tick();

        let strokes: Vec<Stroke> = transport.audio().triggers().iter().map(|t| t.stroke).collect();
        // D . . U: only the first down and nothing else before 0.3
        assert_eq!(strokes, vec![Stroke::Down]);

        transport.audio_mut().set_time(0.7);
        transport.tick();
        let last = transport.audio().triggers().last().unwrap();
        assert_eq!(last.stroke, Stroke::Up);
        assert_eq!(last.at_time, 0.75);
    }

    #[test]
    fn test_tempo_change_resyncs() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();

        transport.audio_mut().set_time(1.3);
        transport.tick();
        assert!(transport.session().unwrap().cursor_event_index() > 0);

        transport.set_tempo(Tempo::new(90).unwrap());
        let session = transport.session().unwrap();
        assert_eq!(session.origin_time(), 1.3);
        assert_eq!(session.cursor_event_index(), 0);
        assert_eq!(transport.current_offset(), 0.0);

        // Next scheduled event is timeline index 0 (a Down) at the resync instant
        transport.audio_mut().drain_triggers();
        transport.tick();
        let first = transport.audio().triggers()[0];
        assert_eq!(first.stroke, Stroke::Down);
        assert_eq!(first.at_time, 1.3);
    }

    #[test]
    fn test_same_tempo_does_not_resync() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();
        transport.audio_mut().set_time(2.0);

        transport.set_tempo(Tempo::new(120).unwrap());
        assert_eq!(transport.session().unwrap().origin_time(), 0.0);
    }

    #[test]
    fn test_tempo_change_while_stopped() {
        let mut transport = transport_at(0.0);
        transport.set_tempo(Tempo::new(60).unwrap());
        assert!(transport.session().is_none());
        assert_eq!(transport.rate().units_per_second(), 100.0);
    }

    #[test]
    fn test_edit_reflattens_and_resyncs() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();
        transport.audio_mut().set_time(3.0);
        transport.tick();

        transport.edit(|p| p.append_block(vec![U, U], 1));

        assert_eq!(transport.timeline().len(), 52 + 3);
        let session = transport.session().unwrap();
        assert_eq!(session.origin_time(), 3.0);
        assert_eq!(session.cursor_event_index(), 0);
        assert_eq!(session.cycle_length_units(), 2560.0 + 140.0);
    }

    #[test]
    fn test_edit_replacing_whole_pattern_reflattens_and_resyncs() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();
        transport.audio_mut().set_time(3.0);
        transport.tick();
        assert!(transport.session().unwrap().cursor_event_index() > 0);

        transport.edit(|p| *p = Pattern::from_blocks(vec![PatternBlock::new(vec![U], 1)]));

        // One step plus its bar boundary
        assert_eq!(transport.timeline().len(), 2);
        let session = transport.session().unwrap();
        assert_eq!(session.origin_time(), 3.0);
        assert_eq!(session.cursor_event_index(), 0);
        assert_eq!(session.cycle_length_units(), 90.0);

        transport.audio_mut().drain_triggers();
        transport.tick();
        let first = transport.audio().triggers()[0];
        assert_eq!(first.stroke, Stroke::Up);
        assert_eq!(first.at_time, 3.0);
    }

    #[test]
    fn test_failed_edit_does_not_resync() {
        let mut transport = transport_at(0.0);
        transport.start().unwrap();
        transport.audio_mut().set_time(3.0);

        let result = transport.edit(|p| p.remove_block(9));
        assert!(result.is_err());
        assert_eq!(transport.session().unwrap().origin_time(), 0.0);
    }

    #[test]
    fn test_empty_pattern_plays_silently() {
        let mut transport = transport_at(0.0).with_pattern(Pattern::new());
        transport.start().unwrap();

        for i in 0..100 {
            transport.audio_mut().set_time(i as f64 * 0.016);
            assert_eq!(transport.tick().visited(), 0);
            assert_eq!(transport.current_offset(), 0.0);
        }
        assert!(transport.audio().triggers().is_empty());

        // Adding steps while playing brings it to life from index 0
        transport.edit(|p| {
            let block = p.append_block(vec![], 1);
            p.append_step(block, D).unwrap();
            p.append_step(block, R).unwrap();
        });
        let resynced_at = transport.audio().now();
        transport.tick();
        assert_eq!(transport.audio().triggers().len(), 1);
        assert_eq!(transport.audio().triggers()[0].at_time, resynced_at);
    }

    #[test]
    fn test_replace_pattern() {
        let mut transport = transport_at(0.0);
        let pattern = Pattern::from_blocks(vec![PatternBlock::new(vec![D, U], 3)]);
        transport.replace_pattern(pattern.clone());

        assert_eq!(transport.pattern(), &pattern);
        assert_eq!(transport.timeline().len(), 9);
    }

    #[test]
    fn test_toggle() {
        let mut transport = transport_at(0.0);
        transport.toggle().unwrap();
        assert!(transport.is_playing());
        transport.toggle().unwrap();
        assert!(!transport.is_playing());
    }
}

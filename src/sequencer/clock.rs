// Clock - Host capabilities the transport depends on
// An authoritative audio clock, a sink for timed triggers, and a coarse frame tick

use crate::audio::{AudioError, AudioResult};
use crate::pattern::Stroke;
use std::time::{Duration, Instant};

/// A strum to be sounded at an absolute audio-clock time (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub stroke: Stroke,
    pub at_time: f64,
}

/// Authoritative monotonic clock (seconds), queried by each tick
pub trait AudioClock {
    /// Current clock time in seconds
    fn now(&self) -> f64;

    /// Acquire or resume the clock; fails if the audio device is unavailable
    fn resume(&mut self) -> AudioResult<()>;

    /// Suspend the clock; already queued triggers are not cancelled
    fn suspend(&mut self);
}

/// Receiver of timed strum triggers (fire-and-forget)
pub trait TriggerSink {
    fn schedule_trigger(&mut self, trigger: Trigger);
}

/// Coarse periodic tick (typically one per display frame)
///
/// The host calls `Transport::tick` once per period while subscribed. No
/// guarantee is made about delivery time.
pub trait TickSource {
    fn subscribe(&mut self);
    fn cancel(&mut self);
    fn is_subscribed(&self) -> bool;
}

/// Synthetic clock + sink for tests and offline driving
///
/// Time only moves when told to. Every trigger is recorded.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: f64,
    running: bool,
    fail_resume: bool,
    resume_count: usize,
    triggers: Vec<Trigger>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at an arbitrary time
    pub fn starting_at(now: f64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Make every `resume` fail, as a denied audio device would
    pub fn unavailable() -> Self {
        Self {
            fail_resume: true,
            ..Self::default()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.fail_resume = !available;
    }

    /// Jump to an absolute time
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    /// Move time forward
    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn resume_count(&self) -> usize {
        self.resume_count
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Take recorded triggers, leaving the log empty
    pub fn drain_triggers(&mut self) -> Vec<Trigger> {
        std::mem::take(&mut self.triggers)
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn resume(&mut self) -> AudioResult<()> {
        if self.fail_resume {
            return Err(AudioError::DeviceUnavailable(
                "manual clock marked unavailable".to_string(),
            ));
        }
        self.running = true;
        self.resume_count += 1;
        Ok(())
    }

    fn suspend(&mut self) {
        self.running = false;
    }
}

impl TriggerSink for ManualClock {
    fn schedule_trigger(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }
}

/// Silent clock following wall time, paused while suspended
/// Triggers are only logged
#[derive(Debug, Clone)]
pub struct WallClock {
    elapsed_before_pause: Duration,
    resumed_at: Option<Instant>,
    triggered: u64,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            elapsed_before_pause: Duration::ZERO,
            resumed_at: None,
            triggered: 0,
        }
    }

    /// Number of triggers received so far
    pub fn triggered(&self) -> u64 {
        self.triggered
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for WallClock {
    fn now(&self) -> f64 {
        let running = self
            .resumed_at
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO);
        (self.elapsed_before_pause + running).as_secs_f64()
    }

    fn resume(&mut self) -> AudioResult<()> {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn suspend(&mut self) {
        if let Some(at) = self.resumed_at.take() {
            self.elapsed_before_pause += at.elapsed();
        }
    }
}

impl TriggerSink for WallClock {
    fn schedule_trigger(&mut self, trigger: Trigger) {
        self.triggered += 1;
        tracing::trace!(stroke = %trigger.stroke, at = trigger.at_time, "Silent trigger");
    }
}

/// Tick source driven by hand; tests call `Transport::tick` directly
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTicks {
    subscribed: bool,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSource for ManualTicks {
    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn cancel(&mut self) {
        self.subscribed = false;
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

/// Fixed-rate frame pacer for hosts without a display refresh callback
#[derive(Debug, Clone)]
pub struct FrameTicker {
    period: Duration,
    next_frame: Instant,
    subscribed: bool,
}

impl FrameTicker {
    /// Create a ticker firing `fps` times per second (at least once)
    pub fn new(fps: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        Self {
            period,
            next_frame: Instant::now(),
            subscribed: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the next frame is due
    /// Late frames are not caught up: the schedule restarts from now
    pub fn wait_next_frame(&mut self) {
        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
            self.next_frame += self.period;
        } else {
            self.next_frame = now + self.period;
        }
    }
}

impl TickSource for FrameTicker {
    fn subscribe(&mut self) {
        self.subscribed = true;
        self.next_frame = Instant::now();
    }

    fn cancel(&mut self) {
        self.subscribed = false;
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

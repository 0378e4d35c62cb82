// Audio engine - Real-time CPAL callback
//
// # Format Support
//
// The device's preferred sample format is detected through `sample_format()`
// and a stream of the matching type is built. Mixing always happens in f32 and
// is converted at write time through CPAL's `FromSample<f32>`:
// - **F32**: native, no conversion
// - **I16**: common on Windows/WASAPI
// - **U16**: rare
//
// # Clock
//
// The callback advances a shared frame counter after every buffer. That
// counter is the clock the transport schedules against, so it stops while the
// stream is paused.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::audio::dsp_utils::finish_sample;
use crate::audio::timing::AudioTiming;
use crate::audio::tone::StrumVoices;
use crate::audio::{AudioError, AudioResult};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, DEFAULT_COMMAND_CAPACITY, create_command_channel,
};
use crate::messaging::command::AudioCommand;
use crate::sequencer::clock::{AudioClock, Trigger, TriggerSink};

pub struct AudioEngine {
    _device: Device,
    stream: Stream,
    sample_rate: f32,
    channels: usize,
    timing: AudioTiming,
    healthy: Arc<AtomicBool>,
}

impl AudioEngine {
    /// Open the default output device and start streaming
    pub fn new(command_rx: CommandConsumer, volume: f32) -> AudioResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".into()))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        tracing::debug!(device = %device_name, ?sample_format, sample_rate, channels, "Audio config");

        let timing = AudioTiming::new(sample_rate as f64);
        let voices = StrumVoices::new(sample_rate, volume);
        let healthy = Arc::new(AtomicBool::new(true));

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                command_rx,
                voices,
                timing.clone(),
                Arc::clone(&healthy),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                command_rx,
                voices,
                timing.clone(),
                Arc::clone(&healthy),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                command_rx,
                voices,
                timing.clone(),
                Arc::clone(&healthy),
            ),
            other => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{:?}. Supported formats: F32, I16, U16",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        tracing::info!(device = %device_name, sample_rate, channels, "Audio engine started");

        Ok(Self {
            _device: device,
            stream,
            sample_rate,
            channels,
            timing,
            healthy,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Shared frame clock driven by the callback
    pub fn timing(&self) -> &AudioTiming {
        &self.timing
    }

    /// False once the error callback has fired
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn play(&self) -> AudioResult<()> {
        self.stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))
    }

    pub fn pause(&self) -> AudioResult<()> {
        self.stream
            .pause()
            .map_err(|e| AudioError::Stream(e.to_string()))
    }

    /// Build an output stream for any supported sample type
    ///
    /// The callback mixes in f32 and converts to `T` per frame.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut command_rx: CommandConsumer,
        mut voices: StrumVoices,
        timing: AudioTiming,
        healthy: Arc<AtomicBool>,
    ) -> AudioResult<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No blocking locks

                    while let Some(command) = command_rx.try_pop() {
                        voices.handle(command);
                    }

                    let start = timing.current_sample();
                    let mut frames = 0;
                    for frame in data.chunks_mut(channels) {
                        let sample = finish_sample(voices.next_sample(start + frames as u64));
                        let value = T::from_sample(sample);
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = value;
                        }
                        frames += 1;
                    }

                    timing.advance(frames);
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the audio callback, logging is fine here
                    tracing::error!(error = %err, "Audio stream error");
                    healthy.store(false, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))
    }
}

/// Audio-device backed clock and trigger sink for the transport
///
/// The device is opened lazily on the first `resume`, so constructing one never
/// touches the audio host.
pub struct CpalOutput {
    volume: f32,
    queue_capacity: usize,
    engine: Option<AudioEngine>,
    command_tx: Option<CommandProducer>,
    dropped_triggers: u64,
}

impl CpalOutput {
    pub fn new(volume: f32) -> Self {
        Self::with_capacity(volume, DEFAULT_COMMAND_CAPACITY)
    }

    pub fn with_capacity(volume: f32, queue_capacity: usize) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            queue_capacity,
            engine: None,
            command_tx: None,
            dropped_triggers: 0,
        }
    }

    pub fn engine(&self) -> Option<&AudioEngine> {
        self.engine.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Triggers lost to a full command queue
    pub fn dropped_triggers(&self) -> u64 {
        self.dropped_triggers
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(tx) = self.command_tx.as_mut()
            && tx.try_push(AudioCommand::SetVolume(self.volume)).is_err()
        {
            tracing::warn!("Command queue full, volume change lost");
        }
    }
}

impl AudioClock for CpalOutput {
    fn now(&self) -> f64 {
        self.engine
            .as_ref()
            .map(|engine| engine.timing().current_seconds())
            .unwrap_or(0.0)
    }

    fn resume(&mut self) -> AudioResult<()> {
        if let Some(engine) = &self.engine {
            return engine.play();
        }

        let (tx, rx) = create_command_channel(self.queue_capacity);
        let engine = AudioEngine::new(rx, self.volume)?;
        self.engine = Some(engine);
        self.command_tx = Some(tx);
        Ok(())
    }

    fn suspend(&mut self) {
        if let Some(engine) = &self.engine
            && let Err(e) = engine.pause()
        {
            tracing::warn!(error = %e, "Failed to pause audio stream");
        }
    }
}

impl TriggerSink for CpalOutput {
    fn schedule_trigger(&mut self, trigger: Trigger) {
        let (Some(engine), Some(tx)) = (self.engine.as_ref(), self.command_tx.as_mut()) else {
            return;
        };

        let command = AudioCommand::Strum {
            stroke: trigger.stroke,
            at_sample: engine.timing().seconds_to_samples(trigger.at_time),
        };

        if tx.try_push(command).is_err() {
            self.dropped_triggers += 1;
            tracing::warn!(stroke = %trigger.stroke, at = trigger.at_time, "Command queue full, strum dropped");
        }
    }
}

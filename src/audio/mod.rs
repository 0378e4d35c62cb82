// Audio module - CPAL backend, strum tones and the sample clock

pub mod dsp_utils;
pub mod engine;
pub mod timing;
pub mod tone;

pub use engine::{AudioEngine, CpalOutput};
pub use timing::AudioTiming;
pub use tone::{StrumSound, StrumVoices};

/// Audio backend errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio device available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

//! Audio demarshalling and buffering
//!
//! - PCM WAV decoding into normalized float samples
//! - External ffmpeg conversion for non-WAV uploads
//! - The front-prunable sample ring used by the streaming core

mod convert;
mod ring;
mod wav;

pub use convert::{check_ffmpeg_available, convert_to_wav};
pub use ring::AudioRing;
pub use wav::{decode_wav_content, f32_content_to_samples, looks_like_wav, pcm16_frame_to_f32, DecodedAudio};

use thiserror::Error;

/// Audio errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("malformed WAV content")]
    Malformed,

    #[error("failed to write temporary audio file: {0}")]
    TempWrite(#[source] std::io::Error),

    #[error("ffmpeg conversion failed: {0}")]
    ConverterFailed(String),

    #[error("failed to remove the original file: {0}")]
    RemoveFailed(#[source] std::io::Error),

    #[error("failed to rename the converted file: {0}")]
    RenameFailed(#[source] std::io::Error),

    #[error("failed to read converted audio: {0}")]
    ReadFailed(#[source] std::io::Error),
}

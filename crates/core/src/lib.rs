//! Core types for the murmur speech-to-text server
//!
//! This crate provides the foundational types used across all other crates:
//! - Decoded transcription segments and token metadata
//! - The exhaustive inference parameter record
//! - Audio constants shared by the decoder, the streaming core and the
//!   formatter

pub mod params;
pub mod segment;

pub use params::{parse_bool, InferenceParams};
pub use segment::{Segment, TokenInfo};

/// Sample rate every audio path operates at. Inbound audio at any other rate
/// must be resampled by the converter or refused.
pub const SAMPLE_RATE: usize = 16_000;

/// Samples per 10-ms timestamp unit (the engine reports t0/t1 in these).
pub const SAMPLES_PER_CENTISECOND: usize = SAMPLE_RATE / 100;

/// Convert a duration in milliseconds to a sample count at [`SAMPLE_RATE`].
pub const fn samples_for_ms(ms: usize) -> usize {
    ms * SAMPLE_RATE / 1000
}

/// Convert a sample count at [`SAMPLE_RATE`] to whole milliseconds.
pub const fn ms_for_samples(samples: usize) -> usize {
    samples * 1000 / SAMPLE_RATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_conversions() {
        assert_eq!(samples_for_ms(1000), 16_000);
        assert_eq!(samples_for_ms(1100), 17_600);
        assert_eq!(samples_for_ms(200), 3_200);
        assert_eq!(ms_for_samples(16_000), 1000);
        assert_eq!(ms_for_samples(8_000), 500);
    }
}

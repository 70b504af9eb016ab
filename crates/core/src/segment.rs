//! Transcription segment types produced by the inference engine

use serde::{Deserialize, Serialize};

/// A decoded transcription span.
///
/// Offsets are in 10-ms units, matching what the engine reports. Token
/// metadata is only populated when token timestamps were requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in 10-ms units
    pub t0: i64,

    /// End offset in 10-ms units
    pub t1: i64,

    /// Decoded text
    pub text: String,

    /// Per-token metadata (empty unless token timestamps were on)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<TokenInfo>,

    /// Probability that this span contains no speech
    #[serde(default)]
    pub no_speech_prob: f32,

    /// Model-native speaker-turn marker (tinydiarize models only)
    #[serde(default)]
    pub speaker_turn_next: bool,
}

impl Segment {
    /// Span duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.t1 - self.t0) as f64 * 0.01
    }
}

/// Per-token metadata within a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Vocabulary id
    pub id: i32,

    /// Token text
    pub text: String,

    /// Token probability
    pub p: f32,

    /// Token log-probability
    pub plog: f32,

    /// Inclusive start offset in 10-ms units
    pub t0: i64,

    /// Inclusive end offset in 10-ms units
    pub t1: i64,

    /// DTW-aligned offset in 10-ms units (-1 when alignment is off)
    pub t_dtw: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_duration() {
        let seg = Segment {
            t0: 100,
            t1: 350,
            text: "hello".into(),
            tokens: Vec::new(),
            no_speech_prob: 0.0,
            speaker_turn_next: false,
        };
        assert!((seg.duration_secs() - 2.5).abs() < f64::EPSILON);
    }
}

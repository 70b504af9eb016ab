//! Canonical PCM WAV demarshalling
//!
//! The decoder assumes a canonical 44-byte header followed by little-endian
//! signed 16-bit samples. Anything shorter than the header is malformed;
//! exactly the header is an empty (but valid) clip.

use crate::AudioError;

/// Byte length of a canonical PCM WAV header.
const WAV_HEADER_LEN: usize = 44;

/// Decoded audio: mono samples plus optional per-channel splits.
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    /// Interleaved samples normalized into [-1, 1]
    pub mono: Vec<f32>,

    /// De-interleaved stereo channels; empty unless stereo was requested and
    /// the sample count was even
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Duration of the mono track in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.mono.len() as f32 / murmur_core::SAMPLE_RATE as f32
    }

    /// Whether two usable channels were recovered.
    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }
}

/// Decode a WAV blob per the canonical-header contract.
pub fn decode_wav_content(content: &[u8], stereo: bool) -> Result<DecodedAudio, AudioError> {
    if content.len() < WAV_HEADER_LEN {
        return Err(AudioError::Malformed);
    }

    let data = &content[WAV_HEADER_LEN..];
    let n_samples = data.len() / 2;

    let mut mono = Vec::with_capacity(n_samples);
    for pair in data.chunks_exact(2) {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        mono.push(sample as f32 / 32768.0);
    }

    let mut channels = Vec::new();
    if stereo && n_samples % 2 == 0 {
        let half = n_samples / 2;
        let mut left = Vec::with_capacity(half);
        let mut right = Vec::with_capacity(half);
        for frame in mono.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        channels.push(left);
        channels.push(right);
    }

    Ok(DecodedAudio { mono, channels })
}

/// Convert one raw 16-bit LE PCM frame into floats.
///
/// Returns `None` for a frame whose byte count is not a multiple of two; the
/// streaming core skips such frames without touching the ring.
pub fn pcm16_frame_to_f32(payload: &[u8]) -> Option<Vec<f32>> {
    if payload.len() % 2 != 0 {
        return None;
    }
    Some(
        payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect(),
    )
}

/// Reinterpret a body of little-endian f32 samples (trailing partial sample
/// bytes are dropped).
pub fn f32_content_to_samples(content: &[u8]) -> Vec<f32> {
    content
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cheap sniff for a RIFF/WAVE container, used to decide whether an upload
/// needs the external converter.
pub fn looks_like_wav(content: &[u8]) -> bool {
    content.len() >= 12 && &content[0..4] == b"RIFF" && &content[8..12] == b"WAVE"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_blob(samples: &[i16]) -> Vec<u8> {
        let mut blob = vec![0u8; 44];
        blob[0..4].copy_from_slice(b"RIFF");
        blob[8..12].copy_from_slice(b"WAVE");
        for s in samples {
            blob.extend_from_slice(&s.to_le_bytes());
        }
        blob
    }

    #[test]
    fn test_short_blob_is_malformed() {
        let result = decode_wav_content(&[0u8; 43], false);
        assert!(matches!(result, Err(AudioError::Malformed)));
    }

    #[test]
    fn test_header_only_blob_is_empty_audio() {
        let decoded = decode_wav_content(&[0u8; 44], false).unwrap();
        assert!(decoded.mono.is_empty());
        assert!(decoded.channels.is_empty());
    }

    #[test]
    fn test_sample_count_law() {
        let blob = wav_blob(&[0i16; 1600]);
        let decoded = decode_wav_content(&blob, false).unwrap();
        assert_eq!(decoded.mono.len(), (blob.len() - 44) / 2);
    }

    #[test]
    fn test_samples_normalized() {
        let blob = wav_blob(&[i16::MIN, 0, i16::MAX]);
        let decoded = decode_wav_content(&blob, false).unwrap();
        assert_eq!(decoded.mono[0], -1.0);
        assert_eq!(decoded.mono[1], 0.0);
        assert!(decoded.mono[2] < 1.0 && decoded.mono[2] > 0.999);
    }

    #[test]
    fn test_stereo_deinterleave() {
        let blob = wav_blob(&[100, -100, 200, -200]);
        let decoded = decode_wav_content(&blob, true).unwrap();
        assert!(decoded.is_stereo());
        assert_eq!(decoded.channels[0].len(), 2);
        assert_eq!(decoded.channels[1].len(), 2);
        assert!(decoded.channels[0][0] > 0.0);
        assert!(decoded.channels[1][0] < 0.0);
    }

    #[test]
    fn test_stereo_skipped_for_odd_sample_count() {
        let blob = wav_blob(&[100, -100, 200]);
        let decoded = decode_wav_content(&blob, true).unwrap();
        assert!(!decoded.is_stereo());
        assert_eq!(decoded.mono.len(), 3);
    }

    #[test]
    fn test_pcm16_frame_odd_length_rejected() {
        assert!(pcm16_frame_to_f32(&[0, 1, 2]).is_none());
        let samples = pcm16_frame_to_f32(&[0, 0, 0, 0x40]).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_f32_content_roundtrip() {
        let mut bytes = Vec::new();
        for v in [0.5f32, -0.25, 1.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(0xFF); // trailing partial sample
        let samples = f32_content_to_samples(&bytes);
        assert_eq!(samples, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_wav_sniff() {
        assert!(looks_like_wav(&wav_blob(&[0; 4])));
        assert!(!looks_like_wav(b"ID3\x04rest-of-an-mp3-file"));
    }
}

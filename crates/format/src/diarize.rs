//! Two-channel energy diarization heuristic

use crate::timestamp::timestamp_to_sample;

/// Guess which of two speakers owns the span `[t0, t1]` by comparing
/// per-channel energy. Returns `"0"`, `"1"` or `"?"`, wrapped as
/// `(speaker X)` unless `id_only`.
pub fn estimate_speaker(channels: &[Vec<f32>], t0: i64, t1: i64, id_only: bool) -> String {
    let n_samples = channels[0].len();

    let is0 = timestamp_to_sample(t0, n_samples);
    let is1 = timestamp_to_sample(t1, n_samples);

    let mut energy0 = 0.0f64;
    let mut energy1 = 0.0f64;
    for j in is0..is1 {
        energy0 += channels[0][j].abs() as f64;
        energy1 += channels[1][j].abs() as f64;
    }

    let speaker = if energy0 > 1.1 * energy1 {
        "0"
    } else if energy1 > 1.1 * energy0 {
        "1"
    } else {
        "?"
    };

    if id_only {
        speaker.to_string()
    } else {
        format!("(speaker {speaker})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(left_level: f32, right_level: f32, n: usize) -> Vec<Vec<f32>> {
        vec![vec![left_level; n], vec![right_level; n]]
    }

    #[test]
    fn test_left_channel_dominant() {
        let channels = stereo(0.8, 0.1, 16_000);
        assert_eq!(estimate_speaker(&channels, 0, 100, false), "(speaker 0)");
        assert_eq!(estimate_speaker(&channels, 0, 100, true), "0");
    }

    #[test]
    fn test_right_channel_dominant() {
        let channels = stereo(0.1, 0.8, 16_000);
        assert_eq!(estimate_speaker(&channels, 0, 100, true), "1");
    }

    #[test]
    fn test_ambiguous_energy_within_ratio() {
        // 1.05x difference is inside the 1.1 deadband
        let channels = stereo(0.50, 0.525, 16_000);
        assert_eq!(estimate_speaker(&channels, 0, 100, true), "?");
    }

    #[test]
    fn test_offsets_clamped_to_buffer() {
        let channels = stereo(0.5, 0.1, 160);
        // t1 far past the end of the buffer
        assert_eq!(estimate_speaker(&channels, 0, 10_000, true), "0");
    }
}

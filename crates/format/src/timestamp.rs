//! Timestamp rendering and sample-offset conversion

use murmur_core::SAMPLES_PER_CENTISECOND;

/// Render an offset in 10-ms units as `HH:MM:SS,mmm` (SRT) or
/// `HH:MM:SS.mmm` (VTT).
pub fn format_timestamp(t: i64, comma: bool) -> String {
    let mut msec = t * 10;
    let hr = msec / (1000 * 60 * 60);
    msec -= hr * 1000 * 60 * 60;
    let min = msec / (1000 * 60);
    msec -= min * 1000 * 60;
    let sec = msec / 1000;
    msec -= sec * 1000;

    let sep = if comma { ',' } else { '.' };
    format!("{hr:02}:{min:02}:{sec:02}{sep}{msec:03}")
}

/// Convert a 10-ms offset to a sample index, clamped into the buffer.
pub fn timestamp_to_sample(t: i64, n_samples: usize) -> usize {
    let sample = t * SAMPLES_PER_CENTISECOND as i64;
    sample.clamp(0, n_samples.saturating_sub(1) as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_timestamp(0, true), "00:00:00,000");
        assert_eq!(format_timestamp(0, false), "00:00:00.000");
    }

    #[test]
    fn test_format_two_seconds() {
        assert_eq!(format_timestamp(200, true), "00:00:02,000");
    }

    #[test]
    fn test_format_carries_units() {
        // 1h 2m 3s 450ms = 372345 units of 10ms
        assert_eq!(format_timestamp(372_345, false), "01:02:03.450");
    }

    #[test]
    fn test_timestamp_to_sample_clamps() {
        assert_eq!(timestamp_to_sample(-5, 16_000), 0);
        assert_eq!(timestamp_to_sample(100, 16_000), 15_999);
        assert_eq!(timestamp_to_sample(50, 16_000), 8_000);
    }
}

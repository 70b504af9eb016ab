//! External ffmpeg conversion for non-WAV uploads
//!
//! The blob is spooled to a unique temporary file, converted to 16 kHz mono
//! PCM WAV by the ffmpeg executable, atomically renamed over the original,
//! decoded, and cleaned up. Each failure mode surfaces distinctly.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::wav::{decode_wav_content, DecodedAudio};
use crate::AudioError;

/// Check that the ffmpeg executable is reachable. Called once at startup
/// when the converter flag is set.
pub fn check_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Convert an arbitrary audio blob to 16 kHz mono PCM and decode it.
pub fn convert_to_wav(blob: &[u8], stereo: bool) -> Result<DecodedAudio, AudioError> {
    let temp_path = PathBuf::from(format!("murmur-server-tmp-{}.wav", uuid::Uuid::new_v4()));
    let converted_path = temp_path.with_extension("wav_temp.wav");

    fs::write(&temp_path, blob).map_err(AudioError::TempWrite)?;

    let result = run_conversion(&temp_path, &converted_path, stereo);

    // best-effort cleanup regardless of outcome
    let _ = fs::remove_file(&temp_path);
    let _ = fs::remove_file(&converted_path);

    result
}

fn run_conversion(
    temp_path: &PathBuf,
    converted_path: &PathBuf,
    stereo: bool,
) -> Result<DecodedAudio, AudioError> {
    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(temp_path)
        .arg("-y")
        .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
        .arg(converted_path)
        .output()
        .map_err(|e| AudioError::ConverterFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!("ffmpeg conversion failed: {}", stderr.trim());
        return Err(AudioError::ConverterFailed(format!(
            "ffmpeg exited with {}",
            output.status
        )));
    }

    fs::remove_file(temp_path).map_err(AudioError::RemoveFailed)?;
    fs::rename(converted_path, temp_path).map_err(AudioError::RenameFailed)?;

    let content = fs::read(temp_path).map_err(AudioError::ReadFailed)?;
    decode_wav_content(&content, stereo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_garbage_fails_without_panicking() {
        // With no real media in the blob, either ffmpeg is absent
        // (ConverterFailed on spawn/output) or it rejects the input.
        let result = convert_to_wav(b"definitely not audio", false);
        assert!(result.is_err());
    }
}

//! Inference parameter record
//!
//! One exhaustive configuration struct shared by the CLI, the per-request
//! multipart overlay and the engine invocation. Requests operate on a clone
//! of the server defaults, so per-request state can never leak between
//! callers.

use serde::{Deserialize, Serialize};

/// Full parameter set for one inference invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceParams {
    /// Threads used during computation
    pub n_threads: i32,

    /// Time offset in milliseconds
    pub offset_t_ms: i32,

    /// Segment index offset for SRT numbering
    pub offset_n: i32,

    /// Duration of audio to process in milliseconds (0 = all)
    pub duration_ms: i32,

    /// Maximum text context tokens to carry (-1 = engine default)
    pub max_context: i32,

    /// Maximum segment length in characters (0 is substituted with 60 at
    /// invocation time)
    pub max_len: i32,

    /// Greedy candidates to keep
    pub best_of: i32,

    /// Beam width; beam search is used only when > 1
    pub beam_size: i32,

    /// Mel frames of audio context to use (0 = all)
    pub audio_ctx: i32,

    /// Word timestamp probability threshold
    pub word_thold: f32,

    /// Entropy threshold for decoder failure
    pub entropy_thold: f32,

    /// Log-probability threshold for decoder failure
    pub logprob_thold: f32,

    /// Initial sampling temperature
    pub temperature: f32,

    /// Temperature fallback step; 0 disables fallback
    pub temperature_inc: f32,

    /// No-speech probability threshold
    pub no_speech_thold: f32,

    pub debug_mode: bool,
    pub translate: bool,
    pub detect_language: bool,

    /// Stereo energy-heuristic diarization
    pub diarize: bool,

    /// Model-native speaker-turn tokens; mutually exclusive with `diarize`
    pub tinydiarize: bool,

    pub split_on_word: bool,
    pub no_timestamps: bool,

    /// Suppress non-speech tokens during decoding
    pub suppress_nst: bool,

    /// Spoken language tag, or "auto" to detect
    pub language: String,

    /// Initial prompt text
    pub prompt: String,

    /// Requested response format name (resolved by the formatter)
    pub response_format: String,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            n_threads: default_threads(),
            offset_t_ms: 0,
            offset_n: 0,
            duration_ms: 0,
            max_context: -1,
            max_len: 0,
            best_of: 2,
            beam_size: -1,
            audio_ctx: 0,
            word_thold: 0.01,
            entropy_thold: 2.40,
            logprob_thold: -1.00,
            temperature: 0.0,
            temperature_inc: 0.2,
            no_speech_thold: 0.6,
            debug_mode: false,
            translate: false,
            detect_language: false,
            diarize: true,
            tinydiarize: false,
            split_on_word: false,
            no_timestamps: false,
            suppress_nst: false,
            language: "en".to_string(),
            prompt: String::new(),
            response_format: "json".to_string(),
        }
    }
}

fn default_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
        .min(4)
}

impl InferenceParams {
    /// Effective maximum segment length: 0 means the historical default of 60.
    pub fn effective_max_len(&self) -> i32 {
        if self.max_len == 0 {
            60
        } else {
            self.max_len
        }
    }

    /// Whether beam search rather than greedy decoding applies.
    pub fn use_beam_search(&self) -> bool {
        self.beam_size > 1
    }
}

/// Lenient boolean coercion used by request parameter parts.
pub fn parse_bool(s: &str) -> bool {
    matches!(s, "true" | "1" | "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_startup_values() {
        let p = InferenceParams::default();
        assert_eq!(p.best_of, 2);
        assert_eq!(p.beam_size, -1);
        assert!(!p.use_beam_search());
        assert_eq!(p.language, "en");
        assert!((p.entropy_thold - 2.4).abs() < f32::EPSILON);
        assert!((p.temperature_inc - 0.2).abs() < f32::EPSILON);
        assert!(p.diarize);
        assert!(!p.tinydiarize);
    }

    #[test]
    fn test_max_len_zero_substitution() {
        let mut p = InferenceParams::default();
        assert_eq!(p.effective_max_len(), 60);
        p.max_len = 32;
        assert_eq!(p.effective_max_len(), 32);
    }

    #[test]
    fn test_parse_bool_accepted_spellings() {
        for s in ["true", "1", "yes", "y"] {
            assert!(parse_bool(s), "{s} should parse as true");
        }
        for s in ["false", "0", "no", "n", "TRUE", ""] {
            assert!(!parse_bool(s), "{s} should parse as false");
        }
    }
}

//! Low-latency parameter profiles for the streaming paths

/// Parameter profile for a streaming inference pass.
///
/// The batch path carries the full [`murmur_core::InferenceParams`] record;
/// streaming passes use these trimmed profiles tuned for latency instead.
#[derive(Debug, Clone)]
pub struct HotParams {
    pub language: String,
    pub translate: bool,
    pub n_threads: i32,
    /// Text context tokens; negative keeps the engine default
    pub max_text_ctx: i32,
    pub audio_ctx: i32,
    /// Token cap per pass; 0 disables the cap
    pub max_tokens: i32,
    pub word_thold: f32,
    /// Max characters per segment; 0 disables the split
    pub max_len: i32,
    pub split_on_word: bool,
    pub entropy_thold: f32,
    pub logprob_thold: f32,
    pub no_speech_thold: f32,
    pub no_timestamps: bool,
    pub suppress_nst: bool,
    pub print_special: bool,
}

impl HotParams {
    /// Profile for the WebSocket realtime path: greedy, two threads, a
    /// 64-token text window, raised entropy threshold and relaxed logprob
    /// threshold for speed.
    pub fn realtime() -> Self {
        Self {
            language: "en".to_string(),
            translate: false,
            n_threads: 2,
            max_text_ctx: 64,
            audio_ctx: 0,
            max_tokens: 0,
            word_thold: 0.05,
            max_len: 32,
            split_on_word: true,
            entropy_thold: 3.0,
            logprob_thold: -0.5,
            no_speech_thold: 0.6,
            no_timestamps: true,
            suppress_nst: true,
            print_special: false,
        }
    }

    /// Profile for the chunked HTTP hot path: like [`realtime`], but with a
    /// wider 128-token text window and the configured audio context.
    ///
    /// [`realtime`]: HotParams::realtime
    pub fn chunked(language: &str, translate: bool, audio_ctx: i32, max_tokens: i32) -> Self {
        Self {
            language: language.to_string(),
            translate,
            max_text_ctx: 128,
            audio_ctx,
            max_tokens,
            ..Self::realtime()
        }
    }

    /// Pass-through profile for the legacy cold `/stream` endpoint: engine
    /// defaults with only language and threads applied.
    pub fn passthrough(language: &str, n_threads: i32) -> Self {
        Self {
            language: language.to_string(),
            translate: false,
            n_threads,
            max_text_ctx: -1,
            audio_ctx: 0,
            max_tokens: 0,
            word_thold: 0.01,
            max_len: 0,
            split_on_word: false,
            entropy_thold: 2.4,
            logprob_thold: -1.0,
            no_speech_thold: 0.6,
            no_timestamps: false,
            suppress_nst: false,
            print_special: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_profile_is_low_latency() {
        let p = HotParams::realtime();
        assert_eq!(p.n_threads, 2);
        assert_eq!(p.max_text_ctx, 64);
        assert!(p.no_timestamps);
        assert!(p.suppress_nst);
        assert!(p.entropy_thold > 2.4);
        assert!(p.logprob_thold > -1.0);
    }

    #[test]
    fn test_chunked_profile_widens_context() {
        let p = HotParams::chunked("en", false, 768, 32);
        assert_eq!(p.max_text_ctx, 128);
        assert_eq!(p.audio_ctx, 768);
        assert_eq!(p.max_tokens, 32);
    }
}

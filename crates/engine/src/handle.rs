//! Opaque handle over one loaded inference model

use whisper_rs::{
    DtwMode, DtwParameters, FullParams, SamplingStrategy, WhisperContext,
    WhisperContextParameters,
};

use murmur_core::{InferenceParams, Segment, TokenInfo};

use crate::abort::AbortFlag;
use crate::dtw::DtwPreset;
use crate::language::lang_full_name;
use crate::params::HotParams;
use crate::EngineError;

/// Model load options.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub use_gpu: bool,
    pub flash_attn: bool,
    pub dtw: Option<DtwPreset>,
}

/// Result of one batch inference pass.
#[derive(Debug)]
pub struct TranscribeOutput {
    pub segments: Vec<Segment>,
    /// Full name of the language the engine settled on
    pub language: &'static str,
}

/// Opaque reference to a loaded model plus its load options.
///
/// A handle is owned exclusively by one serialization domain; nothing here
/// is synchronized.
pub struct EngineHandle {
    ctx: WhisperContext,
    model_path: String,
    options: EngineOptions,
    abort: AbortFlag,
}

impl EngineHandle {
    /// Load a model from a file. Fails fatally at the call site when the
    /// file is missing or the format is unreadable.
    pub fn load(path: &str, options: EngineOptions) -> Result<Self, EngineError> {
        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(options.use_gpu);
        ctx_params.flash_attn(options.flash_attn);
        if let Some(preset) = options.dtw {
            ctx_params.dtw_parameters(DtwParameters {
                mode: DtwMode::ModelPreset {
                    model_preset: preset.to_model_preset(),
                },
                ..Default::default()
            });
        }

        let ctx = WhisperContext::new_with_params(path, ctx_params).map_err(|e| {
            EngineError::InitFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(model = path, gpu = options.use_gpu, "model initialized");

        Ok(Self {
            ctx,
            model_path: path.to_string(),
            options,
            abort: AbortFlag::new(),
        })
    }

    /// Reload this handle from a new model file, keeping the load options.
    /// The previous model is freed by the swap. Callers treat a failed
    /// reload as fatal; there is no fallback path.
    pub fn reload(&mut self, path: &str) -> Result<(), EngineError> {
        let options = self.options.clone();
        *self = Self::load(path, options)?;
        Ok(())
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn is_multilingual(&self) -> bool {
        self.ctx.is_multilingual()
    }

    /// Run one full inference with the complete user-configured parameter
    /// record. `collect_tokens` materializes per-token metadata for the
    /// verbose response shape.
    pub fn transcribe_batch(
        &self,
        params: &InferenceParams,
        collect_tokens: bool,
        samples: &[f32],
    ) -> Result<TranscribeOutput, EngineError> {
        let strategy = if params.use_beam_search() {
            SamplingStrategy::BeamSearch {
                beam_size: params.beam_size,
                patience: -1.0,
            }
        } else {
            SamplingStrategy::Greedy {
                best_of: params.best_of,
            }
        };

        let language = if params.detect_language {
            "auto"
        } else {
            params.language.as_str()
        };

        let mut fp = FullParams::new(strategy);
        fp.set_print_realtime(false);
        fp.set_print_progress(false);
        fp.set_print_timestamps(!params.no_timestamps);
        fp.set_print_special(false);
        fp.set_translate(params.translate);
        fp.set_language(Some(language));
        fp.set_n_threads(params.n_threads);
        if params.max_context >= 0 {
            fp.set_n_max_text_ctx(params.max_context);
        }
        fp.set_offset_ms(params.offset_t_ms);
        fp.set_duration_ms(params.duration_ms);
        fp.set_thold_pt(params.word_thold);
        fp.set_max_len(params.effective_max_len());
        fp.set_split_on_word(params.split_on_word);
        fp.set_audio_ctx(params.audio_ctx);
        fp.set_tdrz_enable(params.tinydiarize);
        if !params.prompt.is_empty() {
            fp.set_initial_prompt(&params.prompt);
        }
        fp.set_temperature(params.temperature);
        fp.set_temperature_inc(params.temperature_inc);
        fp.set_entropy_thold(params.entropy_thold);
        fp.set_logprob_thold(params.logprob_thold);
        fp.set_no_speech_thold(params.no_speech_thold);
        fp.set_no_timestamps(params.no_timestamps);
        fp.set_token_timestamps(collect_tokens && !params.no_timestamps);
        fp.set_suppress_nst(params.suppress_nst);
        self.install_abort_hook(&mut fp);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| EngineError::StateFailed(e.to_string()))?;

        state
            .full(fp, samples)
            .map_err(|_| EngineError::InferenceFailed)?;

        let segments = self.collect_segments(&state, collect_tokens);
        let lang_id = state.full_lang_id_from_state();

        Ok(TranscribeOutput {
            segments,
            language: lang_full_name(lang_id),
        })
    }

    /// Run one low-latency streaming pass with a trimmed parameter profile.
    pub fn transcribe_hot(
        &self,
        hot: &HotParams,
        samples: &[f32],
    ) -> Result<Vec<Segment>, EngineError> {
        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        fp.set_print_realtime(false);
        fp.set_print_progress(false);
        fp.set_print_timestamps(false);
        fp.set_print_special(hot.print_special);
        fp.set_translate(hot.translate);
        fp.set_language(Some(&hot.language));
        fp.set_n_threads(hot.n_threads);
        if hot.max_text_ctx >= 0 {
            fp.set_n_max_text_ctx(hot.max_text_ctx);
        }
        fp.set_offset_ms(0);
        fp.set_duration_ms(0);
        fp.set_thold_pt(hot.word_thold);
        fp.set_max_len(hot.max_len);
        fp.set_max_tokens(hot.max_tokens);
        fp.set_split_on_word(hot.split_on_word);
        fp.set_audio_ctx(hot.audio_ctx);
        fp.set_temperature(0.0);
        fp.set_temperature_inc(0.0);
        fp.set_entropy_thold(hot.entropy_thold);
        fp.set_logprob_thold(hot.logprob_thold);
        fp.set_no_speech_thold(hot.no_speech_thold);
        fp.set_no_timestamps(hot.no_timestamps);
        fp.set_token_timestamps(false);
        fp.set_suppress_nst(hot.suppress_nst);
        self.install_abort_hook(&mut fp);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| EngineError::StateFailed(e.to_string()))?;

        state
            .full(fp, samples)
            .map_err(|_| EngineError::InferenceFailed)?;

        Ok(self.collect_segments(&state, false))
    }

    fn install_abort_hook(&self, fp: &mut FullParams) {
        let flag = self.abort.clone();
        let abort_callback: Box<dyn FnMut() -> bool> = Box::new(move || flag.is_set());
        fp.set_abort_callback_safe::<_, Box<dyn FnMut() -> bool>>(Some(abort_callback));
    }

    fn collect_segments(
        &self,
        state: &whisper_rs::WhisperState,
        collect_tokens: bool,
    ) -> Vec<Segment> {
        let eot = self.ctx.token_eot();
        let n_segments = state.full_n_segments();
        let mut segments = Vec::with_capacity(n_segments as usize);

        for i in 0..n_segments {
            let Some(segment) = state.get_segment(i) else {
                continue;
            };
            let text = match segment.to_str_lossy() {
                Ok(t) => t.into_owned(),
                Err(_) => continue,
            };

            let mut tokens = Vec::new();
            if collect_tokens {
                for j in 0..segment.n_tokens() {
                    let Some(token) = segment.get_token(j) else {
                        continue;
                    };
                    let data = token.token_data();
                    // tokens at or past the end-of-text sentinel are control
                    // tokens, not words
                    if data.id >= eot {
                        continue;
                    }
                    let token_text = match token.to_str_lossy() {
                        Ok(t) => t.into_owned(),
                        Err(_) => continue,
                    };
                    tokens.push(TokenInfo {
                        id: data.id,
                        text: token_text,
                        p: data.p,
                        plog: data.plog,
                        t0: data.t0,
                        t1: data.t1,
                        t_dtw: data.t_dtw,
                    });
                }
            }

            segments.push(Segment {
                t0: segment.start_timestamp(),
                t1: segment.end_timestamp(),
                text,
                tokens,
                no_speech_prob: segment.no_speech_probability(),
                speaker_turn_next: segment.speaker_turn_next(),
            });
        }

        segments
    }
}

//! Command-line surface
//!
//! Flags mirror the historical usage banner; the old multi-character short
//! spellings survive as long aliases (`--ot`, `--bo`, ...). Hot-path flags
//! that collided with their cold-path twins in the old parser are
//! disambiguated with a `hot-` prefix.

use clap::error::ErrorKind;
use clap::Parser;

use murmur_config::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "murmur-server",
    version,
    about = "Dual-path speech-to-text server: batch HTTP, chunked streaming and realtime WebSocket transcription"
)]
pub struct Args {
    /// number of threads to use during computation
    #[arg(short = 't', long)]
    threads: Option<i32>,

    /// time offset in milliseconds
    #[arg(long = "offset-t", alias = "ot")]
    offset_t: Option<i32>,

    /// segment index offset
    #[arg(long = "offset-n", alias = "on")]
    offset_n: Option<i32>,

    /// duration of audio to process in milliseconds
    #[arg(short = 'd', long)]
    duration: Option<i32>,

    /// maximum number of text context tokens to store
    #[arg(long = "max-context", alias = "mc")]
    max_context: Option<i32>,

    /// maximum segment length in characters
    #[arg(long = "max-len", alias = "ml")]
    max_len: Option<i32>,

    /// split on word rather than on token
    #[arg(long = "split-on-word", alias = "sow")]
    split_on_word: bool,

    /// number of best candidates to keep
    #[arg(long = "best-of", alias = "bo")]
    best_of: Option<i32>,

    /// beam size for beam search
    #[arg(long = "beam-size", alias = "bs")]
    beam_size: Option<i32>,

    /// audio context size (0 - all)
    #[arg(long = "audio-ctx", alias = "ac")]
    audio_ctx: Option<i32>,

    /// word timestamp probability threshold
    #[arg(long = "word-thold", alias = "wt")]
    word_thold: Option<f32>,

    /// entropy threshold for decoder fail
    #[arg(long = "entropy-thold", alias = "et")]
    entropy_thold: Option<f32>,

    /// log probability threshold for decoder fail
    #[arg(long = "logprob-thold", alias = "lpt")]
    logprob_thold: Option<f32>,

    /// enable debug mode
    #[arg(long = "debug-mode", alias = "debug")]
    debug_mode: bool,

    /// translate from source language to english
    #[arg(long, alias = "tr")]
    translate: bool,

    /// stereo audio diarization
    #[arg(long, alias = "di")]
    diarize: bool,

    /// enable tinydiarize (requires a tdrz model)
    #[arg(long, alias = "tdrz")]
    tinydiarize: bool,

    /// do not use temperature fallback while decoding
    #[arg(long = "no-fallback", alias = "nf")]
    no_fallback: bool,

    /// do not print timestamps
    #[arg(long = "no-timestamps", alias = "nt")]
    no_timestamps: bool,

    /// spoken language ('auto' for auto-detect)
    #[arg(short = 'l', long)]
    language: Option<String>,

    /// exit after automatically detecting language
    #[arg(long = "detect-language", alias = "dl")]
    detect_language: bool,

    /// initial prompt
    #[arg(long)]
    prompt: Option<String>,

    /// cold path model path
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// compute token-level timestamps with the named DTW preset
    #[arg(long)]
    dtw: Option<String>,

    /// disable GPU inference
    #[arg(long = "no-gpu", alias = "ng")]
    no_gpu: bool,

    /// enable flash attention
    #[arg(long = "flash-attn", alias = "fa")]
    flash_attn: bool,

    /// suppress non-speech tokens
    #[arg(long = "suppress-nst", alias = "sns")]
    suppress_nst: bool,

    /// no speech threshold
    #[arg(long = "no-speech-thold", alias = "nth")]
    no_speech_thold: Option<f32>,

    /// hostname or ip address for the server
    #[arg(long)]
    host: Option<String>,

    /// port number for the server
    #[arg(long)]
    port: Option<u16>,

    /// path to the public folder
    #[arg(long)]
    public: Option<String>,

    /// request path for all requests
    #[arg(long = "request-path")]
    request_path: Option<String>,

    /// inference path for all requests
    #[arg(long = "inference-path")]
    inference_path: Option<String>,

    /// convert audio to WAV, requires ffmpeg on the server
    #[arg(long)]
    convert: bool,

    /// read timeout in seconds
    #[arg(long = "read-timeout")]
    read_timeout: Option<u64>,

    /// write timeout in seconds
    #[arg(long = "write-timeout")]
    write_timeout: Option<u64>,

    // hot path params
    /// streaming step in milliseconds
    #[arg(long = "step-ms")]
    step_ms: Option<i32>,

    /// streaming window length in milliseconds
    #[arg(long = "length-ms")]
    length_ms: Option<i32>,

    /// audio tail kept between streaming passes in milliseconds
    #[arg(long = "keep-ms")]
    keep_ms: Option<i32>,

    /// max tokens per streaming pass
    #[arg(long = "max-tokens")]
    max_tokens: Option<i32>,

    /// hot path audio context
    #[arg(long = "hot-audio-ctx")]
    hot_audio_ctx: Option<i32>,

    /// vad threshold for the streaming decoder
    #[arg(long = "vad-thold")]
    vad_thold: Option<f32>,

    /// hot path model path
    #[arg(long = "hot-model")]
    hot_model: Option<String>,

    /// hot path spoken language
    #[arg(long = "hot-language")]
    hot_language: Option<String>,

    /// translate on the hot path
    #[arg(long = "hot-translate")]
    hot_translate: bool,

    /// disable GPU inference on the hot path
    #[arg(long = "hot-no-gpu")]
    hot_no_gpu: bool,
}

impl Args {
    /// Merge parsed flags onto the settings defaults.
    pub fn into_settings(self) -> Settings {
        let mut settings = Settings::default();

        let params = &mut settings.params;
        if let Some(v) = self.threads {
            params.n_threads = v;
        }
        if let Some(v) = self.offset_t {
            params.offset_t_ms = v;
        }
        if let Some(v) = self.offset_n {
            params.offset_n = v;
        }
        if let Some(v) = self.duration {
            params.duration_ms = v;
        }
        if let Some(v) = self.max_context {
            params.max_context = v;
        }
        if let Some(v) = self.max_len {
            params.max_len = v;
        }
        if let Some(v) = self.best_of {
            params.best_of = v;
        }
        if let Some(v) = self.beam_size {
            params.beam_size = v;
        }
        if let Some(v) = self.audio_ctx {
            params.audio_ctx = v;
        }
        if let Some(v) = self.word_thold {
            params.word_thold = v;
        }
        if let Some(v) = self.entropy_thold {
            params.entropy_thold = v;
        }
        if let Some(v) = self.logprob_thold {
            params.logprob_thold = v;
        }
        if let Some(v) = self.no_speech_thold {
            params.no_speech_thold = v;
        }
        if self.split_on_word {
            params.split_on_word = true;
        }
        if self.debug_mode {
            params.debug_mode = true;
        }
        if self.translate {
            params.translate = true;
        }
        if self.diarize {
            params.diarize = true;
        }
        if self.tinydiarize {
            params.tinydiarize = true;
        }
        if self.no_fallback {
            params.temperature_inc = 0.0;
        }
        if self.no_timestamps {
            params.no_timestamps = true;
        }
        if self.detect_language {
            params.detect_language = true;
        }
        if self.suppress_nst {
            params.suppress_nst = true;
        }
        if let Some(v) = self.language {
            params.language = v;
        }
        if let Some(v) = self.prompt {
            params.prompt = v;
        }

        let model = &mut settings.model;
        if let Some(v) = self.model {
            model.path = v;
        }
        if let Some(v) = self.dtw {
            model.dtw = v;
        }
        if self.no_gpu {
            model.use_gpu = false;
        }
        if self.flash_attn {
            model.flash_attn = true;
        }

        let server = &mut settings.server;
        if let Some(v) = self.host {
            server.host = v;
        }
        if let Some(v) = self.port {
            server.port = v;
        }
        if let Some(v) = self.public {
            server.public_path = v;
        }
        if let Some(v) = self.request_path {
            server.request_path = v;
        }
        if let Some(v) = self.inference_path {
            server.inference_path = v;
        }
        if self.convert {
            server.ffmpeg_converter = true;
        }
        if let Some(v) = self.read_timeout {
            server.read_timeout_secs = v;
        }
        if let Some(v) = self.write_timeout {
            server.write_timeout_secs = v;
        }

        let hot = &mut settings.hot;
        if let Some(v) = self.step_ms {
            hot.step_ms = v;
        }
        if let Some(v) = self.length_ms {
            hot.length_ms = v;
        }
        if let Some(v) = self.keep_ms {
            hot.keep_ms = v;
        }
        if let Some(v) = self.max_tokens {
            hot.max_tokens = v;
        }
        if let Some(v) = self.hot_audio_ctx {
            hot.audio_ctx = v;
        }
        if let Some(v) = self.vad_thold {
            hot.vad_thold = v;
        }
        if let Some(v) = self.hot_model {
            hot.model = v;
        }
        if let Some(v) = self.hot_language {
            hot.language = v;
        }
        if self.hot_translate {
            hot.translate = true;
        }
        if self.hot_no_gpu {
            hot.use_gpu = false;
        }

        settings
    }
}

/// Parse the process arguments. Help and version print and exit 0; an
/// invalid parse exits 1.
pub fn parse_settings() -> Settings {
    match Args::try_parse() {
        Ok(args) => args.into_settings(),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags() {
        let args = Args::try_parse_from(["murmur-server"]).unwrap();
        let settings = args.into_settings();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.params.best_of, 2);
        assert_eq!(settings.hot.length_ms, 2000);
    }

    #[test]
    fn test_long_flags() {
        let args = Args::try_parse_from([
            "murmur-server",
            "--port",
            "9000",
            "--model",
            "models/ggml-small.bin",
            "--beam-size",
            "5",
            "--translate",
            "--convert",
        ])
        .unwrap();
        let settings = args.into_settings();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.model.path, "models/ggml-small.bin");
        assert_eq!(settings.params.beam_size, 5);
        assert!(settings.params.translate);
        assert!(settings.server.ffmpeg_converter);
    }

    #[test]
    fn test_historical_aliases() {
        let args = Args::try_parse_from([
            "murmur-server",
            "--ot",
            "250",
            "--bo",
            "3",
            "--nth",
            "0.7",
        ])
        .unwrap();
        let settings = args.into_settings();
        assert_eq!(settings.params.offset_t_ms, 250);
        assert_eq!(settings.params.best_of, 3);
        assert!((settings.params.no_speech_thold - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_no_fallback_disables_temperature_step() {
        let args = Args::try_parse_from(["murmur-server", "--no-fallback"]).unwrap();
        let settings = args.into_settings();
        assert_eq!(settings.params.temperature_inc, 0.0);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(Args::try_parse_from(["murmur-server", "--definitely-not-a-flag"]).is_err());
    }
}

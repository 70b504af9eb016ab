//! Main settings module

use serde::{Deserialize, Serialize};

use murmur_core::InferenceParams;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Cold-path model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Hot-path (streaming) configuration
    #[serde(default)]
    pub hot: HotPathConfig,

    /// Default inference parameters, cloned per request
    #[serde(default)]
    pub params: InferenceParams,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.read_timeout_secs".to_string(),
                message: "read timeout must be positive".to_string(),
            });
        }
        if self.server.write_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.write_timeout_secs".to_string(),
                message: "write timeout must be positive".to_string(),
            });
        }
        if self.params.diarize && self.params.tinydiarize {
            return Err(ConfigError::InvalidValue {
                field: "params.tinydiarize".to_string(),
                message: "cannot use both diarize and tinydiarize".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request path prefix in front of every endpoint
    #[serde(default)]
    pub request_path: String,

    /// Inference path suffix
    #[serde(default = "default_inference_path")]
    pub inference_path: String,

    /// Static file root
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Read timeout in seconds
    #[serde(default = "default_timeout")]
    pub read_timeout_secs: u64,

    /// Write timeout in seconds
    #[serde(default = "default_timeout")]
    pub write_timeout_secs: u64,

    /// Convert non-WAV uploads with ffmpeg before decoding
    #[serde(default)]
    pub ffmpeg_converter: bool,

    /// Maximum live WebSocket sessions
    #[serde(default = "default_max_sessions")]
    pub ws_max_sessions: usize,

    /// Seconds of inactivity before a WebSocket session is reaped
    #[serde(default = "default_ws_idle_timeout")]
    pub ws_idle_timeout_secs: u64,
}

impl ServerConfig {
    /// WebSocket port, derived from the HTTP port.
    pub fn ws_port(&self) -> u16 {
        self.port + 1000
    }
}

/// Cold-path model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model file path
    #[serde(default = "default_cold_model")]
    pub path: String,

    #[serde(default = "default_true")]
    pub use_gpu: bool,

    #[serde(default)]
    pub flash_attn: bool,

    /// DTW alignment preset name; empty disables token-level alignment
    #[serde(default)]
    pub dtw: String,
}

/// Hot-path (streaming) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotPathConfig {
    /// Stride between inference passes in milliseconds
    #[serde(default = "default_step_ms")]
    pub step_ms: i32,

    /// Context window accumulated before triggering, in milliseconds
    #[serde(default = "default_length_ms")]
    pub length_ms: i32,

    /// Tail retained after an inference pass, in milliseconds
    #[serde(default)]
    pub keep_ms: i32,

    /// Maximum tokens per pass
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,

    /// Mel frames of audio context (0 = all)
    #[serde(default)]
    pub audio_ctx: i32,

    /// No-speech threshold for the streaming decoder
    #[serde(default = "default_vad_thold")]
    pub vad_thold: f32,

    #[serde(default)]
    pub translate: bool,

    #[serde(default = "default_true")]
    pub no_timestamps: bool,

    #[serde(default)]
    pub print_special: bool,

    #[serde(default = "default_true")]
    pub use_gpu: bool,

    /// Quantized streaming model path
    #[serde(default = "default_hot_model")]
    pub model: String,

    #[serde(default = "default_language")]
    pub language: String,
}

impl HotPathConfig {
    /// Overlay `STEP_MS` / `LENGTH_MS` environment variables onto the
    /// configured values. Unparseable values keep the prior setting.
    pub fn apply_env(&mut self) {
        if let Ok(step) = std::env::var("STEP_MS") {
            match step.parse() {
                Ok(v) => self.step_ms = v,
                Err(_) => tracing::warn!("ignoring unparseable STEP_MS={}", step),
            }
        }
        if let Ok(length) = std::env::var("LENGTH_MS") {
            match length.parse() {
                Ok(v) => self.length_ms = v,
                Err(_) => tracing::warn!("ignoring unparseable LENGTH_MS={}", length),
            }
        }
    }

    /// Short model name reported in hot-path responses.
    pub fn model_name(&self) -> String {
        std::path::Path::new(&self.model)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model.clone())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_inference_path() -> String {
    "/inference".to_string()
}
fn default_public_path() -> String {
    "public".to_string()
}
fn default_timeout() -> u64 {
    600
}
fn default_max_sessions() -> usize {
    10
}
fn default_ws_idle_timeout() -> u64 {
    60
}
fn default_cold_model() -> String {
    "models/ggml-base.en.bin".to_string()
}
fn default_hot_model() -> String {
    "models/ggml-tiny.en-q5_1.bin".to_string()
}
fn default_step_ms() -> i32 {
    256
}
fn default_length_ms() -> i32 {
    2000
}
fn default_max_tokens() -> i32 {
    32
}
fn default_vad_thold() -> f32 {
    0.6
}
fn default_language() -> String {
    "en".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_path: String::new(),
            inference_path: default_inference_path(),
            public_path: default_public_path(),
            read_timeout_secs: default_timeout(),
            write_timeout_secs: default_timeout(),
            ffmpeg_converter: false,
            ws_max_sessions: default_max_sessions(),
            ws_idle_timeout_secs: default_ws_idle_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_cold_model(),
            use_gpu: true,
            flash_attn: false,
            dtw: String::new(),
        }
    }
}

impl Default for HotPathConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            length_ms: default_length_ms(),
            keep_ms: 0,
            max_tokens: default_max_tokens(),
            audio_ctx: 0,
            vad_thold: default_vad_thold(),
            translate: false,
            no_timestamps: true,
            print_special: false,
            use_gpu: true,
            model: default_hot_model(),
            language: default_language(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_port_derivation() {
        let mut cfg = ServerConfig::default();
        assert_eq!(cfg.ws_port(), 9080);
        cfg.port = 3000;
        assert_eq!(cfg.ws_port(), 4000);
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut settings = Settings::default();
        settings.server.read_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_conflicting_diarization() {
        let mut settings = Settings::default();
        settings.params.diarize = true;
        settings.params.tinydiarize = true;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_hot_model_name() {
        let hot = HotPathConfig::default();
        assert_eq!(hot.model_name(), "ggml-tiny.en-q5_1");
    }
}

//! HTTP endpoints
//!
//! Route dispatch, multipart parsing, the per-request parameter overlay and
//! the legacy error taxonomy: input and engine errors answer 200 with a JSON
//! `{"error": …}` body, framework-level failures map to 400/404/500 text
//! bodies.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

use murmur_audio::{convert_to_wav, decode_wav_content, f32_content_to_samples, looks_like_wav};
use murmur_core::{parse_bool, samples_for_ms, InferenceParams, Segment};
use murmur_engine::HotParams;
use murmur_format::{
    render_json, render_srt, render_text, render_verbose_json, render_vtt, ResponseFormat,
};

use crate::state::AppState;
use crate::stream::{chunked_pass, ChunkedOutcome, REALTIME_TRIGGER_SAMPLES, STREAM_KEEP_SAMPLES};
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let prefix = state.settings.server.request_path.clone();
    let inference_path = format!("{}{}", prefix, state.settings.server.inference_path);
    let public_path = state.settings.server.public_path.clone();
    let read_timeout = Duration::from_secs(state.settings.server.read_timeout_secs);
    let write_timeout = Duration::from_secs(state.settings.server.write_timeout_secs);

    let static_files = ServeDir::new(public_path).not_found_service(not_found.into_service());

    Router::new()
        .route(&format!("{prefix}/"), get(landing))
        .route(&inference_path, post(inference).options(preflight))
        .route(&format!("{prefix}/stream"), post(stream))
        .route(&format!("{prefix}/hot_stream"), post(hot_stream))
        .route(&format!("{prefix}/load"), post(load))
        .fallback_service(static_files)
        // uploads are bounded by the read timeout, not a byte cap
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(write_timeout))
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .with_state(state)
}

/// Collected multipart parts: file payloads and parameter fields alike.
pub struct Parts {
    fields: HashMap<String, Bytes>,
}

impl Parts {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let data = field.bytes().await?;
            fields.insert(name, data);
        }
        Ok(Self { fields })
    }

    pub fn bytes(&self, name: &str) -> Option<&Bytes> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Overlay request parameter parts onto a per-request copy of the defaults.
/// User input is never trusted: a part that fails its numeric coercion keeps
/// the prior value.
pub fn overlay_params(parts: &Parts, params: &mut InferenceParams) {
    fn set_i32(parts: &Parts, name: &str, slot: &mut i32) {
        if let Some(v) = parts.text(name) {
            if let Ok(n) = v.trim().parse() {
                *slot = n;
            } else {
                tracing::warn!(field = name, value = %v, "invalid parameter value ignored");
            }
        }
    }
    fn set_f32(parts: &Parts, name: &str, slot: &mut f32) {
        if let Some(v) = parts.text(name) {
            if let Ok(n) = v.trim().parse() {
                *slot = n;
            } else {
                tracing::warn!(field = name, value = %v, "invalid parameter value ignored");
            }
        }
    }
    fn set_flag(parts: &Parts, name: &str, slot: &mut bool) {
        if let Some(v) = parts.text(name) {
            *slot = parse_bool(v.trim());
        }
    }

    set_i32(parts, "offset_t", &mut params.offset_t_ms);
    set_i32(parts, "offset_n", &mut params.offset_n);
    set_i32(parts, "duration", &mut params.duration_ms);
    set_i32(parts, "max_context", &mut params.max_context);
    set_i32(parts, "max_len", &mut params.max_len);
    set_i32(parts, "best_of", &mut params.best_of);
    set_i32(parts, "beam_size", &mut params.beam_size);
    set_i32(parts, "audio_ctx", &mut params.audio_ctx);
    set_f32(parts, "word_thold", &mut params.word_thold);
    set_f32(parts, "entropy_thold", &mut params.entropy_thold);
    set_f32(parts, "logprob_thold", &mut params.logprob_thold);
    set_flag(parts, "debug_mode", &mut params.debug_mode);
    set_flag(parts, "translate", &mut params.translate);
    set_flag(parts, "diarize", &mut params.diarize);
    set_flag(parts, "tinydiarize", &mut params.tinydiarize);
    set_flag(parts, "split_on_word", &mut params.split_on_word);
    set_flag(parts, "no_timestamps", &mut params.no_timestamps);
    if let Some(v) = parts.text("language") {
        params.language = v.trim().to_string();
    }
    set_flag(parts, "detect_language", &mut params.detect_language);
    if let Some(v) = parts.text("prompt") {
        params.prompt = v;
    }
    if let Some(v) = parts.text("response_format") {
        params.response_format = v.trim().to_string();
    }
    set_f32(parts, "temperature", &mut params.temperature);
    set_f32(parts, "temperature_inc", &mut params.temperature_inc);
    set_flag(parts, "suppress_non_speech", &mut params.suppress_nst);
    set_flag(parts, "suppress_nst", &mut params.suppress_nst);
}

/// Legacy-shaped error body: HTTP 200 with a JSON `error` field.
fn json_error(message: &str) -> Response {
    Json(json!({ "error": message })).into_response()
}

fn segments_response(outcome: ChunkedOutcome) -> Response {
    let segments: Vec<_> = outcome
        .segments
        .iter()
        .map(|s: &Segment| json!({ "text": s.text, "t0": s.t0, "t1": s.t1 }))
        .collect();
    Json(json!({
        "segments": segments,
        "buffer_size_ms": outcome.buffer_size_ms,
    }))
    .into_response()
}

async fn preflight() {}

/// Trap for anything a handler fails to catch itself.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let what = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown Exception".to_string()
    };
    tracing::error!(what = %what, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("500 Internal Server Error\n{what}"),
    )
        .into_response()
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("File Not Found ({})", uri.path()),
    )
}

/// Landing page with curl examples and a demo form.
async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(landing_html(state.settings.server.port))
}

/// Batch transcription on the cold domain.
async fn inference(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let parts = Parts::read(multipart).await?;

    let Some(file) = parts.bytes("file") else {
        tracing::warn!("inference request without 'file' field");
        return Ok(json_error("no 'file' field in the request"));
    };

    let mut params = state.settings.params.clone();
    overlay_params(&parts, &mut params);

    if params.diarize && params.tinydiarize {
        return Ok(json_error("cannot use both diarize and tinydiarize"));
    }

    tracing::info!(
        response_format = %params.response_format,
        language = %params.language,
        "processing inference request"
    );

    let decoded = if state.settings.server.ffmpeg_converter && !looks_like_wav(file) {
        match convert_to_wav(file, params.diarize) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "audio conversion failed");
                return Ok(json_error(&e.to_string()));
            }
        }
    } else {
        match decode_wav_content(file, params.diarize) {
            Ok(d) => d,
            Err(_) => return Ok(json_error("failed to read WAV file")),
        }
    };

    let engine = state.cold.acquire().await;

    if !engine.is_multilingual() && (params.language != "en" || params.translate) {
        params.language = "en".to_string();
        params.translate = false;
        tracing::warn!("model is not multilingual, ignoring language and translation options");
    }
    if params.detect_language {
        params.language = "auto".to_string();
    }

    tracing::info!(
        samples = decoded.mono.len(),
        seconds = decoded.duration_secs(),
        threads = params.n_threads,
        task = if params.translate { "translate" } else { "transcribe" },
        "running inference"
    );

    let format = ResponseFormat::from_name(&params.response_format);
    let collect_tokens = format == ResponseFormat::VerboseJson;

    let result =
        tokio::task::block_in_place(|| engine.transcribe_batch(&params, collect_tokens, &decoded.mono));
    drop(engine);

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "inference failed");
            return Ok(json_error("failed to process audio"));
        }
    };

    let channels = &decoded.channels;
    let body = match format {
        ResponseFormat::Text => render_text(&output.segments, &params, channels),
        ResponseFormat::Srt => render_srt(&output.segments, &params, channels),
        ResponseFormat::Vtt => render_vtt(&output.segments, &params, channels),
        ResponseFormat::Json => render_json(&output.segments, &params, channels).to_string(),
        ResponseFormat::VerboseJson => render_verbose_json(
            &output.segments,
            &params,
            channels,
            output.language,
            decoded.duration_secs(),
        )
        .to_string(),
    };

    Ok((
        [(header::CONTENT_TYPE, format.content_type())],
        body,
    )
        .into_response())
}

/// Chunked streaming on the cold domain (legacy `/stream`).
async fn stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let parts = Parts::read(multipart).await?;
    let Some(audio) = parts.bytes("audio") else {
        return Ok(json_error("no audio data"));
    };

    let samples = f32_content_to_samples(audio);
    let defaults = &state.settings.params;
    let params = HotParams::passthrough(&defaults.language, defaults.n_threads);

    match chunked_pass(
        &state.cold,
        &state.stream_ring,
        &samples,
        REALTIME_TRIGGER_SAMPLES,
        STREAM_KEEP_SAMPLES,
        &params,
    )
    .await
    {
        Ok(outcome) => Ok(segments_response(outcome)),
        Err(e) => {
            tracing::error!(error = %e, "stream inference failed");
            Ok(json_error("failed to process audio"))
        }
    }
}

/// Hot-path streaming: a `file` part runs one low-latency batch pass over a
/// WAV body; an `audio` part feeds the chunked accumulator.
async fn hot_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let parts = Parts::read(multipart).await?;
    let hot_cfg = &state.settings.hot;

    if let Some(file) = parts.bytes("file") {
        let decoded = match decode_wav_content(file, false) {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!("hot stream request with unreadable WAV body");
                return Ok(json_error("failed to read WAV file"));
            }
        };

        tracing::info!(
            samples = decoded.mono.len(),
            seconds = decoded.duration_secs(),
            "hot stream batch request"
        );

        let mut params = HotParams::chunked(&hot_cfg.language, hot_cfg.translate, hot_cfg.audio_ctx, 0);
        params.no_speech_thold = hot_cfg.vad_thold;
        params.n_threads = state.settings.params.n_threads.min(2);

        let engine = state.hot.acquire().await;
        let started = Instant::now();
        let result = tokio::task::block_in_place(|| engine.transcribe_hot(&params, &decoded.mono));
        drop(engine);
        let processing_time_ms = started.elapsed().as_millis() as u64;

        let segments = match result {
            Ok(segments) => segments,
            Err(e) => {
                tracing::error!(error = %e, "hot path inference failed");
                return Ok(json_error("hot path inference failed"));
            }
        };

        let text: String = segments.iter().map(|s| s.text.as_str()).collect();
        tracing::info!(text = %text, ms = processing_time_ms, "hot stream result");

        Ok(Json(json!({
            "text": text,
            "is_streaming": true,
            "model": hot_cfg.model_name(),
            "processing_time_ms": processing_time_ms,
            "segments": segments.len(),
        }))
        .into_response())
    } else if let Some(audio) = parts.bytes("audio") {
        let samples = f32_content_to_samples(audio);

        let mut params = HotParams::chunked(
            &hot_cfg.language,
            hot_cfg.translate,
            hot_cfg.audio_ctx,
            hot_cfg.max_tokens,
        );
        params.no_timestamps = hot_cfg.no_timestamps;
        params.print_special = hot_cfg.print_special;
        params.no_speech_thold = hot_cfg.vad_thold;

        let trigger = samples_for_ms(hot_cfg.length_ms.max(0) as usize);
        let keep = samples_for_ms(hot_cfg.keep_ms.max(0) as usize);

        match chunked_pass(&state.hot, &state.hot_ring, &samples, trigger, keep, &params).await {
            Ok(outcome) => Ok(segments_response(outcome)),
            Err(e) => {
                tracing::error!(error = %e, "hot stream inference failed");
                Ok(json_error("failed to process audio"))
            }
        }
    } else {
        Ok(json_error("no 'file' field in the request"))
    }
}

/// Hot-reload of the cold model. Holds the cold domain for the whole swap.
/// A failed reinitialization is fatal: there is no fallback to the previous
/// model.
async fn load(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ServerError> {
    let parts = Parts::read(multipart).await?;
    let Some(model) = parts.text("model") else {
        tracing::warn!("load request without 'model' field");
        return Ok(json_error("no 'model' field in the request"));
    };
    let model = model.trim().to_string();

    if !std::path::Path::new(&model).is_file() {
        tracing::warn!(model = %model, "requested model not found");
        return Ok(json_error("model not found!"));
    }

    let mut engine = state.cold.acquire().await;
    let result = tokio::task::block_in_place(|| engine.reload(&model));
    drop(engine);

    match result {
        Ok(()) => {
            tracing::info!(model = %model, "cold model reloaded");
            Ok((
                [(header::CONTENT_TYPE, "application/text")],
                "Load was successful!",
            )
                .into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "model init failed, no model loaded");
            std::process::exit(1);
        }
    }
}

fn landing_html(port: u16) -> String {
    format!(
        r#"<html>
<head>
    <title>murmur</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width">
    <style>
    body {{ font-family: sans-serif; }}
    form {{ display: flex; flex-direction: column; align-items: flex-start; }}
    label {{ margin-bottom: 0.5rem; }}
    input, select {{ margin-bottom: 1rem; }}
    button {{ margin-top: 1rem; }}
    </style>
</head>
<body>
    <h1>murmur</h1>

    <h2>/inference</h2>
    <pre>
curl 127.0.0.1:{port}/inference \
-H "Content-Type: multipart/form-data" \
-F file="@&lt;file-path&gt;" \
-F temperature="0.0" \
-F temperature_inc="0.2" \
-F response_format="json"
    </pre>

    <h2>/load</h2>
    <pre>
curl 127.0.0.1:{port}/load \
-H "Content-Type: multipart/form-data" \
-F model="&lt;path-to-model-file&gt;"
    </pre>

    <div>
        <h2>Try it out</h2>
        <form action="/inference" method="POST" enctype="multipart/form-data">
            <label for="file">Choose an audio file:</label>
            <input type="file" id="file" name="file" accept="audio/*" required><br>

            <label for="temperature">Temperature:</label>
            <input type="number" id="temperature" name="temperature" value="0.0" step="0.01" placeholder="e.g., 0.0"><br>

            <label for="response_format">Response Format:</label>
            <select id="response_format" name="response_format">
                <option value="verbose_json">Verbose JSON</option>
                <option value="json">JSON</option>
                <option value="text">Text</option>
                <option value="srt">SRT</option>
                <option value="vtt">VTT</option>
            </select><br>

            <button type="submit">Submit</button>
        </form>
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_from(pairs: &[(&str, &str)]) -> Parts {
        let mut fields = HashMap::new();
        for (k, v) in pairs {
            fields.insert(k.to_string(), Bytes::copy_from_slice(v.as_bytes()));
        }
        Parts { fields }
    }

    #[test]
    fn test_overlay_numeric_and_flag_fields() {
        let parts = parts_from(&[
            ("offset_t", "1500"),
            ("best_of", "5"),
            ("word_thold", "0.25"),
            ("translate", "yes"),
            ("no_timestamps", "1"),
            ("language", "de"),
            ("response_format", "srt"),
        ]);
        let mut params = InferenceParams::default();
        overlay_params(&parts, &mut params);

        assert_eq!(params.offset_t_ms, 1500);
        assert_eq!(params.best_of, 5);
        assert!((params.word_thold - 0.25).abs() < f32::EPSILON);
        assert!(params.translate);
        assert!(params.no_timestamps);
        assert_eq!(params.language, "de");
        assert_eq!(params.response_format, "srt");
    }

    #[test]
    fn test_overlay_bad_coercion_keeps_prior_value() {
        let parts = parts_from(&[("best_of", "not-a-number"), ("temperature", "warm")]);
        let mut params = InferenceParams::default();
        overlay_params(&parts, &mut params);

        assert_eq!(params.best_of, 2);
        assert_eq!(params.temperature, 0.0);
    }

    #[test]
    fn test_overlay_does_not_touch_absent_fields() {
        let parts = parts_from(&[]);
        let defaults = InferenceParams::default();
        let mut params = defaults.clone();
        overlay_params(&parts, &mut params);
        assert_eq!(params.best_of, defaults.best_of);
        assert_eq!(params.language, defaults.language);
    }

    #[test]
    fn test_suppress_non_speech_alias() {
        let parts = parts_from(&[("suppress_non_speech", "true")]);
        let mut params = InferenceParams::default();
        overlay_params(&parts, &mut params);
        assert!(params.suppress_nst);

        let parts = parts_from(&[("suppress_nst", "y")]);
        let mut params = InferenceParams::default();
        overlay_params(&parts, &mut params);
        assert!(params.suppress_nst);
    }

    #[test]
    fn test_landing_page_mentions_endpoints() {
        let html = landing_html(8080);
        assert!(html.contains("/inference"));
        assert!(html.contains("/load"));
        assert!(html.contains("127.0.0.1:8080"));
    }
}

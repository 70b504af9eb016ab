//! Streaming core
//!
//! The sliding-window trigger policy and inference plumbing shared by the
//! WebSocket realtime path and the chunked HTTP streaming endpoints. All
//! three modes differ only in framing:
//!
//! - WebSocket: trigger at 1.1 s, process the tail 1.1 s, retain 2 s.
//! - HTTP `/stream` (cold): trigger at 1.1 s, process the whole ring,
//!   retain a 200 ms tail.
//! - HTTP `/hot_stream` (hot): trigger at `length_ms`, process the whole
//!   ring, retain a `keep_ms` tail.
//!
//! The ring is pruned only after a successful pass; a failed pass leaves it
//! unchanged so the next frame retries naturally.

use parking_lot::Mutex;

use murmur_audio::AudioRing;
use murmur_core::{samples_for_ms, Segment};
use murmur_engine::{EngineError, HotParams, InferenceDomain};

use crate::session::Session;
use crate::state::AppState;

/// Samples that must accumulate before a realtime pass (1.1 s).
pub const REALTIME_TRIGGER_SAMPLES: usize = samples_for_ms(1100);

/// Ring tail retained after a realtime pass (2 s).
pub const REALTIME_WINDOW_SAMPLES: usize = samples_for_ms(2000);

/// Ring tail retained after a cold `/stream` pass (200 ms).
pub const STREAM_KEEP_SAMPLES: usize = samples_for_ms(200);

/// Run one realtime pass for a WebSocket session if the trigger predicate
/// holds. Returns the whitespace-stripped transcription, or `None` when the
/// window has not filled, inference failed, or the result was empty.
pub async fn realtime_pass(state: &AppState, session: &Session) -> Option<String> {
    let chunk: Vec<f32> = {
        let ring = session.ring.lock();
        if ring.len() < REALTIME_TRIGGER_SAMPLES {
            return None;
        }
        ring.tail(REALTIME_TRIGGER_SAMPLES).to_vec()
    };

    let hot_cfg = &state.settings.hot;
    let params = HotParams {
        language: hot_cfg.language.clone(),
        translate: hot_cfg.translate,
        no_speech_thold: hot_cfg.vad_thold,
        ..HotParams::realtime()
    };

    let engine = state.hot.acquire().await;
    let result = tokio::task::block_in_place(|| engine.transcribe_hot(&params, &chunk));
    drop(engine);

    let segments = match result {
        Ok(segments) => segments,
        Err(e) => {
            tracing::warn!(session = %session.id, error = %e, "realtime pass failed");
            return None;
        }
    };

    session.ring.lock().retain_tail(REALTIME_WINDOW_SAMPLES);

    let text: String = segments.iter().map(|s| s.text.as_str()).collect();
    let text = text.trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Outcome of one chunked streaming POST.
pub struct ChunkedOutcome {
    pub segments: Vec<Segment>,
    pub buffer_size_ms: usize,
}

/// Append samples to a chunked accumulator and run inference over the whole
/// ring once `trigger` samples have built up. The residual ring size is
/// reported either way.
pub async fn chunked_pass(
    domain: &InferenceDomain,
    ring: &Mutex<AudioRing>,
    samples: &[f32],
    trigger: usize,
    keep: usize,
    params: &HotParams,
) -> Result<ChunkedOutcome, EngineError> {
    // The domain lock also serializes ring access across requests on the
    // same endpoint.
    let engine = domain.acquire().await;

    let buffered: Vec<f32> = {
        let mut ring = ring.lock();
        ring.push(samples);
        if ring.len() < trigger {
            return Ok(ChunkedOutcome {
                segments: Vec::new(),
                buffer_size_ms: ring.duration_ms(),
            });
        }
        ring.samples().to_vec()
    };

    let result = tokio::task::block_in_place(|| engine.transcribe_hot(params, &buffered));
    drop(engine);

    let segments = result?;

    let mut ring = ring.lock();
    ring.retain_tail(keep);

    Ok(ChunkedOutcome {
        buffer_size_ms: ring.duration_ms(),
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_constants() {
        assert_eq!(REALTIME_TRIGGER_SAMPLES, 17_600);
        assert_eq!(REALTIME_WINDOW_SAMPLES, 32_000);
        assert_eq!(STREAM_KEEP_SAMPLES, 3_200);
    }

    #[test]
    fn test_ring_below_trigger_accumulates() {
        // the chunked pre-check mirrors this: below the trigger no inference
        // runs and the ring keeps everything
        let ring = Mutex::new(AudioRing::new());
        ring.lock().push(&vec![0.0; 16_000]);
        assert!(ring.lock().len() < REALTIME_TRIGGER_SAMPLES);
        assert_eq!(ring.lock().duration_ms(), 1000);
    }
}

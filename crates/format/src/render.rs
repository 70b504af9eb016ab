//! One renderer per response format

use serde_json::{json, Value};

use murmur_core::{InferenceParams, Segment};

use crate::diarize::estimate_speaker;
use crate::timestamp::format_timestamp;

fn speaker_prefix(params: &InferenceParams, channels: &[Vec<f32>], t0: i64, t1: i64) -> String {
    if params.diarize && channels.len() == 2 {
        estimate_speaker(channels, t0, t1, false)
    } else {
        String::new()
    }
}

/// Plain text: one line per segment, speaker-prefixed when diarizing.
pub fn render_text(segments: &[Segment], params: &InferenceParams, channels: &[Vec<f32>]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&speaker_prefix(params, channels, seg.t0, seg.t1));
        out.push_str(&seg.text);
        out.push('\n');
    }
    out
}

/// SRT: 1-based numbering offset by `offset_n`, comma timestamps.
pub fn render_srt(segments: &[Segment], params: &InferenceParams, channels: &[Vec<f32>]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let speaker = speaker_prefix(params, channels, seg.t0, seg.t1);
        out.push_str(&format!(
            "{}\n{} --> {}\n{}{}\n\n",
            i as i32 + 1 + params.offset_n,
            format_timestamp(seg.t0, true),
            format_timestamp(seg.t1, true),
            speaker,
            seg.text,
        ));
    }
    out
}

/// WebVTT: preamble plus dot timestamps, speaker rendered as a voice cue.
pub fn render_vtt(segments: &[Segment], params: &InferenceParams, channels: &[Vec<f32>]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for seg in segments {
        let speaker = if params.diarize && channels.len() == 2 {
            format!(
                "<v Speaker{}>",
                estimate_speaker(channels, seg.t0, seg.t1, true)
            )
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{} --> {}\n{}{}\n\n",
            format_timestamp(seg.t0, false),
            format_timestamp(seg.t1, false),
            speaker,
            seg.text,
        ));
    }
    out
}

/// Compact JSON: the concatenated text only.
pub fn render_json(segments: &[Segment], params: &InferenceParams, channels: &[Vec<f32>]) -> Value {
    json!({ "text": render_text(segments, params, channels) })
}

/// Verbose JSON matching the openai/whisper response shape.
pub fn render_verbose_json(
    segments: &[Segment],
    params: &InferenceParams,
    channels: &[Vec<f32>],
    language: &str,
    duration_secs: f32,
) -> Value {
    let mut seg_values = Vec::with_capacity(segments.len());

    for (i, seg) in segments.iter().enumerate() {
        let mut entry = json!({
            "id": i,
            "text": seg.text,
        });

        if !params.no_timestamps {
            entry["start"] = json!(seg.t0 as f64 * 0.01);
            entry["end"] = json!(seg.t1 as f64 * 0.01);
        }

        let mut token_ids = Vec::with_capacity(seg.tokens.len());
        let mut words = Vec::with_capacity(seg.tokens.len());
        let mut total_logprob = 0.0f64;
        for token in &seg.tokens {
            token_ids.push(token.id);
            let mut word = json!({ "word": token.text });
            if !params.no_timestamps {
                word["start"] = json!(token.t0 as f64 * 0.01);
                word["end"] = json!(token.t1 as f64 * 0.01);
                word["t_dtw"] = json!(token.t_dtw);
            }
            word["probability"] = json!(token.p);
            total_logprob += token.plog as f64;
            words.push(word);
        }

        let avg_logprob = if seg.tokens.is_empty() {
            0.0
        } else {
            total_logprob / seg.tokens.len() as f64
        };

        entry["tokens"] = json!(token_ids);
        entry["words"] = json!(words);
        entry["temperature"] = json!(params.temperature);
        entry["avg_logprob"] = json!(avg_logprob);
        entry["no_speech_prob"] = json!(seg.no_speech_prob);

        seg_values.push(entry);
    }

    json!({
        "task": if params.translate { "translate" } else { "transcribe" },
        "language": language,
        "duration": duration_secs,
        "text": render_text(segments, params, channels),
        "segments": seg_values,
    })
}

#[cfg(test)]
mod tests {
    use murmur_core::TokenInfo;

    use super::*;

    fn seg(t0: i64, t1: i64, text: &str) -> Segment {
        Segment {
            t0,
            t1,
            text: text.to_string(),
            tokens: Vec::new(),
            no_speech_prob: 0.0,
            speaker_turn_next: false,
        }
    }

    fn mono_params() -> InferenceParams {
        InferenceParams {
            diarize: false,
            ..InferenceParams::default()
        }
    }

    #[test]
    fn test_srt_shape() {
        let segments = vec![seg(0, 200, "hello world")];
        let out = render_srt(&segments, &mono_params(), &[]);
        assert!(out.starts_with("1\n00:00:00,000 --> 00:00:02,000\nhello world\n\n"));
    }

    #[test]
    fn test_srt_numbering_offset() {
        let segments = vec![seg(0, 100, "a"), seg(100, 200, "b")];
        let mut params = mono_params();
        params.offset_n = 10;
        let out = render_srt(&segments, &params, &[]);
        assert!(out.starts_with("11\n"));
        assert!(out.contains("\n\n12\n"));
    }

    #[test]
    fn test_vtt_preamble_and_cue() {
        let segments = vec![seg(0, 150, "hi")];
        let out = render_vtt(&segments, &mono_params(), &[]);
        assert!(out.starts_with("WEBVTT\n\n"));
        assert!(out.contains("00:00:00.000 --> 00:00:01.500\nhi\n"));
    }

    #[test]
    fn test_vtt_speaker_cue_when_diarizing() {
        let segments = vec![seg(0, 10, "hi")];
        let mut params = mono_params();
        params.diarize = true;
        let channels = vec![vec![0.9f32; 1600], vec![0.0f32; 1600]];
        let out = render_vtt(&segments, &params, &channels);
        assert!(out.contains("<v Speaker0>hi"));
    }

    #[test]
    fn test_empty_result_renders_empty_text() {
        let out = render_json(&[], &mono_params(), &[]);
        assert_eq!(out["text"], "");
    }

    #[test]
    fn test_verbose_json_roundtrips_timestamps() {
        let mut s = seg(123, 456, " hello");
        s.tokens = vec![TokenInfo {
            id: 50,
            text: " hello".to_string(),
            p: 0.9,
            plog: -0.1,
            t0: 123,
            t1: 456,
            t_dtw: 130,
        }];
        let params = mono_params();
        let out = render_verbose_json(&[s], &params, &[], "english", 4.56);

        let start = out["segments"][0]["start"].as_f64().unwrap();
        assert_eq!((start * 100.0).round() as i64, 123);
        assert_eq!(out["segments"][0]["tokens"][0], 50);
        assert_eq!(out["segments"][0]["words"][0]["t_dtw"], 130);
        assert_eq!(out["task"], "transcribe");
        assert_eq!(out["language"], "english");
    }

    #[test]
    fn test_verbose_json_avg_logprob_mean() {
        let mut s = seg(0, 100, "ab");
        s.tokens = vec![
            TokenInfo {
                id: 1,
                text: "a".into(),
                p: 0.5,
                plog: -1.0,
                t0: 0,
                t1: 50,
                t_dtw: -1,
            },
            TokenInfo {
                id: 2,
                text: "b".into(),
                p: 0.5,
                plog: -3.0,
                t0: 50,
                t1: 100,
                t_dtw: -1,
            },
        ];
        let out = render_verbose_json(&[s], &mono_params(), &[], "english", 1.0);
        let avg = out["segments"][0]["avg_logprob"].as_f64().unwrap();
        assert!((avg + 2.0).abs() < 1e-6);
    }
}

//! Response formatting
//!
//! Materializes a set of segments (plus token metadata) into one of the
//! supported wire formats. Formats are a closed enum; each variant has one
//! renderer.

mod diarize;
mod render;
mod timestamp;

pub use diarize::estimate_speaker;
pub use render::{render_json, render_srt, render_text, render_verbose_json, render_vtt};
pub use timestamp::{format_timestamp, timestamp_to_sample};

/// Supported response formats for `/inference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    Text,
    #[default]
    Json,
    VerboseJson,
    Srt,
    Vtt,
}

impl ResponseFormat {
    /// Resolve a requested format name. Unknown names fall back to the
    /// compact JSON shape, which is the legacy behavior.
    pub fn from_name(name: &str) -> Self {
        match name {
            "text" => ResponseFormat::Text,
            "srt" => ResponseFormat::Srt,
            "vtt" => ResponseFormat::Vtt,
            "verbose_json" => ResponseFormat::VerboseJson,
            _ => ResponseFormat::Json,
        }
    }

    /// Content type of the rendered body.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text/html; charset=utf-8",
            ResponseFormat::Srt => "application/x-subrip",
            ResponseFormat::Vtt => "text/vtt",
            ResponseFormat::Json | ResponseFormat::VerboseJson => "application/json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_resolution() {
        assert_eq!(ResponseFormat::from_name("srt"), ResponseFormat::Srt);
        assert_eq!(ResponseFormat::from_name("vtt"), ResponseFormat::Vtt);
        assert_eq!(ResponseFormat::from_name("text"), ResponseFormat::Text);
        assert_eq!(
            ResponseFormat::from_name("verbose_json"),
            ResponseFormat::VerboseJson
        );
        assert_eq!(ResponseFormat::from_name("json"), ResponseFormat::Json);
        // unknown names keep the legacy json fallback
        assert_eq!(ResponseFormat::from_name("yaml"), ResponseFormat::Json);
    }
}

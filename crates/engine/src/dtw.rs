//! DTW alignment presets
//!
//! Token-level timestamp alignment needs a model-specific attention-head
//! preset. The accepted names form a fixed enumeration; anything else is a
//! fatal startup error.

use std::str::FromStr;

use whisper_rs::DtwModelPreset;

use crate::EngineError;

/// Model preset enabling DTW token alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtwPreset {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV1,
    LargeV2,
    LargeV3,
}

impl DtwPreset {
    pub(crate) fn to_model_preset(self) -> DtwModelPreset {
        match self {
            DtwPreset::Tiny => DtwModelPreset::Tiny,
            DtwPreset::TinyEn => DtwModelPreset::TinyEn,
            DtwPreset::Base => DtwModelPreset::Base,
            DtwPreset::BaseEn => DtwModelPreset::BaseEn,
            DtwPreset::Small => DtwModelPreset::Small,
            DtwPreset::SmallEn => DtwModelPreset::SmallEn,
            DtwPreset::Medium => DtwModelPreset::Medium,
            DtwPreset::MediumEn => DtwModelPreset::MediumEn,
            DtwPreset::LargeV1 => DtwModelPreset::LargeV1,
            DtwPreset::LargeV2 => DtwModelPreset::LargeV2,
            DtwPreset::LargeV3 => DtwModelPreset::LargeV3,
        }
    }
}

impl FromStr for DtwPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(DtwPreset::Tiny),
            "tiny.en" => Ok(DtwPreset::TinyEn),
            "base" => Ok(DtwPreset::Base),
            "base.en" => Ok(DtwPreset::BaseEn),
            "small" => Ok(DtwPreset::Small),
            "small.en" => Ok(DtwPreset::SmallEn),
            "medium" => Ok(DtwPreset::Medium),
            "medium.en" => Ok(DtwPreset::MediumEn),
            "large.v1" => Ok(DtwPreset::LargeV1),
            "large.v2" => Ok(DtwPreset::LargeV2),
            "large.v3" => Ok(DtwPreset::LargeV3),
            other => Err(EngineError::UnknownDtwPreset(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_presets_parse() {
        for name in [
            "tiny", "tiny.en", "base", "base.en", "small", "small.en", "medium", "medium.en",
            "large.v1", "large.v2", "large.v3",
        ] {
            assert!(name.parse::<DtwPreset>().is_ok(), "{name} should parse");
        }
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let err = "large.v4".parse::<DtwPreset>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownDtwPreset(_)));
    }
}

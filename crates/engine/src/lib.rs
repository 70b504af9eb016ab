//! Inference engine handles and the dispatch fabric
//!
//! Two [`EngineHandle`]s exist at runtime: a high-accuracy cold model for
//! batch requests and a small quantized hot model for streaming. Each lives
//! inside its own [`InferenceDomain`], a serialization scope that admits at
//! most one inference call at a time. The two domains never contend.

mod abort;
mod domain;
mod dtw;
mod handle;
mod language;
mod params;

pub use abort::AbortFlag;
pub use domain::InferenceDomain;
pub use dtw::DtwPreset;
pub use handle::{EngineHandle, EngineOptions, TranscribeOutput};
pub use language::{lang_full_name, lang_is_known};
pub use params::HotParams;

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to initialize model from '{path}': {reason}")]
    InitFailed { path: String, reason: String },

    #[error("unknown DTW preset '{0}'")]
    UnknownDtwPreset(String),

    #[error("failed to create inference state: {0}")]
    StateFailed(String),

    #[error("failed to process audio")]
    InferenceFailed,
}

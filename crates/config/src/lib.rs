//! Configuration for the murmur server
//!
//! Settings are assembled from CLI flags by the server binary; everything
//! here has serde defaults so partial overrides compose cleanly.

mod settings;

pub use settings::{HotPathConfig, ModelConfig, ServerConfig, Settings};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

//! Application state
//!
//! Shared state across all handlers. The two serialization domains and the
//! session registry are explicit context objects owned here; their lifetime
//! is the server's lifetime.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use murmur_audio::AudioRing;
use murmur_config::Settings;
use murmur_engine::InferenceDomain;

use crate::session::SessionRegistry;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub settings: Arc<Settings>,

    /// Cold serialization domain: `/inference`, `/load`, `/stream`
    pub cold: Arc<InferenceDomain>,

    /// Hot serialization domain: `/hot_stream` (HTTP and WebSocket)
    pub hot: Arc<InferenceDomain>,

    /// Live WebSocket sessions
    pub sessions: Arc<SessionRegistry>,

    /// Accumulator for the chunked cold `/stream` endpoint
    pub stream_ring: Arc<Mutex<AudioRing>>,

    /// Accumulator for the chunked hot `/hot_stream` endpoint
    pub hot_ring: Arc<Mutex<AudioRing>>,
}

impl AppState {
    /// Create new application state around the two loaded domains.
    pub fn new(settings: Settings, cold: InferenceDomain, hot: InferenceDomain) -> Self {
        let registry = SessionRegistry::new(
            settings.server.ws_max_sessions,
            Duration::from_secs(settings.server.ws_idle_timeout_secs),
        );
        Self {
            settings: Arc::new(settings),
            cold: Arc::new(cold),
            hot: Arc::new(hot),
            sessions: Arc::new(registry),
            stream_ring: Arc::new(Mutex::new(AudioRing::new())),
            hot_ring: Arc::new(Mutex::new(AudioRing::new())),
        }
    }
}

//! murmur server
//!
//! Serving surfaces for the dual-path transcription engine: the HTTP router
//! (batch + chunked streaming), the WebSocket realtime endpoint, the session
//! registry and the streaming core shared by both.

pub mod cli;
pub mod http;
pub mod session;
pub mod state;
pub mod stream;
pub mod websocket;

pub use http::create_router;
pub use session::{Session, SessionRegistry};
pub use state::AppState;
pub use websocket::create_ws_router;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request")]
    InvalidRequest,

    #[error("{0}")]
    Internal(String),
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(_: axum::extract::multipart::MultipartError) -> Self {
        ServerError::InvalidRequest
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::InvalidRequest => {
                (StatusCode::BAD_REQUEST, "Invalid request").into_response()
            }
            ServerError::Internal(what) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("500 Internal Server Error\n{what}"),
            )
                .into_response(),
        }
    }
}

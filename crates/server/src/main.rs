//! murmur server entry point

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use murmur_audio::check_ffmpeg_available;
use murmur_engine::{lang_is_known, DtwPreset, EngineHandle, EngineOptions, InferenceDomain};
use murmur_server::{cli, create_router, create_ws_router, AppState};

/// Exit code for model initialization failures.
const EXIT_MODEL_INIT: i32 = 3;

#[tokio::main]
async fn main() {
    let mut settings = cli::parse_settings();

    init_tracing();

    settings.hot.apply_env();

    if let Err(e) = settings.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    if !lang_is_known(&settings.params.language) {
        tracing::error!(language = %settings.params.language, "unknown language");
        std::process::exit(1);
    }

    if settings.server.ffmpeg_converter && !check_ffmpeg_available() {
        tracing::error!("ffmpeg not found; install it or drop --convert");
        std::process::exit(1);
    }

    let dtw = if settings.model.dtw.is_empty() {
        None
    } else {
        match settings.model.dtw.parse::<DtwPreset>() {
            Ok(preset) => Some(preset),
            Err(e) => {
                tracing::error!(error = %e, "invalid DTW preset");
                std::process::exit(EXIT_MODEL_INIT);
            }
        }
    };

    tracing::info!("starting murmur server");
    tracing::info!(model = %settings.model.path, "cold path model");
    tracing::info!(model = %settings.hot.model, "hot path model");
    tracing::info!(
        step_ms = settings.hot.step_ms,
        length_ms = settings.hot.length_ms,
        keep_ms = settings.hot.keep_ms,
        "streaming configuration"
    );
    tracing::info!(
        host = %settings.server.host,
        http_port = settings.server.port,
        ws_port = settings.server.ws_port(),
        read_timeout = settings.server.read_timeout_secs,
        write_timeout = settings.server.write_timeout_secs,
        "server configuration"
    );

    let cold_engine = match EngineHandle::load(
        &settings.model.path,
        EngineOptions {
            use_gpu: settings.model.use_gpu,
            flash_attn: settings.model.flash_attn,
            dtw,
        },
    ) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize cold path model");
            std::process::exit(EXIT_MODEL_INIT);
        }
    };

    // flash attention stays off for the hot context
    let hot_engine = match EngineHandle::load(
        &settings.hot.model,
        EngineOptions {
            use_gpu: settings.hot.use_gpu,
            flash_attn: false,
            dtw: None,
        },
    ) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize hot path model");
            std::process::exit(EXIT_MODEL_INIT);
        }
    };

    let state = AppState::new(
        settings.clone(),
        InferenceDomain::new("cold", cold_engine),
        InferenceDomain::new("hot", hot_engine),
    );

    let reaper_shutdown = state.sessions.start_reaper(Duration::from_secs(5));

    let http_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let ws_addr = format!("{}:{}", settings.server.host, settings.server.ws_port());

    let http_listener = match tokio::net::TcpListener::bind(&http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %http_addr, error = %e, "could not bind server socket");
            std::process::exit(1);
        }
    };
    let ws_listener = match tokio::net::TcpListener::bind(&ws_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %ws_addr, error = %e, "could not bind WebSocket socket");
            std::process::exit(1);
        }
    };

    tracing::info!("listening at http://{http_addr}");
    tracing::info!(
        "realtime streaming at ws://{ws_addr}{}/hot_stream",
        settings.server.request_path
    );

    let http_server = axum::serve(http_listener, create_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal());
    let ws_server = axum::serve(ws_listener, create_ws_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal());

    let result = tokio::try_join!(async { http_server.await }, async { ws_server.await });
    if let Err(e) = result {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }

    let _ = reaper_shutdown.send(true);
    tracing::info!("server shutdown complete");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "murmur=info,murmur_server=info,tower_http=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

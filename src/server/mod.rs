//! Progress Engine: the authoritative JSON/HTTP server the student client talks to.
//!
//! Router assembly: API endpoints, static frontend, CORS and HTTP tracing.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::config::ServerConfig;
use crate::server::state::AppState;

pub mod error;
pub mod http;
pub mod logic;
pub mod seeds;
pub mod state;

/// Build the application router with:
/// - JSON API under `/api/...`
/// - Static frontend from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/health", get(http::http_health))
        // Auth & students
        .route("/api/auth/register", post(http::http_register))
        .route("/api/auth/login", post(http::http_login))
        .route("/api/auth/logout", post(http::http_logout))
        .route("/api/students", post(http::http_create_student))
        .route("/api/student-stats/:student_id", get(http::http_student_stats))
        // Videos
        .route("/api/materias", get(http::http_subjects))
        .route("/api/videos", get(http::http_videos))
        .route("/api/video-completo", post(http::http_video_complete))
        // Questions & adaptive test
        .route("/api/pregunta", get(http::http_question))
        .route("/api/adaptive-test/start", post(http::http_run_start))
        .route("/api/adaptive-test/answer", post(http::http_run_answer))
        .route("/api/test-result", post(http::http_test_result))
        // Rewards & results
        .route("/api/rewards", get(http::http_rewards))
        .route("/api/results", get(http::http_results))
        .route("/api/dev/reset", post(http::http_dev_reset))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

/// Bind `127.0.0.1:0` and serve in a background task. Returns the bound address
/// and the shared state so callers can inspect the authoritative data.
pub async fn spawn_local(config: ServerConfig) -> std::io::Result<(SocketAddr, Arc<AppState>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(config));
    let app = build_router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(target: "edusmart", error = %e, "local server stopped");
        }
    });
    info!(target: "edusmart", %addr, "Local progress engine listening");
    Ok((addr, state))
}

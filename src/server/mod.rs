//! HTTP surface — Axum web server.
//!
//! Serves the chat UI page and the JSON API. CORS enabled, matching
//! the browser-facing deployment of the original service.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// The embedded chat UI (compiled into the binary).
const CHAT_UI_HTML: &str = include_str!("templates/index.html");

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(serve_chat_ui))
        .route("/ask", post(routes::ask))
        .route("/api/regions", get(routes::get_regions))
        .route("/api/weather/:region", get(routes::get_region_weather))
        .layer(cors)
        .with_state(state)
}

/// Run the server until a shutdown signal arrives.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

/// Serve the embedded chat UI.
async fn serve_chat_ui() -> Html<&'static str> {
    Html(CHAT_UI_HTML)
}

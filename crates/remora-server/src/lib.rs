#![forbid(unsafe_code)]

//! HTTP API for Mermaid-to-PNG conversion.
//!
//! A thin axum layer over [`remora::Converter`]: requests marshal diagram source in as
//! JSON or multipart, conversions run on the blocking pool, and images travel back as
//! base64. Output files get uuid-suffixed server-side names so concurrent requests
//! reusing the same caller-supplied filename cannot collide.

pub mod api;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/api/health", get(api::health))
        .route("/api/check-dependencies", get(api::check_dependencies))
        .route("/api/convert", post(api::convert))
        .route("/api/convert-file", post(api::convert_file))
        .route("/api/examples", get(api::examples))
        .layer(DefaultBodyLimit::max(state::MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

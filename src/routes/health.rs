// src/routes/health.rs
//! Health check endpoint for the dashboard.
//!
//! Lets container orchestrators and scripts verify that the dashboard
//! process is up and answering HTTP requests. Merged into the gateway router
//! in `mod.rs`.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object; the reading source and the metadata table
/// are not touched.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway router
/// whatever reading source the dashboard was started with.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

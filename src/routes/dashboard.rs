use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error};

use super::AppState;
use crate::cycle::run_cycle;
use crate::store::ReadingSource;

// ---

pub fn router<S>() -> Router<AppState<S>>
where
    S: ReadingSource + 'static,
{
    // ---
    Router::new()
        .route("/", get(page::<S>))
        .route("/api/report", get(report::<S>))
}

/// Handle `GET /`: run a fresh cycle and render the page.
///
/// A failed cycle still answers 200 with an error notice, so the browser's
/// refresh timer keeps going and the next load tries again.
async fn page<S>(State(state): State<AppState<S>>) -> Html<String>
where
    S: ReadingSource + 'static,
{
    // ---
    debug!("GET / - Starting cycle");

    match run_cycle(state.source.as_ref(), &state.metadata, &state.cycle).await {
        Ok(report) => Html(state.page.render(&report)),
        Err(e) => {
            error!("Dashboard cycle failed: {:#}", e);
            Html(state.page.render_error(&format!("{:#}", e)))
        }
    }
}

/// Handle `GET /api/report`: the same cycle, as JSON.
async fn report<S>(State(state): State<AppState<S>>) -> Response
where
    S: ReadingSource + 'static,
{
    // ---
    debug!("GET /api/report - Starting cycle");

    match run_cycle(state.source.as_ref(), &state.metadata, &state.cycle).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("Report cycle failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{:#}", e) })),
            )
                .into_response()
        }
    }
}

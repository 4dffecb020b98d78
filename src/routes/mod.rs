//! HTTP surface of the live dashboard.
//!
//! Gateway for the route modules: `main` only calls [`router`], each sibling
//! module contributes a subrouter over the shared [`AppState`].

use std::sync::Arc;

use axum::Router;

use crate::config::CycleConfig;
use crate::metadata::MetadataTable;
use crate::render::DashboardPage;
use crate::store::ReadingSource;

mod dashboard;
mod health;

// ---

/// State shared by every request handler.
pub struct AppState<S> {
    pub source: Arc<S>,
    pub metadata: Arc<MetadataTable>,
    pub cycle: CycleConfig,
    pub page: DashboardPage,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            metadata: Arc::clone(&self.metadata),
            cycle: self.cycle,
            page: self.page,
        }
    }
}

pub fn router<S>(state: AppState<S>) -> Router
where
    S: ReadingSource + 'static,
{
    // ---
    Router::new()
        .merge(dashboard::router())
        .merge(health::router())
        .with_state(state)
}

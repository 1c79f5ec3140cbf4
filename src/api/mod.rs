//! HTTP API module
//!
//! Host notifications (enable, disable, settings, confirmation answers and
//! viewer data updates) reach the timer loop through these endpoints.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/enable", post(enable_handler))
        .route("/disable", post(disable_handler))
        .route("/settings", post(settings_handler))
        .route("/confirm/:decision", post(confirm_handler))
        .route("/viewer/program", put(program_handler))
        .route("/viewer/recording", put(recording_handler))
        .route("/viewer/catalog", put(catalog_handler))
        .route("/drivers", get(drivers_handler))
        .route("/drivers/:driver/spaces", get(tuning_spaces_handler))
        .route("/drivers/:driver/spaces/:space/channels", get(channels_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Health endpoint handler.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "built": env!("VERGEN_BUILD_TIMESTAMP"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "rancher_url": state.config.rancher_url,
    }))
}

//! Service discovery endpoint.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Service discovery document.
#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    /// Absolute URL to POST objects to.
    pub upload: String,
}

/// GET /.well-known/unhash.json
pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        upload: state.config.server.upload_url(),
    })
}

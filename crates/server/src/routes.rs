//! Route configuration.

use crate::handlers;
use crate::metrics::{metrics_handler, register_metrics};
use crate::payment::require_payment;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{MethodRouter, get};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let root = if state.config.server.upload_on_root {
        upload_methods(&state).get(handlers::banner)
    } else {
        get(handlers::banner)
    };

    let mut router = Router::new()
        .route("/.well-known/unhash.json", get(handlers::discovery))
        .route("/health", get(handlers::health_check))
        .route("/upload", upload_methods(&state).get(handlers::object_not_found))
        .route("/", root)
        // Static routes above take precedence over the digest capture.
        .route("/{hash}", get(handlers::get_object));

    // SECURITY: When enabled, this endpoint MUST be network-restricted
    // to authorized Prometheus scraper IPs only.
    if state.config.server.metrics_enabled {
        register_metrics();
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// POST (paid upload) and OPTIONS (quote) for an upload endpoint.
///
/// The payment layer only wraps POST; methods added after `route_layer`
/// are not affected by it.
fn upload_methods(state: &AppState) -> MethodRouter<AppState> {
    axum::routing::post(handlers::upload_object)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_payment))
        .options(handlers::quote)
}

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all analyst-data peer endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/analyst-data/index-minimal", get(handler::index_minimal_handler))
        .route("/v1/analyst-data/filter-for-push", post(handler::filter_for_push_handler))
        .route("/v1/analyst-data/:kind/upload", post(handler::upload_handler))
        .route("/v1/analyst-data/:kind/fetch", post(handler::fetch_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

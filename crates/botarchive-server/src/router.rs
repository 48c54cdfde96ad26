use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Bot Archive endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/bots",
            get(handler::list_handler)
                .post(handler::action_handler)
                .options(handler::preflight_handler),
        )
        .route("/api/health", get(handler::health_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

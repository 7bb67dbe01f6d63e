pub mod api;
pub mod routes;

use crate::state::AppState;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/optionChain", axum::routing::get(routes::get_option_chain))
        .route("/api/counters", axum::routing::get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

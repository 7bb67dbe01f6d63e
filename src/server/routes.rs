use crate::server::api::{self, OptionChainQuery};
use crate::state::{AppState, CounterSnapshot};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;
use std::time::Instant;

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// GET /optionChain -- price a full chain with a request-scoped engine
pub async fn get_option_chain(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OptionChainQuery>, QueryRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();

    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            state.record_rejected();
            tracing::warn!(%request_id, error = %rejection.body_text(), "rejected option chain query");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let started = Instant::now();
    let option_type = query.option_type.clone();
    let max_grid_points = state.config.max_grid_points;
    let price_decimals = state.config.price_decimals;

    // Pricing is CPU-bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || {
        api::option_chain(&query, max_grid_points, price_decimals)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => {
            state.record_served(outcome.grid_points);
            tracing::info!(
                %request_id,
                option_type = %option_type,
                grid_points = outcome.grid_points,
                factory_builds = outcome.cache.factory_builds,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "option chain served"
            );
            Json(outcome.response).into_response()
        }
        Ok(Err(e)) if e.is_client_error() => {
            state.record_rejected();
            tracing::warn!(%request_id, error = %e, "option chain request rejected");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(e)) => {
            state.record_error();
            tracing::error!(%request_id, error = %e, "option chain computation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(join_err) => {
            state.record_error();
            tracing::error!(%request_id, error = %join_err, "pricing task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "pricing task failed".into())
        }
    }
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}

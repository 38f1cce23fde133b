use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::state::AppState;

/// Greeting returned by `GET /`
pub const GREETING: &str = "Hello from user-service!";

/// Create greeting and metrics exposition routes
pub fn home_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn home(State(state): State<AppState>) -> &'static str {
    state.metrics.record_request();
    GREETING
}

/// Counters in the Prometheus text exposition format
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

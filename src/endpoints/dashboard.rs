use axum::{extract::State, routing::get, Json, Router};

use crate::schemas::{DashboardMetrics, DashboardResponse, Stage, StageStatus};
use crate::state::AppState;

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_dashboard))
        .with_state(state)
}

/// Demo stage list shown when no live probes are wanted
fn demo_stages() -> Vec<Stage> {
    [
        ("Source", "main branch checked out"),
        ("CI", "all tests passed"),
        ("Image", "image built and pushed"),
        ("Deploy", "rollout complete"),
        ("Monitoring", "scraping targets"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((name, detail), id)| Stage::new(id, name, StageStatus::Success).with_detail(detail))
    .collect()
}

/// Fixed demo pipeline plus the service's own counters
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, body = DashboardResponse)
    )
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let snapshot = state.metrics.snapshot();

    Json(DashboardResponse {
        stages: demo_stages(),
        metrics: DashboardMetrics {
            total_requests: snapshot.http_requests,
            pipeline_runs: snapshot.pipeline_runs,
            pipeline_failures: snapshot.pipeline_failures,
            failure_rate_percent: snapshot.failure_rate_percent(),
        },
    })
}

pub mod dashboard;
pub mod home;
pub mod overview;
pub mod tools;
pub mod trigger;

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::schemas::{
    DashboardMetrics, DashboardResponse, OverviewMetrics, OverviewResponse, RunMetrics, Stage,
    StageStatus, ToolsResponse, TriggerRequest, TriggerResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard::get_dashboard,
        overview::get_overview,
        trigger::trigger_pipeline,
        tools::get_tools,
    ),
    components(schemas(
        Stage,
        StageStatus,
        TriggerRequest,
        TriggerResponse,
        RunMetrics,
        OverviewResponse,
        OverviewMetrics,
        DashboardResponse,
        DashboardMetrics,
        ToolsResponse,
    )),
    tags(
        (name = "Pipeline", description = "Demo delivery pipeline runs"),
        (name = "Overview", description = "Live status of pipeline stages"),
        (name = "Dashboard", description = "Demo stages and service counters"),
        (name = "Tools", description = "External tool links"),
    )
)]
pub struct ApiDoc;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(home::home_routes(state.clone()))
        .route("/api/health", get(health_check))
        .route("/api/openapi.json", get(openapi_spec))
        .nest("/api", api_routes(state))
}

/// API routes under /api/*
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/dashboard", dashboard::dashboard_routes(state.clone()))
        .nest("/overview", overview::overview_routes(state.clone()))
        .nest("/trigger", trigger::trigger_routes(state.clone()))
        .nest("/tools", tools::tools_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

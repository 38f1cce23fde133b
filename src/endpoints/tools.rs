use axum::{extract::State, routing::get, Json, Router};

use crate::config::Config;
use crate::schemas::ToolsResponse;
use crate::state::AppState;

pub fn tools_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_tools))
        .with_state(state)
}

fn tool_links(config: &Config) -> ToolsResponse {
    ToolsResponse {
        github: config
            .github
            .repo
            .as_deref()
            .map(|repo| config.github.repo_url(repo)),
        jenkins: config.jenkins.job_url().or_else(|| config.jenkins.url.clone()),
        dockerhub: config.registry.repo_page(),
        prometheus: config.monitoring.prometheus_url.clone(),
        grafana: config.monitoring.grafana_url.clone(),
    }
}

/// Links to the configured external tools
#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "Tools",
    responses(
        (status = 200, body = ToolsResponse)
    )
)]
pub async fn get_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(tool_links(&state.config))
}

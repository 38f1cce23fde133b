use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::schemas::{validate_repo, OverviewQuery, OverviewResponse};
use crate::services::overview::build_overview;
use crate::state::AppState;

pub fn overview_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_overview))
        .with_state(state)
}

/// Live pipeline status gathered from GitHub, Jenkins, the registry, the cluster and metrics
#[utoipa::path(
    get,
    path = "/api/overview",
    tag = "Overview",
    params(OverviewQuery),
    responses(
        (status = 200, body = OverviewResponse),
        (status = 400, description = "repo is not in owner/name form")
    )
)]
pub async fn get_overview(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<OverviewResponse>> {
    let repo = query.repo.as_deref().map(str::trim).filter(|r| !r.is_empty());
    if let Some(repo) = repo {
        validate_repo(repo)?;
    }

    Ok(Json(
        build_overview(&state.config, state.runner.as_ref(), repo).await,
    ))
}

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::schemas::{PipelineTarget, StageStatus, TriggerQuery, TriggerRequest, TriggerResponse};
use crate::services::pipeline::Pipeline;
use crate::state::AppState;

pub fn trigger_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(trigger_pipeline))
        .with_state(state)
}

/// Parse an optional JSON body; an empty body means no fields were sent
fn parse_body(body: &[u8]) -> Result<TriggerRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TriggerRequest::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Run the clone, test, build, push and deploy pipeline for a repository
#[utoipa::path(
    post,
    path = "/api/trigger",
    tag = "Pipeline",
    params(TriggerQuery),
    request_body = TriggerRequest,
    responses(
        (status = 200, body = TriggerResponse),
        (status = 400, description = "Missing or malformed repo/branch")
    )
)]
pub async fn trigger_pipeline(
    State(state): State<AppState>,
    Query(query): Query<TriggerQuery>,
    body: Bytes,
) -> Result<Json<TriggerResponse>> {
    let request = parse_body(&body)?;
    let target = PipelineTarget::resolve(request, query)
        .ok_or_else(|| AppError::BadRequest("repo is required (owner/name)".to_string()))?;
    target.validate()?;

    let response = Pipeline::new(&state.config, state.runner.as_ref())
        .run(target)
        .await?;
    state
        .metrics
        .record_pipeline_run(response.status != StageStatus::Success);

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body() {
        let request = parse_body(b"  \n").unwrap();
        assert!(request.repo.is_none());
        assert!(request.branch.is_none());
    }

    #[test]
    fn test_parse_json_body() {
        let request = parse_body(br#"{"repo": "octocat/Hello-World"}"#).unwrap();
        assert_eq!(request.repo.as_deref(), Some("octocat/Hello-World"));
        assert!(request.branch.is_none());
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(parse_body(b"{not json"), Err(AppError::Json(_))));
    }
}

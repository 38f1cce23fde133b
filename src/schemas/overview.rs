use serde::{Deserialize, Serialize};

use super::stage::Stage;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OverviewQuery {
    /// `owner/name` overriding the configured `GITHUB_REPO`
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub requests_per_second: Option<f64>,
    pub error_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub stages: Vec<Stage>,
    pub metrics: OverviewMetrics,
    pub prometheus_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_requests: u64,
    pub pipeline_runs: u64,
    pub pipeline_failures: u64,
    /// Share of pipeline runs that failed, 0 when nothing has run yet
    pub failure_rate_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stages: Vec<Stage>,
    pub metrics: DashboardMetrics,
}

/// Links to the external tools the pipeline talks to; unset tools are `null`
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolsResponse {
    pub github: Option<String>,
    pub jenkins: Option<String>,
    pub dockerhub: Option<String>,
    pub prometheus: Option<String>,
    pub grafana: Option<String>,
}

use serde::Deserialize;
use tracing::warn;

use super::{ProbeOutcome, ProbeResult, HTTP_CLIENT};
use crate::config::ci::JenkinsConfig;
use crate::schemas::StageStatus;

#[derive(Debug, Deserialize)]
struct Build {
    #[serde(default)]
    building: bool,
    result: Option<String>,
    number: Option<u64>,
    url: Option<String>,
}

/// Attach basic auth when both user and token are configured
pub(crate) fn with_auth(
    config: &JenkinsConfig,
    request: reqwest::RequestBuilder,
) -> reqwest::RequestBuilder {
    match (&config.user, &config.token) {
        (Some(user), Some(token)) => request.basic_auth(user, Some(token)),
        _ => request,
    }
}

/// Map a Jenkins build onto a stage status
fn build_status(building: bool, result: Option<&str>) -> StageStatus {
    if building {
        return StageStatus::InProgress;
    }
    match result {
        Some("SUCCESS") => StageStatus::Success,
        Some(_) => StageStatus::Failed,
        None => StageStatus::Unknown,
    }
}

/// Status of the configured job's last build
pub async fn last_build_status(config: &JenkinsConfig) -> ProbeOutcome {
    let Some(job_url) = config.job_url() else {
        return ProbeOutcome::Unconfigured;
    };

    let url = format!("{}/lastBuild/api/json", job_url);
    let response = match with_auth(config, HTTP_CLIENT.get(&url)).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!("Jenkins last build query returned {}", resp.status());
            return ProbeOutcome::Unreachable;
        }
        Err(e) => {
            warn!("Jenkins last build query failed: {}", e);
            return ProbeOutcome::Unreachable;
        }
    };

    let build = match response.json::<Build>().await {
        Ok(build) => build,
        Err(e) => {
            warn!("Unparseable Jenkins response: {}", e);
            return ProbeOutcome::Unreachable;
        }
    };

    let state = if build.building {
        "building"
    } else {
        build.result.as_deref().unwrap_or("unknown")
    };
    let detail = match build.number {
        Some(n) => format!("build #{}: {}", n, state),
        None => state.to_string(),
    };

    ProbeOutcome::Ok(
        ProbeResult::new(build_status(build.building, build.result.as_deref()))
            .with_detail(detail)
            .with_url(build.url.or(Some(job_url))),
    )
}

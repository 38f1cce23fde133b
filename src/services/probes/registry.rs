use reqwest::StatusCode;
use tracing::warn;

use super::{ProbeOutcome, ProbeResult, HTTP_CLIENT};
use crate::config::registry::RegistryConfig;
use crate::schemas::StageStatus;

/// Whether the configured tag exists in the registry repository
pub async fn tag_status(config: &RegistryConfig) -> ProbeOutcome {
    let Some(ref repo) = config.repo else {
        return ProbeOutcome::Unconfigured;
    };

    let url = format!(
        "{}/v2/repositories/{}/tags/{}",
        config.api_url, repo, config.tag
    );
    let image = format!("{}:{}", repo, config.tag);

    match HTTP_CLIENT.get(&url).send().await {
        Ok(resp) => ProbeOutcome::Ok(
            tag_result(resp.status(), &image).with_url(config.repo_page()),
        ),
        Err(e) => {
            warn!("Registry tag check for {} failed: {}", image, e);
            ProbeOutcome::Unreachable
        }
    }
}

fn tag_result(status: StatusCode, image: &str) -> ProbeResult {
    match status {
        StatusCode::OK => {
            ProbeResult::new(StageStatus::Success).with_detail(format!("{} is published", image))
        }
        StatusCode::NOT_FOUND => ProbeResult::new(StageStatus::InProgress)
            .with_detail(format!("{} not yet pushed", image)),
        other => ProbeResult::new(StageStatus::Unknown)
            .with_detail(format!("registry returned {}", other.as_u16())),
    }
}

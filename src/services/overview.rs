//! Composes probe results into the `/api/overview` document.

use tracing::debug;

use crate::config::Config;
use crate::schemas::{OverviewMetrics, OverviewResponse, Stage, StageStatus};
use crate::services::command::CommandRunner;
use crate::services::probes::{deployment, github, jenkins, prometheus, registry, ProbeOutcome};

const REQUEST_RATE_QUERY: &str = "sum(rate(http_requests_total[5m]))";
const ERROR_RATE_QUERY: &str = r#"sum(rate(http_requests_total{status=~"5.."}[5m]))"#;
const UP_QUERY: &str = "up";

/// Error rate as a percentage, `None` unless both values are known and the total is non-zero
pub fn error_rate_percent(errors: Option<f64>, total: Option<f64>) -> Option<f64> {
    match (errors, total) {
        (Some(errors), Some(total)) if total > 0.0 => Some(errors / total * 100.0),
        _ => None,
    }
}

/// Build the overview for `repo`, falling back to the configured repository
pub async fn build_overview(
    config: &Config,
    runner: &dyn CommandRunner,
    repo: Option<&str>,
) -> OverviewResponse {
    let repo = repo
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .or(config.github.repo.as_deref());

    let source = match repo {
        Some(repo) => Stage::new(1, "Source", StageStatus::Success)
            .with_detail(repo)
            .with_url(Some(config.github.repo_url(repo))),
        None => Stage::new(1, "Source", StageStatus::Unknown)
            .with_detail("no repository configured"),
    };

    let ci = match github::actions_status(&config.github, repo).await {
        ProbeOutcome::Ok(result) => ProbeOutcome::Ok(result),
        other => {
            debug!("GitHub Actions unavailable ({:?}), using Jenkins", other);
            jenkins::last_build_status(&config.jenkins).await
        }
    }
    .into_stage(2, "CI");

    let image = registry::tag_status(&config.registry)
        .await
        .into_stage(3, "Image");

    let deploy = deployment::deployment_status(runner, &config.tools, &config.kubernetes)
        .await
        .into_stage(4, "Deploy");

    let monitoring = match prometheus::query_scalar(&config.monitoring, UP_QUERY).await {
        ProbeOutcome::Ok(_) => Stage::new(5, "Monitoring", StageStatus::Success)
            .with_detail("metrics backend reachable"),
        ProbeOutcome::Unconfigured => {
            Stage::new(5, "Monitoring", StageStatus::Unknown).with_detail("not configured")
        }
        ProbeOutcome::Unreachable => {
            Stage::new(5, "Monitoring", StageStatus::Unknown).with_detail("unreachable")
        }
    }
    .with_url(config.monitoring.grafana_url.clone());

    let total = prometheus::query_scalar(&config.monitoring, REQUEST_RATE_QUERY)
        .await
        .ok();
    let errors = prometheus::query_scalar(&config.monitoring, ERROR_RATE_QUERY)
        .await
        .ok();

    OverviewResponse {
        stages: vec![source, ci, image, deploy, monitoring],
        metrics: OverviewMetrics {
            requests_per_second: total,
            error_rate_percent: error_rate_percent(errors, total),
        },
        prometheus_url: config.monitoring.prometheus_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate_percent() {
        assert_eq!(error_rate_percent(Some(1.0), Some(4.0)), Some(25.0));
        assert_eq!(error_rate_percent(Some(0.0), Some(4.0)), Some(0.0));
    }

    #[test]
    fn test_error_rate_guards_zero_denominator() {
        assert_eq!(error_rate_percent(Some(1.0), Some(0.0)), None);
    }

    #[test]
    fn test_error_rate_requires_both_values() {
        assert_eq!(error_rate_percent(None, Some(4.0)), None);
        assert_eq!(error_rate_percent(Some(1.0), None), None);
    }
}

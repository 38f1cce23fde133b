use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use super::{normalize_run_status, ProbeOutcome, ProbeResult, HTTP_CLIENT};
use crate::config::ci::GithubConfig;
use crate::schemas::StageStatus;

#[derive(Debug, Deserialize)]
struct WorkflowRunList {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    name: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
    html_url: Option<String>,
}

fn authorized(config: &GithubConfig, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let request = request.header(reqwest::header::ACCEPT, "application/vnd.github+json");
    match config.token {
        Some(ref token) => request.bearer_auth(token),
        None => request,
    }
}

/// Status of the most recent GitHub Actions run.
///
/// `repo` overrides the configured repository.
pub async fn actions_status(config: &GithubConfig, repo: Option<&str>) -> ProbeOutcome {
    let Some(repo) = repo.or(config.repo.as_deref()) else {
        return ProbeOutcome::Unconfigured;
    };

    let url = format!("{}/repos/{}/actions/runs", config.api_url, repo);
    let response = match authorized(config, HTTP_CLIENT.get(&url).query(&[("per_page", "1")]))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!("GitHub Actions query for {} returned {}", repo, resp.status());
            return ProbeOutcome::Unreachable;
        }
        Err(e) => {
            warn!("GitHub Actions query for {} failed: {}", repo, e);
            return ProbeOutcome::Unreachable;
        }
    };

    match response.json::<WorkflowRunList>().await {
        Ok(list) => ProbeOutcome::Ok(summarize_run(list.workflow_runs.into_iter().next())),
        Err(e) => {
            warn!("Unparseable GitHub Actions response for {}: {}", repo, e);
            ProbeOutcome::Unreachable
        }
    }
}

fn summarize_run(run: Option<WorkflowRun>) -> ProbeResult {
    let Some(run) = run else {
        return ProbeResult::new(StageStatus::Unknown).with_detail("no workflow runs");
    };

    let status = normalize_run_status(run.status.as_deref(), run.conclusion.as_deref());
    let state = run
        .conclusion
        .as_deref()
        .or(run.status.as_deref())
        .unwrap_or("unknown");
    let detail = match run.name {
        Some(name) => format!("{}: {}", name, state),
        None => state.to_string(),
    };

    ProbeResult::new(status)
        .with_detail(detail)
        .with_url(run.html_url)
}

/// Whether a repository exists on GitHub.
///
/// 200 is a success, 404 is a failure, anything else is unreachable.
pub async fn repository_status(config: &GithubConfig, repo: &str) -> ProbeOutcome {
    let url = format!("{}/repos/{}", config.api_url, repo);
    let link = Some(config.repo_url(repo));

    match authorized(config, HTTP_CLIENT.get(&url)).send().await {
        Ok(resp) if resp.status().is_success() => ProbeOutcome::Ok(
            ProbeResult::new(StageStatus::Success)
                .with_detail(format!("{} is reachable", repo))
                .with_url(link),
        ),
        Ok(resp) if resp.status() == StatusCode::NOT_FOUND => ProbeOutcome::Ok(
            ProbeResult::new(StageStatus::Failed)
                .with_detail(format!("{} not found", repo))
                .with_url(link),
        ),
        Ok(resp) => {
            warn!("GitHub repository check for {} returned {}", repo, resp.status());
            ProbeOutcome::Unreachable
        }
        Err(e) => {
            warn!("GitHub repository check for {} failed: {}", repo, e);
            ProbeOutcome::Unreachable
        }
    }
}

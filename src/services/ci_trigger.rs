//! Hand-off to external CI when the local pipeline cannot run.
//!
//! Each trigger returns `(accepted, message)` and never fails.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ci::{GithubConfig, JenkinsConfig};
use crate::services::probes::jenkins::with_auth;
use crate::services::probes::HTTP_CLIENT;

const TRIGGER_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a CI trigger attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub accepted: bool,
    pub message: String,
}

impl TriggerOutcome {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    workflows: Vec<Workflow>,
}

#[derive(Debug, Deserialize)]
struct Workflow {
    id: u64,
}

/// Dispatch the first workflow listed for the repository
pub async fn trigger_github_workflow(
    config: &GithubConfig,
    repo: &str,
    branch: &str,
) -> TriggerOutcome {
    let Some(ref token) = config.token else {
        return TriggerOutcome::rejected("GitHub token not configured");
    };

    let list_url = format!("{}/repos/{}/actions/workflows", config.api_url, repo);
    let workflows = match HTTP_CLIENT
        .get(&list_url)
        .bearer_auth(token)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .timeout(TRIGGER_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => match resp.json::<WorkflowList>().await {
            Ok(list) => list.workflows,
            Err(e) => return TriggerOutcome::rejected(e.to_string()),
        },
        Ok(resp) => {
            return TriggerOutcome::rejected(format!(
                "GitHub API returned {}",
                resp.status().as_u16()
            ))
        }
        Err(e) => return TriggerOutcome::rejected(e.to_string()),
    };

    let Some(workflow) = workflows.first() else {
        return TriggerOutcome::rejected("No workflows found");
    };

    let dispatch_url = format!(
        "{}/repos/{}/actions/workflows/{}/dispatches",
        config.api_url, repo, workflow.id
    );
    match HTTP_CLIENT
        .post(&dispatch_url)
        .bearer_auth(token)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .json(&serde_json::json!({ "ref": branch }))
        .timeout(TRIGGER_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) if resp.status() == StatusCode::NO_CONTENT => {
            info!(repo, branch, workflow_id = workflow.id, "GitHub workflow dispatched");
            TriggerOutcome::accepted("GitHub Actions workflow triggered successfully")
        }
        Ok(resp) => TriggerOutcome::rejected(format!(
            "GitHub API returned {}",
            resp.status().as_u16()
        )),
        Err(e) => {
            warn!("GitHub workflow dispatch for {} failed: {}", repo, e);
            TriggerOutcome::rejected(e.to_string())
        }
    }
}

/// Queue a parameterized build of the configured Jenkins job
pub async fn trigger_jenkins_job(config: &JenkinsConfig, repo: &str, branch: &str) -> TriggerOutcome {
    let Some(job_url) = config.job_url() else {
        return TriggerOutcome::rejected("Jenkins URL/job not configured");
    };

    let url = format!("{}/buildWithParameters", job_url);
    let request = HTTP_CLIENT
        .post(&url)
        .query(&[("REPO", repo), ("BRANCH", branch)])
        .timeout(TRIGGER_TIMEOUT);

    match with_auth(config, request).send().await {
        Ok(resp) if matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) => {
            info!(repo, branch, "Jenkins build queued");
            TriggerOutcome::accepted("Jenkins job triggered successfully")
        }
        Ok(resp) => TriggerOutcome::rejected(format!(
            "Jenkins returned {}",
            resp.status().as_u16()
        )),
        Err(e) => {
            warn!("Jenkins trigger for {} failed: {}", repo, e);
            TriggerOutcome::rejected(e.to_string())
        }
    }
}

/// Try GitHub Actions first, then Jenkins.
///
/// Returns the accepted outcome, or the combined rejection messages.
pub async fn trigger_external_ci(
    github: &GithubConfig,
    jenkins: &JenkinsConfig,
    repo: &str,
    branch: &str,
) -> TriggerOutcome {
    let gh = trigger_github_workflow(github, repo, branch).await;
    if gh.accepted {
        return gh;
    }

    let jk = trigger_jenkins_job(jenkins, repo, branch).await;
    if jk.accepted {
        return jk;
    }

    TriggerOutcome::rejected(format!("{}; {}", gh.message, jk.message))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{Stage, StageStatus};
use crate::error::{AppError, Result};

fn default_branch() -> String {
    "main".to_string()
}

/// Body of `POST /api/trigger`
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct TriggerRequest {
    /// `owner/name` of the repository to run
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Query parameters accepted by `POST /api/trigger` as an alternative to the body
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriggerQuery {
    pub repo: Option<String>,
    pub branch: Option<String>,
}

/// Repository and branch a pipeline run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTarget {
    pub repo: String,
    pub branch: String,
}

impl PipelineTarget {
    /// Merge body and query input, body taking precedence.
    pub fn resolve(body: TriggerRequest, query: TriggerQuery) -> Option<Self> {
        let repo = body
            .repo
            .or(query.repo)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())?;
        let branch = body
            .branch
            .or(query.branch)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(default_branch);
        Some(Self { repo, branch })
    }

    /// Reject input that is not `owner/name` or that could be parsed as a CLI flag.
    pub fn validate(&self) -> Result<()> {
        validate_repo(&self.repo)?;

        if self.branch.starts_with('-') || self.branch.chars().any(char::is_whitespace) {
            return Err(AppError::BadRequest(format!(
                "invalid branch '{}'",
                self.branch
            )));
        }

        Ok(())
    }

    /// Last path segment of the repository
    pub fn basename(&self) -> &str {
        self.repo.rsplit('/').next().unwrap_or(&self.repo)
    }
}

/// Require an `owner/name` repository safe to place in URLs and command lines.
pub fn validate_repo(repo: &str) -> Result<()> {
    let mut parts = repo.split('/');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => is_repo_segment(owner) && is_repo_segment(name),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "repo must be in owner/name form, got '{}'",
            repo
        )))
    }
}

fn is_repo_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('-')
        && segment.chars().any(|c| c != '.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub repo: String,
    pub branch: String,
    /// Overall outcome: `success`, `failed`, or `in_progress` when handed to external CI
    pub status: StageStatus,
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: RunMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_takes_precedence_over_query() {
        let body = TriggerRequest {
            repo: Some("octocat/Hello-World".to_string()),
            branch: None,
        };
        let query = TriggerQuery {
            repo: Some("other/repo".to_string()),
            branch: Some("dev".to_string()),
        };

        let target = PipelineTarget::resolve(body, query).unwrap();
        assert_eq!(target.repo, "octocat/Hello-World");
        assert_eq!(target.branch, "dev");
    }

    #[test]
    fn test_branch_defaults_to_main() {
        let query = TriggerQuery {
            repo: Some("octocat/Hello-World".to_string()),
            branch: Some("  ".to_string()),
        };

        let target = PipelineTarget::resolve(TriggerRequest::default(), query).unwrap();
        assert_eq!(target.branch, "main");
    }

    #[test]
    fn test_missing_repo_resolves_to_none() {
        assert!(PipelineTarget::resolve(TriggerRequest::default(), TriggerQuery::default()).is_none());

        let blank = TriggerRequest {
            repo: Some("   ".to_string()),
            branch: None,
        };
        assert!(PipelineTarget::resolve(blank, TriggerQuery::default()).is_none());
    }

    fn target(repo: &str, branch: &str) -> PipelineTarget {
        PipelineTarget {
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_owner_name() {
        assert!(target("octocat/Hello-World", "main").validate().is_ok());
        assert!(target("my_org/repo.rs", "feature/x-1").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_repo() {
        for repo in [
            "octocat",
            "a/b/c",
            "/b",
            "a/",
            "--upload-pack=x/y",
            "a/b c",
            "a/$(id)",
            "../etc",
            "octocat/..",
            "../../user?x=",
        ] {
            let err = target(repo, "main").validate().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{} should be rejected", repo);
        }
    }

    #[test]
    fn test_validate_accepts_dotted_names() {
        assert!(validate_repo("octocat/.github").is_ok());
        assert!(validate_repo("octocat/repo.").is_ok());
    }

    #[test]
    fn test_validate_rejects_flag_like_branch() {
        assert!(target("a/b", "--exec=x").validate().is_err());
        assert!(target("a/b", "main dev").validate().is_err());
    }

    #[test]
    fn test_basename() {
        let target = PipelineTarget {
            repo: "octocat/Hello-World".to_string(),
            branch: "main".to_string(),
        };
        assert_eq!(target.basename(), "Hello-World");
    }

    #[test]
    fn test_response_uses_camel_case_metrics() {
        let response = TriggerResponse {
            repo: "a/b".to_string(),
            branch: "main".to_string(),
            status: StageStatus::Success,
            stages: vec![],
            error: None,
            metrics: RunMetrics {
                started_at: Utc::now(),
                duration_seconds: 1.5,
            },
        };
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["metrics"]["durationSeconds"], 1.5);
        assert!(value["metrics"]["startedAt"].is_string());
        assert!(value.get("error").is_none());
    }
}

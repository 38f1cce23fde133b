use super::{var, Lookup};

/// GitHub repository and Actions API settings
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Default `owner/name` repository (env: `GITHUB_REPO`)
    pub repo: Option<String>,
    /// API token used for Actions queries and workflow dispatch (env: `GITHUB_TOKEN`)
    pub token: Option<String>,
    /// REST API base (env: `GITHUB_API_URL`)
    pub api_url: String,
    /// Web base used for clone URLs and links (env: `GITHUB_URL`)
    pub web_url: String,
}

impl GithubConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            repo: var(lookup, "GITHUB_REPO"),
            token: var(lookup, "GITHUB_TOKEN"),
            api_url: base_url(lookup, "GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            web_url: base_url(lookup, "GITHUB_URL")
                .unwrap_or_else(|| "https://github.com".to_string()),
        }
    }

    /// Repository link for a given `owner/name`
    pub fn repo_url(&self, repo: &str) -> String {
        format!("{}/{}", self.web_url, repo)
    }

    /// Clone URL for a given `owner/name`
    pub fn clone_url(&self, repo: &str) -> String {
        format!("{}/{}.git", self.web_url, repo)
    }
}

/// Jenkins job settings
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    pub url: Option<String>,
    pub job: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
}

impl JenkinsConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            url: base_url(lookup, "JENKINS_URL"),
            job: var(lookup, "JENKINS_JOB"),
            user: var(lookup, "JENKINS_USER"),
            token: var(lookup, "JENKINS_TOKEN"),
        }
    }

    /// Base URL of the configured job, if both URL and job are set
    pub fn job_url(&self) -> Option<String> {
        match (&self.url, &self.job) {
            (Some(url), Some(job)) => Some(format!("{}/job/{}", url, job)),
            _ => None,
        }
    }
}

pub(crate) fn base_url(lookup: Lookup<'_>, key: &str) -> Option<String> {
    var(lookup, key).map(|v| v.trim_end_matches('/').to_string())
}

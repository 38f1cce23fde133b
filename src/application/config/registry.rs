use super::ci::base_url;
use super::{var, Lookup};

/// Container registry (DockerHub) settings
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// `namespace/name` repository on the registry (env: `DOCKERHUB_REPO`)
    pub repo: Option<String>,
    /// Tag checked by the overview probe (env: `DOCKERHUB_TAG`)
    pub tag: String,
    pub username: Option<String>,
    pub token: Option<String>,
    /// Registry API base (env: `DOCKERHUB_API_URL`)
    pub api_url: String,
    /// Local image name override (env: `IMAGE_NAME`)
    pub image_name: Option<String>,
}

impl RegistryConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            repo: var(lookup, "DOCKERHUB_REPO"),
            tag: var(lookup, "DOCKERHUB_TAG").unwrap_or_else(|| "latest".to_string()),
            username: var(lookup, "DOCKERHUB_USERNAME"),
            token: var(lookup, "DOCKERHUB_TOKEN"),
            api_url: base_url(lookup, "DOCKERHUB_API_URL")
                .unwrap_or_else(|| "https://hub.docker.com".to_string()),
            image_name: var(lookup, "IMAGE_NAME"),
        }
    }

    /// Username and token, present only when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => Some((user.as_str(), token.as_str())),
            _ => None,
        }
    }

    /// Public page of the registry repository
    pub fn repo_page(&self) -> Option<String> {
        self.repo
            .as_ref()
            .map(|repo| format!("https://hub.docker.com/r/{}", repo))
    }
}

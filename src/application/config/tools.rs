use super::{var, Lookup};

/// Paths of the external binaries the pipeline shells out to
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub git: String,
    pub docker: String,
    pub kubectl: String,
    pub python: String,
    pub npm: String,
}

impl ToolsConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let tool = |key: &str, default: &str| var(lookup, key).unwrap_or_else(|| default.to_string());

        Self {
            git: tool("GIT_PATH", "git"),
            docker: tool("DOCKER_PATH", "docker"),
            kubectl: tool("KUBECTL_PATH", "kubectl"),
            python: tool("PYTHON_PATH", "python"),
            npm: tool("NPM_PATH", "npm"),
        }
    }
}

use super::{var, Lookup};

#[derive(Debug, Clone)]
pub struct KubernetesConfig {
    pub deployment: String,
    pub namespace: String,
    /// Container within the deployment whose image is updated.
    /// Defaults to the deployment name.
    pub container: String,
}

impl KubernetesConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let deployment =
            var(lookup, "K8S_DEPLOYMENT").unwrap_or_else(|| "user-service".to_string());

        Self {
            container: var(lookup, "K8S_CONTAINER").unwrap_or_else(|| deployment.clone()),
            namespace: var(lookup, "K8S_NAMESPACE").unwrap_or_else(|| "default".to_string()),
            deployment,
        }
    }
}

pub mod ci;
pub mod kubernetes;
pub mod monitoring;
pub mod pipeline;
pub mod registry;
pub mod server;
pub mod tools;

use once_cell::sync::Lazy;
use std::env;

/// Source of configuration values, keyed by environment variable name.
///
/// `from_env()` constructors read the process environment; tests build a
/// [`Config`] from a fixed map through [`Config::from_lookup`].
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a value, treating empty strings as unset.
pub(crate) fn var(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn flag(lookup: Lookup<'_>, key: &str, default: bool) -> bool {
    match var(lookup, key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        None => default,
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub github: ci::GithubConfig,
    pub jenkins: ci::JenkinsConfig,
    pub registry: registry::RegistryConfig,
    pub kubernetes: kubernetes::KubernetesConfig,
    pub monitoring: monitoring::MonitoringConfig,
    pub tools: tools::ToolsConfig,
    pub pipeline: pipeline::PipelineConfig,

    pub version: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            server: server::ServerConfig::from_lookup(lookup),
            github: ci::GithubConfig::from_lookup(lookup),
            jenkins: ci::JenkinsConfig::from_lookup(lookup),
            registry: registry::RegistryConfig::from_lookup(lookup),
            kubernetes: kubernetes::KubernetesConfig::from_lookup(lookup),
            monitoring: monitoring::MonitoringConfig::from_lookup(lookup),
            tools: tools::ToolsConfig::from_lookup(lookup),
            pipeline: pipeline::PipelineConfig::from_lookup(lookup),

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: var(lookup, "PIPEWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(&|key: &str| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.log_level, "info");
        assert!(config.github.repo.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.kubernetes.deployment, "user-service");
        assert_eq!(config.kubernetes.namespace, "default");
        assert_eq!(config.kubernetes.container, "user-service");
        assert_eq!(config.registry.tag, "latest");
        assert!(config.pipeline.ci_fallback);
        assert!(config.monitoring.prometheus_url.is_none());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("GITHUB_TOKEN", "  "), ("JENKINS_URL", "")]);

        assert!(config.github.token.is_none());
        assert!(config.jenkins.url.is_none());
    }

    #[test]
    fn test_trailing_slashes_are_stripped() {
        let config = config_from(&[
            ("JENKINS_URL", "http://jenkins:8080/"),
            ("PROMETHEUS_URL", "http://prometheus:9090/"),
        ]);

        assert_eq!(config.jenkins.url.as_deref(), Some("http://jenkins:8080"));
        assert_eq!(
            config.monitoring.prometheus_url.as_deref(),
            Some("http://prometheus:9090")
        );
    }

    #[test]
    fn test_flag_parsing() {
        assert!(!config_from(&[("PIPEWATCH_CI_FALLBACK", "false")]).pipeline.ci_fallback);
        assert!(!config_from(&[("PIPEWATCH_CI_FALLBACK", "0")]).pipeline.ci_fallback);
        assert!(config_from(&[("PIPEWATCH_CI_FALLBACK", "TRUE")]).pipeline.ci_fallback);
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let config = config_from(&[("PIPEWATCH_PORT", "not-a-port")]);
        assert_eq!(config.server.port, 5000);
    }
}

use super::ci::base_url;
use super::Lookup;

/// Configuration for external monitoring services
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Prometheus-compatible query API (env: `PROMETHEUS_URL`)
    pub prometheus_url: Option<String>,
    /// Dashboard link surfaced by `/api/tools` (env: `GRAFANA_URL`)
    pub grafana_url: Option<String>,
}

impl MonitoringConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            prometheus_url: base_url(lookup, "PROMETHEUS_URL"),
            grafana_url: base_url(lookup, "GRAFANA_URL"),
        }
    }
}

use super::{var, Lookup};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from `PIPEWATCH_ALLOWED_ORIGINS` (comma-separated).
    /// When empty, any origin is allowed.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let allowed_origins = var(lookup, "PIPEWATCH_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: var(lookup, "PIPEWATCH_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var(lookup, "PIPEWATCH_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            allowed_origins,
        }
    }
}

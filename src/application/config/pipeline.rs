use super::{flag, Lookup};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Trigger external CI when the clone step fails (env: `PIPEWATCH_CI_FALLBACK`)
    pub ci_fallback: bool,
}

impl PipelineConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            ci_fallback: flag(lookup, "PIPEWATCH_CI_FALLBACK", true),
        }
    }
}

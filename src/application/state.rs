use std::sync::Arc;

use crate::config::Config;
use crate::services::command::{CommandRunner, ProcessRunner};
use crate::services::metrics::MetricsRegistry;

/// Shared command runner
pub type SharedRunner = Arc<dyn CommandRunner>;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub metrics: Arc<MetricsRegistry>,
    pub runner: SharedRunner,
}

impl AppState {
    pub fn new(config: Config, runner: SharedRunner) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(MetricsRegistry::new()),
            runner,
        }
    }

    /// State that runs real processes
    pub fn with_process_runner(config: Config) -> Self {
        Self::new(config, Arc::new(ProcessRunner::new()))
    }
}

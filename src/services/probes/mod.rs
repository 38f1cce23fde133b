//! Read-only status probes against the systems around the pipeline.
//!
//! Every probe degrades instead of failing: missing configuration becomes
//! [`ProbeOutcome::Unconfigured`], and any transport error, unexpected HTTP
//! status or unparseable payload becomes [`ProbeOutcome::Unreachable`].

pub mod deployment;
pub mod github;
pub mod jenkins;
pub mod prometheus;
pub mod registry;

use std::time::Duration;

use once_cell::sync::Lazy;

use crate::schemas::{Stage, StageStatus};

/// Timeout applied to every probe request
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// Shared reqwest client for probe and CI API requests
#[allow(clippy::expect_used)]
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .user_agent(concat!("pipewatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build probe HTTP client")
});

/// Normalized probe payload
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub status: StageStatus,
    pub detail: Option<String>,
    pub url: Option<String>,
}

impl ProbeResult {
    pub fn new(status: StageStatus) -> Self {
        Self {
            status,
            detail: None,
            url: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }
}

/// Outcome of a probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T = ProbeResult> {
    Ok(T),
    /// Required configuration is missing
    Unconfigured,
    /// The backend could not be reached or answered with something unusable
    Unreachable,
}

impl<T> ProbeOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            ProbeOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }
}

impl ProbeOutcome<ProbeResult> {
    /// Render as an overview stage; unconfigured and unreachable probes become `unknown`
    pub fn into_stage(self, id: u32, name: &str) -> Stage {
        match self {
            ProbeOutcome::Ok(result) => {
                let mut stage = Stage::new(id, name, result.status).with_url(result.url);
                stage.detail = result.detail;
                stage
            }
            ProbeOutcome::Unconfigured => {
                Stage::new(id, name, StageStatus::Unknown).with_detail("not configured")
            }
            ProbeOutcome::Unreachable => {
                Stage::new(id, name, StageStatus::Unknown).with_detail("unreachable")
            }
        }
    }
}

/// Map CI run vocabulary (`status` + `conclusion`) onto a stage status
pub fn normalize_run_status(status: Option<&str>, conclusion: Option<&str>) -> StageStatus {
    match (status, conclusion) {
        (Some("in_progress" | "queued"), _) => StageStatus::InProgress,
        (Some("completed"), Some("success")) => StageStatus::Success,
        (Some("completed"), _) => StageStatus::Failed,
        _ => StageStatus::Unknown,
    }
}

use serde_json::Value;
use tracing::warn;

use super::{ProbeOutcome, ProbeResult, PROBE_TIMEOUT};
use crate::config::kubernetes::KubernetesConfig;
use crate::config::tools::ToolsConfig;
use crate::schemas::StageStatus;
use crate::services::command::{CommandRunner, CommandSpec};

/// Replica counts reported for a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaCounts {
    pub desired: i64,
    pub available: i64,
    pub updated: i64,
}

impl ReplicaCounts {
    /// Parse `kubectl get deployment -o json` output
    pub fn from_json(doc: &Value) -> Self {
        let count = |v: &Value| v.as_i64().unwrap_or(0);
        Self {
            desired: doc["spec"]["replicas"].as_i64().unwrap_or(1),
            available: count(&doc["status"]["availableReplicas"]),
            updated: count(&doc["status"]["updatedReplicas"]),
        }
    }

    pub fn is_rolled_out(&self) -> bool {
        self.available >= self.desired && self.updated >= self.desired
    }
}

/// Rollout status of the configured deployment, via kubectl
pub async fn deployment_status(
    runner: &dyn CommandRunner,
    tools: &ToolsConfig,
    kubernetes: &KubernetesConfig,
) -> ProbeOutcome {
    let spec = CommandSpec::new(
        tools.kubectl.as_str(),
        [
            "get",
            "deployment",
            kubernetes.deployment.as_str(),
            "-n",
            kubernetes.namespace.as_str(),
            "-o",
            "json",
        ],
    )
    .timeout(PROBE_TIMEOUT);

    let out = runner.run(&spec).await;
    if !out.success() {
        return ProbeOutcome::Ok(
            ProbeResult::new(StageStatus::Failed).with_detail(out.output.trim().to_string()),
        );
    }

    let doc: Value = match serde_json::from_str(&out.output) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(
                "Unparseable kubectl output for deployment {}: {}",
                kubernetes.deployment, e
            );
            return ProbeOutcome::Unreachable;
        }
    };

    let counts = ReplicaCounts::from_json(&doc);
    let status = if counts.is_rolled_out() {
        StageStatus::Success
    } else {
        StageStatus::InProgress
    };

    ProbeOutcome::Ok(ProbeResult::new(status).with_detail(format!(
        "{}/{}: {}/{} available, {} updated",
        kubernetes.namespace,
        kubernetes.deployment,
        counts.available,
        counts.desired,
        counts.updated
    )))
}

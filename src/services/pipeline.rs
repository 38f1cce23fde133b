//! Demo delivery pipeline: clone, test, build, push, deploy.
//!
//! Steps run strictly in order inside a fresh temporary workspace. The first
//! fatal failure ends the run. The workspace is deleted on a blocking thread
//! once the run ends, or when the run is dropped part way through.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::schemas::{PipelineTarget, RunMetrics, Stage, StageStatus, TriggerResponse};
use crate::services::ci_trigger::trigger_external_ci;
use crate::services::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::services::probes::{github, ProbeOutcome};

/// Longest log excerpt attached to a stage, in characters
pub const MAX_LOG_CHARS: usize = 4000;

/// Log attached to the Test stage when no project marker is found
pub const NO_TESTS_LOG: &str = "no tests detected";

/// Image name used when the repository name has no usable characters
pub const FALLBACK_IMAGE_NAME: &str = "app";

const CLONE_TIMEOUT: Duration = Duration::from_secs(120);
const TEST_TIMEOUT: Duration = Duration::from_secs(300);
const BUILD_TIMEOUT: Duration = Duration::from_secs(600);
const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(120);
const QUICK_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline positions, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Clone,
    Test,
    Build,
    Push,
    Deploy,
}

impl PipelineStep {
    pub const FIRST: PipelineStep = PipelineStep::Clone;

    /// Transition taken after the step succeeds
    pub fn next(self) -> Option<PipelineStep> {
        match self {
            PipelineStep::Clone => Some(PipelineStep::Test),
            PipelineStep::Test => Some(PipelineStep::Build),
            PipelineStep::Build => Some(PipelineStep::Push),
            PipelineStep::Push => Some(PipelineStep::Deploy),
            PipelineStep::Deploy => None,
        }
    }

    pub fn id(self) -> u32 {
        match self {
            PipelineStep::Clone => 1,
            PipelineStep::Test => 2,
            PipelineStep::Build => 3,
            PipelineStep::Push => 4,
            PipelineStep::Deploy => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PipelineStep::Clone => "Clone",
            PipelineStep::Test => "Test",
            PipelineStep::Build => "Build",
            PipelineStep::Push => "Push",
            PipelineStep::Deploy => "Deploy",
        }
    }

    fn stage(self, status: StageStatus) -> Stage {
        Stage::new(self.id(), self.name(), status)
    }

    /// Error reported when the step fails
    fn failure_message(self) -> &'static str {
        match self {
            PipelineStep::Clone => "Clone failed",
            PipelineStep::Test => "Tests failed",
            PipelineStep::Build => "Build failed",
            PipelineStep::Push => "Push failed",
            PipelineStep::Deploy => "Deploy failed",
        }
    }
}

/// Project type detected from marker files in the checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Python,
    Node,
}

impl ProjectKind {
    pub fn detect(dir: &Path) -> Option<ProjectKind> {
        if dir.join("requirements.txt").exists() || dir.join("setup.py").exists() {
            Some(ProjectKind::Python)
        } else if dir.join("package.json").exists() {
            Some(ProjectKind::Node)
        } else {
            None
        }
    }
}

enum StepOutcome {
    Continue(Stage),
    Halt(Stage),
}

/// Runs the demo pipeline against the configured tools
pub struct Pipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Execute one run to completion
    pub async fn run(&self, target: PipelineTarget) -> Result<TriggerResponse> {
        let workspace = tempfile::Builder::new().prefix("pipewatch-").tempdir()?;
        info!(
            repo = %target.repo,
            branch = %target.branch,
            workspace = %workspace.path().display(),
            "Starting pipeline run"
        );

        let mut run = PipelineRun {
            pipeline: self,
            checkout: workspace.path().join("repo"),
            workspace,
            target,
            started_at: Utc::now(),
            started: Instant::now(),
            stages: Vec::new(),
            image: None,
            deploy_tag: None,
        };

        let response = run.execute().await;
        remove_workspace(run.workspace).await;
        info!(
            repo = %response.repo,
            status = %response.status,
            stages = response.stages.len(),
            duration_seconds = response.metrics.duration_seconds,
            "Pipeline run finished"
        );
        Ok(response)
    }
}

/// State of one in-flight run
struct PipelineRun<'p, 'a> {
    pipeline: &'p Pipeline<'a>,
    // Deleted by remove_workspace, or on drop if the run is abandoned
    workspace: TempDir,
    checkout: PathBuf,
    target: PipelineTarget,
    started_at: DateTime<Utc>,
    started: Instant,
    stages: Vec<Stage>,
    /// Locally built image tag
    image: Option<String>,
    /// Tag handed to the deployment
    deploy_tag: Option<String>,
}

impl PipelineRun<'_, '_> {
    async fn execute(&mut self) -> TriggerResponse {
        let mut step = Some(PipelineStep::FIRST);
        let mut error = None;
        let mut handed_off = false;

        while let Some(current) = step {
            match self.step(current).await {
                StepOutcome::Continue(stage) => {
                    info!(stage = current.name(), status = %stage.status, "Stage complete");
                    self.stages.push(stage);
                    step = current.next();
                }
                StepOutcome::Halt(stage) => {
                    warn!(stage = current.name(), "Stage failed, stopping run");
                    self.stages.push(stage);
                    error = Some(current.failure_message().to_string());

                    if current == PipelineStep::Clone && self.pipeline.config.pipeline.ci_fallback {
                        handed_off = self.hand_off_to_ci().await;
                    }
                    break;
                }
            }
        }

        let status = match (&error, handed_off) {
            (None, _) => StageStatus::Success,
            (Some(_), true) => StageStatus::InProgress,
            (Some(_), false) => StageStatus::Failed,
        };

        TriggerResponse {
            repo: self.target.repo.clone(),
            branch: self.target.branch.clone(),
            status,
            stages: std::mem::take(&mut self.stages),
            error,
            metrics: RunMetrics {
                started_at: self.started_at,
                duration_seconds: round2(self.started.elapsed().as_secs_f64()),
            },
        }
    }

    async fn step(&mut self, step: PipelineStep) -> StepOutcome {
        match step {
            PipelineStep::Clone => self.clone_repo().await,
            PipelineStep::Test => self.run_tests().await,
            PipelineStep::Build => self.build_image().await,
            PipelineStep::Push => self.push_image().await,
            PipelineStep::Deploy => self.deploy().await,
        }
    }

    async fn exec(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput {
        let spec = CommandSpec::new(program, args.iter().copied())
            .current_dir(&self.checkout)
            .timeout(timeout);
        self.pipeline.runner.run(&spec).await
    }

    async fn clone_repo(&mut self) -> StepOutcome {
        let config = self.pipeline.config;
        let repo = self.target.repo.as_str();

        match github::repository_status(&config.github, repo).await {
            ProbeOutcome::Ok(result) if result.status == StageStatus::Failed => {
                warn!("Repository check: {}", result.detail.unwrap_or_default());
            }
            ProbeOutcome::Ok(_) => {}
            _ => warn!("Could not verify {} exists, cloning anyway", repo),
        }

        let checkout = self.checkout.display().to_string();
        let clone_url = config.github.clone_url(repo);
        let spec = CommandSpec::new(
            config.tools.git.as_str(),
            [
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--branch",
                self.target.branch.as_str(),
                clone_url.as_str(),
                checkout.as_str(),
            ],
        )
        .current_dir(self.workspace.path())
        .timeout(CLONE_TIMEOUT);

        let out = self.pipeline.runner.run(&spec).await;
        let stage = PipelineStep::Clone
            .stage(status_of(&out))
            .with_url(Some(config.github.repo_url(repo)))
            .with_log(log_tail(&out.output));

        if out.success() {
            StepOutcome::Continue(stage.with_detail(format!("cloned {}@{}", repo, self.target.branch)))
        } else {
            StepOutcome::Halt(stage.with_detail(format!("git clone exited with {}", out.code)))
        }
    }

    async fn hand_off_to_ci(&mut self) -> bool {
        let config = self.pipeline.config;
        let outcome = trigger_external_ci(
            &config.github,
            &config.jenkins,
            &self.target.repo,
            &self.target.branch,
        )
        .await;

        let status = if outcome.accepted {
            StageStatus::InProgress
        } else {
            StageStatus::Failed
        };
        info!(accepted = outcome.accepted, "External CI hand-off: {}", outcome.message);
        self.stages
            .push(Stage::new(2, "CI Trigger", status).with_detail(outcome.message));
        outcome.accepted
    }

    async fn run_tests(&mut self) -> StepOutcome {
        let tools = &self.pipeline.config.tools;

        let (detail, out) = match ProjectKind::detect(&self.checkout) {
            None => {
                return StepOutcome::Continue(
                    PipelineStep::Test
                        .stage(StageStatus::Success)
                        .with_log(NO_TESTS_LOG),
                )
            }
            Some(ProjectKind::Python) => (
                "python -m pytest",
                self.exec(&tools.python, &["-m", "pytest", "-q"], TEST_TIMEOUT)
                    .await,
            ),
            Some(ProjectKind::Node) => {
                let install = self.exec(&tools.npm, &["install"], TEST_TIMEOUT).await;
                if install.success() {
                    let test = self.exec(&tools.npm, &["test"], TEST_TIMEOUT).await;
                    ("npm test", merge(install, test))
                } else {
                    ("npm install", install)
                }
            }
        };

        let stage = PipelineStep::Test
            .stage(status_of(&out))
            .with_detail(format!("{} exited with {}", detail, out.code))
            .with_log(log_tail(&out.output));
        if out.success() {
            StepOutcome::Continue(stage)
        } else {
            StepOutcome::Halt(stage)
        }
    }

    async fn build_image(&mut self) -> StepOutcome {
        let config = self.pipeline.config;

        let rev = self
            .exec(&config.tools.git, &["rev-parse", "--short", "HEAD"], QUICK_TIMEOUT)
            .await;
        let sha = match rev.output.trim() {
            s if rev.success() && !s.is_empty() => s.to_string(),
            _ => "latest".to_string(),
        };

        let name = config
            .registry
            .image_name
            .clone()
            .unwrap_or_else(|| image_component(self.target.basename()));
        let tag = format!("{}:{}", name, sha);

        let out = self
            .exec(&config.tools.docker, &["build", "-t", &tag, "."], BUILD_TIMEOUT)
            .await;
        let stage = PipelineStep::Build
            .stage(status_of(&out))
            .with_detail(tag.clone())
            .with_log(log_tail(&out.output));

        if out.success() {
            self.image = Some(tag);
            StepOutcome::Continue(stage)
        } else {
            StepOutcome::Halt(stage)
        }
    }

    async fn push_image(&mut self) -> StepOutcome {
        let config = self.pipeline.config;
        let Some(local) = self.image.clone() else {
            return StepOutcome::Halt(
                PipelineStep::Push
                    .stage(StageStatus::Failed)
                    .with_detail("no image was built"),
            );
        };

        let Some((user, token)) = config.registry.credentials() else {
            self.deploy_tag = Some(local);
            return StepOutcome::Continue(
                PipelineStep::Push
                    .stage(StageStatus::InProgress)
                    .with_detail("registry credentials not configured; push skipped"),
            );
        };

        let remote = remote_tag(&local, config.registry.repo.as_deref(), user);
        let docker = config.tools.docker.as_str();

        let login = CommandSpec::new(docker, ["login", "-u", user, "--password-stdin"])
            .stdin(token)
            .timeout(LOGIN_TIMEOUT);
        let mut out = self.pipeline.runner.run(&login).await;
        if out.success() {
            let tagged = self
                .exec(docker, &["tag", &local, &remote], QUICK_TIMEOUT)
                .await;
            out = merge(out, tagged);
        }
        if out.success() {
            let pushed = self.exec(docker, &["push", &remote], BUILD_TIMEOUT).await;
            out = merge(out, pushed);
        }

        let stage = PipelineStep::Push
            .stage(status_of(&out))
            .with_detail(remote.clone())
            .with_url(config.registry.repo_page())
            .with_log(log_tail(&out.output));

        if out.success() {
            self.deploy_tag = Some(remote);
            StepOutcome::Continue(stage)
        } else {
            StepOutcome::Halt(stage)
        }
    }

    async fn deploy(&mut self) -> StepOutcome {
        let config = self.pipeline.config;
        let k8s = &config.kubernetes;
        let Some(tag) = self.deploy_tag.clone().or_else(|| self.image.clone()) else {
            return StepOutcome::Halt(
                PipelineStep::Deploy
                    .stage(StageStatus::Failed)
                    .with_detail("no image to deploy"),
            );
        };

        let target = format!("deployment/{}", k8s.deployment);
        let assignment = format!("{}={}", k8s.container, tag);
        let out = self
            .exec(
                &config.tools.kubectl,
                &["set", "image", &target, &assignment, "-n", &k8s.namespace],
                DEPLOY_TIMEOUT,
            )
            .await;

        let stage = PipelineStep::Deploy
            .stage(status_of(&out))
            .with_detail(format!("{} -> {}", target, tag))
            .with_log(log_tail(&out.output));
        if out.success() {
            StepOutcome::Continue(stage)
        } else {
            StepOutcome::Halt(stage)
        }
    }
}

/// Delete a run's workspace off the async worker threads
async fn remove_workspace(workspace: TempDir) {
    let path = workspace.path().display().to_string();
    match tokio::task::spawn_blocking(move || workspace.close()).await {
        Ok(Ok(())) => debug!(workspace = %path, "Workspace removed"),
        Ok(Err(e)) => warn!("Failed to remove workspace {}: {}", path, e),
        Err(e) => warn!("Workspace cleanup for {} did not finish: {}", path, e),
    }
}

/// Reduce a repository name to a valid image name component.
///
/// Lowercases, joins alphanumeric runs with a single separator, and drops
/// leading and trailing separators.
fn image_component(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut pending: Option<char> = None;

    for c in raw.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if let Some(sep) = pending.take() {
                if !name.is_empty() {
                    name.push(sep);
                }
            }
            name.push(c);
        } else {
            let sep = if matches!(c, '.' | '_') { c } else { '-' };
            pending = Some(match pending {
                None => sep,
                Some(_) => '-',
            });
        }
    }

    if name.is_empty() {
        FALLBACK_IMAGE_NAME.to_string()
    } else {
        name
    }
}

fn status_of(out: &CommandOutput) -> StageStatus {
    if out.success() {
        StageStatus::Success
    } else {
        StageStatus::Failed
    }
}

/// Concatenate two command results, keeping the later exit code
fn merge(first: CommandOutput, second: CommandOutput) -> CommandOutput {
    CommandOutput::new(second.code, first.output + &second.output)
}

/// Registry reference for a local `name:sha` tag
fn remote_tag(local: &str, registry_repo: Option<&str>, user: &str) -> String {
    let (name, sha) = local.split_once(':').unwrap_or((local, "latest"));
    match registry_repo {
        Some(repo) => format!("{}:{}", repo, sha),
        None => format!("{}/{}:{}", user, name, sha),
    }
}

/// Last `MAX_LOG_CHARS` characters of a command's output
pub fn log_tail(output: &str) -> String {
    let count = output.chars().count();
    if count <= MAX_LOG_CHARS {
        return output.to_string();
    }
    output.chars().skip(count - MAX_LOG_CHARS).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_is_linear() {
        let mut order = vec![PipelineStep::FIRST];
        while let Some(next) = order.last().and_then(|s| s.next()) {
            order.push(next);
        }

        assert_eq!(
            order,
            vec![
                PipelineStep::Clone,
                PipelineStep::Test,
                PipelineStep::Build,
                PipelineStep::Push,
                PipelineStep::Deploy
            ]
        );
        let ids: Vec<u32> = order.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_detect_project_kind() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectKind::detect(dir.path()), None);

        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(ProjectKind::detect(dir.path()), Some(ProjectKind::Node));

        std::fs::write(dir.path().join("setup.py"), "").unwrap();
        assert_eq!(ProjectKind::detect(dir.path()), Some(ProjectKind::Python));
    }

    #[test]
    fn test_remote_tag() {
        assert_eq!(
            remote_tag("hello-world:abc123", Some("acme/web"), "bob"),
            "acme/web:abc123"
        );
        assert_eq!(
            remote_tag("hello-world:abc123", None, "bob"),
            "bob/hello-world:abc123"
        );
    }

    #[test]
    fn test_image_component_normalizes_names() {
        assert_eq!(image_component("Hello-World"), "hello-world");
        assert_eq!(image_component(".github"), "github");
        assert_eq!(image_component("repo."), "repo");
        assert_eq!(image_component("__init__"), "init");
        assert_eq!(image_component("a._b"), "a-b");
        assert_eq!(image_component("my.lib_rs"), "my.lib_rs");
        assert_eq!(image_component("--x--y--"), "x-y");
    }

    #[test]
    fn test_image_component_falls_back() {
        assert_eq!(image_component("..."), FALLBACK_IMAGE_NAME);
        assert_eq!(image_component("_-_"), FALLBACK_IMAGE_NAME);
    }

    #[tokio::test]
    async fn test_remove_workspace_deletes_directory() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::write(workspace.path().join("file"), "x").unwrap();
        let path = workspace.path().to_path_buf();

        remove_workspace(workspace).await;
        assert!(!path.exists());
    }

    #[test]
    fn test_log_tail_keeps_end_of_output() {
        assert_eq!(log_tail("short"), "short");

        let long = format!("{}END", "x".repeat(MAX_LOG_CHARS));
        let tail = log_tail(&long);
        assert_eq!(tail.chars().count(), MAX_LOG_CHARS);
        assert!(tail.ends_with("END"));
    }

    #[test]
    fn test_merge_keeps_last_code() {
        let merged = merge(CommandOutput::new(0, "a\n"), CommandOutput::new(2, "b\n"));
        assert_eq!(merged, CommandOutput::new(2, "a\nb\n"));
    }
}

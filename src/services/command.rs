//! External process execution.
//!
//! Commands are spawned directly (no shell), with stdout and stderr captured
//! line by line into one buffer in arrival order. Invalid UTF-8 is replaced,
//! never treated as a read error. Failures never surface as
//! errors: a timeout or spawn failure is reported through the sentinel exit
//! code [`FAILURE_CODE`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported for timeouts, spawn errors and signal termination
pub const FAILURE_CODE: i32 = -1;

/// Output text reported when a command exceeds its timeout
pub const TIMEOUT_MESSAGE: &str = "command timed out";

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            stdin: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined for logging
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit code plus combined output of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn new(code: i32, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        debug!(command = %spec.display(), timeout_secs = spec.timeout.as_secs(), "running command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", spec.program, e);
                return CommandOutput::new(FAILURE_CODE, e.to_string());
            }
        };

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collected = Mutex::new(String::new());

        let finished = tokio::time::timeout(spec.timeout, async {
            if let (Some(mut pipe), Some(input)) = (stdin, spec.stdin.as_ref()) {
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    warn!("Failed to write stdin of {}: {}", spec.program, e);
                }
                // Dropping the pipe closes stdin so the child sees EOF
            }
            tokio::join!(pump(stdout, &collected), pump(stderr, &collected));
            child.wait().await
        })
        .await;

        match finished {
            Ok(Ok(status)) => CommandOutput::new(
                status.code().unwrap_or(FAILURE_CODE),
                collected.into_inner(),
            ),
            Ok(Err(e)) => {
                warn!("Failed to wait for {}: {}", spec.program, e);
                CommandOutput::new(FAILURE_CODE, e.to_string())
            }
            Err(_) => {
                warn!(command = %spec.display(), timeout_secs = spec.timeout.as_secs(), "command timed out");
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", spec.program, e);
                }
                CommandOutput::new(FAILURE_CODE, TIMEOUT_MESSAGE)
            }
        }
    }
}

/// Append every line of a pipe to the shared buffer
async fn pump<R>(pipe: Option<R>, collected: &Mutex<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else { return };
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => collected.lock().push_str(&String::from_utf8_lossy(&line)),
            Err(e) => {
                warn!("error reading command output: {}", e);
                // Keep the pipe open until EOF so the child never sees SIGPIPE
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    warn!("error draining command output: {}", e);
                }
                break;
            }
        }
    }
}

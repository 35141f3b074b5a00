//! Process-spawning transport for prepared scripts.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// A script ready to run: injected source plus its escaped command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Script text after parameter injection, before shell escaping.
    pub script: String,
    /// Complete shell command line (`<interpreter> -e '<escaped script>'`).
    pub command_line: String,
    /// Wall-clock budget the bridge enforces around the run.
    pub timeout: Duration,
}

/// Captured result of a finished interpreter process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// Successful run printing `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with exit `code` and diagnostic `stderr`.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status_code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Executes prepared invocations.
///
/// Implementations only spawn and collect output. Timeouts, retries and
/// classification belong to [`super::ScriptBridge`], which drops the
/// returned future when the budget is exceeded.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<RunOutput>;
}

/// Runs invocations through `sh -c`, killing the child if the run is abandoned.
#[derive(Debug, Clone)]
pub struct ShellScriptRunner {
    shell: String,
}

impl ShellScriptRunner {
    /// Runner using `/bin/sh`.
    pub fn new() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
        }
    }

    /// Runner using a custom POSIX shell.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl Default for ShellScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptRunner for ShellScriptRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<RunOutput> {
        debug!(shell = %self.shell, script_bytes = invocation.script.len(), "spawning interpreter");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(exec_command_line(&invocation.command_line))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(RunOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The interpreter replaces the shell, so `kill_on_drop` reaches it.
fn exec_command_line(command_line: &str) -> String {
    format!("exec {}", command_line)
}

//! Script invocation: preparation, execution, parsing and classification.
//!
//! A call goes through four steps:
//!
//! 1. resolve the [`ScriptRef`] to source text (named scripts via a [`ScriptLoader`]);
//! 2. inject parameters into `{{name}}` placeholders, then escape the finished
//!    text for the shell command line (the order matters, see
//!    [`focusbridge_util::script_text`]);
//! 3. run it through a [`ScriptRunner`] under a wall-clock timeout;
//! 4. parse stdout, or classify the failure.
//!
//! An `AppUnavailable` failure is retried once after a fixed delay. This retry
//! sits inside whatever retry loop the caller runs, so one logical call can
//! wait at both levels.

mod loader;
mod response;
mod runner;

pub use loader::{DirectoryScriptLoader, ScriptLoader, StaticScriptLoader};
pub use response::parse_output;
pub use runner::{Invocation, RunOutput, ScriptRunner, ShellScriptRunner};

use focusbridge_types::{ErrorInfo, ErrorKind, ScriptOutcome};
use focusbridge_util::{inject_parameters, shell_single_quote};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::classifier::classify;

/// Script to invoke: literal source or a name resolved by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScriptRef {
    Inline(String),
    Named(String),
}

impl ScriptRef {
    pub fn inline(text: impl Into<String>) -> Self {
        Self::Inline(text.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for ScriptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptRef::Inline(_) => f.write_str("<inline>"),
            ScriptRef::Named(name) => f.write_str(name),
        }
    }
}

/// Tunables for a [`ScriptBridge`].
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Interpreter command the escaped script is appended to.
    pub interpreter: String,
    /// Wall-clock budget per process run.
    pub invocation_timeout: Duration,
    /// Delay before the single retry of an `AppUnavailable` failure.
    pub unavailable_retry_delay: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            interpreter: "osascript -l JavaScript".to_string(),
            invocation_timeout: Duration::from_secs(10),
            unavailable_retry_delay: Duration::from_secs(1),
        }
    }
}

/// Executes automation scripts and produces classified outcomes.
pub struct ScriptBridge {
    runner: Arc<dyn ScriptRunner>,
    loader: Arc<dyn ScriptLoader>,
    settings: BridgeSettings,
}

impl fmt::Debug for ScriptBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptBridge").field("settings", &self.settings).finish()
    }
}

impl ScriptBridge {
    pub fn new(runner: Arc<dyn ScriptRunner>, loader: Arc<dyn ScriptLoader>, settings: BridgeSettings) -> Self {
        Self {
            runner,
            loader,
            settings,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Run one script and return its outcome. Never fails; every failure is
    /// folded into the envelope.
    pub async fn invoke(&self, script: &ScriptRef, params: &Map<String, Value>) -> ScriptOutcome<Value> {
        let source = match self.resolve(script).await {
            Ok(source) => source,
            Err(info) => return ScriptOutcome::failed(info),
        };
        let invocation = self.prepare(&source, params);

        let outcome = self.execute(&invocation).await;
        if outcome.error_kind() != Some(ErrorKind::AppUnavailable) {
            return outcome;
        }

        warn!(
            script = %script,
            delay_ms = self.settings.unavailable_retry_delay.as_millis() as u64,
            "application unavailable, retrying script once"
        );
        sleep(self.settings.unavailable_retry_delay).await;
        self.execute(&invocation).await
    }

    /// Inject `params` into `source` and build the escaped command line.
    pub fn prepare(&self, source: &str, params: &Map<String, Value>) -> Invocation {
        let script = inject_parameters(source, params);
        let command_line = format!("{} -e {}", self.settings.interpreter, shell_single_quote(&script));
        Invocation {
            script,
            command_line,
            timeout: self.settings.invocation_timeout,
        }
    }

    async fn resolve(&self, script: &ScriptRef) -> Result<String, ErrorInfo> {
        match script {
            ScriptRef::Inline(text) => Ok(text.clone()),
            ScriptRef::Named(name) => self
                .loader
                .load(name)
                .await
                .map_err(|error| ErrorInfo::new(ErrorKind::ScriptError, error.to_string())),
        }
    }

    async fn execute(&self, invocation: &Invocation) -> ScriptOutcome<Value> {
        let output = match timeout(invocation.timeout, self.runner.run(invocation)).await {
            Ok(Ok(output)) => output,
            Ok(Err(spawn_error)) => {
                let message = format!("Failed to start interpreter: {}", spawn_error);
                return ScriptOutcome::failed(classify(&message, ""));
            }
            Err(_) => {
                let message = format!("Script timed out after {}s", invocation.timeout.as_secs_f64());
                warn!(timeout_ms = invocation.timeout.as_millis() as u64, "script invocation timed out");
                return ScriptOutcome::failed(ErrorInfo::new(ErrorKind::Timeout, message));
            }
        };

        if output.succeeded() {
            return parse_output(&output.stdout);
        }

        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            match output.status_code {
                Some(code) => format!("Script exited with status {}", code),
                None => "Script terminated by signal".to_string(),
            }
        } else {
            stderr.to_string()
        };
        let info = classify(&message, output.stdout.trim());
        debug!(code = %info.code, kind = %info.kind, "script failed");
        ScriptOutcome::failed(info)
    }
}

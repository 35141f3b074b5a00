//! Fake runners shared by the unit tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::script::{Invocation, RunOutput, ScriptRunner};

type Responder = Box<dyn Fn(&Invocation) -> io::Result<RunOutput> + Send + Sync>;

/// Runner that answers from a closure and records every script it sees.
pub(crate) struct ScriptedRunner {
    responder: Responder,
    delay: Duration,
    seen: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new(responder: impl Fn(&Invocation) -> io::Result<RunOutput> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Same output for every run.
    pub(crate) fn always(output: RunOutput) -> Arc<Self> {
        Self::new(move |_| Ok(output.clone()))
    }

    /// Outputs in order; the last one repeats.
    pub(crate) fn sequence(outputs: Vec<RunOutput>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(outputs));
        Self::new(move |_| {
            let mut queue = queue.lock().unwrap();
            let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
            Ok(next.unwrap_or_default())
        })
    }

    /// Every run fails to spawn.
    pub(crate) fn spawn_failure(message: &'static str) -> Arc<Self> {
        Self::new(move |_| Err(io::Error::new(io::ErrorKind::NotFound, message)))
    }

    /// Delay every run by `delay` before answering.
    pub(crate) fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        let mut runner = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("runner already shared"));
        runner.delay = delay;
        Arc::new(runner)
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn scripts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of runs whose script contains `needle`.
    pub(crate) fn calls_containing(&self, needle: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|script| script.contains(needle)).count()
    }
}

#[async_trait]
impl ScriptRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<RunOutput> {
        self.seen.lock().unwrap().push(invocation.script.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(invocation)
    }
}

/// Simulated application state for probe scripts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeApp {
    pub(crate) running: bool,
    pub(crate) permission: bool,
}

impl FakeApp {
    pub(crate) const HEALTHY: FakeApp = FakeApp {
        running: true,
        permission: true,
    };

    /// Answer a probe script, or `None` for anything else.
    pub(crate) fn answer(&self, invocation: &Invocation) -> Option<RunOutput> {
        let script = &invocation.script;
        if script.contains("probe:app-running") {
            return Some(RunOutput::success(self.running.to_string()));
        }
        if script.contains("probe:request-permission") {
            return Some(if self.permission {
                RunOutput::success(self.running.to_string())
            } else {
                RunOutput::failure(1, "execution error: Not authorized to send Apple events to OmniFocus. (-1743)")
            });
        }
        if script.contains("probe:database-info") {
            return Some(match (self.running, self.permission) {
                (false, _) => RunOutput::failure(1, "execution error: Application isn't running. (-600)"),
                (true, false) => {
                    RunOutput::failure(1, "execution error: Not authorized to send Apple events to OmniFocus. (-1743)")
                }
                (true, true) => RunOutput::success(r#"{"name": "OmniFocus", "taskCount": 12, "projectCount": 3}"#),
            });
        }
        None
    }
}

/// Build a JSON parameter map from an object literal.
pub(crate) fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

//! Built-in probe scripts and the periodic probe task.
//!
//! Each script carries a `probe:*` marker comment so transcripts and fakes
//! can tell them apart. The application name is injected as a parameter.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use super::ConnectionMonitor;

/// Whether the application process is running, without launching it.
pub const APP_RUNNING_SCRIPT: &str = r#"// focusbridge probe:app-running
const systemEvents = Application('System Events');
systemEvents.processes.whose({ name: {{application}} }).length > 0;
"#;

/// Sends a harmless event to the application, which triggers the macOS
/// automation consent prompt when permission has not been decided yet.
pub const REQUEST_PERMISSION_SCRIPT: &str = r#"// focusbridge probe:request-permission
const app = Application({{application}});
app.running();
"#;

/// Minimal database query confirming reachability and permission.
pub const DATABASE_INFO_SCRIPT: &str = r#"// focusbridge probe:database-info
const app = Application({{application}});
const doc = app.defaultDocument;
JSON.stringify({
  name: app.name(),
  taskCount: doc.flattenedTasks.length,
  projectCount: doc.flattenedProjects.length,
  tagCount: doc.flattenedTags.length
});
"#;

/// Handle to a running periodic probe. Stops the task on [`stop`](Self::stop) or drop.
#[derive(Debug)]
pub struct ProbeTaskHandle {
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl ProbeTaskHandle {
    /// Period between probes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task is still scheduled.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the task and wait for it to wind down.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        debug!("periodic connection probe stopped");
    }
}

impl Drop for ProbeTaskHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Start probing `monitor` every `every`; the first probe runs after one full period.
pub(crate) fn spawn_periodic_probe(monitor: Arc<ConnectionMonitor>, every: Duration) -> ProbeTaskHandle {
    // interval_at panics on a zero period.
    let every = every.max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        loop {
            ticker.tick().await;
            let status = monitor.probe().await;
            debug!(connected = status.connected, "periodic connection probe finished");
        }
    });
    ProbeTaskHandle {
        handle: Some(handle),
        interval: every,
    }
}

//! Connection health monitoring.
//!
//! The [`ConnectionMonitor`] owns the single [`ConnectionStatus`] snapshot of
//! a client. Snapshots are replaced whole under a write lock, so readers
//! always see a consistent value. Probes may run concurrently (periodic task
//! and caller-driven repairs); the most recent write wins.
//!
//! Phases: `Unknown → Probing → {Healthy, Unhealthy}`, with `Probing`
//! re-entered by every probe and every repair sequence.

mod probe;

pub use probe::{APP_RUNNING_SCRIPT, DATABASE_INFO_SCRIPT, ProbeTaskHandle, REQUEST_PERMISSION_SCRIPT};

use chrono::{DateTime, Utc};
use focusbridge_types::{ConnectionStatus, ErrorKind, MonitorPhase, ScriptOutcome};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::script::{ScriptBridge, ScriptRef};

/// Error recorded when the permission request fails.
pub const PERMISSION_NOT_GRANTED: &str = "Automation permissions not granted";

#[derive(Debug, Default)]
struct MonitorState {
    status: ConnectionStatus,
    phase: MonitorPhase,
}

/// Tracks and repairs connectivity to the scripted application.
#[derive(Debug)]
pub struct ConnectionMonitor {
    bridge: Arc<ScriptBridge>,
    application: String,
    state: RwLock<MonitorState>,
}

impl ConnectionMonitor {
    pub fn new(bridge: Arc<ScriptBridge>, application: impl Into<String>) -> Self {
        Self {
            bridge,
            application: application.into(),
            state: RwLock::new(MonitorState::default()),
        }
    }

    /// Name of the monitored application.
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Error text used when the application process is absent.
    pub fn not_running_message(&self) -> String {
        format!("{} is not running", self.application)
    }

    /// Parameters injected into the probe scripts.
    pub fn probe_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("application".to_string(), Value::String(self.application.clone()));
        params
    }

    /// Copy of the last stored snapshot.
    pub async fn status(&self) -> ConnectionStatus {
        self.state.read().await.status.clone()
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> MonitorPhase {
        self.state.read().await.phase
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.status.connected
    }

    /// Check availability and permission, store the resulting snapshot and return it.
    pub async fn probe(&self) -> ConnectionStatus {
        self.enter_probing().await;

        if !self.app_running().await {
            let message = self.not_running_message();
            return self
                .store(|checked_at| ConnectionStatus::unhealthy(false, false, message, checked_at))
                .await;
        }

        let outcome = self.database_info().await;
        match outcome.error {
            None => self.store(ConnectionStatus::healthy).await,
            Some(error) => {
                let permissions_granted = error.kind != ErrorKind::Permission;
                warn!(code = %error.code, "connection probe failed: {}", error.message);
                self.store(|checked_at| ConnectionStatus::unhealthy(true, permissions_granted, error.message, checked_at))
                    .await
            }
        }
    }

    /// Repair the connection if it is marked down; returns whether it is usable.
    pub async fn ensure_connected(&self) -> bool {
        if self.is_connected().await {
            return true;
        }
        self.enter_probing().await;
        debug!(application = %self.application, "attempting connection repair");

        if let Err(message) = self.request_permission().await {
            warn!("automation permission request failed: {}", message);
            self.replace_status(|previous, checked_at| {
                ConnectionStatus::unhealthy(previous.app_running, false, PERMISSION_NOT_GRANTED, checked_at)
            })
            .await;
            return false;
        }

        if !self.app_running().await {
            let message = self.not_running_message();
            self.replace_status(|_, checked_at| ConnectionStatus::unhealthy(false, true, message, checked_at))
                .await;
            return false;
        }

        self.probe().await.connected
    }

    /// Mark the snapshot disconnected so the next [`ensure_connected`](Self::ensure_connected) repairs.
    pub async fn mark_disconnected(&self, reason: impl Into<String>) {
        let mut state = self.state.write().await;
        state.status = state.status.disconnected(reason);
        state.phase = MonitorPhase::Unhealthy;
    }

    /// Run the database-info diagnostic script.
    pub async fn database_info(&self) -> ScriptOutcome<Value> {
        self.bridge
            .invoke(&ScriptRef::inline(DATABASE_INFO_SCRIPT), &self.probe_params())
            .await
    }

    /// Probe every `every` in the background until the handle is stopped or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_periodic_probe(self: &Arc<Self>, every: Duration) -> ProbeTaskHandle {
        debug!(interval_secs = every.as_secs(), "starting periodic connection probe");
        probe::spawn_periodic_probe(Arc::clone(self), every)
    }

    async fn app_running(&self) -> bool {
        let outcome = self
            .bridge
            .invoke(&ScriptRef::inline(APP_RUNNING_SCRIPT), &self.probe_params())
            .await;
        match outcome.into_result() {
            Ok(Some(Value::Bool(running))) => running,
            Ok(Some(Value::String(text))) => text.trim().eq_ignore_ascii_case("true"),
            Ok(_) => false,
            Err(error) => {
                debug!(code = %error.code, "availability check failed: {}", error.message);
                false
            }
        }
    }

    async fn request_permission(&self) -> Result<(), String> {
        let outcome = self
            .bridge
            .invoke(&ScriptRef::inline(REQUEST_PERMISSION_SCRIPT), &self.probe_params())
            .await;
        outcome.into_result().map(|_| ()).map_err(|error| error.message)
    }

    async fn enter_probing(&self) {
        self.state.write().await.phase = MonitorPhase::Probing;
    }

    async fn store(&self, build: impl FnOnce(DateTime<Utc>) -> ConnectionStatus) -> ConnectionStatus {
        self.replace_status(|_, checked_at| build(checked_at)).await
    }

    async fn replace_status(
        &self,
        build: impl FnOnce(&ConnectionStatus, DateTime<Utc>) -> ConnectionStatus,
    ) -> ConnectionStatus {
        let mut state = self.state.write().await;
        let checked_at = state.status.next_check_time();
        let next = build(&state.status, checked_at);

        if next.connected != state.status.connected {
            if next.connected {
                info!(application = %self.application, "connection established");
            } else {
                info!(
                    application = %self.application,
                    error = next.error.as_deref().unwrap_or_default(),
                    "connection lost"
                );
            }
        }
        state.phase = if next.connected {
            MonitorPhase::Healthy
        } else {
            MonitorPhase::Unhealthy
        };
        state.status = next.clone();
        next
    }
}

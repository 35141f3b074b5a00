//! Connection status types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Last-known view of the automation connection.
///
/// A snapshot is always replaced as a whole; the builders below return new
/// values instead of mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    /// Whether scripts can currently reach the application.
    pub connected: bool,

    /// Whether the application process is running.
    pub app_running: bool,

    /// Whether the interpreter holds automation permission.
    pub permissions_granted: bool,

    /// Time of the probe that produced this snapshot.
    pub last_checked: Option<DateTime<Utc>>,

    /// Description of the last failure, if disconnected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    /// Status before any probe has run.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Fully healthy snapshot.
    pub fn healthy(checked_at: DateTime<Utc>) -> Self {
        Self {
            connected: true,
            app_running: true,
            permissions_granted: true,
            last_checked: Some(checked_at),
            error: None,
        }
    }

    /// Disconnected snapshot with explicit component flags.
    pub fn unhealthy(
        app_running: bool,
        permissions_granted: bool,
        error: impl Into<String>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            connected: false,
            app_running,
            permissions_granted,
            last_checked: Some(checked_at),
            error: Some(error.into()),
        }
    }

    /// Copy of this snapshot marked disconnected with `error`.
    pub fn disconnected(&self, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
            ..self.clone()
        }
    }

    /// Check if the connection is usable.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// A timestamp strictly later than this snapshot's `last_checked`.
    ///
    /// Uses the wall clock unless it has not advanced past the previous stamp.
    pub fn next_check_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.last_checked {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        }
    }
}

/// Lifecycle phase of the connection monitor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// A probe or repair sequence is in flight.
    Probing,
    /// The last probe succeeded.
    Healthy,
    /// The last probe or repair failed.
    Unhealthy,
}

impl MonitorPhase {
    /// Get the display text for this phase.
    pub fn display(&self) -> &'static str {
        match self {
            MonitorPhase::Unknown => "Unknown",
            MonitorPhase::Probing => "Probing",
            MonitorPhase::Healthy => "Healthy",
            MonitorPhase::Unhealthy => "Unhealthy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_disconnected() {
        let status = ConnectionStatus::unknown();
        assert!(!status.is_connected());
        assert!(status.last_checked.is_none());
        assert!(status.error.is_none());
    }

    #[test]
    fn disconnected_copy_keeps_component_flags() {
        let healthy = ConnectionStatus::healthy(Utc::now());
        let down = healthy.disconnected("connection reset");
        assert!(!down.connected);
        assert!(down.app_running);
        assert!(down.permissions_granted);
        assert_eq!(down.last_checked, healthy.last_checked);
        assert_eq!(down.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn next_check_time_is_strictly_later() {
        let future = Utc::now() + Duration::seconds(60);
        let status = ConnectionStatus::healthy(future);
        assert!(status.next_check_time() > future);

        let unknown = ConnectionStatus::unknown();
        assert!(unknown.next_check_time() <= Utc::now());
    }

    #[test]
    fn serializes_camel_case() {
        let status = ConnectionStatus::unhealthy(false, false, "OmniFocus is not running", Utc::now());
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["appRunning"], false);
        assert_eq!(value["permissionsGranted"], false);
        assert_eq!(value["error"], "OmniFocus is not running");
    }
}

//! Resilient client for an automation-scripted desktop application.
//!
//! The application exposes no network API; every call spawns a short-lived
//! interpreter process. This crate layers connection monitoring, bounded
//! retries, error classification and response caching on top of that
//! interface so callers see a well-behaved async client.
//!
//! Layering, leaf first: [`classifier`] → [`script::ScriptBridge`] →
//! [`monitor::ConnectionMonitor`] → [`retry::RetryExecutor`] →
//! [`client::FocusClient`].

pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod retry;
pub mod script;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::classify;
pub use client::{FocusClient, ProjectQuery, TaskQuery};
pub use config::{ClientConfig, ConfigError};
pub use error::{BridgeError, LoadError};
pub use monitor::{ConnectionMonitor, ProbeTaskHandle};
pub use retry::RetryExecutor;
pub use script::{DirectoryScriptLoader, Invocation, RunOutput, ScriptBridge, ScriptLoader, ScriptRef, ScriptRunner, ShellScriptRunner};

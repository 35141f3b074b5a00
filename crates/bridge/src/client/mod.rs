//! The client facade.
//!
//! [`FocusClient`] is an explicit handle owning one bridge, one connection
//! monitor (with its periodic probe), one retry executor and one response
//! cache. Read operations are cached under dotted operation names
//! (`tasks.list`, `projects.get`, ...) so categories can be invalidated
//! together; [`FocusClient::run_script`] is never cached.

mod queries;

pub use queries::{ProjectQuery, TaskQuery};

use focusbridge_cache::{CacheCategory, CacheStats, ResponseCache, TtlCache};
use focusbridge_types::{ConnectionStatus, ListPage};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::BridgeError;
use crate::monitor::{ConnectionMonitor, DATABASE_INFO_SCRIPT, ProbeTaskHandle};
use crate::retry::RetryExecutor;
use crate::script::{DirectoryScriptLoader, ScriptBridge, ScriptLoader, ScriptRef, ScriptRunner, ShellScriptRunner};

#[derive(Debug, Clone, Copy)]
enum Source {
    Named(&'static str),
    Builtin(&'static str),
}

/// A cached read operation and the script that serves it.
#[derive(Debug, Clone, Copy)]
struct Operation {
    name: &'static str,
    source: Source,
    /// Convert a script-reported `NOT_FOUND` into a cached absence.
    absent_on_not_found: bool,
}

impl Operation {
    const fn list(name: &'static str, script: &'static str) -> Self {
        Self {
            name,
            source: Source::Named(script),
            absent_on_not_found: false,
        }
    }

    const fn lookup(name: &'static str, script: &'static str) -> Self {
        Self {
            name,
            source: Source::Named(script),
            absent_on_not_found: true,
        }
    }

    fn script_ref(&self) -> ScriptRef {
        match self.source {
            Source::Named(name) => ScriptRef::named(name),
            Source::Builtin(text) => ScriptRef::inline(text),
        }
    }
}

const LIST_TASKS: Operation = Operation::list("tasks.list", "list_tasks");
const GET_TASK: Operation = Operation::lookup("tasks.get", "get_task");
const SEARCH_TASKS: Operation = Operation::list("tasks.search", "search_tasks");
const LIST_PROJECTS: Operation = Operation::list("projects.list", "list_projects");
const GET_PROJECT: Operation = Operation::lookup("projects.get", "get_project");
const LIST_TAGS: Operation = Operation::list("tags.list", "list_tags");
const DATABASE_INFO: Operation = Operation {
    name: "database.info",
    source: Source::Builtin(DATABASE_INFO_SCRIPT),
    absent_on_not_found: false,
};

/// Resilient client for the scripted application.
pub struct FocusClient {
    config: ClientConfig,
    bridge: Arc<ScriptBridge>,
    monitor: Arc<ConnectionMonitor>,
    retry: RetryExecutor,
    cache: Arc<dyn ResponseCache>,
    probe: Option<ProbeTaskHandle>,
}

impl fmt::Debug for FocusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusClient")
            .field("application", &self.config.application)
            .field("retry", &self.retry)
            .field("probe", &self.probe)
            .finish()
    }
}

impl FocusClient {
    /// Assemble a client from explicit collaborators and start its periodic probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: ClientConfig,
        runner: Arc<dyn ScriptRunner>,
        loader: Arc<dyn ScriptLoader>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        let bridge = Arc::new(ScriptBridge::new(runner, loader, config.bridge_settings()));
        let monitor = Arc::new(ConnectionMonitor::new(Arc::clone(&bridge), config.application.clone()));
        let retry = RetryExecutor::new(Arc::clone(&monitor), config.max_attempts, config.backoff_base());
        let probe = monitor.spawn_periodic_probe(config.probe_interval());
        info!(
            application = %config.application,
            probe_interval_secs = config.probe_interval_secs,
            "focus client started"
        );

        Self {
            config,
            bridge,
            monitor,
            retry,
            cache,
            probe: Some(probe),
        }
    }

    /// Client backed by the shell runner, the configured script directory and an in-memory cache.
    pub fn from_config(config: ClientConfig) -> Self {
        let loader = DirectoryScriptLoader::new(config.resolved_scripts_dir());
        let cache = TtlCache::new(config.cache);
        Self::start(config, Arc::new(ShellScriptRunner::new()), Arc::new(loader), Arc::new(cache))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Arc<ConnectionMonitor> {
        &self.monitor
    }

    /// Repair the connection if needed; returns whether the application is usable.
    ///
    /// On failure the reason is available from [`connection_status`](Self::connection_status).
    pub async fn initialize(&self) -> bool {
        let connected = self.monitor.ensure_connected().await;
        if !connected {
            let status = self.monitor.status().await;
            warn!(
                application = %self.config.application,
                "initialization failed: {}",
                status.error.as_deref().unwrap_or("unknown error")
            );
        }
        connected
    }

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<ListPage<Value>, BridgeError> {
        let value = self.fetch(LIST_TASKS, filter_params(query)).await?;
        decode_page(LIST_TASKS.name, value)
    }

    /// Fetch one task. A task the script reports as `NOT_FOUND` is `None`.
    pub async fn get_task(&self, id: &str) -> Result<Option<Value>, BridgeError> {
        let value = self.fetch(GET_TASK, id_params(id)).await?;
        Ok(present(value))
    }

    /// Full-text task search. Failures degrade to an empty page.
    pub async fn search_tasks(&self, query: &str, limit: Option<u64>) -> ListPage<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), Value::String(query.to_string()));
        params.insert("limit".to_string(), limit.map_or(Value::Null, Value::from));

        let result = match self.fetch(SEARCH_TASKS, params).await {
            Ok(value) => decode_page(SEARCH_TASKS.name, value),
            Err(error) => Err(error),
        };
        result.unwrap_or_else(|error| {
            warn!(operation = SEARCH_TASKS.name, code = error.code(), "search failed, returning no results: {}", error);
            ListPage::empty(0, limit.unwrap_or(0))
        })
    }

    pub async fn list_projects(&self, query: &ProjectQuery) -> Result<ListPage<Value>, BridgeError> {
        let value = self.fetch(LIST_PROJECTS, filter_params(query)).await?;
        decode_page(LIST_PROJECTS.name, value)
    }

    /// Fetch one project. A project the script reports as `NOT_FOUND` is `None`.
    pub async fn get_project(&self, id: &str) -> Result<Option<Value>, BridgeError> {
        let value = self.fetch(GET_PROJECT, id_params(id)).await?;
        Ok(present(value))
    }

    /// All tags. Failures degrade to an empty page.
    pub async fn list_tags(&self) -> ListPage<Value> {
        let result = match self.fetch(LIST_TAGS, Map::new()).await {
            Ok(value) => decode_page(LIST_TAGS.name, value),
            Err(error) => Err(error),
        };
        result.unwrap_or_else(|error| {
            warn!(operation = LIST_TAGS.name, code = error.code(), "tag listing failed, returning no tags: {}", error);
            ListPage::default()
        })
    }

    /// Summary counts of the application's database.
    pub async fn database_info(&self) -> Result<Value, BridgeError> {
        self.fetch(DATABASE_INFO, self.monitor.probe_params()).await
    }

    /// Run an arbitrary script with retries. Never cached.
    pub async fn run_script(&self, script: &ScriptRef, params: &Map<String, Value>) -> Result<Value, BridgeError> {
        debug!(script = %script, "running script without cache");
        self.invoke_with_retry(script, params).await
    }

    /// Last stored connection snapshot.
    pub async fn connection_status(&self) -> ConnectionStatus {
        self.monitor.status().await
    }

    /// Probe now and return the fresh snapshot.
    pub async fn refresh_connection(&self) -> ConnectionStatus {
        self.monitor.probe().await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached results of one category; returns how many entries were removed.
    pub fn invalidate(&self, category: CacheCategory) -> usize {
        let removed = self.cache.invalidate_by_category(category);
        debug!(category = %category, removed, "invalidated cache category");
        removed
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Stop the periodic probe and release the cache.
    pub async fn shutdown(mut self) {
        if let Some(probe) = self.probe.take() {
            probe.stop().await;
        }
        self.cache.destroy();
        info!(application = %self.config.application, "focus client shut down");
    }

    async fn fetch(&self, operation: Operation, params: Map<String, Value>) -> Result<Value, BridgeError> {
        let key = self.cache.generate_key(operation.name, &Value::Object(params.clone()));
        if let Some(value) = self.cache.get(&key) {
            debug!(operation = operation.name, cache_key = %key, "cache hit");
            return Ok(value);
        }
        debug!(operation = operation.name, cache_key = %key, "cache miss");

        let value = match self.invoke_with_retry(&operation.script_ref(), &params).await {
            Ok(value) => value,
            Err(error) if operation.absent_on_not_found && error.is_not_found() => {
                debug!(operation = operation.name, "entity not found: {}", error);
                Value::Null
            }
            Err(error) => return Err(error),
        };
        self.cache.set(&key, value.clone());
        Ok(value)
    }

    async fn invoke_with_retry(&self, script: &ScriptRef, params: &Map<String, Value>) -> Result<Value, BridgeError> {
        let bridge = &self.bridge;
        self.retry
            .run(|| async move {
                let outcome = bridge.invoke(script, params).await;
                outcome
                    .into_result()
                    .map(|data| data.unwrap_or(Value::Null))
                    .map_err(BridgeError::from)
            })
            .await
    }
}

fn filter_params(filter: &impl Serialize) -> Map<String, Value> {
    let mut params = Map::new();
    // Query structs hold only strings, numbers and booleans.
    let filter = serde_json::to_value(filter).unwrap_or_else(|_| Value::Object(Map::new()));
    params.insert("filter".to_string(), filter);
    params
}

fn id_params(id: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("id".to_string(), Value::String(id.to_string()));
    params
}

fn present(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        value => Some(value),
    }
}

/// Read a list payload. A bare array is accepted as an unpaginated page and
/// empty output as an empty page.
fn decode_page(operation: &str, value: Value) -> Result<ListPage<Value>, BridgeError> {
    match value {
        Value::Null => Ok(ListPage::default()),
        Value::Array(items) => Ok(ListPage::from_items(items)),
        value => serde_json::from_value(value).map_err(|source| BridgeError::decode(operation, source)),
    }
}

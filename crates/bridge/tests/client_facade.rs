//! End-to-end behavior of the client facade against a simulated application.

use async_trait::async_trait;
use focusbridge_bridge::config::ClientConfig;
use focusbridge_bridge::monitor::PERMISSION_NOT_GRANTED;
use focusbridge_bridge::script::StaticScriptLoader;
use focusbridge_bridge::{
    BridgeError, DirectoryScriptLoader, FocusClient, Invocation, ProjectQuery, RunOutput, ScriptLoader, ScriptRunner,
    TaskQuery,
};
use focusbridge_cache::{CacheConfig, ResponseCache, TtlCache};
use focusbridge_types::{ErrorKind, codes};
use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Simulated application answering probe and named scripts.
struct FakeOmniFocus {
    running: AtomicBool,
    permission: AtomicBool,
    /// Number of upcoming task-list runs that fail with a connectivity error.
    flaky_lists: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl FakeOmniFocus {
    fn new(running: bool, permission: bool) -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(running),
            permission: AtomicBool::new(permission),
            flaky_lists: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        })
    }

    fn runs_of(&self, needle: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|script| script.contains(needle)).count()
    }

    fn answer(&self, script: &str) -> RunOutput {
        let running = self.running.load(Ordering::SeqCst);
        let permission = self.permission.load(Ordering::SeqCst);
        let denied = "execution error: Not authorized to send Apple events to OmniFocus. (-1743)";

        if script.contains("probe:app-running") {
            return RunOutput::success(running.to_string());
        }
        if script.contains("probe:request-permission") {
            return if permission {
                RunOutput::success(running.to_string())
            } else {
                RunOutput::failure(1, denied)
            };
        }
        if !running {
            return RunOutput::failure(1, "execution error: Application isn't running. (-600)");
        }
        if !permission {
            return RunOutput::failure(1, denied);
        }
        if script.contains("probe:database-info") {
            return RunOutput::success(r#"{"name": "OmniFocus", "taskCount": 2}"#);
        }
        if script.contains("listTasks") {
            let flaky = self
                .flaky_lists
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if flaky {
                return RunOutput::failure(1, "Connection is invalid. (-609)");
            }
            return RunOutput::success(r#"[{"id": "t1"}, {"id": "t2"}]"#);
        }
        if script.contains("listProjects") {
            return RunOutput::failure(1, "execution error: Application is not running. (-600)");
        }
        if script.contains(r#"getTask("t1")"#) {
            return RunOutput::success(r#"{"id": "t1", "name": "Buy milk"}"#);
        }
        if script.contains("getTask") {
            return RunOutput::success(
                r#"{"success": false, "error": {"code": "NOT_FOUND", "type": "UNKNOWN", "originalMessage": "Task not found"}}"#,
            );
        }
        RunOutput::success("")
    }
}

#[async_trait]
impl ScriptRunner for FakeOmniFocus {
    async fn run(&self, invocation: &Invocation) -> io::Result<RunOutput> {
        self.log.lock().unwrap().push(invocation.script.clone());
        Ok(self.answer(&invocation.script))
    }
}

fn scripts_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("list_tasks.js"), "listTasks({{filter}});\n").unwrap();
    fs::write(dir.path().join("get_task.js"), "getTask({{id}});\n").unwrap();
    dir
}

fn start(app: &Arc<FakeOmniFocus>, scripts: &TempDir) -> (FocusClient, Arc<TtlCache>) {
    start_with_loader(app, Arc::new(DirectoryScriptLoader::new(scripts.path())))
}

fn start_with_loader(app: &Arc<FakeOmniFocus>, loader: Arc<dyn ScriptLoader>) -> (FocusClient, Arc<TtlCache>) {
    let cache = Arc::new(TtlCache::new(CacheConfig::default()));
    let client = FocusClient::start(ClientConfig::default(), app.clone(), loader, cache.clone());
    (client, cache)
}

#[tokio::test]
async fn repeated_reads_run_the_script_once() {
    let app = FakeOmniFocus::new(true, true);
    let scripts = scripts_dir();
    let (client, cache) = start(&app, &scripts);

    let first = client.list_tasks(&TaskQuery::default()).await.unwrap();
    let second = client.list_tasks(&TaskQuery::default()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.items.len(), 2);
    assert_eq!(app.runs_of("listTasks"), 1);
    assert_eq!(cache.stats().hits, 1);
    client.shutdown().await;
}

#[tokio::test]
async fn not_found_is_absence_and_is_cached() {
    let app = FakeOmniFocus::new(true, true);
    let scripts = scripts_dir();
    let (client, _cache) = start(&app, &scripts);

    assert_eq!(client.get_task("nope").await.unwrap(), None);
    assert_eq!(client.get_task("nope").await.unwrap(), None);
    assert_eq!(app.runs_of("getTask"), 1);

    let task = client.get_task("t1").await.unwrap().unwrap();
    assert_eq!(task["name"], "Buy milk");
}

#[tokio::test]
async fn initialize_reports_missing_permission() {
    let app = FakeOmniFocus::new(true, false);
    let scripts = scripts_dir();
    let (client, _cache) = start(&app, &scripts);

    assert!(!client.initialize().await);

    let status = client.connection_status().await;
    assert!(!status.connected);
    assert!(!status.permissions_granted);
    assert_eq!(status.error.as_deref(), Some(PERMISSION_NOT_GRANTED));
}

#[tokio::test]
async fn initialize_reports_app_not_running() {
    let app = FakeOmniFocus::new(false, true);
    let scripts = scripts_dir();
    let (client, _cache) = start(&app, &scripts);

    assert!(!client.initialize().await);

    let status = client.connection_status().await;
    assert!(!status.app_running);
    assert_eq!(status.error.as_deref(), Some("OmniFocus is not running"));
}

#[tokio::test]
async fn initialize_recovers_once_the_app_starts() {
    let app = FakeOmniFocus::new(false, true);
    let scripts = scripts_dir();
    let (client, _cache) = start(&app, &scripts);

    assert!(!client.initialize().await);
    app.running.store(true, Ordering::SeqCst);
    assert!(client.initialize().await);
    assert!(client.connection_status().await.connected);
}

#[tokio::test(start_paused = true)]
async fn connectivity_failures_are_retried_with_backoff() {
    let app = FakeOmniFocus::new(true, true);
    app.flaky_lists.store(2, Ordering::SeqCst);
    // In-memory scripts keep the paused clock clear of blocking file reads.
    let loader = StaticScriptLoader::new().with_script("list_tasks", "listTasks({{filter}});");
    let (client, _cache) = start_with_loader(&app, Arc::new(loader));
    let started = tokio::time::Instant::now();

    let page = client.list_tasks(&TaskQuery::default()).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(app.runs_of("listTasks"), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn unavailable_app_exhausts_both_retry_layers() {
    let app = FakeOmniFocus::new(true, true);
    let loader = StaticScriptLoader::new().with_script("list_projects", "listProjects({{filter}});");
    let (client, _cache) = start_with_loader(&app, Arc::new(loader));
    let started = tokio::time::Instant::now();

    let error = client.list_projects(&ProjectQuery::default()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AppUnavailable);
    assert_eq!(error.code(), codes::APP_UNAVAILABLE);
    // Three executor attempts, each re-run once by the bridge.
    assert_eq!(app.runs_of("listProjects"), 6);
    // A connection repair precedes every attempt.
    assert_eq!(app.runs_of("probe:request-permission"), 3);
    assert_eq!(app.runs_of("probe:database-info"), 3);
    // 1s bridge delay per attempt plus 1s and 2s of backoff.
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test]
async fn reads_fail_with_the_connectivity_reason() {
    let app = FakeOmniFocus::new(false, true);
    let scripts = scripts_dir();
    let (client, _cache) = start(&app, &scripts);

    let error = client.list_tasks(&TaskQuery::default()).await.unwrap_err();

    assert!(matches!(error, BridgeError::Connectivity { .. }));
    assert_eq!(error.to_string(), "OmniFocus is not running");
    assert_eq!(app.runs_of("listTasks"), 0);
}

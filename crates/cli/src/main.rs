use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use focusbridge_bridge::config::{ClientConfig, default_config_path, load_config_from_path, save_config_to_path};
use focusbridge_bridge::{FocusClient, ProjectQuery, ScriptRef, TaskQuery};
use focusbridge_types::ConnectionStatus;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Query and script an automation-enabled desktop application.
#[derive(Debug, Parser)]
#[command(name = "focusbridge", version)]
struct Cli {
    /// Configuration file (defaults to $FOCUSBRIDGE_CONFIG_PATH or the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Application to talk to, overriding the configuration.
    #[arg(long, global = true)]
    app: Option<String>,

    /// Per-invocation timeout in milliseconds, overriding the configuration.
    #[arg(long = "timeout-ms", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe the application and print the connection status.
    Status,
    /// Request automation permission and verify connectivity.
    Init {
        /// Also write the effective configuration to the config file.
        #[arg(long)]
        write_config: bool,
    },
    /// List tasks.
    Tasks {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        flagged: bool,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Show one task.
    Task { id: String },
    /// Search tasks by text.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u64>,
    },
    /// List projects.
    Projects {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one project.
    Project { id: String },
    /// List tags.
    Tags,
    /// Run an inline or named script.
    Run {
        /// Inline script source.
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        script: Option<String>,
        /// Named script from the scripts directory.
        #[arg(long)]
        name: Option<String>,
        /// Script parameter as key=value; values that parse as JSON are passed as JSON.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Print response cache counters.
    CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = effective_config(&cli, &config_path)?;
    debug!(path = %config_path.display(), "configuration loaded");

    if let Command::Init { write_config: true } = cli.command {
        save_config_to_path(&config, &config_path)
            .with_context(|| format!("failed to write configuration to {}", config_path.display()))?;
        info!(path = %config_path.display(), "configuration written");
    }

    let client = FocusClient::from_config(config);
    let result = run_command(&client, cli.command).await;
    client.shutdown().await;
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn effective_config(cli: &Cli, path: &Path) -> Result<ClientConfig> {
    let mut config =
        load_config_from_path(path).with_context(|| format!("failed to load configuration from {}", path.display()))?;
    if let Some(app) = &cli.app {
        config.application = app.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.invocation_timeout_ms = timeout_ms;
    }
    focusbridge_bridge::config::validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

async fn run_command(client: &FocusClient, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            let status = client.refresh_connection().await;
            print_json(&status)?;
            require_connected(&status)
        }
        Command::Init { .. } => {
            let connected = client.initialize().await;
            let status = client.connection_status().await;
            print_json(&status)?;
            if !connected {
                bail!("initialization failed: {}", status.error.unwrap_or_default());
            }
            Ok(())
        }
        Command::Tasks {
            project,
            flagged,
            limit,
            offset,
        } => {
            let query = TaskQuery {
                project,
                flagged: flagged.then_some(true),
                limit,
                offset,
                ..TaskQuery::default()
            };
            print_json(&client.list_tasks(&query).await?)
        }
        Command::Task { id } => match client.get_task(&id).await? {
            Some(task) => print_json(&task),
            None => bail!("task '{}' not found", id),
        },
        Command::Search { query, limit } => print_json(&client.search_tasks(&query, limit).await),
        Command::Projects { status } => {
            let query = ProjectQuery {
                status,
                ..ProjectQuery::default()
            };
            print_json(&client.list_projects(&query).await?)
        }
        Command::Project { id } => match client.get_project(&id).await? {
            Some(project) => print_json(&project),
            None => bail!("project '{}' not found", id),
        },
        Command::Tags => print_json(&client.list_tags().await),
        Command::Run { script, name, params } => {
            let script = match (script, name) {
                (Some(text), _) => ScriptRef::inline(text),
                (None, Some(name)) => ScriptRef::named(name),
                (None, None) => bail!("either --script or --name is required"),
            };
            let params: Map<String, Value> = params.into_iter().collect();
            print_json(&client.run_script(&script, &params).await?)
        }
        Command::CacheStats => print_json(&client.cache_stats()),
    }
}

fn require_connected(status: &ConnectionStatus) -> Result<()> {
    if status.connected {
        return Ok(());
    }
    bail!("{}", status.error.as_deref().unwrap_or("not connected"))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_prefer_json_values() {
        assert_eq!(parse_param("limit=10").unwrap(), ("limit".to_string(), json!(10)));
        assert_eq!(parse_param("flag=true").unwrap(), ("flag".to_string(), json!(true)));
        assert_eq!(parse_param("name=Buy milk").unwrap(), ("name".to_string(), json!("Buy milk")));
        assert_eq!(parse_param("expr=a=b").unwrap(), ("expr".to_string(), json!("a=b")));
    }

    #[test]
    fn params_require_a_key() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn cli_parses_run_with_params() {
        let cli = Cli::try_parse_from(["focusbridge", "run", "--name", "get_task", "--param", "id=\"t1\""]).unwrap();
        match cli.command {
            Command::Run { name, params, .. } => {
                assert_eq!(name.as_deref(), Some("get_task"));
                assert_eq!(params, vec![("id".to_string(), json!("t1"))]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn run_requires_a_script_source() {
        assert!(Cli::try_parse_from(["focusbridge", "run"]).is_err());
        assert!(Cli::try_parse_from(["focusbridge", "run", "--script", "1", "--name", "x"]).is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let cli = Cli::try_parse_from(["focusbridge", "--app", "OmniFocus 4", "--timeout-ms", "2500", "tags"]).unwrap();
        let path = std::env::temp_dir().join("focusbridge-cli-absent-config.json");
        let config = effective_config(&cli, &path).unwrap();
        assert_eq!(config.application, "OmniFocus 4");
        assert_eq!(config.invocation_timeout_ms, 2500);
    }
}

pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{
    agent, client, context, memory, modes, provenance, resilience, stdio, tooling,
};
pub use cli::{Cli, RunMode};
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::model;

use agent::{Agent, AgentOptions};
use application::agent::ToolRuntime;
use client::{ClientConfig, DiscoveryClient};
use context::DiscoveryContext;
use memory::SessionStore;
use model::OllamaClient;
use provenance::SessionSummary;
use serde_json::{Value, json};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

/// Execute the selected run mode. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32, Box<dyn Error>> {
    let quiet_mode = matches!(cli.run, RunMode::Stdio);
    init_tracing(quiet_mode);
    info!("Starting crucible");
    debug!(
        run = ?cli.run,
        config = ?cli.config,
        system = ?cli.system,
        session = ?cli.session,
        "CLI arguments parsed"
    );

    let config_path = cli.config.as_deref().map(Path::new);
    let mut file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration from default path or defaults");
    }
    apply_cli_overrides(&cli, &mut file_config);

    let session_id = cli
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = Arc::new(DiscoveryContext::initialise(&file_config, &session_id)?);
    if let Some(mode) = cli.mode.as_deref() {
        session.modes.set_mode(mode);
    }

    let provider = OllamaClient::new(file_config.endpoint.clone());
    let mut client_config = ClientConfig::new(file_config.model.clone())
        .with_tools(file_config.tools.clone())
        .with_servers(file_config.servers.clone())
        .with_prompt_template(Some(file_config.prompt_template.clone()));
    if let Some(system_prompt) = cli.system.clone().or(file_config.system_prompt.clone()) {
        client_config = client_config.with_system_prompt(system_prompt);
    }
    let client = Arc::new(
        DiscoveryClient::new(provider, client_config)
            .with_session_store(SessionStore::new(file_config.paths.session_dir.clone())),
    );

    info!(run = ?cli.run, "Running client in selected mode");
    let code = match cli.run {
        RunMode::Analyze => {
            let prompt = load_prompt(&cli)?;
            let mut options = AgentOptions::default();
            options.session_id = Some(session_id.clone());
            options.system_prompt = cli.system.clone().or(file_config.system_prompt.clone());
            options.model = cli.model.clone();
            info!("Executing discovery agent workflow");
            let agent = Agent::new(client.clone(), session.clone());
            let outcome = agent.run(prompt, options).await?;

            let summary = finish_session(&session, &outcome.session_id);
            let output = json!({
                "session_id": outcome.session_id,
                "content": outcome.response,
                "tool_steps": outcome.steps,
                "summary": summary,
                "call_stats": session.resilience.stats_snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            0
        }
        RunMode::Validate => {
            let composition = cli.prompt.join(" ").trim().to_string();
            if composition.is_empty() {
                return Err("composition formula required for validate mode".into());
            }
            let code = run_validate(&file_config, client.clone(), session.clone(), &composition)
                .await?;
            finish_session(&session, &session_id);
            code
        }
        RunMode::Stdio => {
            info!("Entering STDIO mode; awaiting JSON line input");
            stdio::run(client.clone(), session.clone()).await?;
            finish_session(&session, &session_id);
            0
        }
        RunMode::Tools => {
            let server_name = cli
                .server
                .as_deref()
                .ok_or("--server is required for tools mode")?;
            let server_config = file_config
                .servers
                .iter()
                .find(|server| server.name == server_name)
                .ok_or_else(|| format!("server '{server_name}' is not configured"))?;
            let tools = tooling::spawn_and_list_tools(server_config).await?;
            let output: Vec<Value> = tools
                .into_iter()
                .map(|(name, description)| json!({"name": name, "description": description}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            0
        }
    };
    info!("Client execution finished");
    Ok(code)
}

async fn run_validate<P>(
    config: &AppConfig,
    client: Arc<DiscoveryClient<P>>,
    session: Arc<DiscoveryContext>,
    composition: &str,
) -> Result<i32, Box<dyn Error>>
where
    P: model::ModelProvider + 'static,
{
    let tool_name = config
        .tools
        .iter()
        .find(|tool| tool.family == "validity")
        .map(|tool| tool.name.clone())
        .ok_or("no validity tool configured")?;

    info!(composition, tool = %tool_name, "Running one-shot composition validity screen");
    let runtime = ToolRuntime::new(config.tools.clone(), client.server_bridge(), session);
    let execution = runtime
        .execute(&tool_name, json!({"composition": composition}))
        .await?;

    let structured = execution.output.get("structuredContent").cloned();
    let valid = structured
        .as_ref()
        .and_then(|s| s.get("valid"))
        .and_then(Value::as_bool)
        .unwrap_or(execution.success);

    let output = json!({
        "composition": composition,
        "valid": valid,
        "detail": structured.unwrap_or(Value::Null),
        "message": execution.message,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(if valid { 0 } else { 2 })
}

/// Close the provenance log and derive the session summary.
fn finish_session(session: &DiscoveryContext, session_id: &str) -> SessionSummary {
    let mut recorder = session.provenance.lock().expect("provenance lock");
    if let Err(err) = recorder.record(
        provenance::SESSION_END,
        json!({ "session_id": session_id }),
    ) {
        warn!(%err, "failed to record session end");
    }
    let summary = SessionSummary::from_events(recorder.events());
    info!(
        materials_found = summary.materials_found,
        tool_calls = summary.tool_calls,
        wall_ms = summary.wall_ms,
        "Session summary derived"
    );
    summary
}

fn init_tracing(quiet: bool) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = if quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn apply_cli_overrides(cli: &Cli, config: &mut AppConfig) {
    if config.endpoint != cli.endpoint {
        info!(url = %cli.endpoint, "Overriding model endpoint based on CLI flag");
        config.endpoint = cli.endpoint.clone();
    }
    if let Some(model) = &cli.model {
        if &config.model != model {
            info!(model = model.as_str(), "Overriding model based on CLI flag");
            config.model = model.clone();
        }
    }
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        let joined = cli.prompt.join(" ");
        return Ok(normalize_prompt(joined));
    }

    if !io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}

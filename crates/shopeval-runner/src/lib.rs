//! Launcher and process supervisor for one evaluation run.
//!
//! Owns the full lifecycle of the two agent processes: launch controller,
//! probe, launch solver, probe, hand control to the single top-level
//! exchange, and tear both processes down on every exit path.

use anyhow::{Context, Result};
use shopeval_lib::client::A2aClient;
use shopeval_lib::env::EnvConfig;
use shopeval_lib::episode::DEFAULT_MAX_STEPS;
use shopeval_lib::probe::{wait_until_ready, ProbeConfig};
use shopeval_lib::tags::wrap_tag;
use shopeval_lib::EvalError;
use std::path::PathBuf;
use std::process::{Child, Command};
use tracing::{info, warn};

/// RAII guard that kills and joins an agent process on drop, so teardown
/// runs on every exit path of the evaluation.
struct AgentProcessGuard {
    name: String,
    process: Child,
}

impl Drop for AgentProcessGuard {
    fn drop(&mut self) {
        info!(agent = %self.name, "shutting down agent process");
        if let Err(e) = self.process.kill() {
            warn!(agent = %self.name, error = %e, "failed to kill agent process");
        }
        if let Err(e) = self.process.wait() {
            warn!(agent = %self.name, error = %e, "failed to join agent process");
        }
    }
}

/// Which role an agent process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Green,
    White,
}

impl AgentRole {
    fn flag(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::White => "white",
        }
    }
}

/// One full run's configuration.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub host: String,
    pub green_port: u16,
    pub white_port: u16,
    pub max_steps: usize,
    pub solver_policy: String,
    pub env_config: EnvConfig,
    pub probe: ProbeConfig,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            green_port: 9001,
            white_port: 9002,
            max_steps: DEFAULT_MAX_STEPS,
            solver_policy: "heuristic".to_string(),
            env_config: EnvConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

/// Composes the assessment task text with its two tag blocks.
pub fn compose_task_text(white_url: &str, env_config: &EnvConfig) -> Result<String> {
    let config_json =
        serde_json::to_string_pretty(env_config).context("failed to serialize env config")?;
    Ok(format!(
        "Your task is to instantiate WebShop to test the agent located at:\n{}\n\nYou should use the following env configuration:\n{}\n",
        wrap_tag("white_agent_url", &format!("{white_url}/")),
        wrap_tag("env_config", &config_json),
    ))
}

/// Locates the agents executable: `SHOPEVAL_AGENT_BIN` when set, otherwise
/// the `shopeval-agents` binary sitting next to the runner executable.
fn agent_binary() -> Result<PathBuf> {
    if let Ok(bin) = std::env::var("SHOPEVAL_AGENT_BIN") {
        return Ok(PathBuf::from(bin));
    }
    let exe = std::env::current_exe().context("failed to locate the runner executable")?;
    let mut dir = exe
        .parent()
        .map(PathBuf::from)
        .context("runner executable has no parent directory")?;
    // Test binaries live one level down in target/<profile>/deps.
    if dir.ends_with("deps") {
        dir.pop();
    }
    let candidate = dir.join(format!("shopeval-agents{}", std::env::consts::EXE_SUFFIX));
    if candidate.is_file() {
        Ok(candidate)
    } else {
        anyhow::bail!(
            "agents binary not found at {}; build it with `cargo build -p shopeval-agents` or set SHOPEVAL_AGENT_BIN",
            candidate.display()
        )
    }
}

/// Spawns one agent process directly from the agents binary, so the drop
/// guard kills the server process itself rather than a build-tool wrapper.
fn spawn_agent(config: &LaunchConfig, role: AgentRole, name: &str, port: u16) -> Result<Child> {
    let mut command = Command::new(agent_binary()?);
    command.args([
        "--role",
        role.flag(),
        "--name",
        name,
        "--host",
        &config.host,
        "--port",
        &port.to_string(),
    ]);
    match role {
        AgentRole::Green => {
            command.args(["--max-steps", &config.max_steps.to_string()]);
        }
        AgentRole::White => {
            command.args(["--policy", &config.solver_policy]);
        }
    }
    command
        .spawn()
        .with_context(|| format!("failed to spawn {name} process"))
}

/// Runs one full evaluation: launch both agents, probe readiness, send the
/// assessment request, and return the controller's result text. Both
/// processes are torn down before this returns, success or not.
pub async fn launch_evaluation(config: LaunchConfig) -> Result<String> {
    let client = A2aClient::new();
    let green_url = format!("http://{}:{}", config.host, config.green_port);
    let white_url = format!("http://{}:{}", config.host, config.white_port);

    info!(url = %green_url, "launching green agent");
    let _green_guard = AgentProcessGuard {
        name: "webshop_green_agent".to_string(),
        process: spawn_agent(
            &config,
            AgentRole::Green,
            "webshop_green_agent",
            config.green_port,
        )?,
    };
    if !wait_until_ready(&client, &green_url, config.probe).await {
        return Err(EvalError::StartupFailed {
            name: "webshop_green_agent".to_string(),
        }
        .into());
    }
    info!("green agent ready");

    info!(url = %white_url, "launching white agent");
    let _white_guard = AgentProcessGuard {
        name: "webshop_white_agent".to_string(),
        process: spawn_agent(
            &config,
            AgentRole::White,
            "webshop_white_agent",
            config.white_port,
        )?,
    };
    if !wait_until_ready(&client, &white_url, config.probe).await {
        return Err(EvalError::StartupFailed {
            name: "webshop_white_agent".to_string(),
        }
        .into());
    }
    info!("white agent ready");

    let task_text = compose_task_text(&white_url, &config.env_config)?;
    info!("sending assessment request to green agent");
    let response = client
        .send_message(&green_url, &task_text, None, None)
        .await
        .context("assessment exchange failed")?;

    let text = response
        .first_text()
        .ok_or_else(|| EvalError::EmptyReply {
            url: green_url.clone(),
        })?
        .to_string();

    info!("terminating agents");
    Ok(text)
}

//! The controller ("green") agent executor.
//!
//! Parses the assessment task out of the inbound message's tag blocks,
//! builds the environment from the embedded configuration, runs the
//! evaluation loop against the solver's URL, and replies with the frozen
//! episode metrics.

use crate::server::AgentExecutor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use shopeval_lib::client::A2aClient;
use shopeval_lib::env::sim::SimShopEnv;
use shopeval_lib::env::EnvConfig;
use shopeval_lib::episode::{run_episode, A2aSolverTransport, EpisodeConfig};
use shopeval_lib::protocol::Message;
use shopeval_lib::tags::parse_tags;
use std::time::Instant;
use tracing::info;

pub struct GreenExecutor {
    client: A2aClient,
    max_steps: usize,
}

impl GreenExecutor {
    pub fn new(client: A2aClient, max_steps: usize) -> Self {
        Self { client, max_steps }
    }
}

#[async_trait]
impl AgentExecutor for GreenExecutor {
    async fn execute(&self, message: &Message) -> Result<Message> {
        info!("received a task, parsing");
        let user_input = message
            .first_text()
            .context("task message carried no text part")?;
        let tags = parse_tags(user_input);
        let (Some(white_agent_url), Some(env_config_str)) =
            (tags.get("white_agent_url"), tags.get("env_config"))
        else {
            return Ok(Message::agent_text(
                "Error: Missing <white_agent_url> or <env_config> tags.",
                message.context_id.clone(),
            ));
        };

        let env_config: EnvConfig = match serde_json::from_str(env_config_str) {
            Ok(config) => config,
            Err(e) => {
                return Ok(Message::agent_text(
                    format!("Error: invalid <env_config> JSON: {e}"),
                    message.context_id.clone(),
                ));
            }
        };

        info!(
            num_products = env_config.num_products,
            human_goals = env_config.human_goals,
            solver = %white_agent_url,
            "setting up environment and starting evaluation"
        );
        let mut env = SimShopEnv::new(&env_config);
        let transport =
            A2aSolverTransport::new(self.client.clone(), white_agent_url.trim_end_matches('/'));

        let started = Instant::now();
        let mut metrics = run_episode(
            &transport,
            &mut env,
            &EpisodeConfig {
                max_steps: self.max_steps,
            },
        )
        .await
        .context("evaluation exchange with the solver failed")?;
        metrics.time_used = Some(started.elapsed().as_secs_f64());

        let marker = if metrics.success { "✅" } else { "❌" };
        info!(success = metrics.success, steps = metrics.steps, "evaluation complete");
        Ok(Message::agent_text(
            format!(
                "Finished. Solver success: {marker}\nMetrics: {}\n",
                serde_json::to_string_pretty(&metrics)?
            ),
            message.context_id.clone(),
        ))
    }
}

//! The step-bounded evaluation loop.
//!
//! Drives one episode: reset the environment, exchange turn messages with
//! the solver, convert replies into environment actions, and accumulate the
//! episode's metrics. Malformed solver output is fed back as an error
//! message and costs one step; it never aborts the episode. Transport
//! failures do abort and surface as the run's error.

use crate::env::{ShopEnv, StepOutcome};
use crate::error::EvalError;
use crate::results::{EpisodeMetrics, HistoryEntry};
use crate::tags::parse_tags;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

/// Default step budget for one episode.
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Loop configuration.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeConfig {
    pub max_steps: usize,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// One solver reply: the conversation context it was produced under and its
/// extracted text.
#[derive(Debug, Clone)]
pub struct SolverReply {
    pub context_id: Option<String>,
    pub text: String,
}

/// Seam between the loop and the wire. The production implementation speaks
/// A2A over HTTP; tests script replies directly.
#[async_trait]
pub trait SolverTransport: Send + Sync {
    async fn exchange(
        &self,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<SolverReply, EvalError>;
}

/// A2A-backed transport for a solver at a fixed base URL.
pub struct A2aSolverTransport {
    client: crate::client::A2aClient,
    base_url: String,
}

impl A2aSolverTransport {
    pub fn new(client: crate::client::A2aClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SolverTransport for A2aSolverTransport {
    async fn exchange(
        &self,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<SolverReply, EvalError> {
        let reply = self
            .client
            .send_message(&self.base_url, text, context_id, None)
            .await?;
        let reply_text = reply
            .first_text()
            .ok_or_else(|| EvalError::EmptyReply {
                url: self.base_url.clone(),
            })?
            .to_string();
        Ok(SolverReply {
            context_id: reply.context_id,
            text: reply_text,
        })
    }
}

/// A solver reply decoded one of two ways: a `<json>` tag block parsed as an
/// object, or the whole trimmed reply as a raw action string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAction {
    Json(Value),
    Raw(String),
}

impl ParsedAction {
    /// Decodes a reply. A present-but-invalid `<json>` block is an
    /// `ActionParseError`; absence of the tag falls back to raw text.
    pub fn from_reply(text: &str) -> Result<Self, EvalError> {
        let tags = parse_tags(text);
        match tags.get("json") {
            Some(block) => {
                let value: Value =
                    serde_json::from_str(block).map_err(|e| EvalError::ActionParseError {
                        reason: format!("invalid json block: {e}"),
                    })?;
                Ok(Self::Json(value))
            }
            None => Ok(Self::Raw(text.trim().to_string())),
        }
    }

    /// Converts to the final action string forwarded to the environment.
    pub fn into_action(self) -> Result<String, EvalError> {
        let action = match self {
            Self::Json(value) => value
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Self::Raw(text) => text,
        };
        if action.is_empty() {
            return Err(EvalError::ActionParseError {
                reason: "empty action string".to_string(),
            });
        }
        Ok(action)
    }
}

/// Mutable per-episode record, finalized into `EpisodeMetrics`.
#[derive(Debug, Default)]
struct EpisodeState {
    steps: usize,
    observation: String,
    reward: f64,
    done: bool,
    history: Vec<HistoryEntry>,
}

impl EpisodeState {
    fn record(&mut self, action: String, outcome: &StepOutcome) {
        self.history.push(HistoryEntry {
            action,
            reward: outcome.reward,
        });
        self.observation = outcome.observation.clone();
        self.reward = outcome.reward;
        self.done = outcome.done;
    }

    fn into_metrics(self) -> EpisodeMetrics {
        EpisodeMetrics {
            success: self.reward == 1.0,
            reward: self.reward,
            steps: self.steps,
            history: self.history,
            time_used: None,
        }
    }
}

/// Runs one bounded episode of solver-vs-environment.
pub async fn run_episode(
    transport: &dyn SolverTransport,
    env: &mut dyn ShopEnv,
    config: &EpisodeConfig,
) -> Result<EpisodeMetrics, EvalError> {
    let reset = env.reset()?;
    let mut state = EpisodeState {
        observation: reset.observation.clone(),
        ..Default::default()
    };
    let mut next_message = initial_task_message(&reset.instruction, &reset.observation);
    let mut context_id: Option<String> = None;

    for step in 0..config.max_steps {
        state.steps = step + 1;
        info!(step = step + 1, "sending observation to solver");

        let reply = transport.exchange(&next_message, context_id.as_deref()).await?;
        // Adopt the conversation context from the first successful reply
        // only; it stays fixed for the episode's lifetime.
        if context_id.is_none() {
            context_id = reply.context_id.clone();
        }

        match apply_reply(env, &reply.text) {
            Ok((action, outcome)) => {
                info!(action = %action, reward = outcome.reward, done = outcome.done, "action applied");
                state.record(action.clone(), &outcome);
                if state.done {
                    info!(reward = state.reward, "episode done");
                    break;
                }
                next_message = next_turn_message(&action, &state.observation);
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "recovering from malformed turn");
                next_message = error_feedback_message(&e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(state.into_metrics())
}

fn apply_reply(env: &mut dyn ShopEnv, reply_text: &str) -> Result<(String, StepOutcome), EvalError> {
    let action = ParsedAction::from_reply(reply_text)?.into_action()?;
    let outcome = env.step(&action)?;
    Ok((action, outcome))
}

/// First turn: frame the task and the action grammar for the solver.
pub fn initial_task_message(instruction: &str, observation: &str) -> String {
    format!(
        r#"You are an agent shopping on a website.
Your Goal: {instruction}

Available Actions:
1. search[keywords] - Search for products
2. click[option] - Click on a link, button, or option (e.g., click[search], click[back to search], click[b000...])

Here is the current page observation:
{observation}

Please respond in JSON format wrapped in <json> tags:
<json>
{{
  "action": "search[...]" or "click[...]"
}}
</json>"#
    )
}

/// Follow-up turn: echo the executed action and the new page.
pub fn next_turn_message(action: &str, observation: &str) -> String {
    format!(
        "Action executed: {action}\nCurrent Page Observation:\n{observation}\n\nPlease provide your next action in <json> tags."
    )
}

/// Recovery turn: tell the solver what went wrong and how to answer.
pub fn error_feedback_message(error: &EvalError) -> String {
    format!("Error: {error}. Please ensure you output valid JSON with an 'action' field.")
}

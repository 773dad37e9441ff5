//! The solver ("white") agent executor and its reply policies.
//!
//! Each conversation's history lives in an explicit map keyed by context id
//! and is passed into the policy on every turn; the executor owns no other
//! per-session state. The LLM-backed policy talks to an OpenAI-style chat
//! completions endpoint; the heuristic policy is a deterministic offline
//! baseline.

use crate::server::AgentExecutor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopeval_lib::protocol::Message;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. You interact with a WebShop \
    environment. Always output your action in JSON format: {\"action\": \"...\"} inside <json> tags.";

/// One prior turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Produces the solver's reply for one turn given the session's history.
#[async_trait]
pub trait SolverPolicy: Send + Sync + 'static {
    async fn reply(&self, history: &[ChatTurn], input: &str) -> Result<String>;
}

pub struct WhiteExecutor {
    sessions: Mutex<HashMap<String, Vec<ChatTurn>>>,
    policy: Box<dyn SolverPolicy>,
}

impl WhiteExecutor {
    pub fn new(policy: Box<dyn SolverPolicy>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            policy,
        }
    }
}

#[async_trait]
impl AgentExecutor for WhiteExecutor {
    async fn execute(&self, message: &Message) -> Result<Message> {
        let input = message
            .first_text()
            .context("turn message carried no text part")?;
        // First turn of a conversation mints the context id; later turns
        // reuse whatever the controller sends back.
        let context_id = message
            .context_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        // Snapshot the history; the lock is never held across the policy
        // call, so concurrent sessions are not serialized on each other.
        let history = {
            let mut sessions = self.sessions.lock().await;
            sessions.entry(context_id.clone()).or_default().clone()
        };

        let content = match self.policy.reply(&history, input).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "policy failed to generate a reply");
                format!("Error generating response: {e}")
            }
        };

        let mut sessions = self.sessions.lock().await;
        let turns = sessions.entry(context_id.clone()).or_default();
        turns.push(ChatTurn {
            role: ChatRole::User,
            content: input.to_string(),
        });
        turns.push(ChatTurn {
            role: ChatRole::Assistant,
            content: content.clone(),
        });
        drop(sessions);

        Ok(Message::agent_text(content, Some(context_id)))
    }
}

/// OpenAI-style chat completions backend.
pub struct LlmPolicy {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmPolicy {
    /// Reads `LLM_API_URL`, `LLM_API_KEY`, and `LLM_MODEL` from the
    /// environment, with local defaults for URL and model.
    pub fn from_env() -> Self {
        let api_url = match std::env::var("LLM_API_URL") {
            Ok(url) => {
                info!("using LLM_API_URL from environment");
                url
            }
            Err(_) => {
                let default_url = "http://localhost:11434/v1/chat/completions".to_string();
                info!(url = %default_url, "LLM_API_URL not set, using default");
                default_url
            }
        };
        let api_key = match std::env::var("LLM_API_KEY") {
            Ok(key) if !key.is_empty() => Some(key),
            _ => {
                warn!("LLM_API_KEY not set or empty");
                None
            }
        };
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

#[async_trait]
impl SolverPolicy for LlmPolicy {
    async fn reply(&self, history: &[ChatTurn], input: &str) -> Result<String> {
        let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];
        for turn in history {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            messages.push(json!({ "role": role, "content": turn.content }));
        }
        messages.push(json!({ "role": "user", "content": input }));

        let mut request = self.http.post(&self.api_url).json(&json!({
            "model": self.model,
            "messages": messages,
        }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .context("failed to send request to the LLM backend")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM backend returned status {status}: {body}");
        }
        let completion: ChatCompletion = response
            .json()
            .await
            .context("failed to deserialize the LLM completion")?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .context("LLM completion carried no choices")?;
        Ok(choice.message.content)
    }
}

/// Deterministic offline baseline: search the goal, open the first hit,
/// buy it. Useful for wiring checks and self-contained runs.
pub struct HeuristicPolicy;

#[async_trait]
impl SolverPolicy for HeuristicPolicy {
    async fn reply(&self, _history: &[ChatTurn], input: &str) -> Result<String> {
        let action = if let Some(goal) = extract_goal(input) {
            format!("search[{goal}]")
        } else if input.contains("buy now") {
            "click[buy now]".to_string()
        } else if let Some(asin) = first_listed_asin(input) {
            format!("click[{asin}]")
        } else {
            "click[back to search]".to_string()
        };
        Ok(format!("<json>{{\"action\": \"{action}\"}}</json>"))
    }
}

fn extract_goal(input: &str) -> Option<String> {
    let line = input
        .lines()
        .find_map(|l| l.strip_prefix("Your Goal: "))?;
    let stripped = line
        .trim_start_matches("Buy a ")
        .trim_start_matches("I'm looking for a ")
        .trim_end_matches(|c: char| c.is_ascii_punctuation());
    // Human-authored templates carry a trailing clause after the title.
    let title = stripped.split(';').next().unwrap_or(stripped).trim();
    Some(title.to_string())
}

fn first_listed_asin(input: &str) -> Option<&str> {
    input
        .lines()
        .find(|l| l.starts_with('B') && l.contains(" [SEP] "))
        .and_then(|l| l.split(" [SEP] ").next())
}

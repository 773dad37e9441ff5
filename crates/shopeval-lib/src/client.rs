//! Transport client for talking to an agent endpoint.
//!
//! Each send re-resolves the endpoint's agent card before issuing the
//! request. That costs one extra round-trip per turn and keeps the client
//! completely stateless between calls.

use crate::error::EvalError;
use crate::protocol::{
    AgentCard, Message, SendMessageRequest, SendMessageResponse, AGENT_CARD_PATH,
};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Generous ceiling for a single turn round-trip; solver replies can hide a
/// full LLM generation behind them.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// A stateless client for the agent discovery and message endpoints.
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: Client,
}

impl Default for A2aClient {
    fn default() -> Self {
        Self::new()
    }
}

impl A2aClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Fetches and validates the agent card served under `base_url`.
    pub async fn resolve_endpoint(&self, base_url: &str) -> Result<AgentCard, EvalError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), AGENT_CARD_PATH);
        let response = self
            .http
            .get(&url)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| EvalError::from_request(&url, e))?;

        if !response.status().is_success() {
            return Err(EvalError::EndpointMalformed {
                url: url.clone(),
                reason: format!("discovery returned status {}", response.status()),
            });
        }

        let card: AgentCard =
            response
                .json()
                .await
                .map_err(|e| EvalError::EndpointMalformed {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
        debug!(agent = %card.name, url = %url, "resolved agent card");
        Ok(card)
    }

    /// Sends one correlated text message to the agent at `base_url` and
    /// returns the result message of the success envelope.
    pub async fn send_message(
        &self,
        base_url: &str,
        text: &str,
        context_id: Option<&str>,
        task_id: Option<&str>,
    ) -> Result<Message, EvalError> {
        // Resolve on every call; the card's advertised URL is authoritative
        // for where the message endpoint lives.
        let card = self.resolve_endpoint(base_url).await?;
        let endpoint = card.url.trim_end_matches('/').to_string();

        let message = Message::user_text(
            text,
            context_id.map(str::to_string),
            task_id.map(str::to_string),
        );
        let request = SendMessageRequest::new(message);

        let response = self
            .http
            .post(&endpoint)
            .timeout(SEND_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| EvalError::from_request(&endpoint, e))?;

        let envelope: SendMessageResponse =
            response
                .json()
                .await
                .map_err(|e| EvalError::EndpointMalformed {
                    url: endpoint.clone(),
                    reason: format!("invalid response envelope: {e}"),
                })?;

        if let Some(error) = envelope.error {
            return Err(EvalError::RpcFailure {
                url: endpoint,
                code: error.code,
                message: error.message,
            });
        }

        envelope.result.ok_or(EvalError::RpcFailure {
            url: endpoint,
            code: -32603,
            message: "success envelope without result".to_string(),
        })
    }
}

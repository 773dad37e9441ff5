//! A2A wire protocol types.
//!
//! Agents expose two surfaces: a discovery document (the agent card) at
//! `/.well-known/agent.json`, and a JSON-RPC 2.0 message endpoint at the
//! base URL accepting `message/send`. Field names follow the protocol's
//! camelCase convention on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known path serving the agent card.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// JSON-RPC method for a turn exchange.
pub const METHOD_MESSAGE_SEND: &str = "message/send";

/// Identity and capability metadata an agent serves at its discovery path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

/// A single advertised skill on an agent card.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// One ordered content part of a message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Part {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Message role on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A directional turn payload between controller and solver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Message {
    /// Builds a user-role message with a single text part and a fresh id.
    pub fn user_text(text: impl Into<String>, context_id: Option<String>, task_id: Option<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
            message_id: uuid::Uuid::new_v4().simple().to_string(),
            context_id,
            task_id,
        }
    }

    /// Builds an agent-role reply carrying `context_id`.
    pub fn agent_text(text: impl Into<String>, context_id: Option<String>) -> Self {
        Self {
            role: Role::Agent,
            parts: vec![Part::Text { text: text.into() }],
            message_id: uuid::Uuid::new_v4().simple().to_string(),
            context_id,
            task_id: None,
        }
    }

    /// Ordered text parts of the message.
    pub fn text_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .map(|Part::Text { text }| text.as_str())
            .collect()
    }

    /// First text part, if any. Absence is a caller-level error.
    pub fn first_text(&self) -> Option<&str> {
        self.text_parts().first().copied()
    }
}

/// Parameters of a `message/send` request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    pub message: Message,
}

/// JSON-RPC 2.0 request envelope for `message/send`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendMessageRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: MessageSendParams,
}

impl SendMessageRequest {
    pub fn new(message: Message) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: uuid::Uuid::new_v4().simple().to_string(),
            method: METHOD_MESSAGE_SEND.to_string(),
            params: MessageSendParams { message },
        }
    }
}

/// JSON-RPC error object of a failure envelope.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC 2.0 response envelope: success wraps a result message, failure
/// wraps an error object. Any non-success envelope is a transport-level
/// failure to the orchestrator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendMessageResponse {
    pub jsonrpc: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl SendMessageResponse {
    pub fn success(id: impl Into<String>, result: Message) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

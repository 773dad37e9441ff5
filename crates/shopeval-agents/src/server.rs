//! Shared axum serving layer for both agent roles.
//!
//! Each agent exposes the discovery card at the well-known path and a
//! JSON-RPC `message/send` endpoint at its base URL, dispatching the inner
//! message to a role-specific executor.

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use shopeval_lib::protocol::{
    AgentCard, Message, SendMessageRequest, SendMessageResponse, AGENT_CARD_PATH,
    METHOD_MESSAGE_SEND,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Handles one inbound message and produces the agent's reply message.
#[async_trait]
pub trait AgentExecutor: Send + Sync + 'static {
    async fn execute(&self, message: &Message) -> Result<Message>;
}

#[derive(Clone)]
struct AppState {
    card: AgentCard,
    executor: Arc<dyn AgentExecutor>,
}

/// Builds the router serving discovery and message endpoints.
pub fn build_router(card: AgentCard, executor: Arc<dyn AgentExecutor>) -> Router {
    let state = AppState { card, executor };
    Router::new()
        .route(AGENT_CARD_PATH, get(agent_card))
        .route("/", post(handle_send))
        .with_state(state)
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn handle_send(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Json<SendMessageResponse> {
    if request.method != METHOD_MESSAGE_SEND {
        return Json(SendMessageResponse::failure(
            request.id,
            -32601,
            format!("unknown method '{}'", request.method),
        ));
    }
    match state.executor.execute(&request.params.message).await {
        Ok(reply) => Json(SendMessageResponse::success(request.id, reply)),
        Err(e) => {
            warn!(error = %e, "executor failed");
            Json(SendMessageResponse::failure(request.id, -32603, e.to_string()))
        }
    }
}

/// Binds `host:port` and serves the agent until the process is terminated.
pub async fn serve(
    host: &str,
    port: u16,
    card: AgentCard,
    executor: Arc<dyn AgentExecutor>,
) -> Result<()> {
    let app = build_router(card.clone(), executor);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!(agent = %card.name, url = %card.url, "agent listening");
    axum::serve(listener, app).await?;
    Ok(())
}

//! Transport client and prober tests against in-process fixture servers.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shopeval_lib::client::A2aClient;
use shopeval_lib::error::EvalError;
use shopeval_lib::probe::{wait_until_ready, ProbeConfig};
use shopeval_lib::protocol::{
    AgentCard, Message, SendMessageRequest, SendMessageResponse, AGENT_CARD_PATH,
};
use std::time::Duration;

fn fixture_card(name: &str, url: &str) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: "fixture agent".to_string(),
        url: url.to_string(),
        version: "0.1.0".to_string(),
        default_input_modes: vec!["text/plain".to_string()],
        default_output_modes: vec!["text/plain".to_string()],
        capabilities: json!({}),
        skills: vec![],
    }
}

/// Serves a discovery card and an echoing message endpoint on port 0.
async fn spawn_echo_agent() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let card = fixture_card("fixture", &url);

    let app = Router::new()
        .route(AGENT_CARD_PATH, get(move || async move { Json(card) }))
        .route(
            "/",
            post(|Json(req): Json<SendMessageRequest>| async move {
                let text = req
                    .params
                    .message
                    .first_text()
                    .unwrap_or_default()
                    .to_string();
                let context_id = req
                    .params
                    .message
                    .context_id
                    .clone()
                    .unwrap_or_else(|| "ctx-fixture".to_string());
                Json(SendMessageResponse::success(
                    req.id,
                    Message::agent_text(format!("echo: {text}"), Some(context_id)),
                ))
            }),
        );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    url
}

#[tokio::test]
async fn resolve_endpoint_returns_the_agent_card() {
    let url = spawn_echo_agent().await;
    let client = A2aClient::new();
    let card = client.resolve_endpoint(&url).await.unwrap();
    assert_eq!(card.name, "fixture");
    assert_eq!(card.url, url);
}

#[tokio::test]
async fn resolve_endpoint_rejects_a_malformed_card() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let app = Router::new().route(AGENT_CARD_PATH, get(|| async { "definitely not a card" }));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = A2aClient::new();
    let err = client.resolve_endpoint(&url).await.unwrap_err();
    assert!(matches!(err, EvalError::EndpointMalformed { .. }));
}

#[tokio::test]
async fn resolve_endpoint_maps_connect_failures() {
    // Bind then drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = A2aClient::new();
    let err = client.resolve_endpoint(&url).await.unwrap_err();
    assert!(matches!(err, EvalError::EndpointUnreachable { .. }));
}

#[tokio::test]
async fn send_message_round_trips_text_and_context() {
    let url = spawn_echo_agent().await;
    let client = A2aClient::new();

    let first = client.send_message(&url, "hello", None, None).await.unwrap();
    assert_eq!(first.first_text(), Some("echo: hello"));
    assert_eq!(first.context_id.as_deref(), Some("ctx-fixture"));

    let second = client
        .send_message(&url, "again", Some("ctx-episode"), None)
        .await
        .unwrap();
    assert_eq!(second.context_id.as_deref(), Some("ctx-episode"));
}

#[tokio::test]
async fn error_envelope_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let card = fixture_card("failing", &url);
    let app = Router::new()
        .route(AGENT_CARD_PATH, get(move || async move { Json(card) }))
        .route(
            "/",
            post(|Json(req): Json<SendMessageRequest>| async move {
                Json(SendMessageResponse::failure(req.id, -32000, "task refused"))
            }),
        );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = A2aClient::new();
    let err = client
        .send_message(&url, "hello", None, None)
        .await
        .unwrap_err();
    match err {
        EvalError::RpcFailure { code, message, .. } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "task refused");
        }
        other => panic!("expected RpcFailure, got {other}"),
    }
}

#[tokio::test]
async fn prober_succeeds_immediately_on_a_live_endpoint() {
    let url = spawn_echo_agent().await;
    let client = A2aClient::new();
    let config = ProbeConfig {
        interval: Duration::from_millis(50),
        timeout: Duration::from_secs(5),
    };
    assert!(wait_until_ready(&client, &url, config).await);
}

#[tokio::test]
async fn prober_gives_up_after_the_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = A2aClient::new();
    let config = ProbeConfig {
        interval: Duration::from_millis(50),
        timeout: Duration::from_millis(250),
    };
    assert!(!wait_until_ready(&client, &url, config).await);
}

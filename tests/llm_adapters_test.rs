// ABOUTME: Integration tests for the Gemini and Claude adapters against a local mock backend
// ABOUTME: Verifies wire translation, status mapping, timeouts, and empty-response handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use korsana_coach::errors::ErrorCode;
use korsana_coach::llm::{
    AnthropicProvider, ChatMessage, ChatRequest, GeminiProvider, LlmProvider, ProviderSettings,
};
use serde_json::{json, Value};

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Debug, Clone)]
struct Captured {
    path_model: Option<String>,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Value,
}

#[derive(Clone)]
struct MockBackend {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockBackend {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            delay: Duration::ZERO,
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn last(&self) -> Captured {
        self.captured.lock().unwrap().last().cloned().unwrap()
    }

    async fn respond(&self, captured: Captured) -> Response {
        self.captured.lock().unwrap().push(captured);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.status, Json(self.reply.clone())).into_response()
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect()
}

async fn gemini_handler(
    State(mock): State<MockBackend>,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.respond(Captured {
        path_model: Some(model),
        query,
        headers: header_map(&headers),
        body,
    })
    .await
}

async fn claude_handler(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.respond(Captured {
        path_model: None,
        query: HashMap::new(),
        headers: header_map(&headers),
        body,
    })
    .await
}

async fn serve(mock: MockBackend) -> SocketAddr {
    let app = Router::new()
        .route("/v1beta/models/:model", post(gemini_handler))
        .route("/v1/messages", post(claude_handler))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings(base_url: String, model: &str, timeout: Duration) -> ProviderSettings {
    ProviderSettings {
        api_key: "test-key".to_owned(),
        base_url,
        model: model.to_owned(),
        timeout,
        max_output_tokens: 512,
    }
}

fn gemini(addr: SocketAddr, timeout: Duration) -> GeminiProvider {
    GeminiProvider::new(settings(
        format!("http://{addr}/v1beta"),
        "gemini-2.5-flash",
        timeout,
    ))
    .unwrap()
}

fn claude(addr: SocketAddr, timeout: Duration) -> AnthropicProvider {
    AnthropicProvider::new(settings(
        format!("http://{addr}/v1"),
        "claude-sonnet-4-5-20250929",
        timeout,
    ))
    .unwrap()
}

fn conversation() -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::user("I ran 10k yesterday"),
        ChatMessage::assistant("Nice work. How did it feel?"),
        ChatMessage::user("Heavy legs"),
    ])
    .with_system_prompt("You are a running coach.")
}

// ============================================================================
// Gemini
// ============================================================================

#[tokio::test]
async fn test_gemini_translates_roles_and_reads_candidate_text() {
    common::init_test_logging();
    let mock = MockBackend::new(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Take an easy "}, {"text": "day."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 4, "totalTokenCount": 44}
        }),
    );
    let addr = serve(mock.clone()).await;

    let response = gemini(addr, Duration::from_secs(5))
        .complete(&conversation())
        .await
        .unwrap();

    assert_eq!(response.content, "Take an easy day.");
    assert_eq!(response.model, "gemini-2.5-flash");
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(response.usage.unwrap().total_tokens, 44);

    let captured = mock.last();
    assert_eq!(
        captured.path_model.as_deref(),
        Some("gemini-2.5-flash:generateContent")
    );
    assert_eq!(captured.query.get("key").map(String::as_str), Some("test-key"));
    let roles: Vec<&str> = captured.body["contents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|content| content["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
    assert_eq!(
        captured.body["systemInstruction"]["parts"][0]["text"],
        "You are a running coach."
    );
}

#[tokio::test]
async fn test_gemini_error_status_is_rejected_with_status() {
    let mock = MockBackend::new(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"message": "overloaded"}}),
    );
    let addr = serve(mock).await;

    let error = gemini(addr, Duration::from_secs(5))
        .complete(&conversation())
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert_eq!(error.details["status"], 503);
    assert_eq!(error.details["provider"], "gemini");
}

#[tokio::test]
async fn test_gemini_timeout_is_unreachable() {
    let mock = MockBackend::new(StatusCode::OK, json!({"candidates": []}))
        .with_delay(Duration::from_secs(2));
    let addr = serve(mock).await;

    let error = gemini(addr, Duration::from_millis(200))
        .complete(&conversation())
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
    assert!(!error.message.contains("test-key"));
}

#[tokio::test]
async fn test_gemini_without_candidates_is_an_error() {
    let addr = serve(MockBackend::new(StatusCode::OK, json!({"candidates": []}))).await;

    let error = gemini(addr, Duration::from_secs(5))
        .complete(&conversation())
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert!(error.message.contains("gemini"));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = gemini(addr, Duration::from_secs(2))
        .complete(&conversation())
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
}

// ============================================================================
// Claude
// ============================================================================

#[tokio::test]
async fn test_claude_sends_headers_and_top_level_system() {
    let mock = MockBackend::new(
        StatusCode::OK,
        json!({
            "content": [{"type": "text", "text": "Rest tomorrow."}],
            "model": "claude-sonnet-4-5-20250929",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 30, "output_tokens": 3}
        }),
    );
    let addr = serve(mock.clone()).await;

    let response = claude(addr, Duration::from_secs(5))
        .complete(&conversation().with_max_tokens(4096))
        .await
        .unwrap();

    assert_eq!(response.content, "Rest tomorrow.");
    assert_eq!(response.usage.unwrap().total_tokens, 33);

    let captured = mock.last();
    assert_eq!(
        captured.headers.get("x-api-key").map(String::as_str),
        Some("test-key")
    );
    assert_eq!(
        captured.headers.get("anthropic-version").map(String::as_str),
        Some("2023-06-01")
    );
    assert_eq!(captured.body["system"], "You are a running coach.");
    assert_eq!(captured.body["max_tokens"], 4096);
    assert_eq!(captured.body["messages"][1]["role"], "assistant");
}

#[tokio::test]
async fn test_claude_rate_limit_status_is_rejected() {
    let addr = serve(MockBackend::new(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"type": "error"}),
    ))
    .await;

    let error = claude(addr, Duration::from_secs(5))
        .complete(&conversation())
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert_eq!(error.details["status"], 429);
}

#[tokio::test]
async fn test_claude_empty_content_is_an_error() {
    let addr = serve(MockBackend::new(StatusCode::OK, json!({"content": []}))).await;

    let error = claude(addr, Duration::from_secs(5))
        .complete(&conversation())
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
}

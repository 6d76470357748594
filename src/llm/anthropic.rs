// ABOUTME: Anthropic Claude provider implementation over the Messages API
// ABOUTME: Sends the system instruction as a top-level field and authenticates with x-api-key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Anthropic Provider
//!
//! Claude is the alternate backend, used when no Gemini key is configured.
//! Set `CLAUDE_API_KEY`.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    build_http_client, empty_response_error, transport_error, ChatRequest, ChatResponse,
    LlmProvider, ProviderSettings, TokenUsage,
};
use crate::constants::llm::ANTHROPIC_VERSION;
use crate::errors::{AppError, AppResult};

const PROVIDER_NAME: &str = "anthropic";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    stop_reason: Option<String>,
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Anthropic Claude LLM provider
pub struct AnthropicProvider {
    settings: ProviderSettings,
    client: Client,
}

impl AnthropicProvider {
    /// Create a new Claude provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(settings: ProviderSettings) -> AppResult<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { settings, client })
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.settings.model,
            max_tokens: request
                .max_tokens
                .unwrap_or(self.settings.max_output_tokens),
            messages: request
                .messages
                .iter()
                .map(|message| ClaudeMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            system: request.system_prompt.as_deref(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.settings.base_url.trim_end_matches('/'))
    }

    fn extract_content(response: &MessagesResponse) -> AppResult<String> {
        let text: String = response
            .content
            .iter()
            .filter(|block| block.kind.is_empty() || block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() {
            return Err(empty_response_error(PROVIDER_NAME, "no text content"));
        }
        Ok(text)
    }

    const fn convert_usage(usage: &ClaudeUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens.saturating_add(usage.output_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &'static str {
        "Anthropic Claude"
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    #[instrument(skip(self, request), fields(turns = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let body = self.build_request(request);
        let model = body.model.to_owned();

        debug!(model = %model, "Sending request to Claude API");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.settings.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_NAME, e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER_NAME, e))?;

        if !status.is_success() {
            error!(status = %status, body = %response_text, "Claude API returned an error status");
            return Err(AppError::upstream_rejected(PROVIDER_NAME, status.as_u16()));
        }

        let parsed: MessagesResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = %e, "Failed to decode Claude response");
            empty_response_error(PROVIDER_NAME, format!("undecodable body: {e}"))
        })?;

        let content = Self::extract_content(&parsed)?;
        debug!(chars = content.len(), "Received Claude response");

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or(model),
            usage: parsed.usage.as_ref().map(Self::convert_usage),
            finish_reason: parsed.stop_reason,
        })
    }
}

impl Debug for AnthropicProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnthropicProvider")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::ChatMessage;

    #[test]
    fn test_request_keeps_neutral_roles_and_top_level_system() {
        let provider = AnthropicProvider::new(ProviderSettings {
            api_key: "k".to_owned(),
            base_url: "https://api.anthropic.com/v1".to_owned(),
            model: "claude-sonnet-4-5-20250929".to_owned(),
            timeout: Duration::from_secs(1),
            max_output_tokens: 1024,
        })
        .unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ])
        .with_system_prompt("coach");

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["system"], "coach");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(provider.messages_url(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_usage_total_saturates_instead_of_overflowing() {
        let usage = AnthropicProvider::convert_usage(&ClaudeUsage {
            input_tokens: u32::MAX,
            output_tokens: 5,
        });
        assert_eq!(usage.prompt_tokens, u32::MAX);
        assert_eq!(usage.completion_tokens, 5);
        assert_eq!(usage.total_tokens, u32::MAX);
    }
}
